/*!
Error types reported by this crate.

There are four distinct failure modes, each with its own type:

* [`PatternError`] is returned when a pattern is syntactically or
structurally invalid. It is always reported by compilation and never deferred
to search time.
* [`MatchError`] is returned when a caller violates the contract of a
search or result routine, for example by asking for a capture group that does
not exist.
* [`TemplateError`] is returned when a replacement template is malformed or
refers to a group that does not exist.
* [`LibraryError`] is returned when the backtracking engine runs out of one
of its configured resource budgets. This is never reported when no budgets
are configured, which is the default.

[`Error`] unifies all of them for routines that can fail in more than one
way. Notice that "no match" is not an error: it is represented by `None`.
*/

use alloc::string::String;

/// An error that occurred while compiling a pattern.
///
/// The error records the byte offset into the pattern source at which the
/// problem was detected, and a human readable description is available via
/// its `Display` impl.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PatternError {
    kind: PatternErrorKind,
    offset: usize,
}

/// The specific structural defect found in a pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
enum PatternErrorKind {
    /// A `(` without a matching `)`.
    GroupUnclosed,
    /// A `)` without a matching `(`.
    GroupUnopened,
    /// A `[` without a matching `]`.
    ClassUnclosed,
    /// A class range whose start is greater than its end.
    ClassRangeInvalid { start: char, end: char },
    /// A class range with a class escape (like `\w`) as one of its ends.
    ClassRangeLiteral,
    /// Two class set operators in a row, e.g., `[a&&||b]`.
    ClassSetOperatorRepeated,
    /// A POSIX class name like `[:foo:]` that isn't recognized.
    ClassPosixUnknown(String),
    /// An unrecognized inline flag letter.
    FlagUnknown(char),
    /// An inline flag group that ended before a `)` or `:` was found.
    FlagUnexpectedEof,
    /// A `-` in an inline flag group that is not followed by any flag.
    FlagDanglingNegation,
    /// A flag was negated that cannot be turned off (like `a` or `u`).
    FlagCannotNegate(char),
    /// The ASCII and Unicode modes were both requested.
    FlagAsciiUnicode,
    /// Unicode mode was requested for a byte pattern.
    FlagUnicodeBytes,
    /// A group name that is not a valid identifier.
    GroupNameInvalid(String),
    /// A group name that was given more than once.
    GroupNameDuplicate(String),
    /// A reference to a group name that does not exist.
    GroupNameUnknown(String),
    /// A group name that was not terminated.
    GroupNameUnterminated,
    /// A reference to a group number that does not exist.
    GroupNumberInvalid(u32),
    /// A conditional group whose condition is malformed.
    ConditionInvalid,
    /// A conditional group with more than two branches.
    ConditionTooManyBranches,
    /// A repetition operator with nothing to repeat.
    RepeatMissing,
    /// A repetition operator applied to another repetition operator.
    RepeatMultiple,
    /// A counted repetition whose minimum exceeds its maximum.
    RepeatRangeInvalid { min: u32, max: u32 },
    /// A counted repetition with a bound that exceeds the limit.
    RepeatTooLarge { limit: u32 },
    /// A lookbehind whose body has no upper bound on its width.
    LookbehindUnbounded,
    /// A lookbehind whose body is wider than the limit.
    LookbehindTooLong { limit: u32 },
    /// A backslash at the very end of the pattern.
    EscapeUnexpectedEof,
    /// An escape sequence that is not recognized.
    EscapeUnknown(char),
    /// A hex or Unicode escape that is malformed.
    EscapeHexInvalid,
    /// An escape for a codepoint that cannot appear in this kind of pattern.
    EscapeCodepointInvalid(u32),
    /// An octal escape whose value exceeds `\377`.
    EscapeOctalInvalid,
    /// A Unicode property escape that is malformed or unknown.
    UnicodePropertyInvalid(String),
    /// A Unicode property escape used in a byte pattern.
    UnicodePropertyBytes,
    /// An unterminated `(?#...)` comment.
    CommentUnclosed,
    /// An unsupported construct (like a subroutine call).
    Unsupported(&'static str),
    /// Groups were nested more deeply than the configured limit.
    NestLimitExceeded(u32),
}

impl PatternError {
    /// Returns the byte offset into the pattern source at which this error
    /// was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn new(kind: PatternErrorKind, offset: usize) -> PatternError {
        PatternError { kind, offset }
    }

    pub(crate) fn group_unclosed(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::GroupUnclosed, offset)
    }

    pub(crate) fn group_unopened(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::GroupUnopened, offset)
    }

    pub(crate) fn class_unclosed(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::ClassUnclosed, offset)
    }

    pub(crate) fn class_range_invalid(
        offset: usize,
        start: char,
        end: char,
    ) -> PatternError {
        let kind = PatternErrorKind::ClassRangeInvalid { start, end };
        PatternError::new(kind, offset)
    }

    pub(crate) fn class_range_literal(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::ClassRangeLiteral, offset)
    }

    pub(crate) fn class_set_operator_repeated(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::ClassSetOperatorRepeated, offset)
    }

    pub(crate) fn class_posix_unknown(
        offset: usize,
        name: &str,
    ) -> PatternError {
        let kind = PatternErrorKind::ClassPosixUnknown(name.into());
        PatternError::new(kind, offset)
    }

    pub(crate) fn flag_unknown(offset: usize, flag: char) -> PatternError {
        PatternError::new(PatternErrorKind::FlagUnknown(flag), offset)
    }

    pub(crate) fn flag_unexpected_eof(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::FlagUnexpectedEof, offset)
    }

    pub(crate) fn flag_dangling_negation(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::FlagDanglingNegation, offset)
    }

    pub(crate) fn flag_cannot_negate(
        offset: usize,
        flag: char,
    ) -> PatternError {
        PatternError::new(PatternErrorKind::FlagCannotNegate(flag), offset)
    }

    pub(crate) fn flag_ascii_unicode(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::FlagAsciiUnicode, offset)
    }

    pub(crate) fn flag_unicode_bytes(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::FlagUnicodeBytes, offset)
    }

    pub(crate) fn group_name_invalid(
        offset: usize,
        name: &str,
    ) -> PatternError {
        let kind = PatternErrorKind::GroupNameInvalid(name.into());
        PatternError::new(kind, offset)
    }

    pub(crate) fn group_name_duplicate(
        offset: usize,
        name: &str,
    ) -> PatternError {
        let kind = PatternErrorKind::GroupNameDuplicate(name.into());
        PatternError::new(kind, offset)
    }

    pub(crate) fn group_name_unknown(
        offset: usize,
        name: &str,
    ) -> PatternError {
        let kind = PatternErrorKind::GroupNameUnknown(name.into());
        PatternError::new(kind, offset)
    }

    pub(crate) fn group_name_unterminated(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::GroupNameUnterminated, offset)
    }

    pub(crate) fn group_number_invalid(
        offset: usize,
        number: u32,
    ) -> PatternError {
        PatternError::new(PatternErrorKind::GroupNumberInvalid(number), offset)
    }

    pub(crate) fn condition_invalid(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::ConditionInvalid, offset)
    }

    pub(crate) fn condition_too_many_branches(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::ConditionTooManyBranches, offset)
    }

    pub(crate) fn repeat_missing(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::RepeatMissing, offset)
    }

    pub(crate) fn repeat_multiple(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::RepeatMultiple, offset)
    }

    pub(crate) fn repeat_range_invalid(
        offset: usize,
        min: u32,
        max: u32,
    ) -> PatternError {
        let kind = PatternErrorKind::RepeatRangeInvalid { min, max };
        PatternError::new(kind, offset)
    }

    pub(crate) fn repeat_too_large(offset: usize, limit: u32) -> PatternError {
        PatternError::new(PatternErrorKind::RepeatTooLarge { limit }, offset)
    }

    pub(crate) fn lookbehind_unbounded(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::LookbehindUnbounded, offset)
    }

    pub(crate) fn lookbehind_too_long(
        offset: usize,
        limit: u32,
    ) -> PatternError {
        let kind = PatternErrorKind::LookbehindTooLong { limit };
        PatternError::new(kind, offset)
    }

    pub(crate) fn escape_unexpected_eof(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::EscapeUnexpectedEof, offset)
    }

    pub(crate) fn escape_unknown(offset: usize, ch: char) -> PatternError {
        PatternError::new(PatternErrorKind::EscapeUnknown(ch), offset)
    }

    pub(crate) fn escape_hex_invalid(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::EscapeHexInvalid, offset)
    }

    pub(crate) fn escape_codepoint_invalid(
        offset: usize,
        cp: u32,
    ) -> PatternError {
        PatternError::new(PatternErrorKind::EscapeCodepointInvalid(cp), offset)
    }

    pub(crate) fn escape_octal_invalid(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::EscapeOctalInvalid, offset)
    }

    pub(crate) fn unicode_property_invalid(
        offset: usize,
        name: &str,
    ) -> PatternError {
        let kind = PatternErrorKind::UnicodePropertyInvalid(name.into());
        PatternError::new(kind, offset)
    }

    pub(crate) fn unicode_property_bytes(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::UnicodePropertyBytes, offset)
    }

    pub(crate) fn comment_unclosed(offset: usize) -> PatternError {
        PatternError::new(PatternErrorKind::CommentUnclosed, offset)
    }

    pub(crate) fn unsupported(
        offset: usize,
        what: &'static str,
    ) -> PatternError {
        PatternError::new(PatternErrorKind::Unsupported(what), offset)
    }

    pub(crate) fn nest_limit_exceeded(
        offset: usize,
        limit: u32,
    ) -> PatternError {
        PatternError::new(PatternErrorKind::NestLimitExceeded(limit), offset)
    }
}

impl std::error::Error for PatternError {}

impl core::fmt::Display for PatternError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use self::PatternErrorKind::*;

        match self.kind {
            GroupUnclosed => write!(f, "missing closing parenthesis"),
            GroupUnopened => write!(f, "unbalanced closing parenthesis"),
            ClassUnclosed => {
                write!(f, "missing terminating ] for character class")
            }
            ClassRangeInvalid { start, end } => write!(
                f,
                "character class range {:?}-{:?} is out of order",
                start, end,
            ),
            ClassRangeLiteral => write!(
                f,
                "invalid range in character class (class escapes cannot \
                 be range bounds)",
            ),
            ClassSetOperatorRepeated => write!(
                f,
                "character class set operator cannot follow another \
                 set operator",
            ),
            ClassPosixUnknown(ref name) => {
                write!(f, "unknown POSIX class name '{}'", name)
            }
            FlagUnknown(flag) => write!(f, "unknown inline flag '{}'", flag),
            FlagUnexpectedEof => write!(f, "missing ')' or ':' after flags"),
            FlagDanglingNegation => {
                write!(f, "missing flag letter after '-' in flag group")
            }
            FlagCannotNegate(flag) => {
                write!(f, "inline flag '{}' cannot be turned off", flag)
            }
            FlagAsciiUnicode => {
                write!(f, "ASCII and UNICODE flags are incompatible")
            }
            FlagUnicodeBytes => {
                write!(f, "cannot use UNICODE flag with a bytes pattern")
            }
            GroupNameInvalid(ref name) => {
                write!(f, "bad character in group name '{}'", name)
            }
            GroupNameDuplicate(ref name) => write!(
                f,
                "redefinition of group name '{}' \
                 (duplicate names are not allowed)",
                name,
            ),
            GroupNameUnknown(ref name) => {
                write!(f, "unknown group name '{}'", name)
            }
            GroupNameUnterminated => {
                write!(f, "missing group name terminator")
            }
            GroupNumberInvalid(n) => {
                write!(f, "reference to non-existent group {}", n)
            }
            ConditionInvalid => write!(f, "invalid condition in conditional"),
            ConditionTooManyBranches => {
                write!(f, "conditional group contains more than two branches")
            }
            RepeatMissing => write!(f, "nothing to repeat"),
            RepeatMultiple => write!(f, "multiple repeat"),
            RepeatRangeInvalid { min, max } => write!(
                f,
                "min repeat {} is greater than max repeat {}",
                min, max,
            ),
            RepeatTooLarge { limit } => {
                write!(f, "repeat count exceeds limit of {}", limit)
            }
            LookbehindUnbounded => {
                write!(f, "lookbehind assertion is not fixed width")
            }
            LookbehindTooLong { limit } => write!(
                f,
                "lookbehind assertion is longer than {} characters",
                limit,
            ),
            EscapeUnexpectedEof => write!(f, "backslash at end of pattern"),
            EscapeUnknown(ch) => write!(f, "bad escape \\{}", ch),
            EscapeHexInvalid => write!(f, "malformed hexadecimal escape"),
            EscapeCodepointInvalid(cp) => {
                write!(f, "escaped codepoint {:#X} is out of range", cp)
            }
            EscapeOctalInvalid => {
                write!(f, "octal escape value is greater than \\377")
            }
            UnicodePropertyInvalid(ref name) => {
                write!(f, "unknown Unicode property '{}'", name)
            }
            UnicodePropertyBytes => write!(
                f,
                "Unicode property escapes are not allowed in bytes patterns",
            ),
            CommentUnclosed => write!(f, "missing ) after (?# comment"),
            Unsupported(what) => write!(f, "unsupported syntax: {}", what),
            NestLimitExceeded(limit) => {
                write!(f, "parentheses are nested deeper than {}", limit)
            }
        }
    }
}

/// An error that occurred because a caller violated the contract of a
/// search or result routine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchError {
    kind: MatchErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum MatchErrorKind {
    /// Flags were given along with an already compiled pattern.
    FlagsWithCompiledPattern,
    /// A group index that is out of range for the pattern.
    GroupIndexInvalid(usize),
    /// A group name that the pattern does not define.
    GroupNameInvalid(String),
}

impl MatchError {
    pub(crate) fn flags_with_compiled_pattern() -> MatchError {
        MatchError { kind: MatchErrorKind::FlagsWithCompiledPattern }
    }

    pub(crate) fn group_index_invalid(index: usize) -> MatchError {
        MatchError { kind: MatchErrorKind::GroupIndexInvalid(index) }
    }

    pub(crate) fn group_name_invalid(name: &str) -> MatchError {
        MatchError { kind: MatchErrorKind::GroupNameInvalid(name.into()) }
    }
}

impl std::error::Error for MatchError {}

impl core::fmt::Display for MatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            MatchErrorKind::FlagsWithCompiledPattern => write!(
                f,
                "cannot process flags argument with a compiled pattern",
            ),
            MatchErrorKind::GroupIndexInvalid(index) => {
                write!(f, "invalid group index {}", index)
            }
            MatchErrorKind::GroupNameInvalid(ref name) => {
                write!(f, "invalid group name '{}'", name)
            }
        }
    }
}

/// An error that occurred while parsing or expanding a replacement template.
///
/// Templates are always parsed completely before any replacement is made, so
/// when this error is returned from a substitution routine, no output was
/// produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateError {
    kind: TemplateErrorKind,
    offset: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum TemplateErrorKind {
    EscapeUnexpectedEof,
    EscapeUnknown(char),
    EscapeOctalInvalid,
    GroupMissingOpen,
    GroupUnterminated,
    GroupNameInvalid(String),
    GroupNameUnknown(String),
    GroupIndexInvalid(u32),
    GroupUnset(usize),
}

impl TemplateError {
    /// Returns the byte offset into the template at which this error was
    /// detected.
    ///
    /// For errors found while expanding a template (such as a reference to
    /// a group that did not participate in the match), this is the offset
    /// of the reference.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn new(kind: TemplateErrorKind, offset: usize) -> TemplateError {
        TemplateError { kind, offset }
    }

    pub(crate) fn escape_unexpected_eof(offset: usize) -> TemplateError {
        TemplateError::new(TemplateErrorKind::EscapeUnexpectedEof, offset)
    }

    pub(crate) fn escape_unknown(offset: usize, ch: char) -> TemplateError {
        TemplateError::new(TemplateErrorKind::EscapeUnknown(ch), offset)
    }

    pub(crate) fn escape_octal_invalid(offset: usize) -> TemplateError {
        TemplateError::new(TemplateErrorKind::EscapeOctalInvalid, offset)
    }

    pub(crate) fn group_missing_open(offset: usize) -> TemplateError {
        TemplateError::new(TemplateErrorKind::GroupMissingOpen, offset)
    }

    pub(crate) fn group_unterminated(offset: usize) -> TemplateError {
        TemplateError::new(TemplateErrorKind::GroupUnterminated, offset)
    }

    pub(crate) fn group_name_invalid(
        offset: usize,
        name: &str,
    ) -> TemplateError {
        let kind = TemplateErrorKind::GroupNameInvalid(name.into());
        TemplateError::new(kind, offset)
    }

    pub(crate) fn group_name_unknown(
        offset: usize,
        name: &str,
    ) -> TemplateError {
        let kind = TemplateErrorKind::GroupNameUnknown(name.into());
        TemplateError::new(kind, offset)
    }

    pub(crate) fn group_index_invalid(
        offset: usize,
        index: u32,
    ) -> TemplateError {
        TemplateError::new(TemplateErrorKind::GroupIndexInvalid(index), offset)
    }

    pub(crate) fn group_unset(offset: usize, index: usize) -> TemplateError {
        TemplateError::new(TemplateErrorKind::GroupUnset(index), offset)
    }
}

impl std::error::Error for TemplateError {}

impl core::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use self::TemplateErrorKind::*;

        match self.kind {
            EscapeUnexpectedEof => write!(f, "backslash at end of template"),
            EscapeUnknown(ch) => write!(f, "bad escape \\{} in template", ch),
            EscapeOctalInvalid => {
                write!(f, "octal escape value is greater than \\377")
            }
            GroupMissingOpen => write!(f, "missing < after \\g"),
            GroupUnterminated => write!(f, "missing group name terminator"),
            GroupNameInvalid(ref name) => {
                write!(f, "bad character in group name '{}'", name)
            }
            GroupNameUnknown(ref name) => {
                write!(f, "unknown group name '{}'", name)
            }
            GroupIndexInvalid(index) => {
                write!(f, "invalid group reference {}", index)
            }
            GroupUnset(index) => write!(
                f,
                "group {} did not participate in the match and unset \
                 groups are not substituted with empty text",
                index,
            ),
        }
    }
}

/// An error that occurred because the backtracking engine ran out of a
/// configured resource budget.
///
/// When this is returned, the search was abandoned: it is not known whether
/// the pattern would have matched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LibraryError {
    kind: LibraryErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum LibraryErrorKind {
    BacktrackLimit { limit: usize },
    StackLimit { limit: usize },
}

impl LibraryError {
    pub(crate) fn backtrack_limit(limit: usize) -> LibraryError {
        LibraryError { kind: LibraryErrorKind::BacktrackLimit { limit } }
    }

    pub(crate) fn stack_limit(limit: usize) -> LibraryError {
        LibraryError { kind: LibraryErrorKind::StackLimit { limit } }
    }
}

impl std::error::Error for LibraryError {}

impl core::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            LibraryErrorKind::BacktrackLimit { limit } => write!(
                f,
                "backtracking step limit of {} exceeded during search",
                limit,
            ),
            LibraryErrorKind::StackLimit { limit } => write!(
                f,
                "backtracking stack limit of {} frames exceeded during search",
                limit,
            ),
        }
    }
}

/// The umbrella error type for routines that can fail in more than one way.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of an [`Error`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The pattern could not be compiled.
    Pattern(PatternError),
    /// A caller contract was violated.
    Match(MatchError),
    /// A replacement template was invalid.
    Template(TemplateError),
    /// The engine ran out of a resource budget.
    Library(LibraryError),
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the underlying pattern error, if this is one.
    pub fn as_pattern(&self) -> Option<&PatternError> {
        match self.kind {
            ErrorKind::Pattern(ref err) => Some(err),
            _ => None,
        }
    }

    /// Returns the underlying match error, if this is one.
    pub fn as_match(&self) -> Option<&MatchError> {
        match self.kind {
            ErrorKind::Match(ref err) => Some(err),
            _ => None,
        }
    }

    /// Returns the underlying template error, if this is one.
    pub fn as_template(&self) -> Option<&TemplateError> {
        match self.kind {
            ErrorKind::Template(ref err) => Some(err),
            _ => None,
        }
    }

    /// Returns the underlying library error, if this is one.
    pub fn as_library(&self) -> Option<&LibraryError> {
        match self.kind {
            ErrorKind::Library(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for Error {
    fn from(err: PatternError) -> Error {
        Error { kind: ErrorKind::Pattern(err) }
    }
}

impl From<MatchError> for Error {
    fn from(err: MatchError) -> Error {
        Error { kind: ErrorKind::Match(err) }
    }
}

impl From<TemplateError> for Error {
    fn from(err: TemplateError) -> Error {
        Error { kind: ErrorKind::Template(err) }
    }
}

impl From<LibraryError> for Error {
    fn from(err: LibraryError) -> Error {
        Error { kind: ErrorKind::Library(err) }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind {
            ErrorKind::Pattern(ref err) => Some(err),
            ErrorKind::Match(ref err) => Some(err),
            ErrorKind::Template(ref err) => Some(err),
            ErrorKind::Library(ref err) => Some(err),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::Pattern(ref err) => {
                write!(
                    f,
                    "error compiling pattern at offset {}: {}",
                    err.offset, err,
                )
            }
            ErrorKind::Match(ref err) => err.fmt(f),
            ErrorKind::Template(ref err) => write!(
                f,
                "error in replacement template at offset {}: {}",
                err.offset, err,
            ),
            ErrorKind::Library(ref err) => err.fmt(f),
        }
    }
}
