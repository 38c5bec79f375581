/// A set of options that change how a pattern is compiled and matched.
///
/// Flags can be given when compiling a pattern, and most of them can also be
/// toggled from inside the pattern with inline groups like `(?i)` or
/// `(?-s:...)`. The single letter aliases (`I`, `M`, ...) mirror the letters
/// used in inline groups.
///
/// Flags combine with `|`:
///
/// ```
/// use regex_backtrack::{Flags, Regex};
///
/// let re = Regex::builder()
///     .flags(Flags::IGNORECASE | Flags::MULTILINE)
///     .build("^abc$")?;
/// assert!(re.search("xyz\nABC\n").is_some());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Flags(u32);

impl Flags {
    /// No flags at all.
    pub const EMPTY: Flags = Flags(0);
    /// Case insensitive matching using simple Unicode case folding (or ASCII
    /// case folding in ASCII mode).
    pub const IGNORECASE: Flags = Flags(1 << 0);
    /// `^` and `$` additionally match at the start and end of each line.
    pub const MULTILINE: Flags = Flags(1 << 1);
    /// `.` matches any character, including `\n`.
    pub const DOTALL: Flags = Flags(1 << 2);
    /// Unescaped whitespace is ignored and `#` begins a comment that runs to
    /// the end of the line.
    pub const VERBOSE: Flags = Flags(1 << 3);
    /// `\w`, `\d`, `\s`, `\b` and case folding are Unicode aware. This is
    /// the default for text patterns and an error for byte patterns.
    pub const UNICODE: Flags = Flags(1 << 4);
    /// `\w`, `\d`, `\s`, `\b` and case folding only consider ASCII. Byte
    /// patterns always behave this way.
    pub const ASCII: Flags = Flags(1 << 5);
    /// Enables the `&&` (intersection), `||` (union), `--` (difference) and
    /// `~~` (symmetric difference) operators inside bracketed classes.
    ///
    /// Without this flag, those characters are literal members of the class.
    /// There is no inline form of this flag.
    pub const CLASS_SET_OPERATIONS: Flags = Flags(1 << 6);

    /// Alias for [`Flags::IGNORECASE`].
    pub const I: Flags = Flags::IGNORECASE;
    /// Alias for [`Flags::MULTILINE`].
    pub const M: Flags = Flags::MULTILINE;
    /// Alias for [`Flags::DOTALL`].
    pub const S: Flags = Flags::DOTALL;
    /// Alias for [`Flags::VERBOSE`].
    pub const X: Flags = Flags::VERBOSE;
    /// Alias for [`Flags::UNICODE`].
    pub const U: Flags = Flags::UNICODE;
    /// Alias for [`Flags::ASCII`].
    pub const A: Flags = Flags::ASCII;

    const ALL: u32 = (1 << 7) - 1;

    /// Returns an empty set of flags.
    pub const fn empty() -> Flags {
        Flags::EMPTY
    }

    /// Returns the raw bits of this set.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Builds a set of flags from raw bits, returning `None` if any unknown
    /// bit is set.
    pub const fn from_bits(bits: u32) -> Option<Flags> {
        if bits & !Flags::ALL != 0 {
            None
        } else {
            Some(Flags(bits))
        }
    }

    /// Returns true when no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true when every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of both sets.
    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    /// Returns the flags in `self` that are not in `other`.
    pub const fn difference(self, other: Flags) -> Flags {
        Flags(self.0 & !other.0)
    }

    /// Sets or clears the given flags.
    pub fn set(&mut self, flags: Flags, yes: bool) {
        if yes {
            self.0 |= flags.0;
        } else {
            self.0 &= !flags.0;
        }
    }

    /// Maps an inline flag letter to its flag.
    pub(crate) fn from_inline(letter: char) -> Option<Flags> {
        Some(match letter {
            'i' => Flags::IGNORECASE,
            'm' => Flags::MULTILINE,
            's' => Flags::DOTALL,
            'x' => Flags::VERBOSE,
            'u' => Flags::UNICODE,
            'a' => Flags::ASCII,
            _ => return None,
        })
    }
}

impl core::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl core::ops::BitAnd for Flags {
    type Output = Flags;

    fn bitand(self, rhs: Flags) -> Flags {
        Flags(self.0 & rhs.0)
    }
}

impl core::ops::Sub for Flags {
    type Output = Flags;

    fn sub(self, rhs: Flags) -> Flags {
        self.difference(rhs)
    }
}

impl core::fmt::Debug for Flags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        const NAMES: &[(Flags, &str)] = &[
            (Flags::IGNORECASE, "IGNORECASE"),
            (Flags::MULTILINE, "MULTILINE"),
            (Flags::DOTALL, "DOTALL"),
            (Flags::VERBOSE, "VERBOSE"),
            (Flags::UNICODE, "UNICODE"),
            (Flags::ASCII, "ASCII"),
            (Flags::CLASS_SET_OPERATIONS, "CLASS_SET_OPERATIONS"),
        ];
        if self.is_empty() {
            return write!(f, "Flags(EMPTY)");
        }
        write!(f, "Flags(")?;
        let mut first = true;
        for &(flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine() {
        let flags = Flags::I | Flags::M;
        assert!(flags.contains(Flags::IGNORECASE));
        assert!(flags.contains(Flags::MULTILINE));
        assert!(!flags.contains(Flags::DOTALL));
        assert_eq!(Flags::IGNORECASE, flags - Flags::M);
        assert_eq!(None, Flags::from_bits(1 << 20));
        assert_eq!(Some(flags), Flags::from_bits(flags.bits()));
    }

    #[test]
    fn debug() {
        assert_eq!("Flags(EMPTY)", format!("{:?}", Flags::empty()));
        assert_eq!(
            "Flags(IGNORECASE | DOTALL)",
            format!("{:?}", Flags::S | Flags::I)
        );
    }
}
