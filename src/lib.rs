/*!
A backtracking regular expression engine with the semantics of Python's `re`
module.

This crate compiles patterns written in the Python/PCRE dialect of regular
expressions and executes them with a backtracking virtual machine. Unlike
the finite automata based engines of the `regex` ecosystem, a backtracker
supports features that require remembering how a match was reached:

* backreferences, like `(\w)\1`, by number or by name,
* lookahead and bounded lookbehind, like `(?<=\$)\d+` and `x(?!y)`,
* conditionals, like `(<)?\w+(?(1)>)`,
* atomic groups `(?>...)` and possessive repetitions `a*+`,
* `\K`, which resets the start of the reported match.

The price of these features is that searching is not guaranteed to run in
linear time. A pathological pattern can take exponential time on some
inputs. [`Config::backtrack_limit`] and [`Config::stack_limit`] put a bound
on the work and memory a single search may use.

# Overview

The main type is [`Pattern`], which is generic over the kind of haystack it
searches. [`Regex`] is a pattern over `str` and [`bytes::Regex`] is a pattern
over `[u8]`. Text and byte patterns can't be mixed: a text pattern only
searches text and only accepts text templates.

Searches return a [`Match`], from which the spans and text of every capture
group may be extracted. The operations of Python's `re` module are all
available, both as methods on a pattern and as free functions that compile
their pattern on the fly:

| Python | Method | Function |
| ------ | ------ | -------- |
| `compile` | [`Pattern::with_flags`] | [`compile`] |
| `search` | [`Pattern::search`] | [`search`] |
| `match` | [`Pattern::prefix_match`] | [`prefix_match`] |
| `fullmatch` | [`Pattern::fullmatch`] | [`fullmatch`] |
| `finditer` | [`Pattern::finditer`] | [`finditer`] |
| `findall` | [`Pattern::findall`] | [`findall`] |
| `split` | [`Pattern::split`] | [`split`] |
| `sub` | [`Pattern::sub`] | [`sub`] |
| `subn` | [`Pattern::subn`] | [`subn`] |

# Example

```
use regex_backtrack::Regex;

let re = Regex::new(r"(?P<word>\w+)\s+(?P=word)")?;
let m = re.search("it is is doubled").unwrap();
assert_eq!("is is", m.as_subject());
assert_eq!(Some("is"), m.name("word"));

let fixed = re.sub(r"\g<word>", "the the cat sat sat", 0)?;
assert_eq!("the cat sat", fixed);

# Ok::<(), Box<dyn std::error::Error>>(())
```

# Free functions

The free functions accept either pattern source or an already compiled
pattern. Flags may only be given along with source, since a compiled pattern
already has its flags:

```
use regex_backtrack::{self as re, Flags, Regex};

let m = re::search(r"B+", "abbc", Flags::IGNORECASE)?.unwrap();
assert_eq!(1..3, m.range());

let compiled = Regex::new(r"b+")?;
assert!(re::search(&compiled, "abbc", Flags::EMPTY)?.is_some());
assert!(re::search(&compiled, "abbc", Flags::IGNORECASE).is_err());

# Ok::<(), Box<dyn std::error::Error>>(())
```

Nothing is cached by the free functions. Code that reuses a small set of
patterns can keep them in a [`PatternCache`].

# Syntax

The syntax is the one documented for Python's `re` module, with these
additions from PCRE2:

* possessive repetitions `*+`, `++`, `?+` and `{m,n}+`,
* atomic groups `(?>...)`,
* the group name forms `(?<name>...)`, `(?'name'...)`, `\k<name>`,
`\k{name}` and `\g{N}`,
* Unicode properties `\p{Greek}`, `\pL`, `\P{Lu}`,
* the escapes `\e`, `\x{h...}`, `\N{U+hhhh}`, `\K` and `\z`,
* POSIX classes like `[[:alpha:]]`,
* variable width lookbehind, as long as its width is bounded,
* with [`Flags::CLASS_SET_OPERATIONS`], the set operators `&&`, `||`, `--`
and `~~` inside bracketed classes.

# Templates

The replacement templates used by [`Pattern::sub`] and [`Match::expand`]
support Python's `\1`, `\g<1>` and `\g<name>`, PCRE2's `$1`, `${1}`,
`$name` and `${name}`, octal escapes, the usual character escapes, and the
case conversions `\u`, `\l`, `\U...\E` and `\L...\E`. Use [`NoExpand`] to
insert text literally, or a closure to compute each replacement.

# Crate features

* **logging** - Enables the `log` crate. Compilation reports a summary of
each compiled program at debug level, and resource limits report at trace
level when they fire.
*/

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(not(any(
    target_pointer_width = "16",
    target_pointer_width = "32",
    target_pointer_width = "64"
)))]
compile_error!("regex-backtrack currently not supported on non-{16,32,64}");

extern crate alloc;

pub use crate::{
    cache::PatternCache,
    error::{
        Error, ErrorKind, LibraryError, MatchError, PatternError,
        TemplateError,
    },
    flags::Flags,
    matches::{GroupKey, Match, Matches, TryMatches},
    pattern::{Builder, Config, Pattern},
    subject::Subject,
    template::{NoExpand, Replacer},
    util::{
        captures::GroupInfo,
        search::{Anchored, Input, Span},
    },
};

#[macro_use]
mod macros;

mod backtrack;
pub mod bytes;
mod cache;
mod error;
mod flags;
mod matches;
mod pattern;
mod subject;
mod syntax;
mod template;
mod util;

/// A compiled pattern for searching UTF-8 text.
pub type Regex = Pattern<str>;

/// Something that can be turned into a compiled [`Pattern`]: pattern source
/// or a reference to an existing pattern.
///
/// This is how the free functions of this crate accept either form.
pub trait IntoPattern<S: Subject + ?Sized> {
    /// Compile this pattern with the given flags.
    ///
    /// Giving flags along with a compiled pattern is a [`MatchError`].
    fn into_pattern(self, flags: Flags) -> Result<Pattern<S>, Error>;
}

impl<'a> IntoPattern<str> for &'a str {
    fn into_pattern(self, flags: Flags) -> Result<Pattern<str>, Error> {
        Ok(Pattern::with_flags(self, flags)?)
    }
}

impl<'a> IntoPattern<str> for &'a String {
    fn into_pattern(self, flags: Flags) -> Result<Pattern<str>, Error> {
        self.as_str().into_pattern(flags)
    }
}

impl<'a> IntoPattern<[u8]> for &'a [u8] {
    fn into_pattern(self, flags: Flags) -> Result<Pattern<[u8]>, Error> {
        Ok(Pattern::with_flags(self, flags)?)
    }
}

impl<'a, const N: usize> IntoPattern<[u8]> for &'a [u8; N] {
    fn into_pattern(self, flags: Flags) -> Result<Pattern<[u8]>, Error> {
        (&self[..]).into_pattern(flags)
    }
}

impl<'a, S: Subject + ?Sized> IntoPattern<S> for &'a Pattern<S> {
    fn into_pattern(self, flags: Flags) -> Result<Pattern<S>, Error> {
        if !flags.is_empty() {
            return Err(MatchError::flags_with_compiled_pattern().into());
        }
        Ok(self.clone())
    }
}

/// Compile a pattern with the given flags.
///
/// Given a compiled pattern and no flags, this returns the same pattern.
pub fn compile<S, P>(pattern: P, flags: Flags) -> Result<Pattern<S>, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
{
    pattern.into_pattern(flags)
}

/// Returns the leftmost match of `pattern` anywhere in the haystack.
pub fn search<'h, S, P>(
    pattern: P,
    haystack: &'h S,
    flags: Flags,
) -> Result<Option<Match<'h, S>>, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
{
    pattern.into_pattern(flags)?.try_search(haystack)
}

/// Returns the match of `pattern` at the beginning of the haystack. This is
/// Python's `re.match`.
pub fn prefix_match<'h, S, P>(
    pattern: P,
    haystack: &'h S,
    flags: Flags,
) -> Result<Option<Match<'h, S>>, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
{
    pattern.into_pattern(flags)?.try_prefix_match(haystack)
}

/// Returns the match of `pattern` spanning the entire haystack.
pub fn fullmatch<'h, S, P>(
    pattern: P,
    haystack: &'h S,
    flags: Flags,
) -> Result<Option<Match<'h, S>>, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
{
    pattern.into_pattern(flags)?.try_fullmatch(haystack)
}

/// Returns the text of every non-overlapping match of `pattern`. See
/// [`Pattern::findall`].
pub fn findall<'h, S, P>(
    pattern: P,
    haystack: &'h S,
    flags: Flags,
) -> Result<Vec<Vec<&'h S>>, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
{
    pattern.into_pattern(flags)?.try_findall(haystack)
}

/// Returns an iterator over every non-overlapping match of `pattern`.
///
/// The iterator panics if the search exceeds a resource limit, which can
/// only happen when a compiled pattern with limits is given.
pub fn finditer<'h, S, P>(
    pattern: P,
    haystack: &'h S,
    flags: Flags,
) -> Result<Matches<'h, S>, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
{
    Ok(pattern.into_pattern(flags)?.finditer(haystack))
}

/// Split the haystack at each match of `pattern`. See [`Pattern::split`].
pub fn split<'h, S, P>(
    pattern: P,
    haystack: &'h S,
    maxsplit: usize,
    flags: Flags,
) -> Result<Vec<Option<&'h S>>, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
{
    pattern.into_pattern(flags)?.try_split(haystack, maxsplit)
}

/// Replace at most `count` matches of `pattern` (all of them when `count`
/// is `0`). See [`Pattern::sub`].
pub fn sub<S, P, R>(
    pattern: P,
    repl: R,
    haystack: &S,
    count: usize,
    flags: Flags,
) -> Result<S::Owned, Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
    R: Replacer<S>,
{
    pattern.into_pattern(flags)?.try_sub(repl, haystack, count)
}

/// Like [`sub`], but also returns the number of replacements made.
///
/// # Example
///
/// ```
/// use regex_backtrack::{subn, Flags};
///
/// let (out, n) = subn("b*", "x", "xyz", 0, Flags::EMPTY)?;
/// assert_eq!(("xxxyxzx", 4), (out.as_str(), n));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn subn<S, P, R>(
    pattern: P,
    repl: R,
    haystack: &S,
    count: usize,
    flags: Flags,
) -> Result<(S::Owned, usize), Error>
where
    S: Subject + ?Sized,
    P: IntoPattern<S>,
    R: Replacer<S>,
{
    pattern.into_pattern(flags)?.try_subn(repl, haystack, count)
}
