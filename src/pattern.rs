/*!
Compiled patterns, and the configuration and builder used to make them.

A [`Pattern`] is generic over the kind of haystack it searches: `Pattern<str>`
(aliased as [`Regex`](crate::Regex)) searches UTF-8 text and
`Pattern<[u8]>` (aliased as [`bytes::Regex`](crate::bytes::Regex)) searches
arbitrary bytes, treating each byte as the codepoint with the same value. A
text pattern can't be used on bytes or vice versa.

Most search routines come in three forms:

* A plain form, like [`Pattern::search`], that searches the whole haystack.
* An `_at` form, like [`Pattern::search_at`], that searches a window
`(pos, endpos)` of the haystack.
* A `try_` form of both that returns an error instead of panicking when a
configured resource limit is exceeded. With the default configuration, no
limit is set and the plain forms never panic.
*/

use core::borrow::Borrow;

use alloc::{sync::Arc, vec::Vec};

use crate::{
    backtrack::{self, Backtracker, Cache},
    error::{Error, LibraryError, PatternError, TemplateError},
    flags::Flags,
    matches::{Match, Matches, TryMatches},
    subject::{Quoted, Subject},
    syntax::parse,
    template::{Replacer, Template},
    util::{
        captures::GroupInfo,
        iter::Searcher,
        pool::Pool,
        search::{Anchored, Input},
    },
};

/// The deepest that groups may be nested in a pattern.
const NEST_LIMIT: u32 = 250;

/// The configuration used for building a [`Pattern`].
///
/// A configuration is a set of options that are merged into a [`Builder`]
/// with [`Builder::configure`]. Options that aren't set keep the value they
/// already had, so configurations can be layered.
///
/// # Example
///
/// This shows how to give up on a pattern that backtracks too much:
///
/// ```
/// use regex_backtrack::{Config, Regex};
///
/// let re = Regex::builder()
///     .configure(Config::new().backtrack_limit(Some(10_000)))
///     .build(r"(?:a|aa)*b")?;
/// let haystack = "a".repeat(40);
/// assert!(re.try_search(&haystack).is_err());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Config {
    flags: Option<Flags>,
    allow_duplicate_names: Option<bool>,
    backtrack_limit: Option<Option<usize>>,
    stack_limit: Option<Option<usize>>,
    prefilter: Option<bool>,
    unset_group_empty: Option<bool>,
}

impl Config {
    /// Return a new default pattern configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the flags a pattern is compiled with.
    ///
    /// By default, no flags are set. Text patterns are Unicode aware unless
    /// [`Flags::ASCII`] is given.
    pub fn flags(self, flags: Flags) -> Config {
        Config { flags: Some(flags), ..self }
    }

    /// Whether more than one group may have the same name.
    ///
    /// When enabled, a name refers to the first group with that name that
    /// participated in a match. This is disabled by default, and a repeated
    /// name is a compile error.
    pub fn allow_duplicate_names(self, yes: bool) -> Config {
        Config { allow_duplicate_names: Some(yes), ..self }
    }

    /// Set the largest number of backtracking steps a single search may
    /// take.
    ///
    /// A search that exceeds this returns a
    /// [`LibraryError`](crate::LibraryError) from the `try_` routines and
    /// panics in the others. There is no limit by default.
    pub fn backtrack_limit(self, limit: Option<usize>) -> Config {
        Config { backtrack_limit: Some(limit), ..self }
    }

    /// Set the largest number of backtracking frames a single search may
    /// keep alive at once.
    ///
    /// This bounds the memory a search uses. Exceeding it is reported the
    /// same way as exceeding the backtrack limit. There is no limit by
    /// default.
    pub fn stack_limit(self, limit: Option<usize>) -> Config {
        Config { stack_limit: Some(limit), ..self }
    }

    /// Whether to skip ahead to occurrences of a pattern's literal prefix
    /// before running the backtracker.
    ///
    /// This only affects speed. It is enabled by default.
    pub fn prefilter(self, yes: bool) -> Config {
        Config { prefilter: Some(yes), ..self }
    }

    /// Whether templates render a reference to a group that did not
    /// participate in a match as empty text.
    ///
    /// When disabled, such a reference is a
    /// [`TemplateError`](crate::TemplateError). This is enabled by default.
    pub fn unset_group_empty(self, yes: bool) -> Config {
        Config { unset_group_empty: Some(yes), ..self }
    }

    /// Returns the flags a pattern is compiled with.
    pub fn get_flags(&self) -> Flags {
        self.flags.unwrap_or(Flags::EMPTY)
    }

    /// Returns whether more than one group may have the same name.
    pub fn get_allow_duplicate_names(&self) -> bool {
        self.allow_duplicate_names.unwrap_or(false)
    }

    /// Returns the backtrack step limit, if any.
    pub fn get_backtrack_limit(&self) -> Option<usize> {
        self.backtrack_limit.unwrap_or(None)
    }

    /// Returns the backtrack frame limit, if any.
    pub fn get_stack_limit(&self) -> Option<usize> {
        self.stack_limit.unwrap_or(None)
    }

    /// Returns whether the literal prefilter is enabled.
    pub fn get_prefilter(&self) -> bool {
        self.prefilter.unwrap_or(true)
    }

    /// Returns whether unset groups render as empty text in templates.
    pub fn get_unset_group_empty(&self) -> bool {
        self.unset_group_empty.unwrap_or(true)
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. If an option in `o` is not set, then the corresponding
    /// option in `self` is used. If it's not set in `self` either, then it
    /// remains not set.
    pub(crate) fn overwrite(&self, o: Config) -> Config {
        Config {
            flags: o.flags.or(self.flags),
            allow_duplicate_names: o
                .allow_duplicate_names
                .or(self.allow_duplicate_names),
            backtrack_limit: o.backtrack_limit.or(self.backtrack_limit),
            stack_limit: o.stack_limit.or(self.stack_limit),
            prefilter: o.prefilter.or(self.prefilter),
            unset_group_empty: o.unset_group_empty.or(self.unset_group_empty),
        }
    }
}

/// A builder for compiling a [`Pattern`].
///
/// This provides a way to set the [`Flags`] and any other [`Config`]
/// options before compiling. [`Pattern::new`] is a shortcut for a builder
/// with the default configuration.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new pattern builder with its default configuration.
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Apply the given configuration on top of this builder's current one.
    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.config = self.config.overwrite(config);
        self
    }

    /// Set the flags the pattern is compiled with.
    ///
    /// This is a shortcut for configuring [`Config::flags`].
    pub fn flags(&mut self, flags: Flags) -> &mut Builder {
        self.configure(Config::new().flags(flags))
    }

    /// Compile the given pattern source.
    ///
    /// The source is text for a [`Regex`](crate::Regex) and bytes for a
    /// [`bytes::Regex`](crate::bytes::Regex). Byte sources may contain any
    /// byte, each of which stands for the codepoint with the same value.
    pub fn build<S: Subject + ?Sized>(
        &self,
        pattern: &S,
    ) -> Result<Pattern<S>, PatternError> {
        let config = self.config.clone();
        let flags = config.get_flags();
        let pconfig = parse::Config {
            flags,
            allow_duplicate_names: config.get_allow_duplicate_names(),
            nest_limit: NEST_LIMIT,
        };
        let ast = parse::parse(pattern, &pconfig)?;
        let bconfig = backtrack::Config {
            prefilter: config.get_prefilter(),
            backtrack_limit: config.get_backtrack_limit(),
            stack_limit: config.get_stack_limit(),
        };
        let backtracker = Backtracker::new(&ast, S::IS_TEXT, &bconfig);
        log!(log::debug!(
            "compiled pattern {:?} with flags {:?} and {} explicit groups",
            Quoted(pattern),
            flags,
            ast.group_info.explicit_group_len(),
        ));
        let create: fn() -> Cache = Cache::new;
        Ok(Pattern {
            imp: Arc::new(PatternI {
                source: pattern.to_owned_subject(),
                config,
                flags,
                backtracker,
                group_info: ast.group_info,
                pool: Pool::new(create),
            }),
        })
    }
}

/// A compiled regular expression with Python `re` semantics.
///
/// A pattern is immutable once compiled. Cloning it is cheap, and it can be
/// shared by any number of threads searching simultaneously: each search
/// takes its scratch space from a pool owned by the pattern.
///
/// # Example
///
/// ```
/// use regex_backtrack::Regex;
///
/// let re = Regex::new(r"(\w+)@(\w+)\.com")?;
/// let m = re.search("mail alice@example.com now").unwrap();
/// assert_eq!(5..22, m.range());
/// assert_eq!(Some("example"), m.get(2));
///
/// let hay = "a@b.com, c@d.com";
/// let found: Vec<&str> = re.finditer(hay).map(|m| m.as_subject()).collect();
/// assert_eq!(vec!["a@b.com", "c@d.com"], found);
///
/// assert_eq!("<a> <c>", re.sub(r"<\1>", hay, 0)?.replace(",", ""));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Pattern<S: Subject + ?Sized> {
    imp: Arc<PatternI<S>>,
}

struct PatternI<S: Subject + ?Sized> {
    source: S::Owned,
    config: Config,
    flags: Flags,
    backtracker: Backtracker,
    group_info: GroupInfo,
    pool: Pool<Cache>,
}

/// Convenience routines for pattern construction and metadata.
impl<S: Subject + ?Sized> Pattern<S> {
    /// Compile the given pattern with the default configuration.
    pub fn new(pattern: &S) -> Result<Pattern<S>, PatternError> {
        Builder::new().build(pattern)
    }

    /// Compile the given pattern with the given flags.
    pub fn with_flags(
        pattern: &S,
        flags: Flags,
    ) -> Result<Pattern<S>, PatternError> {
        Builder::new().flags(flags).build(pattern)
    }

    /// Return a default configuration for a pattern.
    pub fn config() -> Config {
        Config::new()
    }

    /// Return a builder for configuring the compilation of a pattern.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Returns the source this pattern was compiled from.
    pub fn source(&self) -> &S {
        self.imp.source.borrow()
    }

    /// Returns the flags this pattern was compiled with.
    ///
    /// Text patterns always report [`Flags::UNICODE`] unless they were
    /// compiled with [`Flags::ASCII`].
    pub fn flags(&self) -> Flags {
        let flags = self.imp.flags;
        if S::IS_TEXT && !flags.contains(Flags::ASCII) {
            flags | Flags::UNICODE
        } else {
            flags
        }
    }

    /// Returns the number of explicit capture groups in this pattern.
    pub fn groups(&self) -> usize {
        self.imp.group_info.explicit_group_len()
    }

    /// Returns each group name along with the index of the first group with
    /// that name, in the order the names first appear in the pattern.
    pub fn groupindex(&self) -> impl Iterator<Item = (&str, usize)> {
        self.imp.group_info.names()
    }

    /// Returns the capture group metadata of this pattern.
    pub fn group_info(&self) -> &GroupInfo {
        &self.imp.group_info
    }

    /// Returns the configuration this pattern was built with.
    pub fn get_config(&self) -> &Config {
        &self.imp.config
    }

    pub(crate) fn unset_group_empty(&self) -> bool {
        self.imp.config.get_unset_group_empty()
    }

    /// Run one search with the given scratch space. The match reports `pos`
    /// as the start of its window, which may differ from the start of the
    /// input when iterating.
    pub(crate) fn search_with<'h>(
        &self,
        cache: &mut Cache,
        input: &Input<'h, S>,
        pos: usize,
    ) -> Result<Option<Match<'h, S>>, LibraryError> {
        let span = input.get_span();
        let haystack = input.haystack();
        let window = &haystack.as_bytes()[..span.end];
        let mut slots = vec![None; self.imp.backtracker.slot_len()];
        let found = self.imp.backtracker.search(
            cache,
            window,
            span.start,
            input.get_anchored(),
            input.get_not_empty_at_start(),
            &mut slots,
        )?;
        if !found {
            return Ok(None);
        }
        Ok(Some(Match::new(self.clone(), haystack, slots, pos, span.end)))
    }

    /// Build the input for a search of the window `(pos, endpos)`. This
    /// returns `None` when the window is inverted, in which case nothing
    /// can match.
    fn window<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
        anchored: Anchored,
    ) -> Option<Input<'h, S>> {
        let len = haystack.as_bytes().len();
        if pos.min(len) > endpos.min(len) {
            return None;
        }
        Some(Input::new(haystack).range(pos..endpos).anchored(anchored))
    }

    fn try_find_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
        anchored: Anchored,
    ) -> Result<Option<Match<'h, S>>, Error> {
        match self.window(haystack, pos, endpos, anchored) {
            None => Ok(None),
            Some(input) => self.try_search_input(&input),
        }
    }
}

/// Routines for finding a single match.
impl<S: Subject + ?Sized> Pattern<S> {
    /// Returns the leftmost match anywhere in the haystack.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded. Use
    /// [`Pattern::try_search`] to handle that case.
    pub fn search<'h>(&self, haystack: &'h S) -> Option<Match<'h, S>> {
        or_panic(self.try_search(haystack))
    }

    /// Returns the leftmost match that starts no earlier than `pos`, in a
    /// haystack treated as ending at `endpos`.
    ///
    /// Both offsets are clamped to the haystack. Anchors like `^` and
    /// lookbehinds still see the text before `pos`. If `pos > endpos`,
    /// there is no match.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn search_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Option<Match<'h, S>> {
        or_panic(self.try_search_at(haystack, pos, endpos))
    }

    /// Returns the match that starts at the beginning of the haystack, if
    /// one exists. This is Python's `match`.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn prefix_match<'h>(&self, haystack: &'h S) -> Option<Match<'h, S>> {
        or_panic(self.try_prefix_match(haystack))
    }

    /// Like [`Pattern::prefix_match`], but the match must start at `pos`
    /// in a haystack treated as ending at `endpos`.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn prefix_match_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Option<Match<'h, S>> {
        or_panic(self.try_prefix_match_at(haystack, pos, endpos))
    }

    /// Returns the match that spans the entire haystack, if one exists.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn fullmatch<'h>(&self, haystack: &'h S) -> Option<Match<'h, S>> {
        or_panic(self.try_fullmatch(haystack))
    }

    /// Returns the match that spans exactly the window `(pos, endpos)`, if
    /// one exists.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn fullmatch_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Option<Match<'h, S>> {
        or_panic(self.try_fullmatch_at(haystack, pos, endpos))
    }

    /// Run a search with the given parameters, reporting the first match.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn search_input<'h>(
        &self,
        input: &Input<'h, S>,
    ) -> Option<Match<'h, S>> {
        or_panic(self.try_search_input(input))
    }

    /// Returns the leftmost match anywhere in the haystack, or an error if
    /// a resource limit is exceeded.
    pub fn try_search<'h>(
        &self,
        haystack: &'h S,
    ) -> Result<Option<Match<'h, S>>, Error> {
        self.try_search_at(haystack, 0, usize::MAX)
    }

    /// The fallible form of [`Pattern::search_at`].
    pub fn try_search_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Result<Option<Match<'h, S>>, Error> {
        self.try_find_at(haystack, pos, endpos, Anchored::No)
    }

    /// The fallible form of [`Pattern::prefix_match`].
    pub fn try_prefix_match<'h>(
        &self,
        haystack: &'h S,
    ) -> Result<Option<Match<'h, S>>, Error> {
        self.try_prefix_match_at(haystack, 0, usize::MAX)
    }

    /// The fallible form of [`Pattern::prefix_match_at`].
    pub fn try_prefix_match_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Result<Option<Match<'h, S>>, Error> {
        self.try_find_at(haystack, pos, endpos, Anchored::Start)
    }

    /// The fallible form of [`Pattern::fullmatch`].
    pub fn try_fullmatch<'h>(
        &self,
        haystack: &'h S,
    ) -> Result<Option<Match<'h, S>>, Error> {
        self.try_fullmatch_at(haystack, 0, usize::MAX)
    }

    /// The fallible form of [`Pattern::fullmatch_at`].
    pub fn try_fullmatch_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Result<Option<Match<'h, S>>, Error> {
        self.try_find_at(haystack, pos, endpos, Anchored::Full)
    }

    /// The fallible form of [`Pattern::search_input`].
    pub fn try_search_input<'h>(
        &self,
        input: &Input<'h, S>,
    ) -> Result<Option<Match<'h, S>>, Error> {
        let mut cache = self.imp.pool.get();
        Ok(self.search_with(&mut cache, input, input.start())?)
    }
}

/// Routines for finding every match.
impl<S: Subject + ?Sized> Pattern<S> {
    /// Returns an iterator over all non-overlapping matches in the
    /// haystack.
    ///
    /// After an empty match, the next match may start at the same offset
    /// only if it is not empty. So `x*` against `axb` yields the empty match
    /// at `0`, then `x`, then empty matches at `2` and `3`.
    ///
    /// # Panics
    ///
    /// The iterator panics if a configured resource limit is exceeded. Use
    /// [`Pattern::try_finditer`] to handle that case.
    pub fn finditer<'h>(&self, haystack: &'h S) -> Matches<'h, S> {
        Matches(self.try_finditer(haystack))
    }

    /// Returns an iterator over all non-overlapping matches in the window
    /// `(pos, endpos)`.
    pub fn finditer_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Matches<'h, S> {
        Matches(self.try_finditer_at(haystack, pos, endpos))
    }

    /// Returns an iterator over all non-overlapping matches that yields an
    /// error, and then stops, if a resource limit is exceeded.
    pub fn try_finditer<'h>(&self, haystack: &'h S) -> TryMatches<'h, S> {
        self.try_finditer_at(haystack, 0, usize::MAX)
    }

    /// The fallible form of [`Pattern::finditer_at`].
    pub fn try_finditer_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> TryMatches<'h, S> {
        let window = self.window(haystack, pos, endpos, Anchored::No);
        let searcher = match window {
            Some(input) => Searcher::new(input),
            None => Searcher::exhausted(Input::new(haystack)),
        };
        TryMatches::new(self.clone(), searcher)
    }

    /// Returns the text of every non-overlapping match.
    ///
    /// When the pattern has no groups, each item holds the whole match.
    /// Otherwise each item holds the text of every group in order, where a
    /// group that didn't participate yields empty text.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_backtrack::Regex;
    ///
    /// let re = Regex::new(r"(\w)=(\d)?")?;
    /// let found = re.findall("a=1 b= c=3");
    /// assert_eq!(
    ///     vec![vec!["a", "1"], vec!["b", ""], vec!["c", "3"]],
    ///     found,
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn findall<'h>(&self, haystack: &'h S) -> Vec<Vec<&'h S>> {
        or_panic(self.try_findall(haystack))
    }

    /// Like [`Pattern::findall`], but only within the window
    /// `(pos, endpos)`.
    pub fn findall_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Vec<Vec<&'h S>> {
        or_panic(self.try_findall_at(haystack, pos, endpos))
    }

    /// The fallible form of [`Pattern::findall`].
    pub fn try_findall<'h>(
        &self,
        haystack: &'h S,
    ) -> Result<Vec<Vec<&'h S>>, Error> {
        self.try_findall_at(haystack, 0, usize::MAX)
    }

    /// The fallible form of [`Pattern::findall_at`].
    pub fn try_findall_at<'h>(
        &self,
        haystack: &'h S,
        pos: usize,
        endpos: usize,
    ) -> Result<Vec<Vec<&'h S>>, Error> {
        let empty = haystack.slice(0..0);
        let mut items = vec![];
        for result in self.try_finditer_at(haystack, pos, endpos) {
            let m = result?;
            let item = if self.groups() == 0 {
                vec![m.as_subject()]
            } else {
                (1..=self.groups())
                    .map(|index| m.get(index).unwrap_or(empty))
                    .collect()
            };
            items.push(item);
        }
        Ok(items)
    }

    /// Split the haystack at each match of this pattern.
    ///
    /// The text of every group of each match is inserted between the parts
    /// it separates, with `None` for groups that didn't participate. At
    /// most `maxsplit` splits are made, where `0` means no limit. A pattern
    /// that matches the empty string splits between characters, following
    /// the same rule as [`Pattern::finditer`].
    ///
    /// # Example
    ///
    /// ```
    /// use regex_backtrack::Regex;
    ///
    /// let re = Regex::new(r"(-)|,")?;
    /// assert_eq!(
    ///     vec![Some("a"), None, Some("b"), Some("-"), Some("c")],
    ///     re.split("a,b-c", 0),
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn split<'h>(
        &self,
        haystack: &'h S,
        maxsplit: usize,
    ) -> Vec<Option<&'h S>> {
        or_panic(self.try_split(haystack, maxsplit))
    }

    /// The fallible form of [`Pattern::split`].
    pub fn try_split<'h>(
        &self,
        haystack: &'h S,
        maxsplit: usize,
    ) -> Result<Vec<Option<&'h S>>, Error> {
        let mut parts = vec![];
        let mut last = 0;
        let mut it = self.try_finditer(haystack);
        let mut splits = 0;
        while maxsplit == 0 || splits < maxsplit {
            let m = match it.next() {
                None => break,
                Some(result) => result?,
            };
            parts.push(Some(haystack.slice(last..m.start())));
            parts.extend((1..=self.groups()).map(|index| m.get(index)));
            last = m.end();
            splits += 1;
        }
        let end = haystack.as_bytes().len();
        parts.push(Some(haystack.slice(last..end)));
        Ok(parts)
    }
}

/// Routines for substitution.
impl<S: Subject + ?Sized> Pattern<S> {
    /// Replace at most `count` matches (all of them when `count` is `0`)
    /// with the given replacement.
    ///
    /// The replacement is usually a template, in which `\1`, `\g<name>`,
    /// `$1` and friends refer to groups of the match. It may also be a
    /// closure computing the replacement from each [`Match`], or a
    /// [`NoExpand`](crate::NoExpand) holding literal text. A template is
    /// parsed once, before searching, so an invalid template is an error
    /// even when nothing matches.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_backtrack::Regex;
    ///
    /// let re = Regex::new(r"(?P<y>\d{4})-(?P<m>\d{2})")?;
    /// let hay = "2010-03, 2014-10";
    /// assert_eq!("03/2010, 10/2014", re.sub(r"\g<m>/\g<y>", hay, 0)?);
    /// assert_eq!("03/2010, 2014-10", re.sub("$m/$y", hay, 1)?);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded. Use
    /// [`Pattern::try_sub`] to handle that case.
    pub fn sub<R: Replacer<S>>(
        &self,
        repl: R,
        haystack: &S,
        count: usize,
    ) -> Result<S::Owned, TemplateError> {
        self.subn(repl, haystack, count).map(|(out, _)| out)
    }

    /// Like [`Pattern::sub`], but also returns the number of replacements
    /// made.
    ///
    /// # Panics
    ///
    /// This panics if a configured resource limit is exceeded.
    pub fn subn<R: Replacer<S>>(
        &self,
        repl: R,
        haystack: &S,
        count: usize,
    ) -> Result<(S::Owned, usize), TemplateError> {
        match self.try_subn(repl, haystack, count) {
            Ok(result) => Ok(result),
            Err(err) => match err.as_template() {
                Some(err) => Err(err.clone()),
                None => panic!(
                    "unexpected search error, use try_subn to handle it: {}",
                    err,
                ),
            },
        }
    }

    /// The fallible form of [`Pattern::sub`].
    pub fn try_sub<R: Replacer<S>>(
        &self,
        repl: R,
        haystack: &S,
        count: usize,
    ) -> Result<S::Owned, Error> {
        self.try_subn(repl, haystack, count).map(|(out, _)| out)
    }

    /// The fallible form of [`Pattern::subn`].
    pub fn try_subn<R: Replacer<S>>(
        &self,
        mut repl: R,
        haystack: &S,
        count: usize,
    ) -> Result<(S::Owned, usize), Error> {
        let template = match repl.template() {
            None => None,
            Some(template) => {
                Some(Template::new(template, self.group_info())?)
            }
        };
        let unset_empty = self.unset_group_empty();
        let mut dst = S::Owned::default();
        let mut last = 0;
        let mut subs = 0;
        let mut it = self.try_finditer(haystack);
        while count == 0 || subs < count {
            let m = match it.next() {
                None => break,
                Some(result) => result?,
            };
            S::push_subject(&mut dst, haystack.slice(last..m.start()));
            match template {
                Some(ref template) => {
                    template.expand(&m, unset_empty, &mut dst)?
                }
                None => repl.replace_append(&m, &mut dst)?,
            }
            last = m.end();
            subs += 1;
        }
        let end = haystack.as_bytes().len();
        S::push_subject(&mut dst, haystack.slice(last..end));
        Ok((dst, subs))
    }
}

impl<S: Subject + ?Sized> Clone for Pattern<S> {
    fn clone(&self) -> Pattern<S> {
        Pattern { imp: Arc::clone(&self.imp) }
    }
}

impl<S: Subject + ?Sized> core::fmt::Debug for Pattern<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Pattern")
            .field(&Quoted(self.source()))
            .field(&self.flags())
            .finish()
    }
}

fn or_panic<T>(result: Result<T, Error>) -> T {
    match result {
        Ok(t) => t,
        Err(err) => panic!(
            "unexpected search error, use the try_ form to handle it: {}",
            err,
        ),
    }
}
