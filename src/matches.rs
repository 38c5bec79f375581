/*!
The result of a successful search, and iterators over successive matches.

A [`Match`] records the span of every capture group in a single match,
along with enough context (the pattern, the haystack and the search window)
to answer every question Python's match objects answer. Groups can be
looked up by index or by name through the [`GroupKey`] trait.
*/

use core::ops::Range;

use alloc::vec::Vec;

use crate::{
    backtrack::Cache,
    error::{LibraryError, MatchError, TemplateError},
    pattern::Pattern,
    subject::{Quoted, Subject},
    template::Template,
    util::{captures::GroupInfo, iter::Searcher, search::Span},
};

/// A single match of a pattern in a haystack, with the spans of every
/// capture group.
///
/// The lifetime `'h` refers to the haystack. A match holds a cheap clone of
/// the pattern that produced it, so it may outlive the pattern value it was
/// found with.
///
/// # Example
///
/// ```
/// use regex_backtrack::Regex;
///
/// let re = Regex::new(r"(?P<key>\w+)=(?P<value>\w+)?")?;
/// let m = re.search("a=1 b=").unwrap();
/// assert_eq!(0..3, m.range());
/// assert_eq!(Some("a"), m.name("key"));
/// assert_eq!(Some("1"), m.get(2));
/// assert_eq!(Some(2), m.lastindex());
/// assert_eq!(Some("value"), m.lastgroup());
///
/// // Unknown groups are an error, unset groups are not.
/// assert!(m.group(3).is_err());
/// assert!(m.group("nope").is_err());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Match<'h, S: Subject + ?Sized> {
    pattern: Pattern<S>,
    haystack: &'h S,
    /// Two slots per group. Group `0` is always set.
    slots: Vec<Option<usize>>,
    pos: usize,
    endpos: usize,
}

impl<'h, S: Subject + ?Sized> Match<'h, S> {
    pub(crate) fn new(
        pattern: Pattern<S>,
        haystack: &'h S,
        slots: Vec<Option<usize>>,
        pos: usize,
        endpos: usize,
    ) -> Match<'h, S> {
        debug_assert!(slots.len() >= 2 && slots[0].is_some());
        Match { pattern, haystack, slots, pos, endpos }
    }

    /// Returns the starting byte offset of the match.
    #[inline]
    pub fn start(&self) -> usize {
        self.slots[0].unwrap_or(0)
    }

    /// Returns the ending byte offset of the match.
    #[inline]
    pub fn end(&self) -> usize {
        self.slots[1].unwrap_or(0)
    }

    /// Returns the span of the match.
    #[inline]
    pub fn span(&self) -> Span {
        Span { start: self.start(), end: self.end() }
    }

    /// Returns the span of the match as a range.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Returns true if and only if this match is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start() >= self.end()
    }

    /// Returns the length, in bytes, of the match.
    #[inline]
    pub fn len(&self) -> usize {
        self.end().saturating_sub(self.start())
    }

    /// Returns the text of the overall match.
    #[inline]
    pub fn as_subject(&self) -> &'h S {
        self.slice(self.span())
    }

    /// Returns the span of the given group, or `None` if the group did not
    /// participate in the match.
    ///
    /// A name used by more than one group refers to the first of those
    /// groups that participated. An index or name that the pattern doesn't
    /// define is an error.
    pub fn group_span<G: GroupKey>(
        &self,
        group: G,
    ) -> Result<Option<Span>, MatchError> {
        Ok(match group.resolve(self.group_info())? {
            private::Resolved::One(index) => self.span_of(index),
            private::Resolved::Any(indices) => {
                indices.iter().find_map(|&index| self.span_of(index))
            }
        })
    }

    /// Returns the text of the given group, or `None` if the group did not
    /// participate in the match.
    ///
    /// An index or name that the pattern doesn't define is an error.
    pub fn group<G: GroupKey>(
        &self,
        group: G,
    ) -> Result<Option<&'h S>, MatchError> {
        Ok(self.group_span(group)?.map(|span| self.slice(span)))
    }

    /// Returns the text of the group at the given index, or `None` if it
    /// did not participate in the match or doesn't exist.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&'h S> {
        self.span_of(index).map(|span| self.slice(span))
    }

    /// Returns the text of the group with the given name, or `None` if it
    /// did not participate in the match or doesn't exist.
    #[inline]
    pub fn name(&self, name: &str) -> Option<&'h S> {
        self.group(name).ok().flatten()
    }

    /// Returns the text of every explicit group in order, with `default`
    /// standing in for groups that did not participate.
    pub fn groups(&self, default: Option<&'h S>) -> Vec<Option<&'h S>> {
        (1..self.group_info().group_len())
            .map(|index| self.get(index).or(default))
            .collect()
    }

    /// Returns every group name along with the text of its group, in the
    /// order the names were first defined. `default` stands in for groups
    /// that did not participate.
    pub fn groupdict(
        &self,
        default: Option<&'h S>,
    ) -> Vec<(&str, Option<&'h S>)> {
        let info = self.group_info();
        info.names()
            .map(|(name, _)| (name, self.name(name).or(default)))
            .collect()
    }

    /// Returns the index of the last group to close, or `None` if no
    /// explicit group participated.
    ///
    /// The "last" group is the one that ends furthest to the right. When
    /// several groups end at the same offset, the one with the smallest
    /// index wins. For nested groups, that is the outermost one.
    pub fn lastindex(&self) -> Option<usize> {
        let mut last: Option<(usize, usize)> = None;
        for index in 1..self.group_info().group_len() {
            let end = match self.span_of(index) {
                None => continue,
                Some(span) => span.end,
            };
            if last.map_or(true, |(_, max)| max < end) {
                last = Some((index, end));
            }
        }
        last.map(|(index, _)| index)
    }

    /// Returns the name of the group given by [`Match::lastindex`], if it
    /// has one.
    pub fn lastgroup(&self) -> Option<&str> {
        self.group_info().to_name(self.lastindex()?)
    }

    /// Expands the given template using the groups of this match.
    ///
    /// The template syntax is the same as the one used by
    /// [`Pattern::sub`]. Groups that did not participate expand to empty
    /// text unless the pattern was built with
    /// [`Config::unset_group_empty`](crate::Config::unset_group_empty)
    /// disabled.
    pub fn expand(&self, template: &S) -> Result<S::Owned, TemplateError> {
        let template = Template::new(template, self.group_info())?;
        let mut dst = S::Owned::default();
        template.expand(self, self.pattern.unset_group_empty(), &mut dst)?;
        Ok(dst)
    }

    /// Returns the entire haystack that was searched.
    #[inline]
    pub fn subject(&self) -> &'h S {
        self.haystack
    }

    /// Returns the start of the window the search was given.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the end of the window the search was given.
    #[inline]
    pub fn endpos(&self) -> usize {
        self.endpos
    }

    /// Returns the pattern that produced this match.
    #[inline]
    pub fn pattern(&self) -> &Pattern<S> {
        &self.pattern
    }

    /// Returns the span of the group at `index`, if it exists and is set.
    pub(crate) fn span_of(&self, index: usize) -> Option<Span> {
        let start = (*self.slots.get(index * 2)?)?;
        let end = (*self.slots.get(index * 2 + 1)?)?;
        Some(Span { start, end })
    }

    fn group_info(&self) -> &GroupInfo {
        self.pattern.group_info()
    }

    fn slice(&self, span: Span) -> &'h S {
        self.haystack.slice(span.range())
    }
}

impl<'h, S: Subject + ?Sized> Clone for Match<'h, S> {
    fn clone(&self) -> Match<'h, S> {
        Match {
            pattern: self.pattern.clone(),
            haystack: self.haystack,
            slots: self.slots.clone(),
            pos: self.pos,
            endpos: self.endpos,
        }
    }
}

impl<'h, S: Subject + ?Sized> core::fmt::Debug for Match<'h, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "<Match span=({}, {}), match={:?}>",
            self.start(),
            self.end(),
            Quoted(self.as_subject()),
        )
    }
}

/// A way of naming a capture group: by index (`usize`) or by name (`&str`).
///
/// This trait is sealed.
pub trait GroupKey: private::Sealed {}

impl GroupKey for usize {}
impl<'a> GroupKey for &'a str {}

mod private {
    use crate::{error::MatchError, util::captures::GroupInfo};

    pub enum Resolved<'i> {
        One(usize),
        Any(&'i [usize]),
    }

    pub trait Sealed {
        fn resolve<'i>(
            &self,
            info: &'i GroupInfo,
        ) -> Result<Resolved<'i>, MatchError>;
    }

    impl Sealed for usize {
        fn resolve<'i>(
            &self,
            info: &'i GroupInfo,
        ) -> Result<Resolved<'i>, MatchError> {
            if *self < info.group_len() {
                Ok(Resolved::One(*self))
            } else {
                Err(MatchError::group_index_invalid(*self))
            }
        }
    }

    impl<'a> Sealed for &'a str {
        fn resolve<'i>(
            &self,
            info: &'i GroupInfo,
        ) -> Result<Resolved<'i>, MatchError> {
            match info.to_indices(self) {
                [] => Err(MatchError::group_name_invalid(self)),
                indices => Ok(Resolved::Any(indices)),
            }
        }
    }
}

/// An iterator over all non-overlapping matches in a haystack, reporting
/// resource limit errors.
///
/// This is created by [`Pattern::try_finditer`].
pub struct TryMatches<'h, S: Subject + ?Sized> {
    pattern: Pattern<S>,
    cache: Cache,
    pos: usize,
    it: Searcher<'h, S>,
}

impl<'h, S: Subject + ?Sized> TryMatches<'h, S> {
    pub(crate) fn new(
        pattern: Pattern<S>,
        it: Searcher<'h, S>,
    ) -> TryMatches<'h, S> {
        let pos = it.input().start();
        TryMatches { pattern, cache: Cache::new(), pos, it }
    }
}

impl<'h, S: Subject + ?Sized> Iterator for TryMatches<'h, S> {
    type Item = Result<Match<'h, S>, LibraryError>;

    #[inline]
    fn next(&mut self) -> Option<Result<Match<'h, S>, LibraryError>> {
        let TryMatches { ref pattern, ref mut cache, pos, ref mut it } = *self;
        it.try_advance(|input| pattern.search_with(cache, input, pos))
            .transpose()
    }
}

impl<'h, S: Subject + ?Sized> core::fmt::Debug for TryMatches<'h, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TryMatches")
            .field("pattern", &self.pattern)
            .field("input", self.it.input())
            .finish()
    }
}

/// An iterator over all non-overlapping matches in a haystack.
///
/// This is created by [`Pattern::finditer`].
///
/// # Panics
///
/// The iterator panics if a configured backtracking limit is exceeded. Use
/// [`Pattern::try_finditer`] to handle that case.
#[derive(Debug)]
pub struct Matches<'h, S: Subject + ?Sized>(pub(crate) TryMatches<'h, S>);

impl<'h, S: Subject + ?Sized> Iterator for Matches<'h, S> {
    type Item = Match<'h, S>;

    #[inline]
    fn next(&mut self) -> Option<Match<'h, S>> {
        match self.0.next()? {
            Ok(m) => Some(m),
            Err(err) => panic!(
                "unexpected search error, use try_finditer to handle it: {}",
                err,
            ),
        }
    }
}
