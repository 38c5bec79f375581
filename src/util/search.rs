use core::ops::{Range, RangeBounds};

use crate::subject::Subject;

/// The parameters for a search.
///
/// While [`Pattern`](crate::Pattern) exposes convenience routines such as
/// `search` that accept a haystack directly, a search has a few more
/// parameters. This type represents all of them:
///
/// * The search window `(pos, endpos)`. Matching begins no earlier than `pos`
/// and the haystack is treated as if it ended at `endpos`. Text before `pos`
/// is still visible to lookbehind and to `\b`, and `^`/`\A` still refer to the
/// true start of the haystack.
/// * How the match is anchored: anywhere in the window, at its start, or
/// spanning the whole window.
///
/// Both window bounds are clamped to the haystack (and `pos` to `endpos`),
/// so any range is accepted. For text haystacks, a `pos` inside a multi-byte
/// character is moved forward to the next character boundary and an `endpos`
/// inside one is moved back.
///
/// # Example
///
/// ```
/// use regex_backtrack::{Anchored, Input, Regex};
///
/// let re = Regex::new(r"\d+")?;
/// let input = Input::new("a12 345").range(3..).anchored(Anchored::Start);
/// assert_eq!(None, re.search_input(&input).map(|m| m.span()));
///
/// let input = Input::new("a12 345").range(4..6).anchored(Anchored::Start);
/// assert_eq!(Some((4..6).into()), re.search_input(&input).map(|m| m.span()));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Input<'h, S: ?Sized> {
    haystack: &'h S,
    span: Span,
    anchored: Anchored,
    /// When set, an empty match at the start of the window is rejected.
    /// Only the iterators set this, after reporting an empty match.
    not_empty_at_start: bool,
}

impl<'h, S: Subject + ?Sized> Input<'h, S> {
    /// Create a new search configuration for the given haystack, covering
    /// all of it and unanchored.
    #[inline]
    pub fn new(haystack: &'h S) -> Input<'h, S> {
        Input {
            haystack,
            span: Span { start: 0, end: haystack.as_bytes().len() },
            anchored: Anchored::No,
            not_empty_at_start: false,
        }
    }

    /// Set the search window to the given range, clamping both ends.
    ///
    /// Unbounded ends refer to the start and end of the haystack.
    #[inline]
    pub fn range<R: RangeBounds<usize>>(mut self, range: R) -> Input<'h, S> {
        use core::ops::Bound;

        let len = self.haystack.as_bytes().len();
        let start = match range.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&i) => i.saturating_add(1),
            Bound::Excluded(&i) => i,
            Bound::Unbounded => len,
        };
        let end = self.haystack.floor_boundary(end.min(len));
        let start = self.haystack.ceil_boundary(start.min(len)).min(end);
        self.span = Span { start, end };
        self
    }

    /// Set how a match must be anchored within the search window.
    #[inline]
    pub fn anchored(mut self, anchored: Anchored) -> Input<'h, S> {
        self.anchored = anchored;
        self
    }

    /// Returns the haystack, ignoring the window.
    #[inline]
    pub fn haystack(&self) -> &'h S {
        self.haystack
    }

    /// Returns the start of the window (`pos`).
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Returns the end of the window (`endpos`).
    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Returns the window as a span.
    #[inline]
    pub fn get_span(&self) -> Span {
        self.span
    }

    /// Returns the anchor mode of this search.
    #[inline]
    pub fn get_anchored(&self) -> Anchored {
        self.anchored
    }

    /// Move the start of the window without clamping. Callers must give a
    /// character boundary no greater than the end of the window.
    #[inline]
    pub(crate) fn set_start(&mut self, start: usize) {
        debug_assert!(start <= self.span.end);
        self.span.start = start;
    }

    #[inline]
    pub(crate) fn set_not_empty_at_start(&mut self, yes: bool) {
        self.not_empty_at_start = yes;
    }

    #[inline]
    pub(crate) fn get_not_empty_at_start(&self) -> bool {
        self.not_empty_at_start
    }
}

impl<'h, S: Subject + ?Sized> core::fmt::Debug for Input<'h, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Input")
            .field("haystack", &crate::subject::Quoted(self.haystack))
            .field("span", &self.span)
            .field("anchored", &self.anchored)
            .finish()
    }
}

/// How a match must be anchored within the search window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchored {
    /// A match may begin anywhere in the window. This is what `search`
    /// does.
    No,
    /// A match must begin at the start of the window. This is what
    /// `prefix_match` does.
    Start,
    /// A match must begin at the start of the window and end at its end.
    /// This is what `fullmatch` does.
    Full,
}

impl Anchored {
    /// Returns true when the match must begin at the start of the window.
    #[inline]
    pub fn is_anchored(&self) -> bool {
        !matches!(*self, Anchored::No)
    }
}

/// A representation of a span reported by a search.
///
/// This is basically equivalent to a `std::ops::Range<usize>`, except this
/// type implements `Copy` which makes it more ergonomic to use in the context
/// of this crate. Like a range, this implements `Index` for `[u8]` and `str`.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Span {
    /// The start offset of the span, inclusive.
    pub start: usize,
    /// The end offset of the span, exclusive.
    pub end: usize,
}

impl Span {
    /// Returns this span as a range.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        Range::from(*self)
    }

    /// Returns true when this span is empty. That is, when `start >= end`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns the length of this span.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

impl core::fmt::Debug for Span {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl core::ops::Index<Span> for [u8] {
    type Output = [u8];

    #[inline]
    fn index(&self, index: Span) -> &[u8] {
        &self[index.range()]
    }
}

impl core::ops::Index<Span> for str {
    type Output = str;

    #[inline]
    fn index(&self, index: Span) -> &str {
        &self[index.range()]
    }
}

impl From<Range<usize>> for Span {
    #[inline]
    fn from(range: Range<usize>) -> Span {
        Span { start: range.start, end: range.end }
    }
}

impl From<Span> for Range<usize> {
    #[inline]
    fn from(span: Span) -> Range<usize> {
        Range { start: span.start, end: span.end }
    }
}

impl PartialEq<Range<usize>> for Span {
    #[inline]
    fn eq(&self, range: &Range<usize>) -> bool {
        self.start == range.start && self.end == range.end
    }
}

impl PartialEq<Span> for Range<usize> {
    #[inline]
    fn eq(&self, span: &Span) -> bool {
        self.start == span.start && self.end == span.end
    }
}
