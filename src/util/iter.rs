use crate::{
    error::LibraryError, matches::Match, subject::Subject, util::search::Input,
};

/// A searcher for advancing through all non-overlapping matches in a
/// haystack.
///
/// This searcher encapsulates the logic required for finding all successive
/// non-overlapping matches in a haystack. In theory this would be something
/// like this:
///
/// 1. Setting the start position to `pos`.
/// 2. Execute a search. If no match, end iteration.
/// 3. Report the match and set the start position to the end of the match.
/// 4. Go back to (2).
///
/// Unfortunately, because a pattern may match the empty string, the above
/// logic won't work for all possible patterns. Namely, if an empty match is
/// found, then step (3) would set the start position of the search to the
/// position it was at, and the same empty match would be found forever.
///
/// The rule used here is the one used by Python (since 3.7) and PCRE2: after
/// an empty match at offset `E`, the next search still begins at `E`, but
/// it is not permitted to report another empty match at `E`. A non-empty
/// match beginning at `E` is permitted, as is any match beginning later. So
/// `x*|y` against `y` yields an empty match at `0`, then `y`, then an empty
/// match at `1`. Since the same empty match can never be reported twice, and
/// every non-empty match moves the start position forward, iteration always
/// terminates.
///
/// A `Searcher` is not itself an iterator. Instead, it provides an `advance`
/// routine that accepts a closure executing one search. The public iterators
/// ([`Matches`](crate::Matches) and friends) are built on top of it.
#[derive(Clone)]
pub(crate) struct Searcher<'h, S: ?Sized> {
    /// The search configuration. Its start is moved forward after each
    /// match.
    input: Input<'h, S>,
    /// Set once a search has failed, so that no further searches are run.
    done: bool,
}

impl<'h, S: Subject + ?Sized> core::fmt::Debug for Searcher<'h, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Searcher")
            .field("input", &self.input)
            .field("done", &self.done)
            .finish()
    }
}

impl<'h, S: Subject + ?Sized> Searcher<'h, S> {
    /// Create a new non-overlapping matches searcher.
    pub(crate) fn new(input: Input<'h, S>) -> Searcher<'h, S> {
        Searcher { input, done: false }
    }

    /// Create a searcher that reports no matches at all.
    pub(crate) fn exhausted(input: Input<'h, S>) -> Searcher<'h, S> {
        Searcher { input, done: true }
    }

    /// Return the search configuration the next search will use.
    pub(crate) fn input(&self) -> &Input<'h, S> {
        &self.input
    }

    /// Run the next search and advance past its match.
    ///
    /// The `finder` closure must execute one search with the given input and
    /// honor its "not empty at start" setting.
    #[inline]
    pub(crate) fn try_advance<F>(
        &mut self,
        mut finder: F,
    ) -> Result<Option<Match<'h, S>>, LibraryError>
    where
        F: FnMut(&Input<'h, S>) -> Result<Option<Match<'h, S>>, LibraryError>,
    {
        if self.done {
            return Ok(None);
        }
        let m = match finder(&self.input) {
            Ok(Some(m)) => m,
            Ok(None) => {
                self.done = true;
                return Ok(None);
            }
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        };
        self.input.set_start(m.end());
        self.input.set_not_empty_at_start(m.is_empty());
        Ok(Some(m))
    }
}
