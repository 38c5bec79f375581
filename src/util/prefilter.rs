/*!
A literal prefix prefilter.

When every match of a pattern must begin with the same non-empty literal
string, a search can skip straight to the next occurrence of that literal
instead of running the backtracking VM at every starting position. This is
the only accelerator this crate has. It never reports false negatives: the
VM still confirms each candidate, so a candidate that doesn't lead to a match
merely costs one failed attempt.
*/

use memchr::{memchr, memmem};

use crate::util::search::Span;

/// A prefilter for finding the next position at which a match may begin.
#[derive(Clone, Debug)]
pub(crate) struct Prefilter {
    imp: Imp,
}

#[derive(Clone, Debug)]
enum Imp {
    Memchr(u8),
    Memmem(memmem::Finder<'static>),
}

impl Prefilter {
    /// Build a prefilter for the given literal prefix, encoded the same way
    /// as the haystacks it will be used with.
    ///
    /// This returns `None` when the prefix is empty, since every position
    /// would be a candidate.
    pub(crate) fn new(prefix: &[u8]) -> Option<Prefilter> {
        let imp = match prefix.len() {
            0 => {
                log!(log::debug!("prefilter building failed: empty prefix"));
                return None;
            }
            1 => {
                log!(log::debug!("prefilter built: memchr"));
                Imp::Memchr(prefix[0])
            }
            _ => {
                log!(log::debug!("prefilter built: memmem"));
                Imp::Memmem(memmem::Finder::new(prefix).into_owned())
            }
        };
        Some(Prefilter { imp })
    }

    /// Returns the offset of the first occurrence of the prefix that starts
    /// within `span`. The occurrence itself may not extend past the end of
    /// the span.
    #[inline]
    pub(crate) fn find(&self, haystack: &[u8], span: Span) -> Option<usize> {
        let window = &haystack[span];
        let i = match self.imp {
            Imp::Memchr(b) => memchr(b, window)?,
            Imp::Memmem(ref finder) => finder.find(window)?,
        };
        Some(span.start + i)
    }

    /// Returns the length, in bytes, of the literal prefix.
    pub(crate) fn len(&self) -> usize {
        match self.imp {
            Imp::Memchr(_) => 1,
            Imp::Memmem(ref finder) => finder.needle().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prefix_has_no_prefilter() {
        assert!(Prefilter::new(b"").is_none());
    }

    #[test]
    fn single_byte() {
        let pre = Prefilter::new(b"z").unwrap();
        assert_eq!(1, pre.len());
        assert_eq!(Some(3), pre.find(b"abczdz", Span::from(0..6)));
        assert_eq!(Some(5), pre.find(b"abczdz", Span::from(4..6)));
        assert_eq!(None, pre.find(b"abczdz", Span::from(0..3)));
    }

    #[test]
    fn substring() {
        let pre = Prefilter::new("☃b".as_bytes()).unwrap();
        assert_eq!(4, pre.len());
        let haystack = "a☃c☃b".as_bytes();
        assert_eq!(Some(5), pre.find(haystack, Span::from(0..haystack.len())));
        // The occurrence must fit in the window.
        assert_eq!(None, pre.find(haystack, Span::from(0..8)));
    }
}
