/*!
A bounded cache of compiled patterns.

Compiling a pattern is much more expensive than searching with it, so code
that builds patterns from the same source over and over can keep them in a
[`PatternCache`]. The cache is owned by the caller and never grows beyond
the capacity it was created with: when it is full, the least recently used
pattern is evicted.
*/

use alloc::vec::Vec;

use crate::{
    error::PatternError, flags::Flags, pattern::Pattern, subject::Subject,
};

/// A fixed capacity, least recently used cache of compiled patterns keyed by
/// their source and flags.
///
/// # Example
///
/// ```
/// use regex_backtrack::{Flags, PatternCache};
///
/// let mut cache = PatternCache::<str>::new(2);
/// let a = cache.get(r"\d+", Flags::EMPTY)?;
/// let b = cache.get(r"\d+", Flags::EMPTY)?;
/// assert_eq!(1, cache.len());
/// assert!(a.search("x42").is_some());
/// assert_eq!(a.source(), b.source());
///
/// // The same source with different flags is a different pattern.
/// cache.get(r"\d+", Flags::ASCII)?;
/// assert_eq!(2, cache.len());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct PatternCache<S: Subject + ?Sized> {
    /// Ordered by recency, with the most recently used entry last.
    entries: Vec<(Flags, Pattern<S>)>,
    capacity: usize,
}

impl<S: Subject + ?Sized> PatternCache<S> {
    /// Create a new cache holding at most `capacity` patterns.
    ///
    /// A cache with a capacity of zero compiles every pattern it is asked
    /// for and keeps none of them.
    pub fn new(capacity: usize) -> PatternCache<S> {
        PatternCache { entries: Vec::with_capacity(capacity), capacity }
    }

    /// Returns the pattern compiled from `source` with `flags`, compiling
    /// it first if it isn't cached.
    ///
    /// The returned pattern shares its compiled form with the cached one.
    /// Patterns that fail to compile are not cached.
    pub fn get(
        &mut self,
        source: &S,
        flags: Flags,
    ) -> Result<Pattern<S>, PatternError> {
        let found = self.entries.iter().position(|&(f, ref re)| {
            f == flags && re.source().as_bytes() == source.as_bytes()
        });
        if let Some(index) = found {
            let entry = self.entries.remove(index);
            let re = entry.1.clone();
            self.entries.push(entry);
            return Ok(re);
        }
        let re = Pattern::with_flags(source, flags)?;
        if self.capacity == 0 {
            return Ok(re);
        }
        if self.entries.len() >= self.capacity {
            let evicted = self.entries.remove(0);
            log!(log::trace!("evicting {:?} from pattern cache", evicted.1));
            drop(evicted);
        }
        self.entries.push((flags, re.clone()));
        Ok(re)
    }

    /// Returns the number of cached patterns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no patterns are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the largest number of patterns this cache holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Evict every cached pattern.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(cache: &PatternCache<str>) -> Vec<&str> {
        cache.entries.iter().map(|(_, re)| re.source()).collect()
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let mut cache = PatternCache::<str>::new(3);
        for source in &["a", "b", "c"] {
            cache.get(source, Flags::EMPTY).unwrap();
        }
        cache.get("a", Flags::EMPTY).unwrap();
        cache.get("d", Flags::EMPTY).unwrap();
        assert_eq!(vec!["c", "a", "d"], sources(&cache));
        assert_eq!(3, cache.len());
    }

    #[test]
    fn flags_are_part_of_the_key() {
        let mut cache = PatternCache::<str>::new(4);
        let plain = cache.get("a", Flags::EMPTY).unwrap();
        let folded = cache.get("a", Flags::IGNORECASE).unwrap();
        assert_eq!(2, cache.len());
        assert!(plain.search("A").is_none());
        assert!(folded.search("A").is_some());
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache = PatternCache::<str>::new(4);
        assert!(cache.get("(", Flags::EMPTY).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity() {
        let mut cache = PatternCache::<[u8]>::new(0);
        let re = cache.get(b"a+", Flags::EMPTY).unwrap();
        assert_eq!(Some(1..3), re.search(b"baa").map(|m| m.range()));
        assert!(cache.is_empty());
        assert_eq!(0, cache.capacity());
    }

    #[test]
    fn clear() {
        let mut cache = PatternCache::<str>::new(2);
        cache.get("a", Flags::EMPTY).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
