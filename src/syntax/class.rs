/*!
The character class engine.

A [`CharSet`] is a set of codepoints stored as a sorted sequence of
non-overlapping, non-adjacent inclusive ranges. Membership tests are a binary
search over those ranges. The set algebra (union, intersection, difference
and symmetric difference) is implemented with linear merges over both range
sequences.

Case insensitivity is resolved here, at compile time: a class compiled under
`IGNORECASE` is closed over simple case folding before it is negated or
combined with another class, so the VM only ever asks whether a single
codepoint is a member.
*/

use alloc::vec::Vec;

use crate::syntax::unicode;

/// The largest codepoint a text pattern can match.
pub(crate) const MAX_TEXT: u32 = 0x10FFFF;
/// The largest "codepoint" a byte pattern can match. Bytes are Latin-1.
pub(crate) const MAX_BYTE: u32 = 0xFF;

/// A set of codepoints.
#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub(crate) struct CharSet {
    ranges: Vec<(u32, u32)>,
}

impl CharSet {
    /// Create an empty set.
    pub(crate) fn empty() -> CharSet {
        CharSet { ranges: vec![] }
    }

    /// Create a set containing exactly one codepoint.
    pub(crate) fn single(cp: u32) -> CharSet {
        CharSet { ranges: vec![(cp, cp)] }
    }

    /// Create a set from arbitrary (possibly unordered and overlapping)
    /// inclusive ranges. Ranges with `start > end` are ignored.
    pub(crate) fn from_ranges<I>(ranges: I) -> CharSet
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut set = CharSet {
            ranges: ranges.into_iter().filter(|&(s, e)| s <= e).collect(),
        };
        set.canonicalize();
        set
    }

    /// Returns the ranges in this set in ascending order.
    pub(crate) fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// If this set contains exactly one codepoint, return it.
    pub(crate) fn as_single(&self) -> Option<u32> {
        match self.ranges[..] {
            [(s, e)] if s == e => Some(s),
            _ => None,
        }
    }

    /// Returns true if and only if the given codepoint is in this set.
    #[inline]
    pub(crate) fn contains(&self, cp: u32) -> bool {
        self.ranges
            .binary_search_by(|&(s, e)| {
                if e < cp {
                    core::cmp::Ordering::Less
                } else if s > cp {
                    core::cmp::Ordering::Greater
                } else {
                    core::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Add a single range to this set.
    pub(crate) fn push(&mut self, start: u32, end: u32) {
        if start > end {
            return;
        }
        self.ranges.push((start, end));
        self.canonicalize();
    }

    /// Add every codepoint in `other` to this set.
    pub(crate) fn union(&mut self, other: &CharSet) {
        self.ranges.extend_from_slice(&other.ranges);
        self.canonicalize();
    }

    /// Retain only the codepoints in both this set and `other`.
    pub(crate) fn intersect(&mut self, other: &CharSet) {
        let mut result = vec![];
        let (mut a, mut b) = (0, 0);
        while a < self.ranges.len() && b < other.ranges.len() {
            let (s1, e1) = self.ranges[a];
            let (s2, e2) = other.ranges[b];
            let (lo, hi) = (s1.max(s2), e1.min(e2));
            if lo <= hi {
                result.push((lo, hi));
            }
            if e1 < e2 {
                a += 1;
            } else {
                b += 1;
            }
        }
        self.ranges = result;
    }

    /// Remove every codepoint in `other` from this set.
    pub(crate) fn difference(&mut self, other: &CharSet) {
        let mut result = vec![];
        let mut b = 0;
        for &(start, end) in self.ranges.iter() {
            let mut start = start;
            // Skip ranges in 'other' entirely before this one.
            while b < other.ranges.len() && other.ranges[b].1 < start {
                b += 1;
            }
            let mut i = b;
            let mut exhausted = false;
            while i < other.ranges.len() && other.ranges[i].0 <= end {
                let (s2, e2) = other.ranges[i];
                if s2 > start {
                    result.push((start, s2 - 1));
                }
                if e2 >= end {
                    exhausted = true;
                    break;
                }
                start = e2 + 1;
                i += 1;
            }
            if !exhausted {
                result.push((start, end));
            }
        }
        self.ranges = result;
    }

    /// Retain the codepoints in exactly one of this set and `other`.
    pub(crate) fn symmetric_difference(&mut self, other: &CharSet) {
        let mut both = self.clone();
        both.intersect(other);
        self.union(other);
        self.difference(&both);
    }

    /// Replace this set with its complement within `0..=max`.
    pub(crate) fn negate(&mut self, max: u32) {
        let mut result = vec![];
        let mut next = 0u32;
        for &(start, end) in self.ranges.iter() {
            if start > max {
                break;
            }
            if start > next {
                result.push((next, start - 1));
            }
            next = match end.checked_add(1) {
                Some(next) => next,
                None => {
                    self.ranges = result;
                    return;
                }
            };
        }
        if next <= max {
            result.push((next, max));
        }
        self.ranges = result;
    }

    /// Close this set over simple case folding.
    ///
    /// When `unicode` is false, only ASCII letters are folded. This is what
    /// byte patterns and patterns compiled with `ASCII` use.
    pub(crate) fn case_fold(&mut self, unicode: bool) {
        if unicode {
            let folded = unicode::simple_fold(self);
            self.union(&folded);
            return;
        }
        let mut extra = CharSet::empty();
        let lower = (u32::from(b'a'), u32::from(b'z'));
        let upper = (u32::from(b'A'), u32::from(b'Z'));
        for &(start, end) in self.ranges.iter() {
            for &((lo, hi), delta) in [(lower, -32i32), (upper, 32)].iter() {
                let (s, e) = (start.max(lo), end.min(hi));
                if s <= e {
                    let shift = |cp: u32| (cp as i32 + delta) as u32;
                    extra.ranges.push((shift(s), shift(e)));
                }
            }
        }
        extra.canonicalize();
        self.union(&extra);
    }

    /// Sort and merge overlapping or adjacent ranges.
    fn canonicalize(&mut self) {
        if self.ranges.len() <= 1 {
            return;
        }
        self.ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> =
            Vec::with_capacity(self.ranges.len());
        for &(start, end) in self.ranges.iter() {
            if let Some(last) = merged.last_mut() {
                if start <= last.1.saturating_add(1) {
                    last.1 = last.1.max(end);
                    continue;
                }
            }
            merged.push((start, end));
        }
        self.ranges = merged;
    }
}

impl core::fmt::Debug for CharSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let fmt_cp = |cp: u32| match char::from_u32(cp) {
            Some(ch) if !ch.is_control() => alloc::format!("{:?}", ch),
            _ => alloc::format!("\\x{{{:X}}}", cp),
        };
        write!(f, "[")?;
        for (i, &(s, e)) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if s == e {
                write!(f, "{}", fmt_cp(s))?;
            } else {
                write!(f, "{}-{}", fmt_cp(s), fmt_cp(e))?;
            }
        }
        write!(f, "]")
    }
}

/// The set operators that may join operands inside a bracket expression when
/// set operations are enabled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SetOp {
    /// `||`
    Union,
    /// `&&`
    Intersection,
    /// `--`
    Difference,
    /// `~~`
    SymmetricDifference,
}

impl SetOp {
    /// Returns the operator spelled by doubling the given character.
    pub(crate) fn from_char(ch: char) -> Option<SetOp> {
        match ch {
            '|' => Some(SetOp::Union),
            '&' => Some(SetOp::Intersection),
            '-' => Some(SetOp::Difference),
            '~' => Some(SetOp::SymmetricDifference),
            _ => None,
        }
    }

    /// Combine `lhs` with `rhs` in place.
    pub(crate) fn apply(self, lhs: &mut CharSet, rhs: &CharSet) {
        match self {
            SetOp::Union => lhs.union(rhs),
            SetOp::Intersection => lhs.intersect(rhs),
            SetOp::Difference => lhs.difference(rhs),
            SetOp::SymmetricDifference => lhs.symmetric_difference(rhs),
        }
    }
}

/// A POSIX bracket class such as `[:alpha:]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Posix {
    Alnum,
    Alpha,
    Ascii,
    Blank,
    Cntrl,
    Digit,
    Graph,
    Lower,
    Print,
    Punct,
    Space,
    Upper,
    Word,
    Xdigit,
}

impl Posix {
    pub(crate) fn from_name(name: &str) -> Option<Posix> {
        Some(match name {
            "alnum" => Posix::Alnum,
            "alpha" => Posix::Alpha,
            "ascii" => Posix::Ascii,
            "blank" => Posix::Blank,
            "cntrl" => Posix::Cntrl,
            "digit" => Posix::Digit,
            "graph" => Posix::Graph,
            "lower" => Posix::Lower,
            "print" => Posix::Print,
            "punct" => Posix::Punct,
            "space" => Posix::Space,
            "upper" => Posix::Upper,
            "word" => Posix::Word,
            "xdigit" => Posix::Xdigit,
            _ => return None,
        })
    }

    /// Returns the set of codepoints in this class.
    ///
    /// In Unicode mode, the classes with an obvious Unicode counterpart are
    /// widened to it. The rest stay ASCII.
    pub(crate) fn to_set(self, unicode: bool) -> CharSet {
        if unicode {
            let widened = match self {
                Posix::Alnum => Some(unicode::named_set(r"[\p{L}\p{N}]")),
                Posix::Alpha => Some(unicode::named_set(r"\p{L}")),
                Posix::Digit => Some(unicode::named_set(r"\p{Nd}")),
                Posix::Lower => Some(unicode::named_set(r"\p{Ll}")),
                Posix::Upper => Some(unicode::named_set(r"\p{Lu}")),
                Posix::Space => {
                    Some(unicode::named_set(r"[\p{Z}\t\n\x0B\x0C\r]"))
                }
                Posix::Word => Some(unicode::named_set(r"[\p{L}\p{N}_]")),
                _ => None,
            };
            if let Some(set) = widened {
                return set;
            }
        }
        let ascii: &[(u8, u8)] = match self {
            Posix::Alnum => &[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')],
            Posix::Alpha => &[(b'A', b'Z'), (b'a', b'z')],
            Posix::Ascii => &[(0x00, 0x7F)],
            Posix::Blank => &[(b'\t', b'\t'), (b' ', b' ')],
            Posix::Cntrl => &[(0x00, 0x1F), (0x7F, 0x7F)],
            Posix::Digit => &[(b'0', b'9')],
            Posix::Graph => &[(b'!', b'~')],
            Posix::Lower => &[(b'a', b'z')],
            Posix::Print => &[(b' ', b'~')],
            Posix::Punct => &[
                (b'!', b'/'),
                (b':', b'@'),
                (b'[', b'`'),
                (b'{', b'~'),
            ],
            Posix::Space => &[(b'\t', b'\r'), (b' ', b' ')],
            Posix::Upper => &[(b'A', b'Z')],
            Posix::Word => {
                &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')]
            }
            Posix::Xdigit => &[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')],
        };
        ascii_set(ascii)
    }
}

/// The shorthand classes `\d`, `\w`, `\s`, `\h` and `\v`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Perl {
    Digit,
    Word,
    Space,
    HorizontalSpace,
    VerticalSpace,
}

impl Perl {
    pub(crate) fn from_escape(ch: char) -> Option<(Perl, bool)> {
        Some(match ch {
            'd' => (Perl::Digit, false),
            'D' => (Perl::Digit, true),
            'w' => (Perl::Word, false),
            'W' => (Perl::Word, true),
            's' => (Perl::Space, false),
            'S' => (Perl::Space, true),
            'h' => (Perl::HorizontalSpace, false),
            'H' => (Perl::HorizontalSpace, true),
            'v' => (Perl::VerticalSpace, false),
            'V' => (Perl::VerticalSpace, true),
            _ => return None,
        })
    }

    /// Returns the (non-negated) set for this class.
    ///
    /// `unicode` selects the Unicode definitions of `\d`, `\w` and `\s`.
    /// `max` is the largest codepoint the pattern can match, which limits
    /// the horizontal and vertical space classes for byte patterns.
    pub(crate) fn to_set(self, unicode: bool, max: u32) -> CharSet {
        let mut set = match self {
            Perl::Digit if unicode => unicode::named_set(r"\d"),
            Perl::Word if unicode => unicode::named_set(r"\w"),
            Perl::Space if unicode => unicode::named_set(r"\s"),
            Perl::Digit => ascii_set(&[(b'0', b'9')]),
            Perl::Word => ascii_set(&[
                (b'0', b'9'),
                (b'A', b'Z'),
                (b'_', b'_'),
                (b'a', b'z'),
            ]),
            Perl::Space => ascii_set(&[(b'\t', b'\r'), (b' ', b' ')]),
            Perl::HorizontalSpace => CharSet::from_ranges(vec![
                (0x09, 0x09),
                (0x20, 0x20),
                (0xA0, 0xA0),
                (0x1680, 0x1680),
                (0x180E, 0x180E),
                (0x2000, 0x200A),
                (0x202F, 0x202F),
                (0x205F, 0x205F),
                (0x3000, 0x3000),
            ]),
            Perl::VerticalSpace => CharSet::from_ranges(vec![
                (0x0A, 0x0D),
                (0x85, 0x85),
                (0x2028, 0x2029),
            ]),
        };
        set.intersect(&CharSet::from_ranges(vec![(0, max)]));
        set
    }
}

fn ascii_set(ranges: &[(u8, u8)]) -> CharSet {
    CharSet::from_ranges(
        ranges.iter().map(|&(s, e)| (u32::from(s), u32::from(e))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ranges: &[(char, char)]) -> CharSet {
        CharSet::from_ranges(
            ranges.iter().map(|&(s, e)| (u32::from(s), u32::from(e))),
        )
    }

    #[test]
    fn canonical_form() {
        let s = set(&[('d', 'f'), ('a', 'b'), ('c', 'c'), ('x', 'z')]);
        assert_eq!(&[(0x61, 0x66), (0x78, 0x7A)][..], s.ranges());
        assert!(s.contains(u32::from('e')));
        assert!(!s.contains(u32::from('g')));
        assert!(s.contains(u32::from('z')));
    }

    #[test]
    fn algebra() {
        let digits = set(&[('0', '9')]);

        let mut s = digits.clone();
        s.intersect(&set(&[('5', 'z')]));
        assert_eq!(set(&[('5', '9')]), s);

        let mut s = digits.clone();
        s.difference(&set(&[('1', '1'), ('3', '4')]));
        assert_eq!(set(&[('0', '0'), ('2', '2'), ('5', '9')]), s);

        let mut s = digits.clone();
        s.symmetric_difference(&set(&[('5', 'a')]));
        assert_eq!(set(&[('0', '4'), (':', 'a')]), s);

        let mut s = digits.clone();
        s.difference(&digits);
        assert!(s.is_empty());
    }

    #[test]
    fn negation() {
        let mut s = set(&[('\0', 'a'), ('c', 'c')]);
        s.negate(MAX_BYTE);
        assert_eq!(set(&[('b', 'b'), ('d', '\u{FF}')]), s);
        s.negate(MAX_BYTE);
        assert_eq!(set(&[('\0', 'a'), ('c', 'c')]), s);

        let mut s = CharSet::empty();
        s.negate(MAX_TEXT);
        assert_eq!(&[(0, MAX_TEXT)][..], s.ranges());
    }

    #[test]
    fn ascii_folding() {
        let mut s = set(&[('X', 'c')]);
        s.case_fold(false);
        assert!(s.contains(u32::from('x')));
        assert!(s.contains(u32::from('C')));
        assert!(!s.contains(u32::from('d')));
        // U+212A KELVIN SIGN is only folded in Unicode mode.
        assert!(!s.contains(0x212A));
    }

    #[test]
    fn unicode_folding() {
        let mut s = set(&[('k', 'k')]);
        s.case_fold(true);
        assert!(s.contains(u32::from('K')));
        assert!(s.contains(0x212A));

        let mut s = CharSet::single(0xFB05);
        s.case_fold(true);
        assert!(s.contains(0xFB06));
    }

    #[test]
    fn posix() {
        let s = Posix::Punct.to_set(false);
        assert!(s.contains(u32::from('!')));
        assert!(s.contains(u32::from('~')));
        assert!(!s.contains(u32::from('a')));

        assert!(!Posix::Alpha.to_set(false).contains(u32::from('é')));
        assert!(Posix::Alpha.to_set(true).contains(u32::from('é')));
    }

    #[test]
    fn perl() {
        assert!(Perl::Word.to_set(true, MAX_TEXT).contains(u32::from('ж')));
        assert!(!Perl::Word.to_set(false, MAX_TEXT).contains(u32::from('ж')));
        assert!(Perl::Space.to_set(false, MAX_BYTE).contains(0x0B));
        let h = Perl::HorizontalSpace.to_set(false, MAX_BYTE);
        let expected = [(0x09, 0x09), (0x20, 0x20), (0xA0, 0xA0)];
        assert_eq!(&expected[..], h.ranges());
    }
}
