/*!
The bridge to the Unicode data tables in `regex-syntax`.

This crate doesn't carry its own Unicode tables. General categories,
scripts, binary properties, the Perl classes and simple case folding all come
from `regex-syntax`, whose tables are generated from the Unicode Character
Database. This module converts between its class representation and
[`CharSet`].
*/

use alloc::{collections::BTreeMap, format, vec::Vec};
use std::sync::OnceLock;

use regex_syntax::hir::{self, Class, ClassUnicode, ClassUnicodeRange, HirKind};

use crate::syntax::class::{CharSet, MAX_TEXT};

/// Pairs of codepoints that compare equal without case but that simple case
/// folding doesn't relate. They all come from the special casing rules,
/// where both members fold to the same multi-codepoint string.
const SPECIAL_FOLDS: &[(u32, u32)] = &[
    // LATIN SMALL LIGATURE LONG S T / LATIN SMALL LIGATURE ST
    (0xFB05, 0xFB06),
    // GREEK SMALL LETTER IOTA WITH DIALYTIKA AND TONOS
    (0x0390, 0x1FD3),
    // GREEK SMALL LETTER UPSILON WITH DIALYTIKA AND TONOS
    (0x03B0, 0x1FE3),
];

/// Returns the set of `\p{name}`, or `None` if `name` isn't a property,
/// category or script known to the Unicode tables.
///
/// Besides the names `regex-syntax` accepts, this understands a leading `^`
/// (negation) and `L&` or `LC` (aliases for cased letters).
pub(crate) fn property(name: &str) -> Option<CharSet> {
    let (name, negated) = match name.strip_prefix('^') {
        Some(rest) => (rest, true),
        None => (name, false),
    };
    if name == "L&" || name == "LC" {
        let mut set = named_set(r"[\p{Lu}\p{Ll}\p{Lt}]");
        if negated {
            set.negate(MAX_TEXT);
        }
        return Some(set);
    }
    let valid = !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || c == '_'
                || c == ' '
                || c == '-'
                || c == '='
                || c == ':'
        });
    if !valid {
        return None;
    }
    let kind = if negated { 'P' } else { 'p' };
    parse_class(&format!(r"\{}{{{}}}", kind, name))
}

/// Returns the set described by one of this crate's fixed class
/// expressions, such as `\w` or `[\p{L}\p{N}]`.
///
/// # Panics
///
/// This panics if the expression is not a valid class. Only literal
/// expressions written in this crate are passed here.
pub(crate) fn named_set(expr: &str) -> CharSet {
    match parse_class(expr) {
        Some(set) => set,
        None => panic!("invalid built-in class expression {:?}", expr),
    }
}

/// Returns every codepoint that is equivalent, under simple case folding, to
/// some member of `set`. The result includes `set` itself.
pub(crate) fn simple_fold(set: &CharSet) -> CharSet {
    let mut cls = to_class(set);
    cls.case_fold_simple();
    let mut folded = from_class(&cls);
    let mut extra = Vec::new();
    for &(a, b) in SPECIAL_FOLDS {
        if folded.contains(a) {
            extra.push((b, b));
        }
        if folded.contains(b) {
            extra.push((a, a));
        }
    }
    folded.union(&CharSet::from_ranges(extra));
    folded
}

/// Returns the smallest codepoint equivalent to `cp` under simple case
/// folding. Two codepoints fold to each other exactly when their canonical
/// codepoints are equal.
pub(crate) fn fold_canonical(cp: u32) -> u32 {
    static TABLE: OnceLock<Vec<(u32, u32)>> = OnceLock::new();
    let table = TABLE.get_or_init(fold_table);
    match table.binary_search_by_key(&cp, |&(member, _)| member) {
        Ok(i) => table[i].1,
        Err(_) => cp,
    }
}

/// Map every codepoint with at least one other case equivalent to the
/// smallest member of its equivalence class, sorted by codepoint.
///
/// Anything that folds is cased, so only the closure of `\p{Cased}` under
/// folding is visited.
fn fold_table() -> Vec<(u32, u32)> {
    let candidates = simple_fold(&named_set(r"\p{Cased}"));
    let mut canonical = BTreeMap::new();
    for &(start, end) in candidates.ranges() {
        for cp in start..=end {
            if canonical.contains_key(&cp) {
                continue;
            }
            let orbit = simple_fold(&CharSet::single(cp));
            if orbit.as_single().is_some() {
                continue;
            }
            let members = orbit.ranges();
            let least = match members.first() {
                Some(&(least, _)) => least,
                None => continue,
            };
            for &(lo, hi) in members {
                for member in lo..=hi {
                    canonical.insert(member, least);
                }
            }
        }
    }
    canonical.into_iter().collect()
}

/// Returns true when the name is a valid group name in a text pattern: an
/// identifier start character (or `_`) followed by identifier characters.
pub(crate) fn is_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

fn parse_class(expr: &str) -> Option<CharSet> {
    let hir = regex_syntax::ParserBuilder::new().build().parse(expr).ok()?;
    match *hir.kind() {
        HirKind::Class(Class::Unicode(ref cls)) => Some(from_class(cls)),
        HirKind::Literal(hir::Literal::Unicode(ch)) => {
            Some(CharSet::single(u32::from(ch)))
        }
        _ => None,
    }
}

fn from_class(cls: &ClassUnicode) -> CharSet {
    CharSet::from_ranges(
        cls.iter().map(|r| (u32::from(r.start()), u32::from(r.end()))),
    )
}

/// Convert a set into a `regex-syntax` class. Surrogate codepoints can't be
/// represented as `char` and are dropped. They never match anything anyway.
fn to_class(set: &CharSet) -> ClassUnicode {
    let mut ranges = Vec::with_capacity(set.ranges().len());
    for &(start, end) in set.ranges() {
        for &(lo, hi) in [(start, end.min(0xD7FF)), (start.max(0xE000), end)]
            .iter()
        {
            if lo > hi {
                continue;
            }
            let bounds = (char::from_u32(lo), char::from_u32(hi));
            if let (Some(lo), Some(hi)) = bounds {
                ranges.push(ClassUnicodeRange::new(lo, hi));
            }
        }
    }
    ClassUnicode::new(ranges)
}

/// Renders a set of codepoints as a string, for diagnostics in tests.
#[cfg(test)]
fn chars(set: &CharSet) -> alloc::string::String {
    set.ranges()
        .iter()
        .flat_map(|&(s, e)| (s..=e).filter_map(char::from_u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties() {
        let greek = property("Greek").unwrap();
        assert!(greek.contains(u32::from('α')));
        assert!(!greek.contains(u32::from('a')));

        let not_letter = property("^L").unwrap();
        assert!(not_letter.contains(u32::from('1')));
        assert!(!not_letter.contains(u32::from('a')));

        assert!(property("Lu").unwrap().contains(u32::from('Q')));
        let cased = property("L&").unwrap();
        assert!(cased.contains(u32::from('q')));
        assert!(cased.contains(u32::from('Q')));
        assert!(cased.contains(0x01C5));
        assert!(!cased.contains(u32::from('1')));
        assert!(!cased.contains(0x05D0));
        assert!(property("LC") == Some(cased));
        let uncased = property("^L&").unwrap();
        assert!(uncased.contains(u32::from('1')));
        assert!(!uncased.contains(u32::from('q')));
        assert!(property("NotAProperty").is_none());
        assert!(property("L}|.").is_none());
        assert!(property("").is_none());
    }

    #[test]
    fn folding() {
        let folded = simple_fold(&CharSet::single(u32::from('s')));
        assert_eq!("Ssſ", chars(&folded));

        let folded = simple_fold(&CharSet::single(0x1FD3));
        assert!(folded.contains(0x0390));

        // Surrogates are dropped rather than panicking.
        let set = CharSet::from_ranges(vec![(0xD000, 0xE010)]);
        let folded = simple_fold(&set);
        assert!(!folded.contains(0xD900));
    }

    #[test]
    fn canonical_folds() {
        let upper_k = u32::from('K');
        assert_eq!(upper_k, fold_canonical(u32::from('k')));
        assert_eq!(upper_k, fold_canonical(0x212A));
        assert_eq!(u32::from('S'), fold_canonical(0x017F));
        assert_eq!(0x0390, fold_canonical(0x1FD3));
        assert_eq!(fold_canonical(0xFB05), fold_canonical(0xFB06));
        assert_eq!(fold_canonical(0x03C3), fold_canonical(0x03C2));
        assert_eq!(u32::from('1'), fold_canonical(u32::from('1')));
        assert_eq!(0x05D0, fold_canonical(0x05D0));
        assert_ne!(fold_canonical(0xE9), fold_canonical(u32::from('e')));
    }

    #[test]
    fn group_names() {
        assert!(is_group_name("a1"));
        assert!(is_group_name("_"));
        assert!(is_group_name("µ"));
        assert!(is_group_name("名前"));
        assert!(!is_group_name(""));
        assert!(!is_group_name("1a"));
        assert!(!is_group_name("a b"));
        assert!(!is_group_name("a-b"));
    }
}
