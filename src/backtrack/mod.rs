/*!
A backtracking regex engine.

A [`Backtracker`] is a compiled [`Program`] along with an optional literal
prefilter and the limits that bound a single search. It executes a search by
trying each candidate starting position in turn, exploring the alternatives
of the program depth first in priority order. So the first match found is
the match a Perl-style engine reports: leftmost, and among matches starting
at the same position, the one preferred by greedy, lazy and alternation
priorities.

Unlike a finite automata engine, a backtracker is not guaranteed to
run in linear time. That is the price for backreferences, lookaround,
atomic groups and possessive repetitions. To keep a pathological pattern
from running forever (or exhausting memory), a backtracker can be configured
with a limit on the number of backtracking steps and on the depth of its
backtracking stack. Exceeding either one aborts the search with a
[`LibraryError`](crate::LibraryError).
*/

pub(crate) use self::vm::Cache;

use crate::{
    backtrack::program::Program,
    syntax::parse::Ast,
    util::prefilter::Prefilter,
};

pub(crate) mod program;
mod vm;

/// A compiled pattern ready for searching.
#[derive(Clone, Debug)]
pub(crate) struct Backtracker {
    program: Program,
    prefilter: Option<Prefilter>,
    backtrack_limit: Option<usize>,
    stack_limit: Option<usize>,
}

/// The knobs for building a [`Backtracker`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct Config {
    pub(crate) prefilter: bool,
    pub(crate) backtrack_limit: Option<usize>,
    pub(crate) stack_limit: Option<usize>,
}

impl Backtracker {
    /// Compile a parsed pattern. `text` says whether haystacks will be
    /// UTF-8 text or bytes.
    pub(crate) fn new(ast: &Ast, text: bool, config: &Config) -> Backtracker {
        let program = Program::new(ast, text);
        let prefilter = if config.prefilter && !program.anchored_start {
            Prefilter::new(&program.prefix)
        } else {
            None
        };
        Backtracker {
            program,
            prefilter,
            backtrack_limit: config.backtrack_limit,
            stack_limit: config.stack_limit,
        }
    }

    /// The number of capture slots a search writes.
    pub(crate) fn slot_len(&self) -> usize {
        self.program.slot_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LibraryError,
        flags::Flags,
        syntax::parse::{self, parse},
        util::search::Anchored,
    };

    const DEFAULT: Config =
        Config { prefilter: true, backtrack_limit: None, stack_limit: None };

    fn build(pattern: &str, flags: Flags, config: &Config) -> Backtracker {
        let pconfig = parse::Config {
            flags,
            allow_duplicate_names: false,
            nest_limit: 250,
        };
        Backtracker::new(&parse(pattern, &pconfig).unwrap(), true, config)
    }

    fn try_find(
        bt: &Backtracker,
        haystack: &str,
        anchored: Anchored,
    ) -> Result<Option<Vec<Option<(usize, usize)>>>, LibraryError> {
        let mut cache = Cache::new();
        let mut slots = vec![None; bt.slot_len()];
        let found = bt.search(
            &mut cache,
            haystack.as_bytes(),
            0,
            anchored,
            false,
            &mut slots,
        )?;
        if !found {
            return Ok(None);
        }
        let groups = slots
            .chunks(2)
            .map(|pair| match (pair[0], pair[1]) {
                (Some(s), Some(e)) => Some((s, e)),
                _ => None,
            })
            .collect();
        Ok(Some(groups))
    }

    /// Returns the spans of every group of the first match.
    fn find(
        pattern: &str,
        haystack: &str,
    ) -> Option<Vec<Option<(usize, usize)>>> {
        let bt = build(pattern, Flags::EMPTY, &DEFAULT);
        try_find(&bt, haystack, Anchored::No).unwrap()
    }

    fn span(pattern: &str, haystack: &str) -> Option<(usize, usize)> {
        find(pattern, haystack).and_then(|groups| groups[0])
    }

    #[test]
    fn priorities() {
        assert_eq!(Some((0, 3)), span("a*", "aaab"));
        assert_eq!(Some((0, 0)), span("a*?", "aaab"));
        assert_eq!(Some((0, 1)), span("a|ab", "abc"));
        assert_eq!(Some((0, 2)), span("ab|a", "abc"));
        assert_eq!(Some((1, 3)), span("b+", "abbc"));
        assert_eq!(Some((0, 5)), span("a.*c", "abcbc"));
        assert_eq!(Some((0, 2)), span("a.*?c", "abcbc"));
        assert_eq!(Some((0, 3)), span("(?:ab)+?c", "abc"));
        assert_eq!(None, span("x", "abc"));
    }

    #[test]
    fn counted_repetitions() {
        assert_eq!(Some((0, 3)), span("a{2,3}", "aaaa"));
        assert_eq!(Some((0, 2)), span("a{2,3}?", "aaaa"));
        assert_eq!(Some((0, 4)), span("(?:ab){1,2}", "ababab"));
        assert_eq!(Some((0, 2)), span("(?:ab){1,2}?", "ababab"));
        assert_eq!(None, span("(?:ab){3}", "abab"));
        assert_eq!(Some((0, 0)), span("a{0}", "aaa"));
    }

    #[test]
    fn possessive_and_atomic() {
        assert_eq!(None, span("a*+a", "aaaa"));
        assert_eq!(Some((0, 4)), span("a*a", "aaaa"));
        assert_eq!(None, span("(?>a+)a", "aaa"));
        assert_eq!(Some((0, 3)), span("(?>a|ab)c|abc", "abc"));
        assert_eq!(None, span("(?:ab)++ab", "ababab"));
        assert_eq!(Some((0, 6)), span("(?:ab)+ab", "ababab"));
    }

    #[test]
    fn captures() {
        let groups = find("(a)(b|c)*", "abcb").unwrap();
        assert_eq!(vec![Some((0, 4)), Some((0, 1)), Some((3, 4))], groups);

        // A group in a failed branch isn't set.
        let groups = find("(a)x|(a)y", "ay").unwrap();
        assert_eq!(vec![Some((0, 2)), None, Some((0, 1))], groups);

        // A group keeps its last complete iteration.
        let groups = find("(?:(a)|b)*", "ab").unwrap();
        assert_eq!(vec![Some((0, 2)), Some((0, 1))], groups);
    }

    #[test]
    fn empty_iterations_terminate() {
        assert_eq!(Some((0, 0)), span("(?:)*", "abc"));
        assert_eq!(Some((0, 3)), span("(?:a|)*", "aaa"));
        assert_eq!(Some((0, 2)), span("(?:a?)+b", "ab"));
        let groups = find("(a*)*", "b").unwrap();
        assert_eq!(vec![Some((0, 0)), Some((0, 0))], groups);
    }

    #[test]
    fn long_repetition_uses_no_recursion() {
        let haystack = "x".repeat(50_000);
        let groups = find("(x)*", &haystack).unwrap();
        assert_eq!(Some((0, 50_000)), groups[0]);
        assert_eq!(Some((49_999, 50_000)), groups[1]);
    }

    #[test]
    fn backreferences() {
        assert_eq!(Some((0, 6)), span(r"(abc)\1", "abcabc"));
        assert_eq!(None, span(r"(abc)\1", "abcABC"));
        assert_eq!(Some((1, 3)), span(r"(\w)\1", "abbc"));
        // A reference to an unset group fails.
        assert_eq!(None, span(r"(a)?b\1", "b"));
        assert_eq!(Some((0, 1)), span(r"(a)|b\1|b", "ba"));

        let bt = build(r"(abc)\1", Flags::IGNORECASE, &DEFAULT);
        let groups = try_find(&bt, "abcABC", Anchored::No).unwrap().unwrap();
        assert_eq!(Some((0, 6)), groups[0]);

        let bt = build(r"(\w)\1", Flags::IGNORECASE, &DEFAULT);
        let groups = try_find(&bt, "ǅǆ", Anchored::No).unwrap().unwrap();
        assert_eq!(Some((0, 4)), groups[0]);
    }

    #[test]
    fn lookarounds() {
        assert_eq!(Some((0, 1)), span("a(?=b)", "ab"));
        assert_eq!(None, span("a(?=b)", "ac"));
        assert_eq!(Some((0, 1)), span("a(?!b)", "ac"));
        assert_eq!(Some((2, 3)), span("a(?!b)", "abac"));
        assert_eq!(Some((1, 2)), span("(?<=a)b", "ab"));
        assert_eq!(None, span("(?<!a)b", "ab"));
        assert_eq!(Some((3, 4)), span("(?<!a)b", "abcb"));
        assert_eq!(Some((3, 4)), span("(?<=ab|c)d", "abcd"));
        assert_eq!(Some((4, 5)), span("(?<=a.{1,3})e", "abcde"));
        assert_eq!(None, span("(?<=a.{1,2})e", "abcde"));

        // Captures made inside a positive lookahead survive it.
        let groups = find("(?=(a+))a", "aaa").unwrap();
        assert_eq!(vec![Some((0, 1)), Some((0, 3))], groups);
        // Lookarounds are atomic.
        assert_eq!(Some((3, 6)), span(r"(?=(a+))a*b\1", "baaabac"));
        assert_eq!(Some((3, 4)), span(r"(?=(a+?))\1", "bcdaa"));
    }

    #[test]
    fn conditionals() {
        assert_eq!(Some((0, 3)), span(r"(<)?a(?(1)>|b)", "<a>"));
        assert_eq!(Some((0, 2)), span(r"(<)?a(?(1)>|b)", "ab"));
        assert_eq!(Some((1, 3)), span(r"(<)?a(?(1)>|b)", "<ab"));
        assert_eq!(Some((0, 0)), span(r"(a)?(?(1)b)", "a"));
    }

    #[test]
    fn anchoring() {
        let bt = build("b", Flags::EMPTY, &DEFAULT);
        assert!(try_find(&bt, "ab", Anchored::Start).unwrap().is_none());
        assert!(try_find(&bt, "ba", Anchored::Start).unwrap().is_some());
        assert!(try_find(&bt, "ba", Anchored::Full).unwrap().is_none());

        let bt = build("a*?", Flags::EMPTY, &DEFAULT);
        let groups = try_find(&bt, "aaa", Anchored::Full).unwrap().unwrap();
        assert_eq!(Some((0, 3)), groups[0]);
    }

    #[test]
    fn keep_out() {
        assert_eq!(Some((3, 6)), span(r"foo\Kbar", "foobar"));
    }

    #[test]
    fn limits() {
        let config = Config { backtrack_limit: Some(1_000), ..DEFAULT };
        let bt = build("(?:aa|a)*b", Flags::EMPTY, &config);
        let haystack = "a".repeat(30);
        assert!(try_find(&bt, &haystack, Anchored::No).is_err());

        let config = Config { stack_limit: Some(100), ..DEFAULT };
        let bt = build("(?:ab|b)*c", Flags::EMPTY, &config);
        let haystack = "ab".repeat(500);
        assert!(try_find(&bt, &haystack, Anchored::No).is_err());
        // A search that stays within the limit is unaffected.
        assert!(try_find(&bt, "abbc", Anchored::No).unwrap().is_some());
    }

    #[test]
    fn prefilter_agrees() {
        let without = Config { prefilter: false, ..DEFAULT };
        for &(pattern, haystack) in &[
            ("abc", "xxabcxx"),
            ("ab+", "aaxab"),
            ("☃x", "a☃☃x"),
            ("zz", "xyz"),
        ] {
            let a = build(pattern, Flags::EMPTY, &DEFAULT);
            let b = build(pattern, Flags::EMPTY, &without);
            assert!(a.prefilter.is_some());
            assert!(b.prefilter.is_none());
            assert_eq!(
                try_find(&a, haystack, Anchored::No).unwrap(),
                try_find(&b, haystack, Anchored::No).unwrap(),
            );
        }
    }
}
