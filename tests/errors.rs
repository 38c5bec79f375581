use bstr::B;
use regex_backtrack::{
    self as re, bytes, Builder, Config, ErrorKind, Flags, Regex,
};

use crate::pat;

fn pattern_error(source: &str) -> String {
    match Regex::new(source) {
        Ok(_) => panic!("{:?} compiled but should have failed", source),
        Err(err) => err.to_string(),
    }
}

#[test]
fn pattern_errors_describe_the_problem() {
    let cases = [
        ("(a", "missing closing parenthesis"),
        ("a)", "unbalanced closing parenthesis"),
        ("[a", "missing terminating ]"),
        ("[b-a]", "out of order"),
        ("x{2,1}", "min repeat 2 is greater than max repeat 1"),
        ("*", "nothing to repeat"),
        ("x**", "multiple repeat"),
        ("(?z)", "unknown inline flag 'z'"),
        ("(?P<a>x)(?P<a>y)", "redefinition of group name 'a'"),
        ("(?P<1a>x)", "bad character in group name '1a'"),
        ("(?P=nope)", "unknown group name 'nope'"),
        (r"(a)\2", "reference to non-existent group 2"),
        ("(?<=a+)b", "not fixed width"),
        ("\\", "backslash at end of pattern"),
        (r"\q", r"bad escape \q"),
        ("(?au)x", "ASCII and UNICODE flags are incompatible"),
        ("()(?(1)a|b|c)", "more than two branches"),
    ];
    for &(source, message) in &cases {
        let err = pattern_error(source);
        assert!(err.contains(message), "{:?}: {:?}", source, err);
    }
}

#[test]
fn pattern_error_offsets() {
    let err = Regex::new("ab)").unwrap_err();
    assert_eq!(2, err.offset());
    let err = Regex::new(r"ab\q").unwrap_err();
    assert_eq!(2, err.offset());
}

#[test]
fn nothing_to_repeat() {
    for reps in &["*", "+", "?", "{1,2}"] {
        for lazy in &["", "?"] {
            let source = format!("{}{}", reps, lazy);
            assert!(Regex::new(&source).is_err(), "{:?}", source);
            let source = format!("(?:{}{})", reps, lazy);
            assert!(Regex::new(&source).is_err(), "{:?}", source);
        }
    }
}

#[test]
fn multiple_repeat() {
    let reps = ["*", "+", "?", "{1,2}"];
    let mods = ["", "?", "+"];
    for outer in &reps {
        for outer_mod in &mods {
            for inner in &reps {
                for inner_mod in &mods {
                    // x*? and x++ are a single lazy or possessive repeat.
                    let joined = format!("{}{}", inner_mod, outer);
                    if joined == "?" || joined == "+" {
                        continue;
                    }
                    let source = format!(
                        "x{}{}{}{}",
                        inner, inner_mod, outer, outer_mod
                    );
                    assert!(Regex::new(&source).is_err(), "{:?}", source);
                }
            }
        }
    }
}

#[test]
fn flag_errors() {
    for source in &[
        "(?-", "(?-+", "(?-z", "(?-i", "(?-i+", "(?-iz", "(?i:", "(?i",
        "(?i+", "(?iz", "(?au)x",
    ] {
        assert!(Regex::new(source).is_err(), "{:?}", source);
    }
    assert!(bytes::Regex::new(B(r"(?u)\w")).is_err());
    assert!(bytes::Regex::new(B(r"(?aL:a)")).is_err());
    assert!(Regex::with_flags(r"(?u)\w", Flags::ASCII).is_err());
    assert!(bytes::Regex::with_flags(B("a"), Flags::UNICODE).is_err());
    assert!(bytes::Regex::new(B(r"\p{L}")).is_err());
}

#[test]
fn conditional_errors() {
    let sources = [
        r"(?P<a>)(?(0)a|b)",
        r"()(?(+1)a|b)",
        r"()(?( 1 )a|b)",
        r"()(?(1",
        r"()(?(1)a",
        r"()(?(1)a|b",
        r"()(?(1)a|b|c",
        r"()(?(1)a|b|c)",
        r"()(?(2)a)",
    ];
    for source in &sources {
        assert!(Regex::new(source).is_err(), "{:?}", source);
    }
    let ten = "()".repeat(10);
    assert!(Regex::new(&format!("{}(?(1_0)a|b)", ten)).is_err());
    for i in 0..=255u8 {
        let source = format!(r"()(?(1)\x{:02x}?)", i);
        assert!(Regex::new(&source).is_ok(), "{:?}", source);
    }
}

#[test]
fn class_errors() {
    for source in &["[", "[]", "[a-", r"[\w-b]", r"[a-\w]", "[[:nope:]]"] {
        assert!(Regex::new(source).is_err(), "{:?}", source);
    }
    for c in "cijlmopqyzABCFIJLMOPTYZ".chars() {
        let source = format!(r"[\{}]", c);
        assert!(Regex::new(&source).is_err(), "{:?}", source);
    }
    for c in "cijlmopqyCFIJLMOPTY".chars() {
        let source = format!(r"\{}", c);
        assert!(Regex::new(&source).is_err(), "{:?}", source);
    }
}

#[test]
fn set_operator_errors() {
    let ops = Flags::CLASS_SET_OPERATIONS;
    assert!(Regex::with_flags("[a&&||b]", ops).is_err());
    assert!(Regex::with_flags("[a--&&b]", ops).is_err());
    // Without set operations, the operators are ordinary characters. So
    // `a--` is a range running backwards.
    assert!(Regex::new("[a&&||b]").is_ok());
    let err = Regex::new("[a--&&b]").unwrap_err();
    assert!(err.to_string().contains("out of order"), "{}", err);
}

#[test]
fn nest_limit() {
    let deep = format!("{}a{}", "(".repeat(300), ")".repeat(300));
    assert!(Regex::new(&deep).is_err());
    let shallow = format!("{}a{}", "(".repeat(100), ")".repeat(100));
    assert!(Regex::new(&shallow).is_ok());
}

#[test]
fn template_errors() {
    let re = pat("(?P<word>a)");
    let cases = [
        (r"\g<2>", "invalid group reference 2"),
        (r"\2", "invalid group reference 2"),
        (r"\g<nope>", "unknown group name 'nope'"),
        (r"\g<1a>", "bad character in group name '1a'"),
        (r"\g<word", "missing group name terminator"),
        (r"\g", "missing <"),
        ("a\\", "backslash at end of template"),
        (r"\q", r"bad escape \q"),
        (r"\400", r"greater than \377"),
        ("${word", "missing group name terminator"),
        ("$2", "invalid group reference 2"),
    ];
    for &(template, message) in &cases {
        let err = match re.sub(template, "a", 0) {
            Ok(out) => panic!("{:?} expanded to {:?}", template, out),
            Err(err) => err.to_string(),
        };
        assert!(err.contains(message), "{:?}: {:?}", template, err);
    }

    // Templates are checked even when nothing matches.
    assert!(re.sub(r"\g<2>", "zzz", 0).is_err());
    let m = re.search("a").unwrap();
    assert!(m.expand(r"\g<9>").is_err());
}

#[test]
fn match_errors() {
    let re = pat("(?P<first>a)(b)?");
    let m = re.search("a").unwrap();
    assert_eq!(Ok(None), m.group(2));
    let err = m.group(3).unwrap_err();
    assert_eq!("invalid group index 3", err.to_string());
    let err = m.group("second").unwrap_err();
    assert_eq!("invalid group name 'second'", err.to_string());
    assert_eq!(None, m.name("second"));
    assert_eq!(None, m.get(3));
}

#[test]
fn flags_with_compiled_patterns() {
    let compiled = pat("a");
    let err = re::search(&compiled, "a", Flags::IGNORECASE).unwrap_err();
    assert!(err.as_match().is_some());
    assert!(matches!(*err.kind(), ErrorKind::Match(_)));
    assert_eq!(
        "cannot process flags argument with a compiled pattern",
        err.to_string(),
    );
    for result in &[
        re::compile(&compiled, Flags::M).map(|_| ()),
        re::fullmatch(&compiled, "a", Flags::S).map(|_| ()),
        re::split(&compiled, "a", 0, Flags::X).map(|_| ()),
        re::sub(&compiled, "b", "a", 0, Flags::A).map(|_| ()),
    ] {
        assert!(result.as_ref().unwrap_err().as_match().is_some());
    }
    assert!(re::compile(&compiled, Flags::EMPTY).is_ok());
}

#[test]
fn error_kinds() {
    let err = re::search("(", "a", Flags::EMPTY).unwrap_err();
    assert!(err.as_pattern().is_some());
    assert!(err.as_template().is_none());
    assert!(matches!(*err.kind(), ErrorKind::Pattern(_)));

    let err = re::sub("a", r"\9", "a", 0, Flags::EMPTY).unwrap_err();
    assert!(err.as_template().is_some());
    assert!(matches!(*err.kind(), ErrorKind::Template(_)));

    // Errors can be boxed like any other error.
    let boxed: Box<dyn std::error::Error> = Box::new(err);
    assert!(!boxed.to_string().is_empty());
}

#[test]
fn resource_limits() {
    let re = Builder::new()
        .configure(Config::new().backtrack_limit(Some(1000)))
        .build("(x+x+)+y")
        .unwrap();
    let hay = "x".repeat(40);
    let err = re.try_search(&hay).unwrap_err();
    let lib = err.as_library().expect("a library error");
    assert!(lib.to_string().contains("limit of 1000"), "{}", lib);
    assert!(matches!(*err.kind(), ErrorKind::Library(_)));
    assert!(re.try_findall(&hay).is_err());
    assert!(re.try_split(&hay, 0).is_err());

    // Short haystacks fit in the budget.
    assert_eq!(Some((0, 3)), re.search("xxy").map(|m| (m.start(), m.end())));

    let re = Builder::new()
        .configure(Config::new().stack_limit(Some(16)))
        .build("(?:a|b)*c")
        .unwrap();
    let hay = "ab".repeat(100);
    assert!(re.try_fullmatch(&hay).unwrap_err().as_library().is_some());
}

#[test]
#[should_panic(expected = "use the try_ form")]
fn limits_panic_in_infallible_routines() {
    let re = Builder::new()
        .configure(Config::new().backtrack_limit(Some(10)))
        .build("(a|aa)*b")
        .unwrap();
    re.search(&"a".repeat(30));
}
