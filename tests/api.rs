use std::sync::Arc;

use bstr::B;
use regex_backtrack::{
    bytes, Anchored, Builder, Config, Flags, Input, PatternCache, Regex,
};

use crate::{pat, span, texts, Result};

#[test]
fn match_spans() {
    let re = pat(r"(a)(b)?(?P<c>c)");
    let m = re.search("xxac").unwrap();
    assert_eq!(2, m.start());
    assert_eq!(4, m.end());
    assert_eq!(2..4, m.range());
    assert_eq!(2..4, m.span());
    assert_eq!(2, m.len());
    assert!(!m.is_empty());
    assert_eq!("ac", m.as_subject());

    assert_eq!(Ok(Some((2..3).into())), m.group_span(1));
    assert_eq!(Ok(None), m.group_span(2));
    assert_eq!(Ok(Some((3..4).into())), m.group_span("c"));
    assert!(m.group_span(4).is_err());

    let m = pat("x*").search("abc").unwrap();
    assert!(m.is_empty());
    assert_eq!(0, m.len());
}

#[test]
fn match_groups() {
    let re = pat(r"(?P<first>\w)(?P<second>\d)?(\w)?");
    let m = re.search("a").unwrap();
    assert_eq!(Ok(Some("a")), m.group(0));
    assert_eq!(Ok(Some("a")), m.group("first"));
    assert_eq!(Ok(None), m.group("second"));
    assert_eq!(Some("a"), m.get(1));
    assert_eq!(None, m.get(2));
    assert_eq!(vec![Some("a"), None, None], m.groups(None));
    assert_eq!(vec![Some("a"), Some("-"), Some("-")], m.groups(Some("-")));
    assert_eq!(
        vec![("first", Some("a")), ("second", None)],
        m.groupdict(None),
    );
    assert_eq!(
        vec![("first", Some("a")), ("second", Some(""))],
        m.groupdict(Some("")),
    );
}

#[test]
fn match_metadata() {
    let re = pat(r"(?P<word>\w+)");
    let hay = "  hello world";
    let m = re.search_at(hay, 1, 9).unwrap();
    assert_eq!(hay, m.subject());
    assert_eq!(1, m.pos());
    assert_eq!(9, m.endpos());
    assert_eq!("hello", m.as_subject());
    assert_eq!(re.source(), m.pattern().source());
    assert_eq!(Some(1), m.lastindex());
    assert_eq!(Some("word"), m.lastgroup());

    let m = re.search(hay).unwrap();
    assert_eq!(0, m.pos());
    assert_eq!(hay.len(), m.endpos());

    let m = pat("a").search("a").unwrap();
    assert_eq!(None, m.lastindex());
    assert_eq!(None, m.lastgroup());

    // Cloned matches are independent of the original.
    let copy = m.clone();
    drop(m);
    assert_eq!("a", copy.as_subject());
}

#[test]
fn pattern_metadata() {
    let re = pat(r"(?P<a>x)(y)(?P<b>z)");
    assert_eq!(r"(?P<a>x)(y)(?P<b>z)", re.source());
    assert_eq!(3, re.groups());
    assert_eq!(vec![("a", 1), ("b", 3)], re.groupindex().collect::<Vec<_>>());
    assert_eq!(Some(3), re.group_info().to_index("b"));
    assert_eq!(None, re.group_info().to_name(2));

    assert_eq!(Flags::UNICODE, pat("a").flags());
    let re = Regex::with_flags("a", Flags::A).unwrap();
    assert_eq!(Flags::ASCII, re.flags());
    let re = Regex::with_flags("a", Flags::I | Flags::M).unwrap();
    assert_eq!(Flags::I | Flags::M | Flags::U, re.flags());
    assert_eq!(Flags::EMPTY, bytes::Regex::new(B("a")).unwrap().flags());
}

#[test]
fn duplicate_names() -> Result<()> {
    assert!(Regex::new("(?P<x>a)|(?P<x>b)").is_err());
    let re = Regex::builder()
        .configure(Config::new().allow_duplicate_names(true))
        .build("(?P<x>a)|(?P<x>b)")?;
    assert_eq!(2, re.groups());
    assert_eq!(vec![("x", 1)], re.groupindex().collect::<Vec<_>>());
    assert_eq!(&[1, 2], re.group_info().to_indices("x"));

    let m = re.search("b").unwrap();
    assert_eq!(Some("b"), m.name("x"));
    assert_eq!(Ok(Some((0..1).into())), m.group_span("x"));
    assert_eq!("<b>", m.expand(r"<\g<x>>")?);
    Ok(())
}

#[test]
fn config_and_builder() -> Result<()> {
    let config = Config::new();
    assert_eq!(Flags::EMPTY, config.get_flags());
    assert!(!config.get_allow_duplicate_names());
    assert_eq!(None, config.get_backtrack_limit());
    assert_eq!(None, config.get_stack_limit());
    assert!(config.get_prefilter());
    assert!(config.get_unset_group_empty());

    let mut builder = Builder::new();
    builder
        .configure(Config::new().backtrack_limit(Some(5000)).prefilter(false))
        .flags(Flags::IGNORECASE);
    // Options that aren't set don't undo earlier ones.
    builder.configure(Config::new().stack_limit(Some(100)));
    let re = builder.build("abc")?;
    let config = re.get_config();
    assert_eq!(Some(5000), config.get_backtrack_limit());
    assert_eq!(Some(100), config.get_stack_limit());
    assert!(!config.get_prefilter());
    assert_eq!(Flags::IGNORECASE, config.get_flags());
    assert_eq!(Some((1, 4)), span(re.search("xABC")));

    // One builder can build patterns over both kinds of haystack.
    let re = builder.build(B("abc"))?;
    assert_eq!(Some((0, 3)), span(re.search(B("ABC"))));
    Ok(())
}

#[test]
fn prefilter_does_not_change_results() -> Result<()> {
    let hays = ["", "abc", "xxabcabc", "ab ab abc", "\u{e9}abc\u{e9}"];
    for source in &["abc", "abc|abd", r"ab\w", "(?i)abc", r"\babc"] {
        let with = Regex::new(source)?;
        let without = Regex::builder()
            .configure(Regex::config().prefilter(false))
            .build(*source)?;
        for hay in &hays {
            assert_eq!(texts(&with, hay), texts(&without, hay), "{}", source);
        }
    }
    Ok(())
}

#[test]
fn windows() {
    let re = pat(r"\w+");
    let hay = "one two three";
    assert_eq!(Some((4, 7)), span(re.search_at(hay, 3, 100)));
    assert_eq!(Some((5, 7)), span(re.search_at(hay, 5, 100)));
    assert_eq!(Some((4, 6)), span(re.search_at(hay, 3, 6)));
    assert_eq!(None, span(re.search_at(hay, 8, 4)));
    assert_eq!(None, span(re.search_at(hay, 100, 200)));

    // The window truncates the haystack, so `$` matches at `endpos`.
    let re = pat("o$");
    assert_eq!(Some((2, 3)), span(re.search_at("foobar", 0, 3)));
    assert_eq!(None, span(re.search("foobar")));

    // But `pos` is only where searching begins: `^` still means the start
    // of the haystack.
    let re = pat("^b");
    assert_eq!(None, span(re.search_at("ab", 1, 2)));
    let re = pat(r"(?<=a)b");
    assert_eq!(Some((1, 2)), span(re.search_at("ab", 1, 2)));

    let re = pat(r"\d+");
    assert_eq!(Some((2, 4)), span(re.prefix_match_at("ab12", 2, 4)));
    assert_eq!(None, span(re.prefix_match_at("ab12", 1, 4)));
    assert_eq!(Some((2, 3)), span(re.fullmatch_at("ab12", 2, 3)));
    assert_eq!(None, span(re.fullmatch_at("ab12x", 2, 5)));
    assert_eq!(vec![vec!["2"]], re.findall_at("1a2b3", 1, 3));
}

#[test]
fn search_input() {
    let re = pat(r"\d+");
    let input = Input::new("a12 345").range(1..);
    assert_eq!(Some((1, 3)), span(re.search_input(&input)));

    let input = Input::new("a12 345").range(2..).anchored(Anchored::Start);
    assert_eq!(Some((2, 3)), span(re.search_input(&input)));

    let input = Input::new("a12 345").range(..2).anchored(Anchored::Full);
    assert_eq!(None, span(re.search_input(&input)));
    let input = Input::new("a12 345").range(4..).anchored(Anchored::Full);
    assert_eq!(Some((4, 7)), span(re.search_input(&input)));

    let input = Input::new("a12").range(1..2);
    assert_eq!(1, input.start());
    assert_eq!(2, input.end());
    assert_eq!(1..2, input.get_span());
    assert_eq!(Anchored::No, input.get_anchored());
    assert!(!input.get_anchored().is_anchored());
    assert_eq!("a12", input.haystack());

    // Windows that split a character are moved to character boundaries.
    let input = Input::new("\u{2603}x").range(1..4);
    assert_eq!(3..4, input.get_span());
}

#[test]
fn iterators() -> Result<()> {
    let re = pat(r"\d");
    let mut it = re.finditer("a1b2");
    assert_eq!(Some((1, 2)), span(it.next()));
    assert_eq!(Some((3, 4)), span(it.next()));
    assert_eq!(None, span(it.next()));
    assert_eq!(None, span(it.next()));

    let found = re
        .try_finditer("1 2 3")
        .map(|result| result.map(|m| m.start()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    assert_eq!(vec![0, 2, 4], found);

    let found: Vec<_> = re
        .try_finditer_at("1 2 3", 1, 4)
        .map(|r| r.unwrap().start())
        .collect();
    assert_eq!(vec![2], found);

    // An inverted window yields nothing.
    assert_eq!(0, re.finditer_at("1 2 3", 4, 1).count());

    // Matches found by iteration report the window they were found in.
    let m = re.finditer_at("1 2 3", 1, 4).next().unwrap();
    assert_eq!((1, 4), (m.pos(), m.endpos()));
    Ok(())
}

#[test]
fn try_finditer_stops_after_an_error() {
    let re = Regex::builder()
        .configure(Config::new().backtrack_limit(Some(50)))
        .build("(?:a|aa)*b|c")
        .unwrap();
    let hay = format!("c{}c", "a".repeat(30));
    let results: Vec<_> = re.try_finditer(&hay).collect();
    assert_eq!(2, results.len());
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn pattern_cache() -> Result<()> {
    let mut cache = PatternCache::<str>::new(2);
    assert!(cache.is_empty());
    assert_eq!(2, cache.capacity());

    let a = cache.get("a", Flags::EMPTY)?;
    cache.get("b", Flags::EMPTY)?;
    assert_eq!(2, cache.len());
    // Touching "a" makes "b" the least recently used.
    cache.get("a", Flags::EMPTY)?;
    cache.get("c", Flags::EMPTY)?;
    assert_eq!(2, cache.len());
    assert_eq!("a", a.source());

    assert!(cache.get("(", Flags::EMPTY).is_err());
    assert_eq!(2, cache.len());

    let upper = cache.get("a", Flags::IGNORECASE)?;
    assert!(upper.search("A").is_some());
    assert!(cache.get("a", Flags::EMPTY)?.search("A").is_none());

    cache.clear();
    assert!(cache.is_empty());

    let mut none = PatternCache::<[u8]>::new(0);
    assert!(none.get(B("a"), Flags::EMPTY)?.search(B("a")).is_some());
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn debug_output() {
    let re = pat(r#"a"\d"#);
    assert_eq!(
        r#"Pattern("a\"\\d", Flags(UNICODE))"#,
        format!("{:?}", re),
    );
    let m = re.search(r#"xa"1"#).unwrap();
    assert_eq!(r#"<Match span=(1, 4), match="a\"1">"#, format!("{:?}", m));

    let re = bytes::Regex::with_flags(B("(?s)."), Flags::I).unwrap();
    assert_eq!(
        r#"Pattern(b"(?s).", Flags(IGNORECASE))"#,
        format!("{:?}", re),
    );
    let m = re.search(&b"\xff"[..]).unwrap();
    assert_eq!(r#"<Match span=(0, 1), match=b"\xff">"#, format!("{:?}", m));

    assert_eq!("Flags(EMPTY)", format!("{:?}", Flags::EMPTY));
    assert_eq!(
        "Flags(IGNORECASE | MULTILINE)",
        format!("{:?}", Flags::M | Flags::I),
    );
}

#[test]
fn bytes_patterns() -> Result<()> {
    let re = bytes::Regex::new(B(r"(\w+)=([^;]*)"))?;
    let hay = &b"k1=\xff\xfe;k2=v"[..];
    let found = re.findall(hay);
    assert_eq!(
        vec![vec![B("k1"), &b"\xff\xfe"[..]], vec![B("k2"), B("v")]],
        found,
    );
    let parts = re.split(hay, 1);
    assert_eq!(4, parts.len());
    assert_eq!(Some(B("")), parts[0]);
    assert_eq!(Some(B("k1")), parts[1]);
    assert_eq!(Some(&b"\xff\xfe"[..]), parts[2]);
    assert_eq!(Some(B(";k2=v")), parts[3]);

    // Byte patterns are ASCII only.
    assert!(bytes::Regex::new(B(r"\w"))?.search(&b"\xe9"[..]).is_none());
    // And each byte is a character, so `.` matches half of a UTF-8 sequence.
    let m = bytes::Regex::new(B("."))?.search("\u{e9}".as_bytes()).unwrap();
    assert_eq!(1, m.len());
    Ok(())
}

#[test]
fn text_matches_whole_characters() {
    let re = pat(".");
    let hay = "\u{e9}\u{2603}\u{1f600}";
    assert_eq!(vec!["\u{e9}", "\u{2603}", "\u{1f600}"], texts(&re, hay));
    let re = pat("");
    let starts: Vec<usize> = re.finditer("é☃").map(|m| m.start()).collect();
    assert_eq!(vec![0, 2, 5], starts);
}

#[test]
fn patterns_are_shared_across_threads() {
    let re = Arc::new(pat(r"(\w+)-(\d+)"));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let re = Arc::clone(&re);
            std::thread::spawn(move || {
                let hay = format!("item-{} other-{}", i, i * 10);
                let found: Vec<String> = re
                    .findall(&hay)
                    .into_iter()
                    .map(|groups| groups[1].to_string())
                    .collect();
                found
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let found = handle.join().unwrap();
        assert_eq!(vec![i.to_string(), (i * 10).to_string()], found);
    }

    // A clone shares the compiled pattern.
    let copy = (*re).clone();
    assert_eq!(re.source(), copy.source());
    assert!(copy.search("a-1").is_some());
}
