/*!
Patterns that search arbitrary bytes.

A byte pattern treats its source and every haystack as a sequence of bytes,
where each byte stands for the codepoint with the same value (`\xFF` is
`ÿ`). Haystacks need not be valid UTF-8, and matches may split a multi-byte
sequence. Byte patterns are always ASCII only: `\w`, `\d`, `\s`, `\b` and
case insensitivity only consider ASCII, and [`Flags::UNICODE`] is an error.

[`Flags::UNICODE`]: crate::Flags::UNICODE

# Example

```
use regex_backtrack::bytes::Regex;

let re = Regex::new(br"(?i)caf\xE9")?;
let m = re.search(b"le CAF\xE9!").unwrap();
assert_eq!(3..7, m.range());
// Only ASCII letters fold, so `\xE9` doesn't match `\xC9`.
assert!(re.search(b"le CAF\xC9!").is_none());

// Invalid UTF-8 is fine.
let re = Regex::new(br"\xFF+")?;
let m = re.search(b"a\xFF\xFFb").unwrap();
assert_eq!(&b"\xFF\xFF"[..], m.as_subject());

# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

use crate::pattern::Pattern;

/// A compiled pattern for searching bytes.
pub type Regex = Pattern<[u8]>;
