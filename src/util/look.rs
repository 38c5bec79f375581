use crate::util::utf8;

/// A zero-width anchor or word boundary assertion.
///
/// Each assertion is evaluated at a position in the haystack, where the
/// haystack has already been truncated at the end of the search window. So
/// `End` matches at the end of the window, while `Start` always refers to
/// the true start of the subject (a window start never moves it).
///
/// Some assertions only look behind the position (`Start`, `StartLine`),
/// some only look ahead (`End`, `EndLine`, `EndOrFinalNewline`) while word
/// boundaries look both ways.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Look {
    /// `\A`, or `^` outside of multi-line mode.
    Start,
    /// `\z` and `\Z`.
    End,
    /// `$` outside of multi-line mode: the end of the haystack, or just
    /// before a `\n` that is the last byte of the haystack.
    EndOrFinalNewline,
    /// `^` in multi-line mode: the start of the haystack, or just after a
    /// `\n` that is not the last byte of the haystack.
    StartLine,
    /// `$` in multi-line mode: the end of the haystack or just before any
    /// `\n`.
    EndLine,
    /// `\b` in ASCII mode.
    WordAscii,
    /// `\B` in ASCII mode.
    WordAsciiNegate,
    /// `\b` in Unicode mode.
    WordUnicode,
    /// `\B` in Unicode mode.
    WordUnicodeNegate,
}

impl Look {
    /// Returns true when this assertion can only ever match at position `0`.
    pub(crate) fn is_start(self) -> bool {
        self == Look::Start
    }

    /// Returns true when this assertion holds at position `at` in
    /// `haystack`.
    ///
    /// # Panics
    ///
    /// This panics when `at > haystack.len()`.
    #[inline]
    pub(crate) fn matches(self, haystack: &[u8], at: usize) -> bool {
        match self {
            Look::Start => at == 0,
            Look::End => at == haystack.len(),
            Look::EndOrFinalNewline => {
                at == haystack.len()
                    || (at + 1 == haystack.len() && haystack[at] == b'\n')
            }
            Look::StartLine => {
                at == 0
                    || (at < haystack.len() && haystack[at - 1] == b'\n')
            }
            Look::EndLine => at == haystack.len() || haystack[at] == b'\n',
            Look::WordAscii => {
                is_word_ascii_rev(haystack, at)
                    != is_word_ascii_fwd(haystack, at)
            }
            Look::WordAsciiNegate => {
                is_word_ascii_rev(haystack, at)
                    == is_word_ascii_fwd(haystack, at)
            }
            Look::WordUnicode => {
                is_word_unicode_rev(haystack, at)
                    != is_word_unicode_fwd(haystack, at)
            }
            Look::WordUnicodeNegate => {
                is_word_unicode_rev(haystack, at)
                    == is_word_unicode_fwd(haystack, at)
            }
        }
    }
}

#[inline(always)]
fn is_word_ascii_fwd(haystack: &[u8], at: usize) -> bool {
    haystack.get(at).map_or(false, |&b| utf8::is_word_byte(b))
}

#[inline(always)]
fn is_word_ascii_rev(haystack: &[u8], at: usize) -> bool {
    at > 0 && utf8::is_word_byte(haystack[at - 1])
}

#[inline(always)]
fn is_word_unicode_fwd(haystack: &[u8], at: usize) -> bool {
    match utf8::decode(&haystack[at..]) {
        None | Some(Err(_)) => false,
        Some(Ok(ch)) => utf8::is_word_char(ch),
    }
}

#[inline(always)]
fn is_word_unicode_rev(haystack: &[u8], at: usize) -> bool {
    match utf8::decode_last(&haystack[..at]) {
        None | Some(Err(_)) => false,
        Some(Ok(ch)) => utf8::is_word_char(ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! testlook {
        ($look:expr, $haystack:expr, $at:expr) => {
            $look.matches($haystack.as_bytes(), $at)
        };
    }

    #[test]
    fn look_matches_start_line() {
        let look = Look::StartLine;

        assert!(testlook!(look, "", 0));
        assert!(testlook!(look, "\n", 0));
        assert!(testlook!(look, "a", 0));
        assert!(testlook!(look, "\na", 1));

        // A trailing newline does not begin a new line.
        assert!(!testlook!(look, "\n", 1));
        assert!(!testlook!(look, "a", 1));
        assert!(!testlook!(look, "a\na", 1));
    }

    #[test]
    fn look_matches_end_line() {
        let look = Look::EndLine;

        assert!(testlook!(look, "", 0));
        assert!(testlook!(look, "\n", 1));
        assert!(testlook!(look, "\n", 0));
        assert!(testlook!(look, "a\nb", 1));
        assert!(testlook!(look, "a", 1));

        assert!(!testlook!(look, "a", 0));
        assert!(!testlook!(look, "\na", 1));
    }

    #[test]
    fn look_matches_end_or_final_newline() {
        let look = Look::EndOrFinalNewline;

        assert!(testlook!(look, "", 0));
        assert!(testlook!(look, "abc\n", 3));
        assert!(testlook!(look, "abc\n", 4));

        assert!(!testlook!(look, "a\nb\n", 1));
        assert!(!testlook!(look, "abc", 2));
    }

    #[test]
    fn look_matches_start_end() {
        assert!(testlook!(Look::Start, "abc", 0));
        assert!(!testlook!(Look::Start, "abc", 1));
        assert!(testlook!(Look::End, "abc", 3));
        assert!(!testlook!(Look::End, "abc\n", 3));
    }

    #[test]
    fn look_matches_word_ascii() {
        let look = Look::WordAscii;

        assert!(testlook!(look, "a", 0));
        assert!(testlook!(look, "a", 1));
        assert!(testlook!(look, "a=", 1));
        assert!(testlook!(look, "=a", 1));
        assert!(!testlook!(look, "", 0));
        assert!(!testlook!(look, "ab", 1));
        assert!(!testlook!(look, "=-", 1));
        // Non-ASCII letters are not word characters in ASCII mode.
        assert!(!testlook!(look, "я", 0));
        assert!(testlook!(Look::WordAsciiNegate, "я", 0));
    }

    #[test]
    fn look_matches_word_unicode() {
        let look = Look::WordUnicode;

        assert!(testlook!(look, "я", 0));
        assert!(testlook!(look, "я", 2));
        assert!(testlook!(look, "я=", 2));
        assert!(testlook!(look, "=я", 1));
        assert!(!testlook!(look, "юя", 2));
        assert!(!testlook!(look, "=-", 1));
        assert!(testlook!(Look::WordUnicodeNegate, "юя", 2));
        assert!(!testlook!(Look::WordUnicodeNegate, "a", 0));
    }
}
