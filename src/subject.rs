/*!
The abstraction over the two kinds of subjects a pattern can search.

A pattern is compiled either from text (`str`) or from bytes (`[u8]`), and it
can only ever search subjects (and expand templates) of the same kind. That
rule is enforced by the type system: [`Pattern`](crate::Pattern) is generic
over a [`Subject`], which is only implemented for `str` and `[u8]`.

Offsets are always byte offsets. For text subjects, every offset reported by
this crate falls on a UTF-8 codepoint boundary. For byte subjects, each byte
is treated as the codepoint with the same value (i.e., Latin-1).
*/

use core::{convert::TryFrom, ops::Range};

use alloc::{string::String, vec::Vec};

mod private {
    pub trait Sealed {}

    impl Sealed for str {}
    impl Sealed for [u8] {}
}

/// A haystack, pattern source or template that a pattern can work with.
///
/// This trait is sealed: it is implemented for `str` and `[u8]` only.
pub trait Subject: private::Sealed + core::fmt::Debug {
    /// The owned form of this subject, produced by substitutions.
    type Owned: Clone
        + Default
        + core::fmt::Debug
        + core::borrow::Borrow<Self>
        + AsRef<Self>;

    /// True for text subjects, where the haystack is UTF-8 and character
    /// classes, case folding and word boundaries may be Unicode aware.
    const IS_TEXT: bool;

    /// Returns the raw bytes of this subject.
    fn as_bytes(&self) -> &[u8];

    /// Returns the sub-subject at the given byte range.
    ///
    /// Callers must only give ranges whose ends fall on character
    /// boundaries.
    fn slice(&self, range: Range<usize>) -> &Self;

    /// Returns the largest character boundary that is less than or equal to
    /// `at`, where `at` must not exceed the length of this subject.
    fn floor_boundary(&self, at: usize) -> usize;

    /// Returns the smallest character boundary that is greater than or equal
    /// to `at`, where `at` must not exceed the length of this subject.
    fn ceil_boundary(&self, at: usize) -> usize;

    /// Decodes every character along with its starting byte offset.
    fn decode_all(&self) -> Vec<(usize, char)>;

    /// Copies this subject into a new owned value.
    fn to_owned_subject(&self) -> Self::Owned;

    /// Appends `src` to `dst`.
    fn push_subject(dst: &mut Self::Owned, src: &Self);

    /// Appends one character to `dst`.
    ///
    /// For byte subjects, the character must be at most `U+00FF`.
    fn push_char(dst: &mut Self::Owned, ch: char);

    /// Appends the uppercase form of `ch` to `dst`.
    fn push_upper(dst: &mut Self::Owned, ch: char);

    /// Appends the lowercase form of `ch` to `dst`.
    fn push_lower(dst: &mut Self::Owned, ch: char);

    /// Writes a quoted, escaped rendering of this subject.
    fn fmt_quoted(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result;
}

impl Subject for str {
    type Owned = String;

    const IS_TEXT: bool = true;

    fn as_bytes(&self) -> &[u8] {
        str::as_bytes(self)
    }

    fn slice(&self, range: Range<usize>) -> &str {
        &self[range]
    }

    fn floor_boundary(&self, mut at: usize) -> usize {
        while !self.is_char_boundary(at) {
            at -= 1;
        }
        at
    }

    fn ceil_boundary(&self, mut at: usize) -> usize {
        while !self.is_char_boundary(at) {
            at += 1;
        }
        at
    }

    fn decode_all(&self) -> Vec<(usize, char)> {
        self.char_indices().collect()
    }

    fn to_owned_subject(&self) -> String {
        String::from(self)
    }

    fn push_subject(dst: &mut String, src: &str) {
        dst.push_str(src);
    }

    fn push_char(dst: &mut String, ch: char) {
        dst.push(ch);
    }

    fn push_upper(dst: &mut String, ch: char) {
        dst.extend(ch.to_uppercase());
    }

    fn push_lower(dst: &mut String, ch: char) {
        dst.extend(ch.to_lowercase());
    }

    fn fmt_quoted(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Subject for [u8] {
    type Owned = Vec<u8>;

    const IS_TEXT: bool = false;

    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn slice(&self, range: Range<usize>) -> &[u8] {
        &self[range]
    }

    fn floor_boundary(&self, at: usize) -> usize {
        at
    }

    fn ceil_boundary(&self, at: usize) -> usize {
        at
    }

    fn decode_all(&self) -> Vec<(usize, char)> {
        self.iter().enumerate().map(|(i, &b)| (i, char::from(b))).collect()
    }

    fn to_owned_subject(&self) -> Vec<u8> {
        self.to_vec()
    }

    fn push_subject(dst: &mut Vec<u8>, src: &[u8]) {
        dst.extend_from_slice(src);
    }

    fn push_char(dst: &mut Vec<u8>, ch: char) {
        match u8::try_from(u32::from(ch)) {
            Ok(b) => dst.push(b),
            // Templates and patterns over bytes never produce codepoints
            // above U+00FF, but encode anything else as UTF-8 rather than
            // silently truncating it.
            Err(_) => {
                let mut buf = [0; 4];
                dst.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    fn push_upper(dst: &mut Vec<u8>, ch: char) {
        <[u8] as Subject>::push_char(dst, ch.to_ascii_uppercase());
    }

    fn push_lower(dst: &mut Vec<u8>, ch: char) {
        <[u8] as Subject>::push_char(dst, ch.to_ascii_lowercase());
    }

    fn fmt_quoted(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        write!(f, "b\"")?;
        for &b in self {
            if b == b'"' {
                write!(f, "\\\"")?;
            } else {
                write!(f, "{}", core::ascii::escape_default(b))?;
            }
        }
        write!(f, "\"")
    }
}

/// Wraps a subject so that its `Debug` impl renders it quoted and escaped.
pub(crate) struct Quoted<'a, S: ?Sized>(pub(crate) &'a S);

impl<'a, S: Subject + ?Sized> core::fmt::Debug for Quoted<'a, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt_quoted(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_boundaries() {
        let s = "aé☃";
        assert_eq!(1, s.floor_boundary(2));
        assert_eq!(3, s.ceil_boundary(2));
        assert_eq!(6, s.ceil_boundary(6));
        assert_eq!(vec![(0, 'a'), (1, 'é'), (3, '☃')], s.decode_all());
    }

    #[test]
    fn bytes_are_latin1() {
        let b: &[u8] = b"a\xFF";
        assert_eq!(vec![(0, 'a'), (1, '\u{FF}')], b.decode_all());

        let mut out = Vec::new();
        <[u8] as Subject>::push_char(&mut out, '\u{FF}');
        <[u8] as Subject>::push_upper(&mut out, 'q');
        assert_eq!(b"\xFFQ".to_vec(), out);
    }

    #[test]
    fn quoted() {
        assert_eq!(r#""a\"b""#, format!("{:?}", Quoted("a\"b")));
        assert_eq!(
            r#"b"a\"\xff""#,
            format!("{:?}", Quoted(&b"a\"\xFF"[..]))
        );
    }
}
