/*!
Replacement templates and the [`Replacer`] trait.

A template is literal text interspersed with references to capture groups.
The syntax is the union of what Python's `re` and PCRE2's extended
substitution accept:

* `\g<name>` and `\g<N>` refer to a group by name or number.
* `\N` and `\NN` refer to a group by number. A two digit reference that
isn't a valid group falls back to the one digit group followed by a literal
digit.
* `\0`, `\0o`, `\0oo` and three digit `\ooo` are octal escapes. The value
may not exceed `\377`.
* `$N`, `${N}`, `$name` and `${name}` refer to groups too, and `$$` is a
literal `$`. A `$` that isn't followed by any of these is literal.
* `\a \b \e \f \n \r \t \v` are the usual control characters.
* `\u` and `\l` change the case of the next character, `\U` and `\L` change
the case of everything up to the next `\E`.
* A backslash followed by any character other than an ASCII letter or digit
is that character. Any other ASCII letter is an error.

Templates are parsed completely, and every group reference is checked
against the pattern, before any text is produced.
*/

use core::convert::TryFrom;

use alloc::{boxed::Box, string::String, vec::Vec};

use crate::{
    error::TemplateError, matches::Match, subject::Subject,
    syntax::unicode, util::captures::GroupInfo,
};

/// A parsed replacement template, bound to the groups of one pattern.
#[derive(Clone, Debug)]
pub(crate) struct Template {
    pieces: Vec<Piece>,
    /// True when the template contains a case conversion escape. When it
    /// doesn't, group text is copied without decoding it.
    has_case: bool,
}

#[derive(Clone, Debug)]
enum Piece {
    Literal(String),
    /// A reference to the first participating group among `groups`. The
    /// offset of the reference is kept for error reporting.
    Group { groups: Box<[usize]>, offset: usize },
    Case(Case),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Case {
    /// `\u`
    UpperNext,
    /// `\l`
    LowerNext,
    /// `\U`
    Upper,
    /// `\L`
    Lower,
    /// `\E`
    End,
}

impl Template {
    /// Parse a template, resolving its group references with `info`.
    pub(crate) fn new<S: Subject + ?Sized>(
        template: &S,
        info: &GroupInfo,
    ) -> Result<Template, TemplateError> {
        let chars = template.decode_all();
        let end = template.as_bytes().len();
        let mut parser = TemplateParser {
            chars: &chars,
            end,
            pos: 0,
            info,
            text: S::IS_TEXT,
            pieces: vec![],
            literal: String::new(),
        };
        parser.parse()?;
        let has_case = parser
            .pieces
            .iter()
            .any(|piece| matches!(*piece, Piece::Case(_)));
        Ok(Template { pieces: parser.pieces, has_case })
    }

    /// Append the expansion of this template for the given match to `dst`.
    ///
    /// A reference to a group that didn't participate expands to nothing
    /// when `unset_empty` is true, and is an error otherwise.
    pub(crate) fn expand<S: Subject + ?Sized>(
        &self,
        m: &Match<'_, S>,
        unset_empty: bool,
        dst: &mut S::Owned,
    ) -> Result<(), TemplateError> {
        let mut casing = Casing::default();
        for piece in self.pieces.iter() {
            match *piece {
                Piece::Literal(ref lit) => {
                    for ch in lit.chars() {
                        casing.push::<S>(dst, ch);
                    }
                }
                Piece::Group { ref groups, offset } => {
                    let span =
                        groups.iter().find_map(|&index| m.span_of(index));
                    let span = match span {
                        Some(span) => span,
                        None if unset_empty => continue,
                        None => {
                            return Err(TemplateError::group_unset(
                                offset, groups[0],
                            ));
                        }
                    };
                    let text = m.subject().slice(span.range());
                    if !self.has_case {
                        S::push_subject(dst, text);
                        continue;
                    }
                    for (_, ch) in text.decode_all() {
                        casing.push::<S>(dst, ch);
                    }
                }
                Piece::Case(case) => casing.apply(case),
            }
        }
        Ok(())
    }
}

/// The case conversion in effect while expanding a template.
#[derive(Clone, Copy, Debug, Default)]
struct Casing {
    /// Set by `\u` or `\l` for the next character only.
    next: Option<bool>,
    /// Set by `\U` or `\L` until `\E`. `true` means uppercase.
    span: Option<bool>,
}

impl Casing {
    fn apply(&mut self, case: Case) {
        match case {
            Case::UpperNext => self.next = Some(true),
            Case::LowerNext => self.next = Some(false),
            Case::Upper => self.span = Some(true),
            Case::Lower => self.span = Some(false),
            Case::End => {
                self.span = None;
                self.next = None;
            }
        }
    }

    fn push<S: Subject + ?Sized>(&mut self, dst: &mut S::Owned, ch: char) {
        match self.next.take().or(self.span) {
            None => S::push_char(dst, ch),
            Some(true) => S::push_upper(dst, ch),
            Some(false) => S::push_lower(dst, ch),
        }
    }
}

struct TemplateParser<'a> {
    /// Every character of the template along with its byte offset.
    chars: &'a [(usize, char)],
    /// The length of the template in bytes.
    end: usize,
    /// An index into `chars`.
    pos: usize,
    info: &'a GroupInfo,
    text: bool,
    pieces: Vec<Piece>,
    /// Literal text accumulated since the last non-literal piece.
    literal: String,
}

impl<'a> TemplateParser<'a> {
    fn parse(&mut self) -> Result<(), TemplateError> {
        while let Some(ch) = self.char() {
            match ch {
                '\\' => self.parse_escape()?,
                '$' => self.parse_dollar()?,
                _ => {
                    self.literal.push(ch);
                    self.pos += 1;
                }
            }
        }
        self.flush();
        Ok(())
    }

    fn char(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, ch)| ch)
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|&(_, ch)| ch)
    }

    /// The byte offset of the current character.
    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.end, |&(offset, _)| offset)
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            let lit = core::mem::replace(&mut self.literal, String::new());
            self.pieces.push(Piece::Literal(lit));
        }
    }

    fn push_piece(&mut self, piece: Piece) {
        self.flush();
        self.pieces.push(piece);
    }

    fn push_group(&mut self, index: usize, offset: usize) {
        let groups = vec![index].into_boxed_slice();
        self.push_piece(Piece::Group { groups, offset });
    }

    fn parse_escape(&mut self) -> Result<(), TemplateError> {
        let start = self.offset();
        self.pos += 1;
        let ch = match self.char() {
            None => return Err(TemplateError::escape_unexpected_eof(start)),
            Some(ch) => ch,
        };
        self.pos += 1;
        let lit = match ch {
            'g' => return self.parse_g(start),
            '0' => {
                let mut value = 0;
                for _ in 0..2 {
                    match self.char().and_then(|c| c.to_digit(8)) {
                        None => break,
                        Some(d) => {
                            value = value * 8 + d;
                            self.pos += 1;
                        }
                    }
                }
                self.push_octal(start, value)?;
                return Ok(());
            }
            '1'..='9' => return self.parse_number(start, ch),
            'a' => '\x07',
            'b' => '\x08',
            'e' => '\x1B',
            'f' => '\x0C',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0B',
            'u' | 'l' | 'U' | 'L' | 'E' => {
                let case = match ch {
                    'u' => Case::UpperNext,
                    'l' => Case::LowerNext,
                    'U' => Case::Upper,
                    'L' => Case::Lower,
                    _ => Case::End,
                };
                self.push_piece(Piece::Case(case));
                return Ok(());
            }
            ch if ch.is_ascii_alphabetic() => {
                return Err(TemplateError::escape_unknown(start, ch));
            }
            ch => ch,
        };
        self.literal.push(lit);
        Ok(())
    }

    /// Parse a reference or octal escape beginning with a non-zero digit,
    /// which has already been consumed.
    fn parse_number(
        &mut self,
        start: usize,
        first: char,
    ) -> Result<(), TemplateError> {
        let digit = |c: Option<char>, radix| c.and_then(|c| c.to_digit(radix));
        let d1 = first.to_digit(10).unwrap_or(0);
        if first.to_digit(8).is_some() {
            if let (Some(d2), Some(d3)) =
                (digit(self.char(), 8), digit(self.peek(1), 8))
            {
                self.pos += 2;
                return self.push_octal(start, d1 * 64 + d2 * 8 + d3);
            }
        }
        let group_len = self.info.group_len();
        if let Some(d2) = digit(self.char(), 10) {
            let index = (d1 * 10 + d2) as usize;
            if index < group_len {
                self.pos += 1;
                self.push_group(index, start);
                return Ok(());
            }
        }
        let index = d1 as usize;
        if index >= group_len {
            return Err(TemplateError::group_index_invalid(start, d1));
        }
        self.push_group(index, start);
        Ok(())
    }

    fn push_octal(
        &mut self,
        start: usize,
        value: u32,
    ) -> Result<(), TemplateError> {
        if value > 0o377 {
            return Err(TemplateError::escape_octal_invalid(start));
        }
        // Values up to 0o377 are always valid codepoints.
        if let Some(ch) = char::from_u32(value) {
            self.literal.push(ch);
        }
        Ok(())
    }

    /// Parse the `<...>` following `\g`.
    fn parse_g(&mut self, start: usize) -> Result<(), TemplateError> {
        if self.char() != Some('<') {
            return Err(TemplateError::group_missing_open(start));
        }
        self.pos += 1;
        let name = self.take_until('>', start)?;
        self.push_reference(&name, start)
    }

    /// Parse a `$` reference.
    fn parse_dollar(&mut self) -> Result<(), TemplateError> {
        let start = self.offset();
        self.pos += 1;
        match self.char() {
            Some('$') => {
                self.pos += 1;
                self.literal.push('$');
            }
            Some('{') => {
                self.pos += 1;
                let name = self.take_until('}', start)?;
                self.push_reference(&name, start)?;
            }
            Some(c) if c.is_ascii_digit() => {
                let mut index: u32 = 0;
                while let Some(d) = self.char().and_then(|c| c.to_digit(10)) {
                    index = index.saturating_mul(10).saturating_add(d);
                    self.pos += 1;
                }
                self.push_index(index, start)?;
            }
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(c) = self.char() {
                    if c != '_' && !c.is_ascii_alphanumeric() {
                        break;
                    }
                    name.push(c);
                    self.pos += 1;
                }
                self.push_name(&name, start)?;
            }
            _ => self.literal.push('$'),
        }
        Ok(())
    }

    /// Collect everything up to (and consume) the given terminator.
    fn take_until(
        &mut self,
        terminator: char,
        start: usize,
    ) -> Result<String, TemplateError> {
        let mut name = String::new();
        loop {
            match self.char() {
                None => return Err(TemplateError::group_unterminated(start)),
                Some(c) if c == terminator => {
                    self.pos += 1;
                    return Ok(name);
                }
                Some(c) => {
                    name.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Resolve the contents of `\g<...>` or `${...}`, which is either a
    /// decimal group number or a group name.
    fn push_reference(
        &mut self,
        name: &str,
        start: usize,
    ) -> Result<(), TemplateError> {
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            let index = name.bytes().fold(0u32, |acc, b| {
                acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
            });
            return self.push_index(index, start);
        }
        self.push_name(name, start)
    }

    fn push_index(
        &mut self,
        index: u32,
        start: usize,
    ) -> Result<(), TemplateError> {
        let valid = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.info.group_len());
        match valid {
            None => Err(TemplateError::group_index_invalid(start, index)),
            Some(i) => {
                self.push_group(i, start);
                Ok(())
            }
        }
    }

    fn push_name(
        &mut self,
        name: &str,
        start: usize,
    ) -> Result<(), TemplateError> {
        let valid = if self.text {
            unicode::is_group_name(name)
        } else {
            is_ascii_group_name(name)
        };
        if !valid {
            return Err(TemplateError::group_name_invalid(start, name));
        }
        let indices = self.info.to_indices(name);
        if indices.is_empty() {
            return Err(TemplateError::group_name_unknown(start, name));
        }
        let groups = indices.to_vec().into_boxed_slice();
        self.push_piece(Piece::Group { groups, offset: start });
        Ok(())
    }
}

fn is_ascii_group_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b == b'_' || b.is_ascii_alphabetic() => {
            bytes.all(|b| b == b'_' || b.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// A replacement strategy for substitutions.
///
/// This trait is implemented for template strings (`&str`, `String`,
/// `&[u8]` and `Vec<u8>`), for [`NoExpand`], which inserts its text
/// literally, and for closures `FnMut(&Match) -> T` where `T` is the text to
/// insert. Closure output is never interpreted as a template.
///
/// # Example
///
/// ```
/// use regex_backtrack::{Match, Regex};
///
/// let re = Regex::new(r"\d+")?;
/// let bump = |m: &Match<'_, str>| {
///     (m.as_subject().parse::<u32>().unwrap() + 1).to_string()
/// };
/// assert_eq!("9.3 -3 24x100y", re.sub(bump, "08.2 -2 23x99y", 0)?);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Replacer<S: Subject + ?Sized> {
    /// Append the replacement for the given match to `dst`.
    fn replace_append(
        &mut self,
        m: &Match<'_, S>,
        dst: &mut S::Owned,
    ) -> Result<(), TemplateError>;

    /// Returns the template this replacer expands, if it is one.
    ///
    /// Substitutions use this to parse a template once, before searching,
    /// rather than once per match.
    fn template(&mut self) -> Option<&S> {
        None
    }
}

impl<'a> Replacer<str> for &'a str {
    fn replace_append(
        &mut self,
        m: &Match<'_, str>,
        dst: &mut String,
    ) -> Result<(), TemplateError> {
        dst.push_str(&m.expand(self)?);
        Ok(())
    }

    fn template(&mut self) -> Option<&str> {
        Some(*self)
    }
}

impl<'a> Replacer<str> for &'a String {
    fn replace_append(
        &mut self,
        m: &Match<'_, str>,
        dst: &mut String,
    ) -> Result<(), TemplateError> {
        self.as_str().replace_append(m, dst)
    }

    fn template(&mut self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl Replacer<str> for String {
    fn replace_append(
        &mut self,
        m: &Match<'_, str>,
        dst: &mut String,
    ) -> Result<(), TemplateError> {
        self.as_str().replace_append(m, dst)
    }

    fn template(&mut self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<'a> Replacer<[u8]> for &'a [u8] {
    fn replace_append(
        &mut self,
        m: &Match<'_, [u8]>,
        dst: &mut Vec<u8>,
    ) -> Result<(), TemplateError> {
        dst.extend_from_slice(&m.expand(self)?);
        Ok(())
    }

    fn template(&mut self) -> Option<&[u8]> {
        Some(*self)
    }
}

impl<'a> Replacer<[u8]> for &'a Vec<u8> {
    fn replace_append(
        &mut self,
        m: &Match<'_, [u8]>,
        dst: &mut Vec<u8>,
    ) -> Result<(), TemplateError> {
        self.as_slice().replace_append(m, dst)
    }

    fn template(&mut self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

impl Replacer<[u8]> for Vec<u8> {
    fn replace_append(
        &mut self,
        m: &Match<'_, [u8]>,
        dst: &mut Vec<u8>,
    ) -> Result<(), TemplateError> {
        self.as_slice().replace_append(m, dst)
    }

    fn template(&mut self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

impl<S, F, T> Replacer<S> for F
where
    S: Subject + ?Sized,
    F: FnMut(&Match<'_, S>) -> T,
    T: AsRef<S>,
{
    fn replace_append(
        &mut self,
        m: &Match<'_, S>,
        dst: &mut S::Owned,
    ) -> Result<(), TemplateError> {
        S::push_subject(dst, (*self)(m).as_ref());
        Ok(())
    }
}

/// A replacer that inserts its text literally, without interpreting any
/// template syntax.
///
/// # Example
///
/// ```
/// use regex_backtrack::{NoExpand, Regex};
///
/// let re = Regex::new(r"(\w+)")?;
/// assert_eq!(r"\1 $1", re.sub(NoExpand(r"\1 $1"), "word", 0)?);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct NoExpand<'t, S: ?Sized>(pub &'t S);

impl<'t, S: Subject + ?Sized> Replacer<S> for NoExpand<'t, S> {
    fn replace_append(
        &mut self,
        _: &Match<'_, S>,
        dst: &mut S::Owned,
    ) -> Result<(), TemplateError> {
        S::push_subject(dst, self.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(
        template: &str,
        groups: usize,
    ) -> Result<Template, TemplateError> {
        let info = GroupInfo::new((0..groups).map(|_| None::<&str>));
        Template::new(template, &info)
    }

    fn literal(template: &str) -> String {
        let t = parse(template, 0).unwrap();
        match t.pieces.as_slice() {
            [] => String::new(),
            [Piece::Literal(ref lit)] => lit.clone(),
            pieces => panic!("expected one literal, got {:?}", pieces),
        }
    }

    fn groups(template: &str, groups: usize) -> Vec<usize> {
        parse(template, groups)
            .unwrap()
            .pieces
            .iter()
            .filter_map(|piece| match *piece {
                Piece::Group { ref groups, .. } => Some(groups[0]),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn escapes() {
        let controls = literal(r"\t\n\v\r\f\a\b\e");
        assert_eq!("\t\n\x0B\r\x0C\x07\x08\x1B", controls);
        assert_eq!(r"\$&", literal(r"\\\$\&"));
        assert_eq!("é", literal(r"\é"));
        for c in "cdhijkmopqswxyzABCDFGHIJKMNOPRSTVWXYZ".chars() {
            let template = format!(r"\{}", c);
            assert!(parse(&template, 0).is_err(), "{:?}", template);
        }
        assert!(parse("\\", 0).is_err());
    }

    #[test]
    fn octal() {
        assert_eq!("\0", literal(r"\0"));
        assert_eq!("\0", literal(r"\000"));
        assert_eq!("\x01", literal(r"\001"));
        assert_eq!("\08", literal(r"\008"));
        assert_eq!("\x49", literal(r"\111"));
        assert_eq!("\u{FF}", literal(r"\377"));
        assert_eq!("\x491", literal(r"\1111"));
        assert_eq!("\x07", literal(r"\07"));
        assert_eq!("\0a", literal(r"\0a"));
        assert!(parse(r"\400", 0).is_err());
    }

    #[test]
    fn numbered_references() {
        assert_eq!(vec![1], groups(r"\1", 1));
        assert_eq!(vec![11], groups(r"\11", 11));
        // Too few groups for \11, so it's \1 followed by "1".
        assert_eq!(vec![1], groups(r"\11", 1));
        assert_eq!(vec![0, 1], groups(r"\g<0>\g<1>", 1));
        assert_eq!(vec![11], groups(r"\g<11>8", 11));
        assert!(parse(r"\2", 1).is_err());
        assert!(parse(r"\g<2>", 1).is_err());
    }

    #[test]
    fn dollar_references() {
        assert_eq!(vec![1, 1], groups("$1${1}", 1));
        assert_eq!("$", literal("$$"));
        assert_eq!("a$ $", literal("a$ $"));
        assert!(parse("$2", 1).is_err());
        assert!(parse("${1", 1).is_err());
    }

    #[test]
    fn named_references() {
        let info = GroupInfo::new(vec![Some("a"), None, Some("a")]);
        let t = Template::new(r"\g<a>", &info).unwrap();
        match t.pieces.as_slice() {
            [Piece::Group { ref groups, .. }] => {
                assert_eq!(&[1, 3], &**groups)
            }
            pieces => panic!("unexpected pieces {:?}", pieces),
        }
        assert!(Template::new("$a${a}", &info).is_ok());

        let errors = [
            r"\g<a",
            r"\g<",
            r"\g",
            r"\g<a a>",
            r"\g<>",
            r"\g<1a1>",
            r"\g<ab>",
            r"\g<-1>",
            r"\g<+1>",
            r"\g< 1 >",
            r"\g<©>",
            r"\g<¹>",
            r"\g<१>",
        ];
        for template in errors.iter() {
            assert!(Template::new(*template, &info).is_err(), "{}", template);
        }

        // Byte templates only accept ASCII names.
        assert!(Template::new(&b"\\g<\xC2\xB5>"[..], &info).is_err());
    }

    #[test]
    fn case_escapes_are_pieces() {
        let t = parse(r"\u\1\E", 1).unwrap();
        assert!(t.has_case);
        assert_eq!(3, t.pieces.len());
    }
}
