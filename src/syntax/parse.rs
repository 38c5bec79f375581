/*!
The pattern parser.

The parser turns pattern source into a [`Node`] tree in one left-to-right
pass. Groups are handled with an explicit stack of frames rather than
recursion, so deeply nested patterns are bounded only by the configured nest
limit.

References to groups (backreferences and conditionals) may point forward, to
a group that hasn't been opened yet, and whether `\12` refers to group 12 or
to group 1 followed by a literal `2` depends on how many groups the whole
pattern has. When a pattern contains a reference that can't be resolved with
what has been seen so far, it is simply parsed a second time with the group
metadata from the first pass in hand. Since parsing is deterministic, the
second pass numbers every group the same way.
*/

use alloc::{boxed::Box, string::String, vec::Vec};

use crate::{
    error::PatternError,
    flags::Flags,
    subject::Subject,
    syntax::{
        ast::{LookAround, Node, Repeat, RepeatKind, Width},
        class::{CharSet, Perl, Posix, SetOp, MAX_BYTE, MAX_TEXT},
        unicode,
    },
    util::{captures::GroupInfo, look::Look},
};

/// The largest bound permitted in a counted repetition.
const REPEAT_LIMIT: u32 = 65535;
/// The largest number of codepoints a lookbehind may look back.
const LOOKBEHIND_LIMIT: u32 = 65535;

/// The configuration of a parse.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) flags: Flags,
    pub(crate) allow_duplicate_names: bool,
    pub(crate) nest_limit: u32,
}

/// A parsed pattern.
#[derive(Clone, Debug)]
pub(crate) struct Ast {
    pub(crate) root: Node,
    pub(crate) group_info: GroupInfo,
}

/// Parse the given pattern source.
pub(crate) fn parse<S: Subject + ?Sized>(
    pattern: &S,
    config: &Config,
) -> Result<Ast, PatternError> {
    let flags = config.flags;
    if flags.contains(Flags::ASCII) && flags.contains(Flags::UNICODE) {
        return Err(PatternError::flag_ascii_unicode(0));
    }
    if !S::IS_TEXT && flags.contains(Flags::UNICODE) {
        return Err(PatternError::flag_unicode_bytes(0));
    }
    let chars = pattern.decode_all();
    let len = pattern.as_bytes().len();

    let first = Parser::new(&chars, len, S::IS_TEXT, config, None).parse()?;
    let (mut root, names) = if first.unresolved {
        let known = GroupInfo::new(first.names.iter().map(|n| n.as_deref()));
        let second =
            Parser::new(&chars, len, S::IS_TEXT, config, Some(&known))
                .parse()?;
        debug_assert!(!second.unresolved);
        (second.root, second.names)
    } else {
        (first.root, first.names)
    };

    let mut widths = vec![];
    root.width(&mut widths);
    check_lookbehinds(&mut root, &mut widths)?;
    let group_info = GroupInfo::new(names.iter().map(|n| n.as_deref()));
    Ok(Ast { root, group_info })
}

/// Measure every lookbehind and reject the ones without a fixed upper bound
/// on their width.
fn check_lookbehinds(
    node: &mut Node,
    widths: &mut Vec<Option<Width>>,
) -> Result<(), PatternError> {
    match *node {
        Node::Empty
        | Node::Literal(_)
        | Node::Class(_)
        | Node::Any
        | Node::AnyNotNewline
        | Node::Look(_)
        | Node::SearchStart
        | Node::KeepOut
        | Node::BackRef { .. } => Ok(()),
        Node::Capture { ref mut node, .. } | Node::Atomic(ref mut node) => {
            check_lookbehinds(node, widths)
        }
        Node::Repeat(ref mut rep) => check_lookbehinds(&mut rep.node, widths),
        Node::Concat(ref mut nodes) | Node::Alternate(ref mut nodes) => {
            for node in nodes.iter_mut() {
                check_lookbehinds(node, widths)?;
            }
            Ok(())
        }
        Node::Conditional { ref mut yes, ref mut no, .. } => {
            check_lookbehinds(yes, widths)?;
            check_lookbehinds(no, widths)
        }
        Node::LookAround(ref mut look) => {
            if look.behind {
                let width = look.node.width(widths);
                match width.max {
                    None => {
                        return Err(PatternError::lookbehind_unbounded(
                            look.offset,
                        ))
                    }
                    Some(max) if max > LOOKBEHIND_LIMIT => {
                        return Err(PatternError::lookbehind_too_long(
                            look.offset,
                            LOOKBEHIND_LIMIT,
                        ))
                    }
                    Some(_) => {}
                }
                look.width = width;
            }
            check_lookbehinds(&mut look.node, widths)
        }
    }
}

/// The flags in effect at some point in a pattern.
#[derive(Clone, Copy, Debug)]
struct Scope {
    fold: bool,
    multiline: bool,
    dotall: bool,
    verbose: bool,
    /// Set for byte patterns, and for text patterns in ASCII mode.
    ascii: bool,
    /// Set when Unicode mode was explicitly requested, which makes a later
    /// request for ASCII mode an error.
    unicode_explicit: bool,
}

/// What the most recent item in a sequence was. This decides whether a
/// repetition operator is permitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Last {
    Nothing,
    Assertion,
    Atom,
    Repeat,
}

#[derive(Clone, Debug)]
enum GroupKind {
    Capture(usize),
    NonCapture,
    Atomic,
    Look { behind: bool, negated: bool },
    Conditional(Vec<usize>),
}

/// A group that has been opened but not yet closed.
#[derive(Debug)]
struct Frame {
    kind: GroupKind,
    /// The offset of the `(` that opened the group.
    offset: usize,
    /// The flags in effect outside of the group, restored when it closes.
    outer: Scope,
    branches: Vec<Node>,
    concat: Vec<Node>,
    last: Last,
}

impl Frame {
    fn new(kind: GroupKind, offset: usize, outer: Scope) -> Frame {
        Frame {
            kind,
            offset,
            outer,
            branches: vec![],
            concat: vec![],
            last: Last::Nothing,
        }
    }

    fn into_branches(mut self) -> Vec<Node> {
        self.branches.push(Node::concat(self.concat));
        self.branches
    }
}

/// The result of one parsing pass.
struct Parsed {
    root: Node,
    names: Vec<Option<String>>,
    /// Set when some reference couldn't be resolved during the pass.
    unresolved: bool,
}

/// A single item inside a bracketed class.
enum ClassAtom {
    Char(u32),
    Set(CharSet),
}

struct Parser<'a> {
    chars: &'a [(usize, char)],
    /// The length of the pattern in bytes.
    len: usize,
    pos: usize,
    text: bool,
    config: &'a Config,
    /// The group metadata found by a previous pass, if there was one.
    known: Option<&'a GroupInfo>,
    scope: Scope,
    root: Frame,
    stack: Vec<Frame>,
    names: Vec<Option<String>>,
    unresolved: bool,
    look_depth: usize,
    class_depth: u32,
}

impl<'a> Parser<'a> {
    fn new(
        chars: &'a [(usize, char)],
        len: usize,
        text: bool,
        config: &'a Config,
        known: Option<&'a GroupInfo>,
    ) -> Parser<'a> {
        let flags = config.flags;
        let scope = Scope {
            fold: flags.contains(Flags::IGNORECASE),
            multiline: flags.contains(Flags::MULTILINE),
            dotall: flags.contains(Flags::DOTALL),
            verbose: flags.contains(Flags::VERBOSE),
            ascii: !text || flags.contains(Flags::ASCII),
            unicode_explicit: flags.contains(Flags::UNICODE),
        };
        Parser {
            chars,
            len,
            pos: 0,
            text,
            config,
            known,
            scope,
            root: Frame::new(GroupKind::NonCapture, 0, scope),
            stack: vec![],
            names: vec![],
            unresolved: false,
            look_depth: 0,
            class_depth: 0,
        }
    }

    fn parse(mut self) -> Result<Parsed, PatternError> {
        loop {
            self.skip_verbose();
            let start = self.offset();
            let c = match self.bump() {
                None => break,
                Some(c) => c,
            };
            match c {
                '(' => self.open_group(start)?,
                ')' => self.close_group(start)?,
                '|' => {
                    let frame = self.frame_mut();
                    let concat = core::mem::take(&mut frame.concat);
                    frame.branches.push(Node::concat(concat));
                    frame.last = Last::Nothing;
                }
                '[' => {
                    let set = self.parse_class(start)?;
                    self.push_atom(Node::Class(set));
                }
                '*' => self.push_repeat(start, 0, None)?,
                '+' => self.push_repeat(start, 1, None)?,
                '?' => self.push_repeat(start, 0, Some(1))?,
                '{' => match self.parse_counted(start)? {
                    Some((min, max)) => self.push_repeat(start, min, max)?,
                    None => self.push_literal(u32::from('{')),
                },
                '.' => {
                    let node = if self.scope.dotall {
                        Node::Any
                    } else {
                        Node::AnyNotNewline
                    };
                    self.push_atom(node);
                }
                '^' => {
                    let look = if self.scope.multiline {
                        Look::StartLine
                    } else {
                        Look::Start
                    };
                    self.push_assertion(Node::Look(look));
                }
                '$' => {
                    let look = if self.scope.multiline {
                        Look::EndLine
                    } else {
                        Look::EndOrFinalNewline
                    };
                    self.push_assertion(Node::Look(look));
                }
                '\\' => self.parse_escape(start)?,
                c => self.push_literal(u32::from(c)),
            }
        }
        if let Some(frame) = self.stack.last() {
            return Err(PatternError::group_unclosed(frame.offset));
        }
        let root = Node::alternate(self.root.into_branches());
        Ok(Parsed { root, names: self.names, unresolved: self.unresolved })
    }

    fn char(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.char()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.char() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// The byte offset of the current position.
    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |&(i, _)| i)
    }

    /// Whether `\w`, `\b`, case folding and friends are Unicode aware at the
    /// current position.
    fn unicode(&self) -> bool {
        !self.scope.ascii
    }

    /// The largest codepoint this pattern can match.
    fn max_cp(&self) -> u32 {
        if self.text {
            MAX_TEXT
        } else {
            MAX_BYTE
        }
    }

    fn frame_mut(&mut self) -> &mut Frame {
        match self.stack.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    fn frame(&self) -> &Frame {
        self.stack.last().unwrap_or(&self.root)
    }

    fn push_atom(&mut self, node: Node) {
        let frame = self.frame_mut();
        frame.concat.push(node);
        frame.last = Last::Atom;
    }

    fn push_assertion(&mut self, node: Node) {
        let frame = self.frame_mut();
        frame.concat.push(node);
        frame.last = Last::Assertion;
    }

    fn push_literal(&mut self, cp: u32) {
        let node = self.literal(cp);
        self.push_atom(node);
    }

    /// Returns the node matching `cp` under the current flags.
    fn literal(&self, cp: u32) -> Node {
        if !self.scope.fold {
            return Node::Literal(cp);
        }
        let mut set = CharSet::single(cp);
        set.case_fold(self.unicode());
        match set.as_single() {
            Some(cp) => Node::Literal(cp),
            None => Node::Class(set),
        }
    }

    /// Returns the node matching a class under the current flags. Case
    /// folding is applied before negation.
    fn class(&self, mut set: CharSet, negated: bool) -> Node {
        if self.scope.fold {
            set.case_fold(self.unicode());
        }
        if negated {
            set.negate(self.max_cp());
        }
        Node::Class(set)
    }

    fn skip_verbose(&mut self) {
        if !self.scope.verbose {
            return;
        }
        loop {
            match self.char() {
                Some(' ') | Some('\t') | Some('\n') | Some('\r')
                | Some('\x0B') | Some('\x0C') => {
                    self.pos += 1;
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn push_repeat(
        &mut self,
        start: usize,
        min: u32,
        max: Option<u32>,
    ) -> Result<(), PatternError> {
        match self.frame().last {
            Last::Nothing | Last::Assertion => {
                return Err(PatternError::repeat_missing(start))
            }
            Last::Repeat => return Err(PatternError::repeat_multiple(start)),
            Last::Atom => {}
        }
        let kind = if self.eat('?') {
            RepeatKind::Lazy
        } else if self.eat('+') {
            RepeatKind::Possessive
        } else {
            RepeatKind::Greedy
        };
        let frame = self.frame_mut();
        let node = match frame.concat.pop() {
            Some(node) => node,
            None => return Err(PatternError::repeat_missing(start)),
        };
        let node = Box::new(node);
        frame.concat.push(Node::Repeat(Repeat { node, min, max, kind }));
        frame.last = Last::Repeat;
        Ok(())
    }

    /// Parse the rest of a counted repetition after its `{`. If what follows
    /// isn't a valid bound, nothing is consumed and `None` is returned, in
    /// which case the `{` is a literal.
    fn parse_counted(
        &mut self,
        start: usize,
    ) -> Result<Option<(u32, Option<u32>)>, PatternError> {
        let saved = self.pos;
        let min = self.parse_decimal();
        let (min, max) = if self.eat(',') {
            let max = self.parse_decimal();
            (min.unwrap_or(0), max)
        } else {
            match min {
                None => {
                    self.pos = saved;
                    return Ok(None);
                }
                Some(min) => (min, Some(min)),
            }
        };
        if !self.eat('}') {
            self.pos = saved;
            return Ok(None);
        }
        let limit = u64::from(REPEAT_LIMIT);
        if min > limit || max.map_or(false, |max| max > limit) {
            return Err(PatternError::repeat_too_large(start, REPEAT_LIMIT));
        }
        // Both fit in a u32 now.
        let (min, max) = (min as u32, max.map(|max| max as u32));
        if let Some(max) = max {
            if min > max {
                return Err(PatternError::repeat_range_invalid(
                    start, min, max,
                ));
            }
        }
        Ok(Some((min, max)))
    }

    /// Parse a run of ASCII decimal digits. Overly large values saturate.
    fn parse_decimal(&mut self) -> Option<u64> {
        let mut value: Option<u64> = None;
        while let Some(d) = self.char().and_then(|c| c.to_digit(10)) {
            self.pos += 1;
            let v = value.unwrap_or(0);
            value = Some(v.saturating_mul(10).saturating_add(u64::from(d)));
        }
        value
    }

    fn open_frame(
        &mut self,
        kind: GroupKind,
        start: usize,
    ) -> Result<(), PatternError> {
        if self.stack.len() + self.class_depth as usize
            >= self.config.nest_limit as usize
        {
            return Err(PatternError::nest_limit_exceeded(
                start,
                self.config.nest_limit,
            ));
        }
        if let GroupKind::Look { .. } = kind {
            self.look_depth += 1;
        }
        self.stack.push(Frame::new(kind, start, self.scope));
        Ok(())
    }

    fn open_capture(
        &mut self,
        start: usize,
        name: Option<String>,
    ) -> Result<(), PatternError> {
        if let Some(ref name) = name {
            let duplicate =
                self.names.iter().any(|n| n.as_deref() == Some(name.as_str()));
            if duplicate && !self.config.allow_duplicate_names {
                return Err(PatternError::group_name_duplicate(start, name));
            }
        }
        self.names.push(name);
        let index = self.names.len();
        self.open_frame(GroupKind::Capture(index), start)
    }

    fn open_group(&mut self, start: usize) -> Result<(), PatternError> {
        if !self.eat('?') {
            return self.open_capture(start, None);
        }
        let off = self.offset();
        let c = match self.bump() {
            None => return Err(PatternError::group_unclosed(start)),
            Some(c) => c,
        };
        match c {
            '#' => {
                while let Some(c) = self.bump() {
                    if c == ')' {
                        return Ok(());
                    }
                }
                Err(PatternError::comment_unclosed(start))
            }
            ':' => self.open_frame(GroupKind::NonCapture, start),
            '>' => self.open_frame(GroupKind::Atomic, start),
            '=' => self.open_frame(
                GroupKind::Look { behind: false, negated: false },
                start,
            ),
            '!' => self.open_frame(
                GroupKind::Look { behind: false, negated: true },
                start,
            ),
            '<' if self.eat('=') => self.open_frame(
                GroupKind::Look { behind: true, negated: false },
                start,
            ),
            '<' if self.eat('!') => self.open_frame(
                GroupKind::Look { behind: true, negated: true },
                start,
            ),
            '<' => {
                let name = self.parse_group_name('>', start)?;
                self.open_capture(start, Some(name))
            }
            '\'' => {
                let name = self.parse_group_name('\'', start)?;
                self.open_capture(start, Some(name))
            }
            'P' => match self.bump() {
                Some('<') => {
                    let name = self.parse_group_name('>', start)?;
                    self.open_capture(start, Some(name))
                }
                Some('=') => {
                    let name_off = self.offset();
                    let name = self.parse_group_name(')', start)?;
                    let groups = self.resolve_name(&name, name_off)?;
                    self.push_backref(groups);
                    Ok(())
                }
                Some('>') => {
                    Err(PatternError::unsupported(start, "subroutine call"))
                }
                Some(_) => Err(PatternError::flag_unknown(off, 'P')),
                None => Err(PatternError::group_unclosed(start)),
            },
            '(' => self.open_conditional(start),
            '|' => {
                Err(PatternError::unsupported(start, "branch reset group"))
            }
            'R' | '&' | '+' | '0'..='9' => {
                Err(PatternError::unsupported(start, "subroutine call"))
            }
            _ => {
                self.pos -= 1;
                self.parse_flags(start)
            }
        }
    }

    /// Parse the flags of an inline flag group, e.g., `(?i-s)` or
    /// `(?x:...)`. The `(?` has already been consumed.
    fn parse_flags(&mut self, start: usize) -> Result<(), PatternError> {
        let mut scope = self.scope;
        let mut negate = false;
        let mut negated_any = false;
        let mut ascii = false;
        let mut unicode = false;
        let end = loop {
            let off = self.offset();
            let c = match self.bump() {
                None => return Err(PatternError::flag_unexpected_eof(off)),
                Some(c) => c,
            };
            let flag = match c {
                ')' | ':' => {
                    if negate && !negated_any {
                        return Err(PatternError::flag_dangling_negation(off));
                    }
                    break c;
                }
                '-' => {
                    if negate {
                        return Err(PatternError::flag_unknown(off, c));
                    }
                    if self.char().map_or(false, |c| c.is_ascii_digit()) {
                        return Err(PatternError::unsupported(
                            start,
                            "subroutine call",
                        ));
                    }
                    negate = true;
                    continue;
                }
                c => match Flags::from_inline(c) {
                    None => return Err(PatternError::flag_unknown(off, c)),
                    Some(flag) => flag,
                },
            };
            if flag == Flags::ASCII || flag == Flags::UNICODE {
                if negate {
                    return Err(PatternError::flag_cannot_negate(off, c));
                }
                if flag == Flags::UNICODE {
                    if !self.text {
                        return Err(PatternError::flag_unicode_bytes(off));
                    }
                    if ascii || scope.ascii {
                        return Err(PatternError::flag_ascii_unicode(off));
                    }
                    unicode = true;
                    scope.unicode_explicit = true;
                } else {
                    if unicode || scope.unicode_explicit {
                        return Err(PatternError::flag_ascii_unicode(off));
                    }
                    ascii = true;
                    scope.ascii = true;
                }
                continue;
            }
            let yes = !negate;
            negated_any |= negate;
            if flag == Flags::IGNORECASE {
                scope.fold = yes;
            } else if flag == Flags::MULTILINE {
                scope.multiline = yes;
            } else if flag == Flags::DOTALL {
                scope.dotall = yes;
            } else if flag == Flags::VERBOSE {
                scope.verbose = yes;
            }
        };
        if end == ':' {
            self.open_frame(GroupKind::NonCapture, start)?;
        } else {
            self.frame_mut().last = Last::Nothing;
        }
        self.scope = scope;
        Ok(())
    }

    /// Parse the condition of a conditional group. The `(?(` has already
    /// been consumed.
    fn open_conditional(&mut self, start: usize) -> Result<(), PatternError> {
        let cond_off = self.offset();
        let mut cond = String::new();
        loop {
            match self.bump() {
                None => return Err(PatternError::condition_invalid(cond_off)),
                Some(')') => break,
                Some(c) => cond.push(c),
            }
        }
        let groups = if !cond.is_empty()
            && cond.chars().all(|c| c.is_ascii_digit())
        {
            let number = match cond.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(PatternError::condition_invalid(cond_off)),
            };
            vec![self.resolve_index(number, cond_off)?]
        } else {
            let name = if cond.starts_with('<') && cond.ends_with('>')
                || cond.starts_with('\'') && cond.ends_with('\'')
            {
                cond.get(1..cond.len().saturating_sub(1)).unwrap_or("")
            } else {
                cond.as_str()
            };
            if !self.is_group_name(name) {
                return Err(PatternError::condition_invalid(cond_off));
            }
            self.resolve_name(name, cond_off)?
        };
        self.open_frame(GroupKind::Conditional(groups), start)
    }

    fn close_group(&mut self, start: usize) -> Result<(), PatternError> {
        let frame = match self.stack.pop() {
            None => return Err(PatternError::group_unopened(start)),
            Some(frame) => frame,
        };
        self.scope = frame.outer;
        let offset = frame.offset;
        let kind = frame.kind.clone();
        let mut branches = frame.into_branches();
        let node = match kind {
            GroupKind::Capture(index) => Node::Capture {
                index,
                node: Box::new(Node::alternate(branches)),
            },
            GroupKind::NonCapture => Node::alternate(branches),
            GroupKind::Atomic => {
                Node::Atomic(Box::new(Node::alternate(branches)))
            }
            GroupKind::Look { behind, negated } => {
                self.look_depth -= 1;
                Node::LookAround(LookAround {
                    node: Box::new(Node::alternate(branches)),
                    behind,
                    negated,
                    width: Width::ZERO,
                    offset,
                })
            }
            GroupKind::Conditional(groups) => {
                if branches.len() > 2 {
                    return Err(PatternError::condition_too_many_branches(
                        offset,
                    ));
                }
                let no = if branches.len() == 2 {
                    branches.pop().unwrap_or(Node::Empty)
                } else {
                    Node::Empty
                };
                let yes = branches.pop().unwrap_or(Node::Empty);
                let (yes, no) = (Box::new(yes), Box::new(no));
                Node::Conditional { groups, yes, no }
            }
        };
        self.push_atom(node);
        Ok(())
    }

    fn is_group_name(&self, name: &str) -> bool {
        if self.text {
            return unicode::is_group_name(name);
        }
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first == '_' || first.is_ascii_alphabetic() => {
                chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
            }
            _ => false,
        }
    }

    /// Parse a group name terminated by `close`.
    fn parse_group_name(
        &mut self,
        close: char,
        start: usize,
    ) -> Result<String, PatternError> {
        let name_off = self.offset();
        let mut name = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(PatternError::group_name_unterminated(start))
                }
                Some(c) if c == close => break,
                Some(c) => name.push(c),
            }
        }
        if !self.is_group_name(&name) {
            return Err(PatternError::group_name_invalid(name_off, &name));
        }
        Ok(name)
    }

    /// Resolve a reference to an explicit group by number.
    fn resolve_index(
        &mut self,
        number: u32,
        offset: usize,
    ) -> Result<usize, PatternError> {
        let index = number as usize;
        if index >= 1 && index <= self.names.len() {
            return Ok(index);
        }
        match self.known {
            Some(info) if index >= 1 && index <= info.explicit_group_len() => {
                Ok(index)
            }
            Some(_) => Err(PatternError::group_number_invalid(offset, number)),
            None if index == 0 => {
                Err(PatternError::group_number_invalid(offset, number))
            }
            None => {
                self.unresolved = true;
                Ok(index)
            }
        }
    }

    /// Resolve a reference to every explicit group using the given name.
    fn resolve_name(
        &mut self,
        name: &str,
        offset: usize,
    ) -> Result<Vec<usize>, PatternError> {
        if let Some(info) = self.known {
            let indices = info.to_indices(name);
            if indices.is_empty() {
                return Err(PatternError::group_name_unknown(offset, name));
            }
            return Ok(indices.to_vec());
        }
        let indices: Vec<usize> = self
            .names
            .iter()
            .enumerate()
            .filter(|&(_, n)| n.as_deref() == Some(name))
            .map(|(i, _)| i + 1)
            .collect();
        // With duplicate names, a later group may still join the set.
        if indices.is_empty() || self.config.allow_duplicate_names {
            self.unresolved = true;
        }
        Ok(indices)
    }

    fn push_backref(&mut self, groups: Vec<usize>) {
        let node = Node::BackRef {
            groups,
            fold: self.scope.fold,
            unicode: self.unicode(),
        };
        self.push_atom(node);
    }

    /// Parse an escape sequence outside of a class. The `\` has already
    /// been consumed.
    fn parse_escape(&mut self, start: usize) -> Result<(), PatternError> {
        let c = match self.bump() {
            None => return Err(PatternError::escape_unexpected_eof(start)),
            Some(c) => c,
        };
        let word = |unicode: bool, negated: bool| match (unicode, negated) {
            (false, false) => Look::WordAscii,
            (false, true) => Look::WordAsciiNegate,
            (true, false) => Look::WordUnicode,
            (true, true) => Look::WordUnicodeNegate,
        };
        match c {
            'A' => self.push_assertion(Node::Look(Look::Start)),
            'Z' | 'z' => self.push_assertion(Node::Look(Look::End)),
            'b' => {
                let look = word(self.unicode(), false);
                self.push_assertion(Node::Look(look));
            }
            'B' => {
                let look = word(self.unicode(), true);
                self.push_assertion(Node::Look(look));
            }
            'G' => self.push_assertion(Node::SearchStart),
            'K' => {
                if self.look_depth > 0 {
                    return Err(PatternError::unsupported(
                        start,
                        "\\K in a lookaround assertion",
                    ));
                }
                self.push_assertion(Node::KeepOut);
            }
            'Q' => loop {
                if self.char() == Some('\\') && self.peek_at(1) == Some('E') {
                    self.pos += 2;
                    break;
                }
                match self.bump() {
                    None => break,
                    Some(c) => self.push_literal(u32::from(c)),
                }
            },
            'E' => {}
            'R' => {
                let node = self.linebreak();
                self.push_atom(node);
            }
            'X' => {
                let node = self.grapheme();
                self.push_atom(node);
            }
            'N' if self.char() == Some('{') => {
                let cp = self.parse_named_codepoint(start)?;
                self.push_literal(cp);
            }
            'N' => self.push_atom(Node::AnyNotNewline),
            'g' => self.parse_g_reference(start)?,
            'k' => {
                let close = match self.bump() {
                    Some('<') => '>',
                    Some('\'') => '\'',
                    Some('{') => '}',
                    _ => return Err(PatternError::escape_unknown(start, 'k')),
                };
                let name_off = self.offset();
                let name = self.parse_group_name(close, start)?;
                let groups = self.resolve_name(&name, name_off)?;
                self.push_backref(groups);
            }
            'p' | 'P' => {
                let set = self.parse_property(start)?;
                let node = self.class(set, c == 'P');
                self.push_atom(node);
            }
            '0'..='9' => self.parse_digit_escape(start, c)?,
            c => match Perl::from_escape(c) {
                Some((perl, negated)) => {
                    let set = perl.to_set(self.unicode(), self.max_cp());
                    let node = self.class(set, negated);
                    self.push_atom(node);
                }
                None => {
                    let cp = self.simple_escape(start, c)?;
                    self.push_literal(cp);
                }
            },
        }
        Ok(())
    }

    /// Parse the escapes that always denote a single codepoint: control
    /// characters, hex escapes and escaped punctuation. The escaped
    /// character `c` has already been consumed.
    fn simple_escape(
        &mut self,
        start: usize,
        c: char,
    ) -> Result<u32, PatternError> {
        let cp = match c {
            'a' => 0x07,
            'e' => 0x1B,
            'f' => 0x0C,
            'n' => 0x0A,
            'r' => 0x0D,
            't' => 0x09,
            'x' if self.eat('{') => {
                let mut digits = String::new();
                loop {
                    match self.bump() {
                        Some('}') => break,
                        Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                        _ => {
                            return Err(PatternError::escape_hex_invalid(start))
                        }
                    }
                }
                if digits.is_empty() {
                    return Err(PatternError::escape_hex_invalid(start));
                }
                match u32::from_str_radix(&digits, 16) {
                    Ok(cp) => cp,
                    Err(_) => {
                        return Err(PatternError::escape_codepoint_invalid(
                            start,
                            u32::MAX,
                        ))
                    }
                }
            }
            'x' => self.parse_hex_digits(start, 2)?,
            'u' if self.text => self.parse_hex_digits(start, 4)?,
            'U' if self.text => self.parse_hex_digits(start, 8)?,
            c if c.is_ascii_alphanumeric() => {
                return Err(PatternError::escape_unknown(start, c))
            }
            c => u32::from(c),
        };
        self.check_codepoint(start, cp)
    }

    /// Parse exactly `count` hex digits.
    fn parse_hex_digits(
        &mut self,
        start: usize,
        count: usize,
    ) -> Result<u32, PatternError> {
        let mut cp: u32 = 0;
        for _ in 0..count {
            let digit = match self.char().and_then(|c| c.to_digit(16)) {
                None => return Err(PatternError::escape_hex_invalid(start)),
                Some(digit) => digit,
            };
            self.pos += 1;
            cp = match cp.checked_mul(16) {
                Some(cp) => cp + digit,
                None => {
                    return Err(PatternError::escape_codepoint_invalid(
                        start,
                        u32::MAX,
                    ))
                }
            };
        }
        Ok(cp)
    }

    /// Check that `cp` is something this pattern can match: a scalar value
    /// for text patterns, or a byte for byte patterns.
    fn check_codepoint(
        &self,
        start: usize,
        cp: u32,
    ) -> Result<u32, PatternError> {
        let ok = if self.text {
            char::from_u32(cp).is_some()
        } else {
            cp <= MAX_BYTE
        };
        if ok {
            Ok(cp)
        } else {
            Err(PatternError::escape_codepoint_invalid(start, cp))
        }
    }

    /// Parse `{U+XXXX}` after a `\N`.
    fn parse_named_codepoint(
        &mut self,
        start: usize,
    ) -> Result<u32, PatternError> {
        self.pos += 1;
        if !(self.eat('U') && self.eat('+')) {
            return Err(PatternError::unsupported(
                start,
                "named Unicode characters",
            ));
        }
        let mut cp: u32 = 0;
        let mut digits = 0;
        loop {
            match self.bump() {
                Some('}') if digits > 0 => break,
                Some(c) if c.is_ascii_hexdigit() => {
                    digits += 1;
                    let digit = c.to_digit(16).unwrap_or(0);
                    cp = cp.saturating_mul(16).saturating_add(digit);
                }
                _ => return Err(PatternError::escape_hex_invalid(start)),
            }
        }
        self.check_codepoint(start, cp)
    }

    /// Parse the name of a Unicode property after `\p` or `\P`, returning
    /// the (non-negated) set it names.
    fn parse_property(
        &mut self,
        start: usize,
    ) -> Result<CharSet, PatternError> {
        if !self.text {
            return Err(PatternError::unicode_property_bytes(start));
        }
        let mut name = String::new();
        if self.eat('{') {
            loop {
                match self.bump() {
                    None => {
                        return Err(PatternError::unicode_property_invalid(
                            start, &name,
                        ))
                    }
                    Some('}') => break,
                    Some(c) => name.push(c),
                }
            }
        } else {
            match self.bump() {
                None => return Err(PatternError::escape_unexpected_eof(start)),
                Some(c) => name.push(c),
            }
        }
        unicode::property(&name).ok_or_else(|| {
            PatternError::unicode_property_invalid(start, &name)
        })
    }

    /// Parse an escape beginning with a decimal digit outside of a class:
    /// an octal escape or a numbered backreference.
    fn parse_digit_escape(
        &mut self,
        start: usize,
        first: char,
    ) -> Result<(), PatternError> {
        let is_octal =
            |c: Option<char>| c.map_or(false, |c| ('0'..='7').contains(&c));
        let value = |c: char| c.to_digit(10).unwrap_or(0);
        if first == '0' {
            let mut cp = 0;
            for _ in 0..2 {
                if !is_octal(self.char()) {
                    break;
                }
                cp = cp * 8 + self.bump().map_or(0, value);
            }
            self.push_literal(cp);
            return Ok(());
        }
        let second = match self.char().filter(|c| c.is_ascii_digit()) {
            None => {
                let index = self.resolve_index(value(first), start)?;
                self.push_backref(vec![index]);
                return Ok(());
            }
            Some(second) => second,
        };
        if is_octal(Some(first))
            && is_octal(Some(second))
            && is_octal(self.peek_at(1))
        {
            let third = self.peek_at(1).map_or(0, value);
            let cp = value(first) * 64 + value(second) * 8 + third;
            if cp > 0o377 {
                return Err(PatternError::escape_octal_invalid(start));
            }
            self.pos += 2;
            let cp = self.check_codepoint(start, cp)?;
            self.push_literal(cp);
            return Ok(());
        }
        let number = value(first) * 10 + value(second);
        let total = match self.known {
            Some(info) => info.explicit_group_len(),
            None => self.names.len(),
        };
        if number as usize <= total {
            self.pos += 1;
            self.push_backref(vec![number as usize]);
        } else if self.known.is_none() {
            self.pos += 1;
            self.unresolved = true;
            self.push_backref(vec![number as usize]);
        } else {
            // Group 1-9 followed by a literal digit.
            let index = self.resolve_index(value(first), start)?;
            self.push_backref(vec![index]);
        }
        Ok(())
    }

    /// Parse the forms of `\g` that refer to a group: `\gN`, `\g-N`,
    /// `\g{N}`, `\g{-N}` and `\g{name}`.
    fn parse_g_reference(&mut self, start: usize) -> Result<(), PatternError> {
        let reference = match self.char() {
            Some('{') => {
                self.pos += 1;
                let mut reference = String::new();
                loop {
                    match self.bump() {
                        None => {
                            return Err(PatternError::group_name_unterminated(
                                start,
                            ))
                        }
                        Some('}') => break,
                        Some(c) => reference.push(c),
                    }
                }
                reference
            }
            Some('<') | Some('\'') => {
                return Err(PatternError::unsupported(start, "subroutine call"))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let mut reference = String::new();
                if self.eat('-') {
                    reference.push('-');
                }
                while let Some(c) = self.char().filter(char::is_ascii_digit) {
                    reference.push(c);
                    self.pos += 1;
                }
                reference
            }
            _ => return Err(PatternError::escape_unknown(start, 'g')),
        };
        let (relative, digits) = match reference.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, reference.as_str()),
        };
        let groups = if !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
        {
            let number = match digits.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(PatternError::group_number_invalid(start, 0)),
            };
            let number = if relative {
                let opened = self.names.len() as u32;
                if number > opened {
                    return Err(PatternError::group_number_invalid(start, 0));
                }
                opened + 1 - number
            } else {
                number
            };
            vec![self.resolve_index(number, start)?]
        } else if !relative && self.is_group_name(digits) {
            self.resolve_name(digits, start)?
        } else {
            return Err(PatternError::group_name_invalid(start, &reference));
        };
        self.push_backref(groups);
        Ok(())
    }

    /// `\R`: any Unicode line break sequence, with `\r\n` taken as a unit.
    fn linebreak(&self) -> Node {
        let crlf = crlf();
        let any = Perl::VerticalSpace.to_set(false, self.max_cp());
        Node::Atomic(Box::new(Node::Alternate(vec![crlf, Node::Class(any)])))
    }

    /// `\X`: an approximation of an extended grapheme cluster. This is a
    /// non-mark followed by any number of marks, or a run of marks, or
    /// `\r\n`. For byte patterns, it is `\r\n` or any byte.
    fn grapheme(&self) -> Node {
        let crlf = crlf();
        if !self.text {
            let any = Node::Alternate(vec![crlf, Node::Any]);
            return Node::Atomic(Box::new(any));
        }
        let marks = unicode::named_set(r"\p{M}");
        let mut base = marks.clone();
        base.negate(MAX_TEXT);
        let repeat = |min| {
            Node::Repeat(Repeat {
                node: Box::new(Node::Class(marks.clone())),
                min,
                max: None,
                kind: RepeatKind::Greedy,
            })
        };
        let cluster = Node::Concat(vec![Node::Class(base), repeat(0)]);
        Node::Atomic(Box::new(Node::Alternate(vec![crlf, cluster, repeat(1)])))
    }

    /// Parse a bracketed class. The `[` has already been consumed.
    fn parse_class(&mut self, start: usize) -> Result<CharSet, PatternError> {
        if self.stack.len() + self.class_depth as usize
            >= self.config.nest_limit as usize
        {
            return Err(PatternError::nest_limit_exceeded(
                start,
                self.config.nest_limit,
            ));
        }
        self.class_depth += 1;
        let result = self.parse_class_body(start);
        self.class_depth -= 1;
        result
    }

    fn parse_class_body(
        &mut self,
        start: usize,
    ) -> Result<CharSet, PatternError> {
        let negated = self.eat('^');
        let set_ops = self.config.flags.contains(Flags::CLASS_SET_OPERATIONS);
        // The result of every operand combined so far, along with the
        // operator that combines it with the operand being parsed.
        let mut combined: Option<(CharSet, SetOp)> = None;
        let mut operand = CharSet::empty();
        let mut first = true;
        loop {
            let off = self.offset();
            let c = match self.char() {
                None => return Err(PatternError::class_unclosed(start)),
                Some(c) => c,
            };
            if c == ']' && !first {
                self.pos += 1;
                break;
            }
            let op = self.class_operator().filter(|_| set_ops && !first);
            if let Some(op) = op {
                self.pos += 2;
                if self.class_operator().is_some() {
                    return Err(PatternError::class_set_operator_repeated(off));
                }
                let lhs = self.combine(combined.take(), operand);
                combined = Some((lhs, op));
                operand = CharSet::empty();
                continue;
            }
            first = false;
            self.parse_class_item(&mut operand, set_ops)?;
        }
        let mut set = self.combine(combined, operand);
        if negated {
            set.negate(self.max_cp());
        }
        Ok(set)
    }

    /// Returns the set operator at the current position, if there is one.
    /// An operator immediately before the closing `]` is not an operator.
    fn class_operator(&self) -> Option<SetOp> {
        let c = self.char()?;
        let op = SetOp::from_char(c)?;
        if self.peek_at(1) != Some(c) || self.peek_at(2) == Some(']') {
            return None;
        }
        Some(op)
    }

    /// Fold `operand` under the current flags and combine it with what came
    /// before it.
    fn combine(
        &self,
        combined: Option<(CharSet, SetOp)>,
        mut operand: CharSet,
    ) -> CharSet {
        if self.scope.fold {
            operand.case_fold(self.unicode());
        }
        match combined {
            None => operand,
            Some((mut lhs, op)) => {
                op.apply(&mut lhs, &operand);
                lhs
            }
        }
    }

    /// Parse a single item of a class, which is a codepoint, a range or a
    /// nested class, adding it to `operand`.
    fn parse_class_item(
        &mut self,
        operand: &mut CharSet,
        set_ops: bool,
    ) -> Result<(), PatternError> {
        let start = self.offset();
        let lo = match self.parse_class_atom(set_ops)? {
            ClassAtom::Set(set) => {
                if self.is_class_range() {
                    return Err(PatternError::class_range_literal(start));
                }
                operand.union(&set);
                return Ok(());
            }
            ClassAtom::Char(cp) => cp,
        };
        if !self.is_class_range() {
            operand.push(lo, lo);
            return Ok(());
        }
        self.pos += 1;
        let hi = match self.parse_class_atom(set_ops)? {
            ClassAtom::Set(_) => {
                return Err(PatternError::class_range_literal(start))
            }
            ClassAtom::Char(cp) => cp,
        };
        if lo > hi {
            let ch = |cp| char::from_u32(cp).unwrap_or('\u{FFFD}');
            let (lo, hi) = (ch(lo), ch(hi));
            return Err(PatternError::class_range_invalid(start, lo, hi));
        }
        operand.push(lo, hi);
        Ok(())
    }

    /// Whether the current position is the `-` of a range. A `-` before the
    /// closing `]` or the end of the pattern is a literal, as is the start
    /// of a `--` operator.
    fn is_class_range(&self) -> bool {
        if self.char() != Some('-') {
            return false;
        }
        match self.peek_at(1) {
            None | Some(']') => false,
            Some('-') => {
                !self.config.flags.contains(Flags::CLASS_SET_OPERATIONS)
            }
            Some(_) => true,
        }
    }

    fn parse_class_atom(
        &mut self,
        set_ops: bool,
    ) -> Result<ClassAtom, PatternError> {
        let start = self.offset();
        let c = match self.bump() {
            None => return Err(PatternError::class_unclosed(start)),
            Some(c) => c,
        };
        match c {
            '[' if self.char() == Some(':') => match self.parse_posix(start)? {
                Some(set) => Ok(ClassAtom::Set(set)),
                None => Ok(ClassAtom::Char(u32::from('['))),
            },
            '[' if set_ops => Ok(ClassAtom::Set(self.parse_class(start)?)),
            '\\' => self.parse_class_escape(start),
            c => Ok(ClassAtom::Char(u32::from(c))),
        }
    }

    /// Parse a POSIX class like `[:alpha:]` or `[:^alpha:]`. The `[` has
    /// been consumed. If no `:]` terminates the name, nothing is consumed
    /// and `None` is returned.
    fn parse_posix(
        &mut self,
        start: usize,
    ) -> Result<Option<CharSet>, PatternError> {
        let saved = self.pos;
        self.pos += 1;
        let negated = self.eat('^');
        let mut name = String::new();
        while let Some(c) = self.char().filter(|c| c.is_ascii_alphabetic()) {
            name.push(c);
            self.pos += 1;
        }
        if !(self.eat(':') && self.eat(']')) {
            self.pos = saved;
            return Ok(None);
        }
        let posix = match Posix::from_name(&name) {
            None => {
                return Err(PatternError::class_posix_unknown(start, &name))
            }
            Some(posix) => posix,
        };
        let mut set = posix.to_set(self.unicode());
        if negated {
            set.negate(self.max_cp());
        }
        Ok(Some(set))
    }

    /// Parse an escape inside a class. The `\` has been consumed.
    fn parse_class_escape(
        &mut self,
        start: usize,
    ) -> Result<ClassAtom, PatternError> {
        let c = match self.bump() {
            None => return Err(PatternError::escape_unexpected_eof(start)),
            Some(c) => c,
        };
        if let Some((perl, negated)) = Perl::from_escape(c) {
            let mut set = perl.to_set(self.unicode(), self.max_cp());
            if negated {
                set.negate(self.max_cp());
            }
            return Ok(ClassAtom::Set(set));
        }
        let cp = match c {
            'b' => 0x08,
            'p' | 'P' => {
                let mut set = self.parse_property(start)?;
                if c == 'P' {
                    set.negate(self.max_cp());
                }
                return Ok(ClassAtom::Set(set));
            }
            'N' if self.char() == Some('{') => {
                self.parse_named_codepoint(start)?
            }
            'E' => return Ok(ClassAtom::Set(CharSet::empty())),
            'Q' => {
                let mut set = CharSet::empty();
                loop {
                    if self.char() == Some('\\')
                        && self.peek_at(1) == Some('E')
                    {
                        self.pos += 2;
                        break;
                    }
                    match self.bump() {
                        None => break,
                        Some(c) => set.push(u32::from(c), u32::from(c)),
                    }
                }
                return Ok(ClassAtom::Set(set));
            }
            '0'..='7' => {
                let mut cp = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.char().and_then(|c| c.to_digit(8)) {
                        None => break,
                        Some(d) => {
                            self.pos += 1;
                            cp = cp * 8 + d;
                        }
                    }
                }
                if cp > 0o377 {
                    return Err(PatternError::escape_octal_invalid(start));
                }
                self.check_codepoint(start, cp)?
            }
            'a' | 'e' | 'f' | 'n' | 'r' | 't' | 'x' | 'u' | 'U' => {
                self.simple_escape(start, c)?
            }
            c if c.is_ascii_alphanumeric() => {
                return Err(PatternError::escape_unknown(start, c))
            }
            c => u32::from(c),
        };
        Ok(ClassAtom::Char(cp))
    }
}

/// The two character sequence `\r\n`.
fn crlf() -> Node {
    Node::Concat(vec![Node::Literal(0x0D), Node::Literal(0x0A)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(flags: Flags) -> Config {
        Config { flags, allow_duplicate_names: false, nest_limit: 250 }
    }

    fn parse_str(pattern: &str) -> Result<Ast, PatternError> {
        parse(pattern, &config(Flags::EMPTY))
    }

    /// Returns the codepoint a pattern parses to, if it is one literal.
    fn literal(pattern: &str) -> Option<u32> {
        match parse_str(pattern).unwrap().root {
            Node::Literal(cp) => Some(cp),
            _ => None,
        }
    }

    fn parse_flags(pattern: &str, flags: Flags) -> Result<Ast, PatternError> {
        parse(pattern, &config(flags))
    }

    fn class_of(pattern: &str, flags: Flags) -> CharSet {
        match parse_flags(pattern, flags).unwrap().root {
            Node::Class(set) => set,
            node => panic!("expected a class, got {:?}", node),
        }
    }

    fn contains(set: &CharSet, s: &str) -> bool {
        s.chars().all(|c| set.contains(u32::from(c)))
    }

    #[test]
    fn group_numbering() {
        let ast = parse_str(r"(a)(?:b)(?P<x>c)(?<y>d)(?'z'e)((f))").unwrap();
        let info = &ast.group_info;
        assert_eq!(6, info.explicit_group_len());
        assert_eq!(Some(2), info.to_index("x"));
        assert_eq!(Some(3), info.to_index("y"));
        assert_eq!(Some(4), info.to_index("z"));
    }

    #[test]
    fn forward_references() {
        let ast = parse_str(r"(?(x)a|b)\k<x>(?P<x>c)").unwrap();
        assert_eq!(1, ast.group_info.explicit_group_len());
        assert!(parse_str(r"\2(a)(b)").is_ok());
        assert!(parse_str(r"\2(a)").is_err());
        assert!(parse_str(r"\k<nope>(?P<x>c)").is_err());
    }

    #[test]
    fn two_digit_backreferences() {
        // With fewer than 11 groups, \11 is group 1 followed by '1'.
        let ast = parse_str(r"(a)\11").unwrap();
        match ast.root {
            Node::Concat(ref nodes) => {
                assert_eq!(3, nodes.len());
                assert!(matches!(nodes[2], Node::Literal(0x31)));
            }
            ref node => panic!("unexpected {:?}", node),
        }
        let many = "(a)".repeat(11) + r"\11";
        match parse_str(&many).unwrap().root {
            Node::Concat(ref nodes) => {
                assert_eq!(12, nodes.len());
                match nodes[11] {
                    Node::BackRef { ref groups, .. } => {
                        assert_eq!(&[11][..], &groups[..])
                    }
                    ref node => panic!("unexpected {:?}", node),
                }
            }
            ref node => panic!("unexpected {:?}", node),
        }
        // Three octal digits make an octal escape.
        assert_eq!(Some(0x61), literal(r"\141"));
        assert!(parse_str(r"\477").is_err());
    }

    #[test]
    fn repeat_errors() {
        assert!(parse_str("*").is_err());
        assert!(parse_str("a|*").is_err());
        assert!(parse_str("^*").is_err());
        assert!(parse_str(r"\b*").is_err());
        assert!(parse_str("x**").is_err());
        assert!(parse_str("x*??").is_err());
        assert!(parse_str("x*{1,2}").is_err());
        assert!(parse_str("x{2,1}").is_err());
        assert!(parse_str("x{65536}").is_err());
        assert!(parse_str("{1}").is_err());
        assert!(parse_str("x*?").is_ok());
        assert!(parse_str("x*+").is_ok());
        assert!(parse_str("(?:)*").is_ok());
        assert!(parse_str("(?=a)*").is_ok());
    }

    #[test]
    fn counted_repeats() {
        let bounds = |pattern: &str| match parse_str(pattern).unwrap().root {
            Node::Repeat(rep) => Some((rep.min, rep.max)),
            _ => None,
        };
        assert_eq!(Some((2, Some(3))), bounds("x{2,3}"));
        assert_eq!(Some((2, Some(2))), bounds("x{2}"));
        assert_eq!(Some((2, None)), bounds("x{2,}"));
        assert_eq!(Some((0, Some(3))), bounds("x{,3}"));
        assert_eq!(Some((0, None)), bounds("x{,}"));
        // Not a valid bound, so the brace is a literal.
        assert_eq!(None, bounds("x{}"));
        assert_eq!(None, bounds("x{a}"));
        assert_eq!(None, bounds("x{1"));
    }

    #[test]
    fn flag_errors() {
        let patterns = &[
            "(?-",
            "(?-+",
            "(?-z",
            "(?-i",
            "(?i",
            "(?i+",
            "(?iz",
            "(?z)",
            "(?L)",
            "(?-)",
            "(?-a)",
            "(?au)",
        ];
        for pattern in patterns {
            assert!(parse_str(pattern).is_err(), "{:?}", pattern);
        }
        assert!(parse_flags("(?u)", Flags::ASCII).is_err());
        assert!(parse_flags("(?a)", Flags::UNICODE).is_err());
        assert!(parse_flags("", Flags::ASCII | Flags::UNICODE).is_err());
        assert!(parse(&b"(?u)"[..], &config(Flags::EMPTY)).is_err());
        assert!(parse(&b"a"[..], &config(Flags::UNICODE)).is_err());
        assert!(parse_str("(?i-s:a)(?x)").is_ok());
    }

    #[test]
    fn conditional_errors() {
        let patterns = &[
            "(a)(?(0)b)",
            "(a)(?(+1)b)",
            "(a)(?(-1)b)",
            "(a)(?(1a)b)",
            "(?P<a>a)(?(a.)b)",
            "(a)(?( 1)b)",
            "(a)(?(١)b)",
            "(a)(?(1)b|c|d)",
            "(?(x)a)",
            "(?()a)",
        ];
        for pattern in patterns {
            assert!(parse_str(pattern).is_err(), "{:?}", pattern);
        }
        assert!(parse_str("(a)(?(1)b|c)").is_ok());
        assert!(parse_str("(?P<a>a)(?(a)b)").is_ok());
        assert!(parse_str("(?P<a>a)(?(<a>)b)").is_ok());
    }

    #[test]
    fn escape_errors() {
        for c in "cijlmopqyCFIJLMOPTY".chars() {
            let pattern = format!(r"\{}", c);
            assert!(parse_str(&pattern).is_err(), "{:?}", pattern);
        }
        for c in "cijlmopqyzABCFIJLMOPTYZ".chars() {
            let pattern = format!(r"[\{}]", c);
            assert!(parse_str(&pattern).is_err(), "{:?}", pattern);
        }
        assert!(parse_str("\\").is_err());
        assert!(parse_str(r"\x1").is_err());
        assert!(parse_str(r"\x{110000}").is_err());
        assert!(parse(&br"\x{100}"[..], &config(Flags::EMPTY)).is_err());
        assert!(parse(&br"\p{L}"[..], &config(Flags::EMPTY)).is_err());
        assert!(parse_str(r"\p{Bogus}").is_err());
        assert!(parse_str(r"(?<=a\K)").is_err());
        assert!(parse_str(r"\g<1>(a)").is_err());
    }

    #[test]
    fn escapes() {
        assert_eq!(Some(0x41), literal(r"\x41"));
        assert_eq!(Some(0x263A), literal(r"\x{263A}"));
        assert_eq!(Some(0x263A), literal(r"☺"));
        assert_eq!(Some(0x263A), literal(r"\N{U+263A}"));
        assert_eq!(Some(0), literal(r"\0"));
        assert_eq!(Some(0o12), literal(r"\012"));
        assert_eq!(Some(0x25), literal(r"\%"));
        assert_eq!(Some(0x1B), literal(r"\e"));
        match parse_str(r"\Qa.b\E").unwrap().root {
            Node::Concat(nodes) => assert_eq!(3, nodes.len()),
            node => panic!("unexpected {:?}", node),
        }
    }

    #[test]
    fn classes() {
        let set = class_of("[a-c]", Flags::EMPTY);
        assert!(contains(&set, "abc"));
        assert!(!contains(&set, "d"));

        let set = class_of("[]a]", Flags::EMPTY);
        assert!(contains(&set, "]a"));

        let set = class_of("[^a]", Flags::EMPTY);
        assert!(!contains(&set, "a"));
        assert!(contains(&set, "b\u{10FFFF}"));

        let set = class_of("[a-]", Flags::EMPTY);
        assert!(contains(&set, "a-"));

        let set = class_of("[%--]", Flags::EMPTY);
        assert!(contains(&set, "%&+,-"));

        let set = class_of(r"[\w-]", Flags::EMPTY);
        assert!(contains(&set, "a-"));

        let set = class_of("[[:alpha:][:digit:]]", Flags::EMPTY);
        assert!(contains(&set, "aZ9"));
        assert!(!contains(&set, "_"));

        let set = class_of("[[:^digit:]]", Flags::EMPTY);
        assert!(!contains(&set, "5"));

        let set = class_of("[K]", Flags::IGNORECASE);
        assert!(contains(&set, "Kk\u{212A}"));

        let set = class_of("[^k]", Flags::IGNORECASE);
        assert!(!contains(&set, "K"));
    }

    #[test]
    fn class_operators_are_literal_by_default() {
        let set = class_of("[0-9--1]", Flags::EMPTY);
        assert!(contains(&set, "-./0123456789"));
        let set = class_of("[0-9&&1]", Flags::EMPTY);
        assert!(contains(&set, "&0123456789"));
        assert!(!contains(&set, "a"));
    }

    #[test]
    fn class_set_operations() {
        let ops = Flags::CLASS_SET_OPERATIONS;
        let set = class_of("[0-9--1]", ops);
        assert!(contains(&set, "02"));
        assert!(!contains(&set, "1-"));

        let set = class_of("[a-z&&[aeiou]]", ops);
        assert!(contains(&set, "aeiou"));
        assert!(!contains(&set, "b"));

        let set = class_of("[a-c||x]", ops);
        assert!(contains(&set, "abcx"));

        let set = class_of("[a-c~~b-d]", ops);
        assert!(contains(&set, "ad"));
        assert!(!contains(&set, "bc"));

        // A trailing operator is literal.
        let set = class_of("[a--]", ops);
        assert!(contains(&set, "a-"));

        assert!(parse_flags("[a&&||b]", ops).is_err());
        assert!(parse_flags("[a--&&b]", ops).is_err());
    }

    #[test]
    fn class_errors() {
        let patterns = &[
            "[", "[^", "[a", "[a-", r"[\w-b]", r"[a-\w]", "[b-a]", "[[:foo:]]",
        ];
        for pattern in patterns {
            assert!(parse_str(pattern).is_err(), "{:?}", pattern);
        }
    }

    #[test]
    fn group_errors() {
        assert!(parse_str("(").is_err());
        assert!(parse_str(")").is_err());
        assert!(parse_str("(?#abc").is_err());
        assert!(parse_str("(?P<1a>x)").is_err());
        assert!(parse_str("(?P<a>x)(?P<a>y)").is_err());
        assert!(parse_str("(?P<a").is_err());
        assert!(parse_str("(?P<>x)").is_err());
        let bytes = "(?P<é>x)".as_bytes();
        assert!(parse(bytes, &config(Flags::EMPTY)).is_err());
        assert!(parse_str("(?P<é>x)").is_ok());

        let mut dup = config(Flags::EMPTY);
        dup.allow_duplicate_names = true;
        let ast = parse("(?P<a>x)|(?P<a>y)", &dup).unwrap();
        assert_eq!(&[1, 2][..], ast.group_info.to_indices("a"));
    }

    #[test]
    fn nest_limit() {
        let mut limited = config(Flags::EMPTY);
        limited.nest_limit = 2;
        assert!(parse("((a))", &limited).is_ok());
        assert!(parse("(((a)))", &limited).is_err());
    }

    #[test]
    fn lookbehind_width() {
        assert!(parse_str("(?<=ab|c)").is_ok());
        assert!(parse_str("(?<=a{1,3})").is_ok());
        assert!(parse_str("(?<=a*)").is_err());
        assert!(parse_str("(?<=a{0,65536})").is_err());
        assert!(parse_str(r"(ab)(?<=\1)").is_ok());
        assert!(parse_str(r"(a*)(?<=\1)").is_err());
        match parse_str("(?<=ab|c)").unwrap().root {
            Node::LookAround(look) => {
                assert_eq!(Width { min: 1, max: Some(2) }, look.width)
            }
            node => panic!("unexpected {:?}", node),
        }
    }

    #[test]
    fn verbose_mode() {
        let ast = parse_flags("a b # comment\n c", Flags::VERBOSE).unwrap();
        match ast.root {
            Node::Concat(nodes) => assert_eq!(3, nodes.len()),
            node => panic!("unexpected {:?}", node),
        }
        // Whitespace inside a class is significant.
        let set = class_of("[ a]", Flags::VERBOSE);
        assert!(contains(&set, " a"));
        // Verbose mode is scoped.
        let ast = parse_str("(?x: a )b c").unwrap();
        match ast.root {
            Node::Concat(nodes) => assert_eq!(4, nodes.len()),
            node => panic!("unexpected {:?}", node),
        }
    }

    #[test]
    fn case_insensitive_literals() {
        match parse_flags("k", Flags::IGNORECASE).unwrap().root {
            Node::Class(set) => assert!(contains(&set, "kK\u{212A}")),
            node => panic!("unexpected {:?}", node),
        }
        let ascii = Flags::IGNORECASE | Flags::ASCII;
        match parse_flags("k", ascii).unwrap().root {
            Node::Class(set) => {
                let expected = [(0x4B, 0x4B), (0x6B, 0x6B)];
                assert_eq!(&expected[..], set.ranges());
            }
            node => panic!("unexpected {:?}", node),
        }
        let root = parse_flags("1", Flags::IGNORECASE).unwrap().root;
        assert!(matches!(root, Node::Literal(0x31)));
    }
}
