/*!
Compiles a parsed pattern into a flat program for the backtracking VM.

A program is a sequence of instructions addressed by index. Control flow is
expressed with explicit jumps and splits. Besides the capture slots, a
program owns a set of scratch registers: repetition counters, the position
at which the current iteration of a loop began, saved stack depths for
atomic groups and lookarounds, and so on. The compiler allocates registers
and the VM undoes writes to them when it backtracks, so every construct
nests without any recursion in the VM.
*/

use core::convert::TryFrom;

use alloc::{boxed::Box, vec::Vec};

use crate::{
    syntax::{
        ast::{LookAround, Node, Repeat, RepeatKind},
        class::CharSet,
        parse::Ast,
    },
    util::look::Look,
};

/// The index of an instruction in a program.
pub(crate) type InstPtr = usize;

/// A matcher of exactly one character.
#[derive(Clone, Debug)]
pub(crate) enum Single {
    Char(u32),
    Class(CharSet),
    Any,
    AnyNotNewline,
}

impl Single {
    #[inline(always)]
    pub(crate) fn matches(&self, cp: u32) -> bool {
        match *self {
            Single::Char(want) => cp == want,
            Single::Class(ref set) => set.contains(cp),
            Single::Any => true,
            Single::AnyNotNewline => cp != u32::from(b'\n'),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Inst {
    /// Report a match ending at the current position.
    Match,
    /// Consume one character that matches.
    One(Single),
    Look(Look),
    /// Succeeds only at the position the search started at.
    SearchStart,
    /// Reset the start of the overall match to the current position.
    KeepOut,
    /// Store the current position in a register.
    Save(usize),
    /// Close a capture group. Its start was saved in the `start` register
    /// when the group was entered. Writing both slots at once means a group
    /// always holds its last complete match.
    Capture { group: usize, start: usize },
    /// Try `first`, and on failure, `second`.
    Split(InstPtr, InstPtr),
    Jump(InstPtr),
    /// Reset an iteration counter before a loop.
    RepeatStart { counter: usize },
    /// The head of a loop, executed before every iteration. `counter` holds
    /// the number of iterations completed so far and `position` the
    /// position at which the most recent one began. The body of the loop
    /// starts at the next instruction, which is always a `RepeatEnter`.
    Repeat {
        counter: usize,
        position: usize,
        min: u32,
        max: Option<u32>,
        greedy: bool,
        exit: InstPtr,
    },
    /// Begin one iteration of a loop.
    RepeatEnter { counter: usize, position: usize },
    /// A repetition of a single character matcher. These need no loop and
    /// give back (or take more) characters one at a time.
    RepeatSingle {
        single: Single,
        min: u32,
        max: Option<u32>,
        kind: RepeatKind,
    },
    AtomicStart { depth: usize },
    /// Discard every backtracking choice made since the matching
    /// `AtomicStart`.
    AtomicEnd { depth: usize },
    /// Begin a lookaround. `depth` and `position` save the backtracking
    /// stack depth and the position at the start. For a lookbehind,
    /// `behind` holds the minimum and maximum number of characters the body
    /// can match. `exit` is the instruction following the `LookEnd`.
    LookStart {
        depth: usize,
        position: usize,
        negated: bool,
        behind: Option<(u32, u32)>,
        exit: InstPtr,
    },
    LookEnd { depth: usize, position: usize, negated: bool, behind: bool },
    BackRef { groups: Box<[usize]>, fold: bool, unicode: bool },
    /// Continue with the next instruction when any of `groups` is set, and
    /// at `no` otherwise.
    Cond { groups: Box<[usize]>, no: InstPtr },
}

/// A compiled pattern.
#[derive(Clone, Debug)]
pub(crate) struct Program {
    pub(crate) insts: Vec<Inst>,
    /// The number of groups, including the implicit group `0`.
    pub(crate) group_len: usize,
    /// The number of registers. The first `2 * group_len` are the capture
    /// slots.
    pub(crate) reg_len: usize,
    /// A literal string that every match must begin with, encoded the way
    /// the haystack is.
    pub(crate) prefix: Vec<u8>,
    /// True when every match must begin at offset `0`.
    pub(crate) anchored_start: bool,
    /// True when the haystack is UTF-8 text rather than Latin-1 bytes.
    pub(crate) text: bool,
}

impl Program {
    pub(crate) fn new(ast: &Ast, text: bool) -> Program {
        let group_len = ast.group_info.group_len();
        let mut compiler = Compiler { insts: vec![], next_reg: 2 * group_len };
        compiler.c(&ast.root);
        compiler.push(Inst::Match);

        let mut prefix = vec![];
        literal_prefix(&ast.root, &mut prefix);
        let prefix = encode(&prefix, text);
        let program = Program {
            insts: compiler.insts,
            group_len,
            reg_len: compiler.next_reg,
            prefix,
            anchored_start: is_anchored_start(&ast.root),
            text,
        };
        log!(log::debug!(
            "compiled program with {} instructions, {} groups, {} registers",
            program.insts.len(),
            program.group_len,
            program.reg_len,
        ));
        program
    }

    pub(crate) fn slot_len(&self) -> usize {
        2 * self.group_len
    }
}

struct Compiler {
    insts: Vec<Inst>,
    next_reg: usize,
}

impl Compiler {
    fn push(&mut self, inst: Inst) -> InstPtr {
        self.insts.push(inst);
        self.insts.len() - 1
    }

    fn pc(&self) -> InstPtr {
        self.insts.len()
    }

    fn reg(&mut self) -> usize {
        self.next_reg += 1;
        self.next_reg - 1
    }

    fn c(&mut self, node: &Node) {
        match *node {
            Node::Empty => {}
            Node::Literal(cp) => {
                self.push(Inst::One(Single::Char(cp)));
            }
            Node::Class(ref set) => {
                self.push(Inst::One(single_class(set)));
            }
            Node::Any => {
                self.push(Inst::One(Single::Any));
            }
            Node::AnyNotNewline => {
                self.push(Inst::One(Single::AnyNotNewline));
            }
            Node::Look(look) => {
                self.push(Inst::Look(look));
            }
            Node::SearchStart => {
                self.push(Inst::SearchStart);
            }
            Node::KeepOut => {
                self.push(Inst::KeepOut);
            }
            Node::Capture { index, ref node } => {
                let start = self.reg();
                self.push(Inst::Save(start));
                self.c(node);
                self.push(Inst::Capture { group: index, start });
            }
            Node::Concat(ref nodes) => {
                for node in nodes.iter() {
                    self.c(node);
                }
            }
            Node::Alternate(ref branches) => self.c_alternate(branches),
            Node::Repeat(ref rep) => self.c_repeat(rep),
            Node::Atomic(ref node) => self.c_atomic(node),
            Node::LookAround(ref look) => self.c_look(look),
            Node::BackRef { ref groups, fold, unicode } => {
                let groups = groups.clone().into_boxed_slice();
                self.push(Inst::BackRef { groups, fold, unicode });
            }
            Node::Conditional { ref groups, ref yes, ref no } => {
                let groups = groups.clone().into_boxed_slice();
                let cond = self.push(Inst::Cond { groups, no: 0 });
                self.c(yes);
                let jump = self.push(Inst::Jump(0));
                let no_pc = self.pc();
                self.c(no);
                let end = self.pc();
                if let Inst::Cond { ref mut no, .. } = self.insts[cond] {
                    *no = no_pc;
                }
                self.insts[jump] = Inst::Jump(end);
            }
        }
    }

    fn c_alternate(&mut self, branches: &[Node]) {
        let mut jumps = vec![];
        for (i, branch) in branches.iter().enumerate() {
            if i + 1 == branches.len() {
                self.c(branch);
                break;
            }
            let split = self.push(Inst::Split(0, 0));
            self.c(branch);
            jumps.push(self.push(Inst::Jump(0)));
            let next = self.pc();
            self.insts[split] = Inst::Split(split + 1, next);
        }
        let end = self.pc();
        for jump in jumps {
            self.insts[jump] = Inst::Jump(end);
        }
    }

    fn c_repeat(&mut self, rep: &Repeat) {
        if let Some(single) = as_single(&rep.node) {
            self.push(Inst::RepeatSingle {
                single,
                min: rep.min,
                max: rep.max,
                kind: rep.kind,
            });
            return;
        }
        if rep.kind == RepeatKind::Possessive {
            let depth = self.reg();
            self.push(Inst::AtomicStart { depth });
            self.c_loop(rep, true);
            self.push(Inst::AtomicEnd { depth });
            return;
        }
        self.c_loop(rep, rep.kind == RepeatKind::Greedy);
    }

    fn c_loop(&mut self, rep: &Repeat, greedy: bool) {
        if rep.max == Some(0) {
            return;
        }
        if rep.min == 1 && rep.max == Some(1) {
            self.c(&rep.node);
            return;
        }
        let counter = self.reg();
        let position = self.reg();
        self.push(Inst::RepeatStart { counter });
        let head = self.push(Inst::Repeat {
            counter,
            position,
            min: rep.min,
            max: rep.max,
            greedy,
            exit: 0,
        });
        self.push(Inst::RepeatEnter { counter, position });
        self.c(&rep.node);
        self.push(Inst::Jump(head));
        let end = self.pc();
        if let Inst::Repeat { ref mut exit, .. } = self.insts[head] {
            *exit = end;
        }
    }

    fn c_atomic(&mut self, node: &Node) {
        let depth = self.reg();
        self.push(Inst::AtomicStart { depth });
        self.c(node);
        self.push(Inst::AtomicEnd { depth });
    }

    fn c_look(&mut self, look: &LookAround) {
        let depth = self.reg();
        let position = self.reg();
        let behind = if look.behind {
            // Widths were bounded by the parser.
            Some((look.width.min, look.width.max.unwrap_or(look.width.min)))
        } else {
            None
        };
        let start = self.push(Inst::LookStart {
            depth,
            position,
            negated: look.negated,
            behind,
            exit: 0,
        });
        self.c(&look.node);
        self.push(Inst::LookEnd {
            depth,
            position,
            negated: look.negated,
            behind: look.behind,
        });
        let end = self.pc();
        if let Inst::LookStart { ref mut exit, .. } = self.insts[start] {
            *exit = end;
        }
    }
}

fn single_class(set: &CharSet) -> Single {
    match set.as_single() {
        Some(cp) => Single::Char(cp),
        None => Single::Class(set.clone()),
    }
}

fn as_single(node: &Node) -> Option<Single> {
    match *node {
        Node::Literal(cp) => Some(Single::Char(cp)),
        Node::Class(ref set) => Some(single_class(set)),
        Node::Any => Some(Single::Any),
        Node::AnyNotNewline => Some(Single::AnyNotNewline),
        _ => None,
    }
}

/// Collect the literal codepoints every match must begin with. Returns
/// false once something other than a literal is found.
fn literal_prefix(node: &Node, prefix: &mut Vec<u32>) -> bool {
    match *node {
        Node::Empty => true,
        Node::Literal(cp) => {
            prefix.push(cp);
            true
        }
        Node::Capture { ref node, .. } => literal_prefix(node, prefix),
        Node::Concat(ref nodes) => {
            nodes.iter().all(|node| literal_prefix(node, prefix))
        }
        _ => false,
    }
}

fn encode(cps: &[u32], text: bool) -> Vec<u8> {
    let mut bytes = vec![];
    for &cp in cps {
        if text {
            let mut buf = [0; 4];
            match char::from_u32(cp) {
                Some(ch) => {
                    let encoded = ch.encode_utf8(&mut buf);
                    bytes.extend_from_slice(encoded.as_bytes());
                }
                None => break,
            }
        } else {
            match u8::try_from(cp) {
                Ok(b) => bytes.push(b),
                Err(_) => break,
            }
        }
    }
    bytes
}

fn is_anchored_start(node: &Node) -> bool {
    match *node {
        Node::Look(look) => look.is_start(),
        Node::Capture { ref node, .. } | Node::Atomic(ref node) => {
            is_anchored_start(node)
        }
        Node::Concat(ref nodes) => {
            nodes.first().map_or(false, is_anchored_start)
        }
        Node::Alternate(ref branches) => {
            branches.iter().all(is_anchored_start)
        }
        _ => false,
    }
}
