use core::convert::TryFrom;

use alloc::vec::Vec;

use crate::{
    backtrack::{
        program::{Inst, InstPtr, Program},
        Backtracker,
    },
    error::LibraryError,
    syntax::{ast::RepeatKind, unicode},
    util::{search::Anchored, utf8},
};

/// The value of a register that hasn't been written.
const UNSET: usize = usize::MAX;

/// The mutable scratch space used by a search.
///
/// A cache can be reused across searches (and across patterns), which
/// avoids reallocating the backtracking stack for every search.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cache {
    /// The registers of the program, capture slots first.
    regs: Vec<usize>,
    /// An undo log of register writes. Each entry is a register and the
    /// value it held before the write.
    saves: Vec<(usize, usize)>,
    /// The backtracking stack.
    stack: Vec<Frame>,
}

impl Cache {
    pub(crate) fn new() -> Cache {
        Cache::default()
    }
}

/// A choice point on the backtracking stack. Every frame records the length
/// of the undo log when it was pushed. Popping a frame first rolls every
/// register back to what it was at that time.
#[derive(Clone, Copy, Debug)]
enum Frame {
    /// Resume at `pc` and `at`.
    Step { pc: InstPtr, at: usize, nsave: usize },
    /// A greedy single character repetition that ended at `at`. It may give
    /// back characters one at a time, but never go below `min_at`.
    GiveBack { pc: InstPtr, at: usize, min_at: usize, nsave: usize },
    /// A lazy single character repetition (the instruction at `inst`) that
    /// has taken `count` characters ending at `at`, and may take one more.
    TakeMore { inst: InstPtr, at: usize, count: u32, nsave: usize },
    /// A lookbehind whose body is currently being tried from `start`. It
    /// may still be tried from up to `remaining` characters earlier.
    Behind { pc: InstPtr, start: usize, remaining: u32, nsave: usize },
}

/// What happened after executing one instruction.
enum Outcome {
    Next,
    Fail,
    Match,
}

impl Backtracker {
    /// Search `haystack` (already truncated at the end of the search
    /// window) for a match beginning at or after `start`.
    ///
    /// On success, `slots` receives the capture slots of the match and this
    /// returns true.
    pub(crate) fn search(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        anchored: Anchored,
        not_empty_at_start: bool,
        slots: &mut [Option<usize>],
    ) -> Result<bool, LibraryError> {
        let program = &self.program;
        if program.anchored_start && start > 0 {
            return Ok(false);
        }
        let mut vm = Vm {
            program,
            backtrack_limit: self.backtrack_limit,
            stack_limit: self.stack_limit,
            haystack,
            search_start: start,
            anchored,
            not_empty_at_start,
            cache,
            steps: 0,
        };
        let mut at = start;
        loop {
            if !anchored.is_anchored() {
                if let Some(ref pre) = self.prefilter {
                    let span = crate::util::search::Span {
                        start: at,
                        end: haystack.len(),
                    };
                    at = match pre.find(haystack, span) {
                        None => return Ok(false),
                        Some(i) => i,
                    };
                }
            }
            if vm.attempt(at)? {
                let regs = vm.cache.regs.iter();
                for (slot, &reg) in slots.iter_mut().zip(regs) {
                    *slot = if reg == UNSET { None } else { Some(reg) };
                }
                return Ok(true);
            }
            if anchored.is_anchored()
                || program.anchored_start
                || at >= haystack.len()
            {
                return Ok(false);
            }
            at = if program.text {
                utf8::next_boundary(haystack, at)
            } else {
                at + 1
            };
        }
    }
}

struct Vm<'a> {
    program: &'a Program,
    backtrack_limit: Option<usize>,
    stack_limit: Option<usize>,
    haystack: &'a [u8],
    search_start: usize,
    anchored: Anchored,
    not_empty_at_start: bool,
    cache: &'a mut Cache,
    /// The number of times a frame has been popped during this search.
    steps: usize,
}

impl<'a> Vm<'a> {
    /// Try to find a match beginning at exactly `start`.
    fn attempt(&mut self, start: usize) -> Result<bool, LibraryError> {
        {
            let cache = &mut *self.cache;
            cache.regs.clear();
            cache.regs.resize(self.program.reg_len, UNSET);
            cache.saves.clear();
            cache.stack.clear();
            cache.regs[0] = start;
        }

        let (mut pc, mut at) = (0, start);
        loop {
            match self.step(&mut pc, &mut at)? {
                Outcome::Next => {}
                Outcome::Match => return Ok(true),
                Outcome::Fail => {
                    if !self.backtrack(&mut pc, &mut at)? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Execute the instruction at `pc`.
    #[inline(always)]
    fn step(
        &mut self,
        pc: &mut InstPtr,
        at: &mut usize,
    ) -> Result<Outcome, LibraryError> {
        let program = self.program;
        match program.insts[*pc] {
            Inst::Match => {
                let full = self.anchored == Anchored::Full;
                if full && *at != self.haystack.len() {
                    return Ok(Outcome::Fail);
                }
                let start = self.cache.regs[0];
                if self.not_empty_at_start
                    && start == *at
                    && *at == self.search_start
                {
                    return Ok(Outcome::Fail);
                }
                self.cache.regs[1] = *at;
                return Ok(Outcome::Match);
            }
            Inst::One(ref single) => match self.next(*at) {
                Some((cp, len)) if single.matches(cp) => *at += len,
                _ => return Ok(Outcome::Fail),
            },
            Inst::Look(look) => {
                if !look.matches(self.haystack, *at) {
                    return Ok(Outcome::Fail);
                }
            }
            Inst::SearchStart => {
                if *at != self.search_start {
                    return Ok(Outcome::Fail);
                }
            }
            Inst::KeepOut => self.save(0, *at),
            Inst::Save(reg) => self.save(reg, *at),
            Inst::Capture { group, start } => {
                let start = self.cache.regs[start];
                self.save(2 * group, start);
                self.save(2 * group + 1, *at);
            }
            Inst::Split(first, second) => {
                self.push_step(second, *at)?;
                *pc = first;
                return Ok(Outcome::Next);
            }
            Inst::Jump(next) => {
                *pc = next;
                return Ok(Outcome::Next);
            }
            Inst::RepeatStart { counter } => self.save(counter, 0),
            Inst::Repeat { counter, position, min, max, greedy, exit } => {
                let count = self.cache.regs[counter];
                let min = min as usize;
                if count > min && self.cache.regs[position] == *at {
                    // The last iteration matched the empty string, so more
                    // iterations can't make progress.
                    *pc = exit;
                    return Ok(Outcome::Next);
                }
                if count < min {
                    *pc += 1;
                } else if max.map_or(false, |max| count >= max as usize) {
                    *pc = exit;
                } else if greedy {
                    self.push_step(exit, *at)?;
                    *pc += 1;
                } else {
                    self.push_step(*pc + 1, *at)?;
                    *pc = exit;
                }
                return Ok(Outcome::Next);
            }
            Inst::RepeatEnter { counter, position } => {
                let count = self.cache.regs[counter];
                self.save(counter, count + 1);
                self.save(position, *at);
            }
            Inst::RepeatSingle { ref single, min, max, kind } => {
                let mut end = *at;
                let mut count = 0;
                let mut min_at = end;
                let limit =
                    if kind == RepeatKind::Lazy { Some(min) } else { max };
                while limit.map_or(true, |limit| count < limit) {
                    match self.next(end) {
                        Some((cp, len)) if single.matches(cp) => {
                            end += len;
                            count += 1;
                            if count == min {
                                min_at = end;
                            }
                        }
                        _ => break,
                    }
                }
                if count < min {
                    return Ok(Outcome::Fail);
                }
                match kind {
                    RepeatKind::Greedy if end > min_at => {
                        self.push(Frame::GiveBack {
                            pc: *pc + 1,
                            at: end,
                            min_at,
                            nsave: self.cache.saves.len(),
                        })?;
                    }
                    RepeatKind::Lazy if max.map_or(true, |max| min < max) => {
                        self.push(Frame::TakeMore {
                            inst: *pc,
                            at: end,
                            count,
                            nsave: self.cache.saves.len(),
                        })?;
                    }
                    _ => {}
                }
                *at = end;
            }
            Inst::AtomicStart { depth } => {
                let len = self.cache.stack.len();
                self.save(depth, len);
            }
            Inst::AtomicEnd { depth } => {
                let len = self.cache.regs[depth];
                self.cache.stack.truncate(len);
            }
            Inst::LookStart { depth, position, negated, behind, exit } => {
                self.save(position, *at);
                let len = self.cache.stack.len();
                self.save(depth, len);
                if negated {
                    // Where to continue when the body fails.
                    self.push_step(exit, *at)?;
                }
                if let Some((min, max)) = behind {
                    let mut start = *at;
                    for _ in 0..min {
                        start = match self.prev(start) {
                            None => return Ok(Outcome::Fail),
                            Some(start) => start,
                        };
                    }
                    if max > min {
                        self.push(Frame::Behind {
                            pc: *pc + 1,
                            start,
                            remaining: max - min,
                            nsave: self.cache.saves.len(),
                        })?;
                    }
                    *at = start;
                }
            }
            Inst::LookEnd { depth, position, negated, behind } => {
                let origin = self.cache.regs[position];
                if behind && *at != origin {
                    return Ok(Outcome::Fail);
                }
                let len = self.cache.regs[depth];
                self.cache.stack.truncate(len);
                if negated {
                    return Ok(Outcome::Fail);
                }
                *at = origin;
            }
            Inst::BackRef { ref groups, fold, unicode } => {
                let span = groups.iter().find_map(|&group| {
                    let start = self.cache.regs[2 * group];
                    let end = self.cache.regs[2 * group + 1];
                    if start == UNSET || end == UNSET {
                        None
                    } else {
                        Some((start, end))
                    }
                });
                let (start, end) = match span {
                    None => return Ok(Outcome::Fail),
                    Some(span) => span,
                };
                let matched = if fold {
                    self.backref_fold(start, end, *at, unicode)
                } else {
                    let len = end - start;
                    let here = self.haystack.get(*at..).unwrap_or(&[]);
                    if here.starts_with(&self.haystack[start..end]) {
                        Some(*at + len)
                    } else {
                        None
                    }
                };
                match matched {
                    None => return Ok(Outcome::Fail),
                    Some(end) => *at = end,
                }
            }
            Inst::Cond { ref groups, no } => {
                let set = groups
                    .iter()
                    .any(|&group| self.cache.regs[2 * group + 1] != UNSET);
                if !set {
                    *pc = no;
                    return Ok(Outcome::Next);
                }
            }
        }
        *pc += 1;
        Ok(Outcome::Next)
    }

    /// Pop frames until one can be resumed, setting `pc` and `at` to where
    /// execution continues. Returns false when the stack is exhausted.
    fn backtrack(
        &mut self,
        pc: &mut InstPtr,
        at: &mut usize,
    ) -> Result<bool, LibraryError> {
        while let Some(frame) = self.cache.stack.pop() {
            self.steps += 1;
            if let Some(limit) = self.backtrack_limit {
                if self.steps > limit {
                    log!(log::trace!("backtrack limit of {} exceeded", limit));
                    return Err(LibraryError::backtrack_limit(limit));
                }
            }
            match frame {
                Frame::Step { pc: next, at: resume, nsave } => {
                    self.restore(nsave);
                    *pc = next;
                    *at = resume;
                    return Ok(true);
                }
                Frame::GiveBack { pc: next, at: end, min_at, nsave } => {
                    self.restore(nsave);
                    let end = match self.prev(end) {
                        None => continue,
                        Some(end) => end,
                    };
                    if end > min_at {
                        self.push(Frame::GiveBack {
                            pc: next,
                            at: end,
                            min_at,
                            nsave,
                        })?;
                    }
                    *pc = next;
                    *at = end;
                    return Ok(true);
                }
                Frame::TakeMore { inst, at: end, count, nsave } => {
                    self.restore(nsave);
                    let program = self.program;
                    let (single, max) = match program.insts[inst] {
                        Inst::RepeatSingle { ref single, max, .. } => {
                            (single, max)
                        }
                        _ => unreachable!("lazy frame without a repetition"),
                    };
                    let end = match self.next(end) {
                        Some((cp, len)) if single.matches(cp) => end + len,
                        _ => continue,
                    };
                    let count = count + 1;
                    if max.map_or(true, |max| count < max) {
                        self.push(Frame::TakeMore {
                            inst,
                            at: end,
                            count,
                            nsave,
                        })?;
                    }
                    *pc = inst + 1;
                    *at = end;
                    return Ok(true);
                }
                Frame::Behind { pc: next, start, remaining, nsave } => {
                    self.restore(nsave);
                    let start = match self.prev(start) {
                        None => continue,
                        Some(start) => start,
                    };
                    if remaining > 1 {
                        self.push(Frame::Behind {
                            pc: next,
                            start,
                            remaining: remaining - 1,
                            nsave,
                        })?;
                    }
                    *pc = next;
                    *at = start;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Write a register, logging its old value when there is a frame that
    /// might need it restored.
    #[inline(always)]
    fn save(&mut self, reg: usize, value: usize) {
        let cache = &mut *self.cache;
        if !cache.stack.is_empty() {
            cache.saves.push((reg, cache.regs[reg]));
        }
        cache.regs[reg] = value;
    }

    fn restore(&mut self, nsave: usize) {
        let cache = &mut *self.cache;
        while cache.saves.len() > nsave {
            if let Some((reg, value)) = cache.saves.pop() {
                cache.regs[reg] = value;
            }
        }
    }

    #[inline(always)]
    fn push(&mut self, frame: Frame) -> Result<(), LibraryError> {
        if let Some(limit) = self.stack_limit {
            if self.cache.stack.len() >= limit {
                log!(log::trace!("stack limit of {} exceeded", limit));
                return Err(LibraryError::stack_limit(limit));
            }
        }
        self.cache.stack.push(frame);
        Ok(())
    }

    #[inline(always)]
    fn push_step(
        &mut self,
        pc: InstPtr,
        at: usize,
    ) -> Result<(), LibraryError> {
        let nsave = self.cache.saves.len();
        self.push(Frame::Step { pc, at, nsave })
    }

    /// Decode the character at `at`, returning its codepoint and length.
    #[inline(always)]
    fn next(&self, at: usize) -> Option<(u32, usize)> {
        let rest = self.haystack.get(at..)?;
        if !self.program.text {
            return rest.first().map(|&b| (u32::from(b), 1));
        }
        match utf8::decode(rest)? {
            Ok(ch) => Some((u32::from(ch), ch.len_utf8())),
            Err(_) => None,
        }
    }

    /// Returns the start of the character ending at `at`.
    #[inline(always)]
    fn prev(&self, at: usize) -> Option<usize> {
        if at == 0 {
            return None;
        }
        if !self.program.text {
            return Some(at - 1);
        }
        match utf8::decode_last(&self.haystack[..at])? {
            Ok(ch) => Some(at - ch.len_utf8()),
            Err(_) => Some(at - 1),
        }
    }

    /// Match the text in `start..end` at `at` without regard to case,
    /// returning the end of the match.
    fn backref_fold(
        &self,
        mut start: usize,
        end: usize,
        mut at: usize,
        unicode: bool,
    ) -> Option<usize> {
        while start < end {
            let (want, want_len) = self.next(start)?;
            let (got, got_len) = self.next(at)?;
            if !fold_eq(want, got, unicode) {
                return None;
            }
            start += want_len;
            at += got_len;
        }
        Some(at)
    }
}

/// Returns true when `a` and `b` are equal under simple case folding, or
/// ASCII case folding when `unicode` is false.
fn fold_eq(a: u32, b: u32, unicode: bool) -> bool {
    if a == b {
        return true;
    }
    let ascii_fold = |cp: u32| match u8::try_from(cp) {
        Ok(b) if b.is_ascii() => Some(b.to_ascii_lowercase()),
        _ => None,
    };
    if let (Some(a), Some(b)) = (ascii_fold(a), ascii_fold(b)) {
        return a == b;
    }
    if !unicode {
        return false;
    }
    unicode::fold_canonical(a) == unicode::fold_canonical(b)
}
