/*!
The abstract syntax of a parsed pattern.

By the time a pattern is represented as a [`Node`], every inline flag has
been applied: case insensitive literals and classes have been closed over
case folding, `.` knows whether it matches `\n`, and `^`/`$` know whether
they are multi-line. Group names have been resolved to indices. So the
compiler never needs to track flag scopes.
*/

use alloc::{boxed::Box, vec::Vec};

use crate::{syntax::class::CharSet, util::look::Look};

/// A single node in the syntax tree of a pattern.
#[derive(Clone, Debug)]
pub(crate) enum Node {
    /// Matches the empty string.
    Empty,
    /// Matches exactly one codepoint.
    Literal(u32),
    /// Matches any one codepoint in the set.
    Class(CharSet),
    /// `.` with `DOTALL`.
    Any,
    /// `.` without `DOTALL`.
    AnyNotNewline,
    /// A zero-width anchor or word boundary.
    Look(Look),
    /// `\G`: asserts the position at which the current search started.
    SearchStart,
    /// `\K`: moves the reported start of the overall match to here.
    KeepOut,
    /// A capturing group. Explicit groups are numbered from 1.
    Capture { index: usize, node: Box<Node> },
    Concat(Vec<Node>),
    /// Branches in order of priority.
    Alternate(Vec<Node>),
    Repeat(Repeat),
    /// `(?>...)`. Once the inner node matches, its backtracking choices are
    /// discarded.
    Atomic(Box<Node>),
    LookAround(LookAround),
    /// A backreference to every group in `groups`. The first one that has
    /// participated in the match so far is the one replayed. With `fold`
    /// set, the replay ignores case, using Unicode simple case folding when
    /// `unicode` is set and ASCII case folding otherwise.
    BackRef { groups: Vec<usize>, fold: bool, unicode: bool },
    /// `(?(ref)yes|no)`. The yes branch is taken when any group in `groups`
    /// has participated in the match so far.
    Conditional { groups: Vec<usize>, yes: Box<Node>, no: Box<Node> },
}

#[derive(Clone, Debug)]
pub(crate) struct Repeat {
    pub(crate) node: Box<Node>,
    pub(crate) min: u32,
    /// `None` means unbounded.
    pub(crate) max: Option<u32>,
    pub(crate) kind: RepeatKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RepeatKind {
    Greedy,
    Lazy,
    /// A greedy repetition that never gives anything back.
    Possessive,
}

#[derive(Clone, Debug)]
pub(crate) struct LookAround {
    pub(crate) node: Box<Node>,
    pub(crate) behind: bool,
    pub(crate) negated: bool,
    /// The width of the inner node. Only lookbehind uses it, and it is only
    /// known once the whole pattern has been parsed.
    pub(crate) width: Width,
    /// The offset of the `(` that opened this assertion, for error
    /// reporting.
    pub(crate) offset: usize,
}

/// The number of codepoints a node can match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Width {
    pub(crate) min: u32,
    /// `None` means unbounded.
    pub(crate) max: Option<u32>,
}

impl Width {
    pub(crate) const ZERO: Width = Width { min: 0, max: Some(0) };
    pub(crate) const ONE: Width = Width { min: 1, max: Some(1) };
    pub(crate) const UNBOUNDED: Width = Width { min: 0, max: None };

    fn then(self, next: Width) -> Width {
        Width {
            min: self.min.saturating_add(next.min),
            max: match (self.max, next.max) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                _ => None,
            },
        }
    }

    fn or(self, other: Width) -> Width {
        Width {
            min: self.min.min(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }

    fn repeat(self, min: u32, max: Option<u32>) -> Width {
        Width {
            min: self.min.saturating_mul(min),
            max: match (self.max, max) {
                (Some(0), _) => Some(0),
                (Some(a), Some(b)) => Some(a.saturating_mul(b)),
                _ => None,
            },
        }
    }
}

impl Node {
    /// Concatenate the given nodes, flattening where possible.
    pub(crate) fn concat(mut nodes: Vec<Node>) -> Node {
        match nodes.len() {
            0 => Node::Empty,
            1 => nodes.pop().unwrap_or(Node::Empty),
            _ => Node::Concat(nodes),
        }
    }

    /// Alternate between the given branches, simplifying the single branch
    /// case.
    pub(crate) fn alternate(mut branches: Vec<Node>) -> Node {
        match branches.len() {
            0 => Node::Empty,
            1 => branches.pop().unwrap_or(Node::Empty),
            _ => Node::Alternate(branches),
        }
    }

    /// Returns the width of this node in codepoints.
    ///
    /// `groups` holds the width of each capture group that has already been
    /// measured. A backreference to a group whose width is not known yet
    /// (because the reference precedes the end of the group) is treated as
    /// unbounded.
    pub(crate) fn width(&self, groups: &mut Vec<Option<Width>>) -> Width {
        match *self {
            Node::Empty
            | Node::Look(_)
            | Node::SearchStart
            | Node::KeepOut => Width::ZERO,
            Node::LookAround(ref look) => {
                // Measured only for the groups inside it.
                look.node.width(groups);
                Width::ZERO
            }
            Node::Literal(_)
            | Node::Class(_)
            | Node::Any
            | Node::AnyNotNewline => Width::ONE,
            Node::Capture { index, ref node } => {
                let width = node.width(groups);
                if groups.len() <= index {
                    groups.resize(index + 1, None);
                }
                groups[index] = Some(width);
                width
            }
            Node::Concat(ref nodes) => nodes
                .iter()
                .fold(Width::ZERO, |acc, node| acc.then(node.width(groups))),
            Node::Alternate(ref nodes) => {
                let mut acc: Option<Width> = None;
                for node in nodes.iter() {
                    let width = node.width(groups);
                    acc = Some(acc.map_or(width, |acc| acc.or(width)));
                }
                acc.unwrap_or(Width::ZERO)
            }
            Node::Repeat(ref rep) => {
                rep.node.width(groups).repeat(rep.min, rep.max)
            }
            Node::Atomic(ref node) => node.width(groups),
            Node::BackRef { groups: ref targets, .. } => {
                let mut acc: Option<Width> = None;
                for &index in targets.iter() {
                    let width = groups
                        .get(index)
                        .copied()
                        .flatten()
                        .unwrap_or(Width::UNBOUNDED);
                    acc = Some(acc.map_or(width, |acc| acc.or(width)));
                }
                // An unset group never matches, so a reference to one
                // can't widen anything. A reference that exists at all
                // matches zero or more codepoints.
                acc.unwrap_or(Width::UNBOUNDED)
            }
            Node::Conditional { ref yes, ref no, .. } => {
                let yes = yes.width(groups);
                let no = no.width(groups);
                yes.or(no)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ch: char) -> Node {
        Node::Literal(u32::from(ch))
    }

    fn rep(node: Node, min: u32, max: Option<u32>) -> Node {
        Node::Repeat(Repeat {
            node: Box::new(node),
            min,
            max,
            kind: RepeatKind::Greedy,
        })
    }

    #[test]
    fn widths() {
        let mut groups = vec![];
        let node = Node::concat(vec![
            lit('a'),
            Node::alternate(vec![
                lit('b'),
                Node::concat(vec![lit('c'), lit('d')]),
            ]),
            rep(lit('e'), 2, Some(3)),
        ]);
        assert_eq!(Width { min: 4, max: Some(6) }, node.width(&mut groups));

        let node = rep(lit('a'), 1, None);
        assert_eq!(Width { min: 1, max: None }, node.width(&mut groups));

        // A repetition of something empty is still empty.
        let node = rep(Node::Look(Look::Start), 0, None);
        assert_eq!(Width::ZERO, node.width(&mut groups));
    }

    #[test]
    fn backreference_widths() {
        let mut groups = vec![];
        let group = Node::Capture {
            index: 1,
            node: Box::new(Node::concat(vec![lit('a'), lit('b')])),
        };
        let node = Node::concat(vec![
            group,
            Node::BackRef { groups: vec![1], fold: false, unicode: true },
        ]);
        assert_eq!(Width { min: 4, max: Some(4) }, node.width(&mut groups));

        // A reference from inside the group itself is unbounded.
        let mut groups = vec![];
        let backref =
            Node::BackRef { groups: vec![1], fold: false, unicode: true };
        let node = Node::Capture { index: 1, node: Box::new(backref) };
        assert_eq!(None, node.width(&mut groups).max);
    }
}
