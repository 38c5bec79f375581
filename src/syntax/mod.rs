/*!
Pattern syntax: parsing a pattern string into an abstract syntax tree.

The parser resolves everything that depends on context (inline flags, group
names, forward references) so that the tree it produces can be compiled
without any further knowledge of the source text. Character classes are
sets of codepoints, with Unicode data drawn from `regex-syntax`.
*/

pub(crate) mod ast;
pub(crate) mod class;
pub(crate) mod parse;
pub(crate) mod unicode;
