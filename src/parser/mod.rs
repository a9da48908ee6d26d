//! Literal reconstructor
//!
//! Maps a string to a [`Value`](crate::Value) only when the whole string is a
//! composition of literals: numbers, `True`/`False`/`None`, quoted strings,
//! byte strings, sequences and tuples. Anything else is rejected with a
//! [`LiteralError`](crate::LiteralError).

mod grammar;
pub mod lexer;

pub use grammar::parse_literal;
