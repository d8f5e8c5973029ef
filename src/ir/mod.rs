//! The lowered form of a program: functions made of basic blocks, each a
//! straight-line run of instructions over virtual registers closed by a
//! terminator. Everything implements [`Display`](std::fmt::Display) in an
//! LLVM-like textual syntax.

mod instr;
mod types;

pub use instr::*;
pub use types::*;
