//! The three-address instruction set operated on by the transformation.
//!
//! This module owns the data model the analyses consume: opcodes, types,
//! literal values, the [`Instruction`] tagged union, and the [`Function`] /
//! [`Program`] containers. Parsing and serializing a textual form of the IR
//! is out of scope; the [`std::fmt::Display`] implementations exist for
//! diagnostics only.
//!
//! # Key Components
//!
//! - [`Opcode`] - Operation codes, including the control transfers the CFG
//!   splitter keys on (`jmp`, `br`, `ret`) and the `phi` pseudo-operation
//! - [`Instruction`] - Tagged union over label markers and operations with
//!   explicitly optional destination/type/operand fields
//! - [`Function`] - Name, parameters, optional return type, and the ordered
//!   instruction stream
//! - [`FunctionBuilder`] - Fluent construction of functions for tests and
//!   demos

mod builder;
mod instruction;

// Re-export primary types at module level
pub use builder::FunctionBuilder;
pub use instruction::{Function, Instruction, Literal, Opcode, Parameter, Program, Type};
