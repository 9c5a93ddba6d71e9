//! Fluent construction of IR functions.
//!
//! [`FunctionBuilder`] assembles the instruction stream of a [`Function`]
//! one instruction at a time, resolving nothing - labels are plain names and
//! the CFG layer validates targets later. It exists so tests, benches, and
//! demos can state a function's shape without hand-writing `Instruction`
//! variants.
//!
//! # Examples
//!
//! ```rust
//! use ssaform::ir::{FunctionBuilder, Opcode, Type};
//!
//! let function = FunctionBuilder::new("max")
//!     .param("a", Type::Int)
//!     .param("b", Type::Int)
//!     .ret_type(Type::Int)
//!     .value(Opcode::Gt, "cond", Type::Bool, ["a", "b"])
//!     .br("cond", "take_a", "take_b")
//!     .label("take_a")
//!     .ret("a")
//!     .label("take_b")
//!     .ret("b")
//!     .finish();
//!
//! assert_eq!(function.instructions.len(), 6);
//! ```

use crate::ir::{Function, Instruction, Literal, Opcode, Parameter, Type};

/// Builds a [`Function`] through chained instruction appends.
///
/// Every method appends exactly one instruction (or records one piece of
/// signature metadata) and returns the builder, so a whole function reads
/// as a single expression.
#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
}

impl FunctionBuilder {
    /// Starts a builder for a function with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        FunctionBuilder {
            function: Function::new(name),
        }
    }

    /// Appends a parameter to the function's signature.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, param_type: Type) -> Self {
        self.function.params.push(Parameter {
            name: name.into(),
            param_type,
        });
        self
    }

    /// Declares the function's return type.
    #[must_use]
    pub fn ret_type(mut self, return_type: Type) -> Self {
        self.function.return_type = Some(return_type);
        self
    }

    /// Appends a label marker.
    #[must_use]
    pub fn label(mut self, name: impl Into<String>) -> Self {
        self.function.instructions.push(Instruction::label(name));
        self
    }

    /// Appends a `const` instruction loading a literal.
    ///
    /// An `i64` or `bool` converts into the matching [`Literal`].
    #[must_use]
    pub fn constant(mut self, dest: impl Into<String>, ty: Type, value: impl Into<Literal>) -> Self {
        self.function.instructions.push(Instruction::Op {
            op: Opcode::Const,
            dest: Some(dest.into()),
            op_type: Some(ty),
            args: Vec::new(),
            labels: Vec::new(),
            funcs: Vec::new(),
            value: Some(value.into()),
        });
        self
    }

    /// Appends a value-producing instruction with a destination and type.
    #[must_use]
    pub fn value<I, S>(mut self, op: Opcode, dest: impl Into<String>, ty: Type, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.function.instructions.push(Instruction::Op {
            op,
            dest: Some(dest.into()),
            op_type: Some(ty),
            args: args.into_iter().map(Into::into).collect(),
            labels: Vec::new(),
            funcs: Vec::new(),
            value: None,
        });
        self
    }

    /// Appends an effect-only instruction (no destination).
    #[must_use]
    pub fn effect<I, S>(mut self, op: Opcode, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.function.instructions.push(Instruction::Op {
            op,
            dest: None,
            op_type: None,
            args: args.into_iter().map(Into::into).collect(),
            labels: Vec::new(),
            funcs: Vec::new(),
            value: None,
        });
        self
    }

    /// Appends an unconditional jump to `target`.
    #[must_use]
    pub fn jmp(mut self, target: impl Into<String>) -> Self {
        self.function.instructions.push(Instruction::Op {
            op: Opcode::Jmp,
            dest: None,
            op_type: None,
            args: Vec::new(),
            labels: vec![target.into()],
            funcs: Vec::new(),
            value: None,
        });
        self
    }

    /// Appends a conditional branch on `cond` to `if_true` / `if_false`.
    #[must_use]
    pub fn br(
        mut self,
        cond: impl Into<String>,
        if_true: impl Into<String>,
        if_false: impl Into<String>,
    ) -> Self {
        self.function.instructions.push(Instruction::Op {
            op: Opcode::Br,
            dest: None,
            op_type: None,
            args: vec![cond.into()],
            labels: vec![if_true.into(), if_false.into()],
            funcs: Vec::new(),
            value: None,
        });
        self
    }

    /// Appends a call to `callee` producing `dest`.
    #[must_use]
    pub fn call<I, S>(
        mut self,
        dest: impl Into<String>,
        ty: Type,
        callee: impl Into<String>,
        args: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.function.instructions.push(Instruction::Op {
            op: Opcode::Call,
            dest: Some(dest.into()),
            op_type: Some(ty),
            args: args.into_iter().map(Into::into).collect(),
            labels: Vec::new(),
            funcs: vec![callee.into()],
            value: None,
        });
        self
    }

    /// Appends a `ret` returning the named value.
    #[must_use]
    pub fn ret(mut self, arg: impl Into<String>) -> Self {
        self.function.instructions.push(Instruction::Op {
            op: Opcode::Ret,
            dest: None,
            op_type: None,
            args: vec![arg.into()],
            labels: Vec::new(),
            funcs: Vec::new(),
            value: None,
        });
        self
    }

    /// Appends a `ret` with no value.
    #[must_use]
    pub fn ret_void(mut self) -> Self {
        self.function.instructions.push(Instruction::Op {
            op: Opcode::Ret,
            dest: None,
            op_type: None,
            args: Vec::new(),
            labels: Vec::new(),
            funcs: Vec::new(),
            value: None,
        });
        self
    }

    /// Consumes the builder, yielding the finished function.
    #[must_use]
    pub fn finish(self) -> Function {
        self.function
    }
}
