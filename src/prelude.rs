//! # ssaform Prelude
//!
//! This module provides a convenient prelude for the most commonly used
//! types from the ssaform library. Import this module to get quick access to
//! the essential types for building IR functions and converting them to SSA
//! form.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all ssaform operations
pub use crate::Error;

/// The result type used throughout ssaform
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Single-function SSA transformation with default options
pub use crate::construct_ssa;

/// Single-function SSA transformation with explicit options
pub use crate::construct_ssa_with;

/// Whole-program SSA transformation (parallel across functions)
pub use crate::transform_program;

/// SSA construction options and the undefined-use policy
pub use crate::{SsaOptions, UndefinedUsePolicy};

// ================================================================================================
// Instruction Set
// ================================================================================================

/// IR building blocks
pub use crate::ir::{
    Function, FunctionBuilder, Instruction, Literal, Opcode, Parameter, Program, Type,
};

// ================================================================================================
// Analyses
// ================================================================================================

/// Control-flow and dominance structures
pub use crate::analysis::{BasicBlock, BlockId, ControlFlowGraph, DominatorTree};

/// The SSA construction engine
pub use crate::analysis::SsaBuilder;
