#![deny(missing_docs)]

//! # ssaform
//!
//! A compiler middle-end that transforms functions of a three-address-style
//! intermediate representation into Static Single Assignment (SSA) form.
//! Built in pure Rust, `ssaform` provides control-flow-graph construction,
//! dominance analysis, and the classic dominance-frontier-based SSA
//! construction algorithm for labeled instruction streams.
//!
//! ## Features
//!
//! - **Control flow graphs** - Partition a flat labeled instruction stream
//!   into basic blocks with a consistent predecessor/successor relation
//! - **Dominance analysis** - Immediate dominators, dominator sets, and
//!   dominance frontiers via the Cooper–Harvey–Kennedy iterative algorithm
//! - **SSA construction** - Phi placement at dominance frontiers followed by
//!   dominator-tree-guided renaming, with an explicit frame stack so deep
//!   control flow cannot exhaust the host stack
//! - **Parallel driver** - Independent functions of a program are
//!   transformed concurrently with `rayon`
//! - **Comprehensive error handling** - Structural, convergence, and
//!   undefined-use failures are surfaced, never silently absorbed
//!
//! ## Quick Start
//!
//! ```rust
//! use ssaform::prelude::*;
//!
//! // Build a diamond: entry assigns x, both arms reassign it, the merge
//! // block reads it. The merge read must flow through a phi.
//! let mut function = FunctionBuilder::new("main")
//!     .constant("x", Type::Int, 1)
//!     .constant("cond", Type::Bool, true)
//!     .br("cond", "left", "right")
//!     .label("left")
//!     .constant("x", Type::Int, 2)
//!     .jmp("merge")
//!     .label("right")
//!     .constant("x", Type::Int, 3)
//!     .jmp("merge")
//!     .label("merge")
//!     .effect(Opcode::Print, ["x"])
//!     .ret_void()
//!     .finish();
//!
//! construct_ssa(&mut function)?;
//!
//! // Every destination is now unique and the merge block carries a phi.
//! # Ok::<(), ssaform::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `ssaform` is organized into focused modules:
//!
//! - [`ir`] - The instruction set: opcodes, types, instructions, functions
//! - [`analysis`] - CFG construction, dominator trees, SSA building
//! - [`prelude`] - Convenient re-exports of the commonly used types
//! - [`Error`] and [`Result`] - Crate-wide error handling
//!
//! The pipeline is strictly linear. [`construct_ssa`] builds a
//! [`analysis::ControlFlowGraph`] from the function, computes a
//! [`analysis::DominatorTree`] over it, runs the
//! [`analysis::SsaBuilder`] phases (definition collection, phi insertion,
//! renaming), and flattens the renamed blocks back into the function's
//! instruction list. No stage mutates the structural relations of the stage
//! before it.
//!
//! ## Diagnostics
//!
//! Progress and block dumps are emitted through the [`log`] facade at
//! `debug`/`trace` level; pruned unreachable blocks and synthesized
//! placeholder definitions are reported at `warn` level. Logging carries no
//! semantic contract.

pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use ssaform::prelude::*;
///
/// let function = FunctionBuilder::new("id")
///     .param("a", Type::Int)
///     .ret_type(Type::Int)
///     .value(Opcode::Id, "b", Type::Int, ["a"])
///     .ret("b")
///     .finish();
/// assert_eq!(function.params.len(), 1);
/// ```
pub mod prelude;

/// The instruction set operated on by the transformation.
///
/// Instructions are a tagged union over label markers and operations with
/// explicitly optional destination/type/operand fields; see
/// [`ir::Instruction`]. Functions bundle a parameter list with an ordered
/// instruction stream mixing label markers and operations.
pub mod ir;

/// Control-flow, dominance, and SSA analyses.
///
/// - [`analysis::ControlFlowGraph`] - basic blocks and their edge relation
/// - [`analysis::DominatorTree`] - immediate dominators, dominator sets,
///   dominance frontiers
/// - [`analysis::SsaBuilder`] - phi insertion and renaming
pub mod analysis;

mod transform;

/// `ssaform` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type
/// is always [`Error`]. Used consistently throughout the crate for all
/// fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `ssaform` Error type
///
/// The main error type for all operations in this crate. Covers structural
/// defects in the input stream, fixpoint convergence failures, and uses of
/// variables with no dominating definition.
pub use error::Error;

pub use transform::{construct_ssa, construct_ssa_with, transform_program, transform_program_with};

pub use analysis::ssa::{SsaOptions, UndefinedUsePolicy};
