//! Program analysis for IR functions.
//!
//! This module provides the analyses the SSA transformation is built from.
//!
//! # Architecture
//!
//! The analysis module is organized into focused sub-modules:
//!
//! - [`cfg`] - Control Flow Graph construction and traversal
//! - [`dominators`] - Immediate dominators, dominator sets, dominance
//!   frontiers (Cooper–Harvey–Kennedy)
//! - [`ssa`] - Phi insertion and dominator-tree-guided renaming
//!
//! Data flows one direction: a [`crate::ir::Function`] becomes a
//! [`ControlFlowGraph`], a [`DominatorTree`] is computed over it, and the
//! [`SsaBuilder`] mutates block contents (never block structure) before
//! flattening the result back into the function.
//!
//! # Usage
//!
//! ```rust
//! use ssaform::analysis::{ControlFlowGraph, DominatorTree};
//! use ssaform::ir::{FunctionBuilder, Type};
//!
//! let function = FunctionBuilder::new("f")
//!     .constant("x", Type::Int, 1)
//!     .jmp("done")
//!     .label("done")
//!     .ret_void()
//!     .finish();
//!
//! let cfg = ControlFlowGraph::build(&function)?;
//! let dominators = DominatorTree::compute(&cfg)?;
//! assert!(dominators.dominates(cfg.entry(), cfg.entry()));
//! # Ok::<(), ssaform::Error>(())
//! ```

pub mod cfg;
pub mod dominators;
pub mod ssa;

// Re-export primary types at module level
pub use cfg::{BasicBlock, BlockId, ControlFlowGraph};
pub use dominators::DominatorTree;
pub use ssa::{SsaBuilder, SsaOptions, UndefinedUsePolicy};
