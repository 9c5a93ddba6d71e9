//! Control Flow Graph (CFG) construction and traversal.
//!
//! This module partitions a function's flat labeled instruction stream into
//! basic blocks and computes the successor/predecessor relation between
//! them.
//!
//! # Key Components
//!
//! - [`BlockId`] - Strongly-typed arena index identifying a block
//! - [`BasicBlock`] - A labeled instruction run with its edge sets
//! - [`ControlFlowGraph`] - The block arena, entry designation, and
//!   postorder traversal
//!
//! # Construction Rules
//!
//! A synthetic entry label is prepended (uniquified against every label in
//! the function) so the stream always starts with a labeled block. The
//! stream is then split at label positions; each run becomes one block.
//! Successors are read off each block's **last** instruction: jumps and
//! branches connect to their named targets, returns end the function, and
//! anything else falls through to the next block in stream order.
//! Predecessors are derived purely as the inverse of the successor
//! relation, so the two views cannot diverge.
//!
//! Blocks unreachable from the entry are pruned before edges are wired (and
//! reported through [`log::warn!`]); every downstream analysis therefore
//! sees only reachable blocks.

mod block;
mod graph;

pub use block::{BasicBlock, BlockId};
pub use graph::ControlFlowGraph;
