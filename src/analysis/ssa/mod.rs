//! Static Single Assignment (SSA) construction.
//!
//! This module converts a function whose control flow graph and dominator
//! tree have been computed into SSA form, where every variable has exactly
//! one static definition site and control-flow merges are made explicit
//! through phi pseudo-instructions.
//!
//! # Algorithm
//!
//! The classic dominance-frontier construction:
//!
//! 1. **Definition collection** - find the "global" variables (read in some
//!    block before any local redefinition) and every variable's defining
//!    blocks; parameters count as defined in the entry block
//! 2. **Phi placement** - for each global variable, a worklist over its
//!    defining blocks plants at most one phi per dominance-frontier block,
//!    each planted phi becoming a new definition site
//! 3. **Renaming** - a single dominator-tree walk carrying per-variable
//!    version counters and visibility stacks; operands resolve to the top
//!    of their stack, destinations push fresh versions, CFG successors'
//!    phis receive the current version tagged with this block's label, and
//!    everything a block pushed is popped when the walk leaves it
//! 4. **Reconstruction** - blocks are flattened back into the function's
//!    instruction stream in original order
//!
//! The walk uses an explicit enter/leave frame stack, so renaming depth is
//! bounded by heap, not by host recursion limits.
//!
//! # Undefined Uses
//!
//! A use whose variable has no dominating definition is a policy decision,
//! configured through [`SsaOptions`]: reject the function (default) or
//! synthesize an explicit `undef` placeholder definition at the entry. See
//! [`UndefinedUsePolicy`].
//!
//! # References
//!
//! - Cytron et al., "Efficiently Computing Static Single Assignment Form
//!   and the Control Dependence Graph", ACM TOPLAS 1991
//! - Cooper & Torczon, "Engineering a Compiler", Chapter 9

mod builder;
mod rename;

// Re-export primary types at module level
pub use builder::{SsaBuilder, SsaOptions, UndefinedUsePolicy};
