//! Basic block representation and block identifiers.
//!
//! Blocks live in a flat arena inside the [`ControlFlowGraph`] and are
//! referred to exclusively through [`BlockId`] indices (or their unique
//! labels). Two blocks are never compared structurally - identity is the
//! arena index.
//!
//! [`ControlFlowGraph`]: crate::analysis::ControlFlowGraph

use std::collections::BTreeSet;
use std::fmt;

use crate::ir::Instruction;

/// A strongly-typed identifier for basic blocks within a control flow graph.
///
/// `BlockId` wraps a `usize` arena index, preventing accidental mixing of
/// block indices with other integer values. Ids are assigned sequentially in
/// original stream order when the graph is built, so the entry block is
/// always `BlockId::new(0)`.
///
/// # Thread Safety
///
/// `BlockId` is [`Copy`], [`Send`], and [`Sync`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Creates a new `BlockId` from a raw index value.
    ///
    /// Primarily intended for internal use and testing; normal usage
    /// obtains ids from [`ControlFlowGraph`](crate::analysis::ControlFlowGraph)
    /// queries.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        BlockId(index)
    }

    /// Returns the raw arena index of this block identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl From<usize> for BlockId {
    #[inline]
    fn from(index: usize) -> Self {
        BlockId(index)
    }
}

impl From<BlockId> for usize {
    #[inline]
    fn from(block: BlockId) -> Self {
        block.0
    }
}

/// A labeled, ordered run of instructions plus its edge sets.
///
/// The instruction list excludes the leading label marker (and every other
/// block's labels). Edge sets are ordered ([`BTreeSet`]) so all traversals
/// over them are deterministic.
///
/// # Invariants
///
/// A block's successors are the mutual inverses of other blocks'
/// predecessors. The graph keeps the relation consistent by only ever
/// deriving predecessors from successors.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// The block's label, unique within the function
    pub label: String,
    /// The instructions of this block, label markers excluded
    pub instructions: Vec<Instruction>,
    /// Blocks with an edge into this block
    pub predecessors: BTreeSet<BlockId>,
    /// Blocks this block transfers control to
    pub successors: BTreeSet<BlockId>,
}

impl BasicBlock {
    /// Creates a block with the given label and instruction run.
    #[must_use]
    pub fn new(label: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        BasicBlock {
            label: label.into(),
            instructions,
            predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
        }
    }

    /// Returns the block's last instruction, if any.
    ///
    /// The successor rule is evaluated from this instruction alone; a block
    /// whose run is empty (its label was immediately followed by another
    /// label) behaves like a fallthrough.
    #[must_use]
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    /// Returns an iterator over the phi instructions at the head of this
    /// block.
    pub fn phis(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.is_phi())
    }

    /// Returns `true` if this block carries a phi for the given base
    /// variable.
    #[must_use]
    pub fn has_phi_for(&self, variable: &str) -> bool {
        self.phis().any(|phi| phi.dest() == Some(variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Opcode, Type};
    use std::collections::HashMap;

    #[test]
    fn test_block_id_new_and_index() {
        let block = BlockId::new(42);
        assert_eq!(block.index(), 42);
    }

    #[test]
    fn test_block_id_ordering() {
        let mut ids = vec![BlockId::new(3), BlockId::new(1), BlockId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![BlockId::new(1), BlockId::new(2), BlockId::new(3)]);
    }

    #[test]
    fn test_block_id_as_map_key() {
        let mut map: HashMap<BlockId, &str> = HashMap::new();
        map.insert(BlockId::new(0), "entry");
        map.insert(BlockId::new(1), "exit");

        assert_eq!(map.get(&BlockId::new(0)), Some(&"entry"));
        assert_eq!(map.get(&BlockId::new(2)), None);
    }

    #[test]
    fn test_block_id_formats() {
        let block = BlockId::new(7);
        assert_eq!(format!("{block:?}"), "BlockId(7)");
        assert_eq!(format!("{block}"), "b7");
    }

    #[test]
    fn test_block_id_conversions() {
        let block: BlockId = 5usize.into();
        assert_eq!(block.index(), 5);
        let raw: usize = block.into();
        assert_eq!(raw, 5);
    }

    #[test]
    fn test_terminator_is_last_instruction() {
        let block = BasicBlock::new(
            "l",
            vec![
                Instruction::Op {
                    op: Opcode::Const,
                    dest: Some("x".to_string()),
                    op_type: Some(Type::Int),
                    args: Vec::new(),
                    labels: Vec::new(),
                    funcs: Vec::new(),
                    value: Some(crate::ir::Literal::Int(1)),
                },
                Instruction::Op {
                    op: Opcode::Jmp,
                    dest: None,
                    op_type: None,
                    args: Vec::new(),
                    labels: vec!["next".to_string()],
                    funcs: Vec::new(),
                    value: None,
                },
            ],
        );
        assert!(block.terminator().unwrap().is_terminator());

        let empty = BasicBlock::new("e", Vec::new());
        assert!(empty.terminator().is_none());
    }

    #[test]
    fn test_has_phi_for() {
        let block = BasicBlock::new(
            "merge",
            vec![Instruction::Op {
                op: Opcode::Phi,
                dest: Some("x".to_string()),
                op_type: Some(Type::Int),
                args: Vec::new(),
                labels: Vec::new(),
                funcs: Vec::new(),
                value: None,
            }],
        );
        assert!(block.has_phi_for("x"));
        assert!(!block.has_phi_for("y"));
    }
}
