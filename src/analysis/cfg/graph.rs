//! Control Flow Graph implementation.
//!
//! This module provides the [`ControlFlowGraph`] structure: a flat arena of
//! [`BasicBlock`]s in original stream order, a label index, and the
//! postorder traversal the dominance algorithm is built on.

use std::collections::{BTreeSet, HashMap};

use log::{debug, warn};

use crate::{
    analysis::cfg::{BasicBlock, BlockId},
    ir::{Function, Instruction, Opcode},
    Error, Result,
};

/// The label prepended to every function so the stream starts with a
/// labeled block; suffixed with `0` until it collides with nothing.
const ENTRY_LABEL: &str = "entry";

/// The control flow graph of a single function.
///
/// Owns all basic blocks of the function, keyed both by arena index
/// ([`BlockId`]) and by unique label. The entry block is always the first
/// arena slot. After construction the arena contains only blocks reachable
/// from the entry - unreachable blocks are pruned (and logged) before edges
/// are wired, so every downstream traversal is reachable-only by
/// construction.
///
/// # Examples
///
/// ```rust
/// use ssaform::analysis::ControlFlowGraph;
/// use ssaform::ir::{FunctionBuilder, Type};
///
/// let function = FunctionBuilder::new("f")
///     .constant("cond", Type::Bool, true)
///     .br("cond", "left", "right")
///     .label("left")
///     .jmp("merge")
///     .label("right")
///     .jmp("merge")
///     .label("merge")
///     .ret_void()
///     .finish();
///
/// let cfg = ControlFlowGraph::build(&function)?;
/// assert_eq!(cfg.block_count(), 4);
/// assert_eq!(cfg.block(cfg.entry()).unwrap().successors.len(), 2);
/// # Ok::<(), ssaform::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    /// Block arena in original stream order; entry first
    blocks: Vec<BasicBlock>,
    /// Label -> arena index
    labels: HashMap<String, BlockId>,
    /// The designated entry block
    entry: BlockId,
}

impl ControlFlowGraph {
    /// Partitions a function's instruction stream into basic blocks and
    /// computes the successor/predecessor relation.
    ///
    /// A synthetic entry label is prepended, uniquified against all labels
    /// in the function by suffixing `0` until no collision remains, so
    /// every stream has a label-prefixed block even if its first
    /// instruction was unlabeled.
    ///
    /// # Errors
    ///
    /// - [`Error::Empty`] if the function has no instructions
    /// - [`Error::DuplicateLabel`] if two label markers share a name
    /// - [`Error::UnknownTarget`] if a jump or branch names a label with no
    ///   block, including in unreachable code
    pub fn build(function: &Function) -> Result<Self> {
        if function.instructions.is_empty() {
            return Err(Error::Empty);
        }

        // Split the stream into label-delimited runs, the synthetic entry
        // run first.
        let mut runs: Vec<(String, Vec<Instruction>)> = Vec::new();
        let mut label = Self::unique_entry_label(function);
        let mut run = Vec::new();
        for instr in &function.instructions {
            if let Some(name) = instr.label_name() {
                runs.push((label, run));
                if runs.iter().any(|(prior, _)| prior.as_str() == name) {
                    return Err(Error::DuplicateLabel(name.to_string()));
                }
                label = name.to_string();
                run = Vec::new();
            } else {
                run.push(instr.clone());
            }
        }
        runs.push((label, run));

        let run_index: HashMap<&str, usize> = runs
            .iter()
            .enumerate()
            .map(|(i, (label, _))| (label.as_str(), i))
            .collect();

        // Successor rule, evaluated from each run's last instruction.
        let mut successor_sets: Vec<BTreeSet<usize>> = Vec::with_capacity(runs.len());
        for (i, (label, instructions)) in runs.iter().enumerate() {
            let mut successors = BTreeSet::new();
            match instructions.last() {
                Some(last) if matches!(last.opcode(), Some(Opcode::Jmp | Opcode::Br)) => {
                    for target in last.target_labels() {
                        let target_idx = run_index.get(target.as_str()).ok_or_else(|| {
                            Error::UnknownTarget {
                                label: target.clone(),
                                block: label.clone(),
                            }
                        })?;
                        successors.insert(*target_idx);
                    }
                }
                Some(last) if matches!(last.opcode(), Some(Opcode::Ret)) => {}
                // Fall through, including calls and runs cut short by the
                // next block's label.
                _ => {
                    if i + 1 < runs.len() {
                        successors.insert(i + 1);
                    }
                }
            }
            successor_sets.push(successors);
        }

        // Prune runs unreachable from the entry before wiring any edges.
        let reachable = Self::reachable_runs(&successor_sets);
        for (i, (label, _)) in runs.iter().enumerate() {
            if !reachable[i] {
                warn!("pruning unreachable block '{label}'");
            }
        }

        let mut arena_index: Vec<Option<BlockId>> = vec![None; runs.len()];
        let mut blocks = Vec::new();
        let mut labels = HashMap::new();
        for (i, (label, instructions)) in runs.into_iter().enumerate() {
            if reachable[i] {
                let id = BlockId::new(blocks.len());
                arena_index[i] = Some(id);
                labels.insert(label.clone(), id);
                blocks.push(BasicBlock::new(label, instructions));
            }
        }

        for (i, successors) in successor_sets.iter().enumerate() {
            let Some(from) = arena_index[i] else { continue };
            for &succ in successors {
                let to = arena_index[succ].expect("successor of reachable block is reachable");
                blocks[from.index()].successors.insert(to);
                blocks[to.index()].predecessors.insert(from);
            }
        }

        let cfg = ControlFlowGraph {
            blocks,
            labels,
            entry: BlockId::new(0),
        };

        for block in &cfg.blocks {
            debug!(
                "function {}: block '{}' succ={:?} pred={:?}",
                function.name,
                block.label,
                cfg.label_set(&block.successors),
                cfg.label_set(&block.predecessors),
            );
        }

        Ok(cfg)
    }

    /// Picks an entry label that collides with no label in the function.
    fn unique_entry_label(function: &Function) -> String {
        let mut entry_label = ENTRY_LABEL.to_string();
        while function
            .instructions
            .iter()
            .any(|instr| instr.label_name() == Some(entry_label.as_str()))
        {
            entry_label.push('0');
        }
        entry_label
    }

    /// Marks the runs reachable from run 0 over the successor relation.
    fn reachable_runs(successor_sets: &[BTreeSet<usize>]) -> Vec<bool> {
        let mut reachable = vec![false; successor_sets.len()];
        let mut worklist = vec![0usize];
        reachable[0] = true;
        while let Some(i) = worklist.pop() {
            for &succ in &successor_sets[i] {
                if !reachable[succ] {
                    reachable[succ] = true;
                    worklist.push(succ);
                }
            }
        }
        reachable
    }

    /// Returns the entry block's id.
    #[must_use]
    #[inline]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Returns the number of blocks in the graph.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the block with the given id, or `None` if out of range.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Returns a mutable reference to the block with the given id.
    #[must_use]
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(id.index())
    }

    /// Returns the id of the block carrying the given label.
    #[must_use]
    pub fn block_by_label(&self, label: &str) -> Option<BlockId> {
        self.labels.get(label).copied()
    }

    /// Returns an iterator over all block ids in stream order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId::new)
    }

    /// Returns an iterator over all blocks in stream order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    /// Produces the postorder sequence over the successor relation starting
    /// at the entry.
    ///
    /// An iterative depth-first traversal with a visited guard, so cyclic
    /// graphs terminate; a block reachable by multiple paths appears exactly
    /// once, at the position of its last completed visit. The entry is
    /// always last, which makes [`Self::reverse_postorder`] start with it.
    #[must_use]
    pub fn postorder(&self) -> Vec<BlockId> {
        let mut visited = vec![false; self.blocks.len()];
        let mut order = Vec::with_capacity(self.blocks.len());
        let mut stack = vec![(self.entry, false)];

        while let Some((block, children_done)) = stack.pop() {
            if children_done {
                order.push(block);
                continue;
            }
            if visited[block.index()] {
                continue;
            }
            visited[block.index()] = true;

            stack.push((block, true));
            // Reversed push so successors are explored in set order.
            for &succ in self.blocks[block.index()].successors.iter().rev() {
                if !visited[succ.index()] {
                    stack.push((succ, false));
                }
            }
        }

        order
    }

    /// Produces the reverse postorder sequence: the entry first, every
    /// block before its successors along forward edges.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let mut order = self.postorder();
        order.reverse();
        order
    }

    /// Maps a set of block ids to their labels, for diagnostics.
    fn label_set(&self, ids: &BTreeSet<BlockId>) -> Vec<&str> {
        ids.iter()
            .map(|id| self.blocks[id.index()].label.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FunctionBuilder, Type};

    fn diamond() -> Function {
        FunctionBuilder::new("diamond")
            .constant("cond", Type::Bool, true)
            .br("cond", "left", "right")
            .label("left")
            .jmp("merge")
            .label("right")
            .jmp("merge")
            .label("merge")
            .ret_void()
            .finish()
    }

    #[test]
    fn test_empty_function_rejected() {
        let function = Function::new("empty");
        assert!(matches!(
            ControlFlowGraph::build(&function),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn test_single_block() {
        let function = FunctionBuilder::new("f")
            .constant("x", Type::Int, 1)
            .ret_void()
            .finish();
        let cfg = ControlFlowGraph::build(&function).unwrap();

        assert_eq!(cfg.block_count(), 1);
        assert_eq!(cfg.block(cfg.entry()).unwrap().label, "entry");
        assert!(cfg.block(cfg.entry()).unwrap().successors.is_empty());
    }

    #[test]
    fn test_entry_label_uniquified() {
        let function = FunctionBuilder::new("f")
            .constant("x", Type::Int, 1)
            .label("entry")
            .label("entry0")
            .ret_void()
            .finish();
        let cfg = ControlFlowGraph::build(&function).unwrap();

        // The synthetic label dodges both collisions.
        assert_eq!(cfg.block(cfg.entry()).unwrap().label, "entry00");
        assert!(cfg.block_by_label("entry").is_some());
        assert!(cfg.block_by_label("entry0").is_some());
    }

    #[test]
    fn test_diamond_edges() {
        let cfg = ControlFlowGraph::build(&diamond()).unwrap();
        assert_eq!(cfg.block_count(), 4);

        let entry = cfg.entry();
        let left = cfg.block_by_label("left").unwrap();
        let right = cfg.block_by_label("right").unwrap();
        let merge = cfg.block_by_label("merge").unwrap();

        let entry_block = cfg.block(entry).unwrap();
        assert!(entry_block.successors.contains(&left));
        assert!(entry_block.successors.contains(&right));

        let merge_block = cfg.block(merge).unwrap();
        assert_eq!(merge_block.predecessors.len(), 2);
        assert!(merge_block.predecessors.contains(&left));
        assert!(merge_block.predecessors.contains(&right));
        assert!(merge_block.successors.is_empty());
    }

    #[test]
    fn test_conditional_branch_same_target_collapses() {
        let function = FunctionBuilder::new("f")
            .constant("cond", Type::Bool, true)
            .br("cond", "next", "next")
            .label("next")
            .ret_void()
            .finish();
        let cfg = ControlFlowGraph::build(&function).unwrap();

        assert_eq!(cfg.block(cfg.entry()).unwrap().successors.len(), 1);
    }

    #[test]
    fn test_fallthrough_and_call() {
        // A call does not terminate a block; a run cut short by the next
        // label falls through.
        let function = FunctionBuilder::new("f")
            .call("r", Type::Int, "g", ["r"])
            .label("after")
            .ret_void()
            .finish();
        let cfg = ControlFlowGraph::build(&function).unwrap();

        let after = cfg.block_by_label("after").unwrap();
        assert_eq!(cfg.block(cfg.entry()).unwrap().successors.len(), 1);
        assert!(cfg.block(cfg.entry()).unwrap().successors.contains(&after));
    }

    #[test]
    fn test_ret_has_no_successors() {
        let function = FunctionBuilder::new("f")
            .ret_void()
            .label("tail")
            .ret_void()
            .finish();
        let cfg = ControlFlowGraph::build(&function).unwrap();

        // The tail block is unreachable and pruned.
        assert_eq!(cfg.block_count(), 1);
        assert!(cfg.block_by_label("tail").is_none());
    }

    #[test]
    fn test_unknown_target_rejected() {
        let function = FunctionBuilder::new("f").jmp("nowhere").finish();
        let err = ControlFlowGraph::build(&function).unwrap_err();
        assert!(matches!(err, Error::UnknownTarget { label, .. } if label == "nowhere"));
    }

    #[test]
    fn test_unknown_target_in_unreachable_code_rejected() {
        let function = FunctionBuilder::new("f")
            .ret_void()
            .label("dead")
            .jmp("nowhere")
            .finish();
        assert!(matches!(
            ControlFlowGraph::build(&function),
            Err(Error::UnknownTarget { .. })
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let function = FunctionBuilder::new("f")
            .label("l")
            .label("l")
            .ret_void()
            .finish();
        assert!(matches!(
            ControlFlowGraph::build(&function),
            Err(Error::DuplicateLabel(label)) if label == "l"
        ));
    }

    #[test]
    fn test_postorder_entry_last() {
        let cfg = ControlFlowGraph::build(&diamond()).unwrap();
        let postorder = cfg.postorder();

        assert_eq!(postorder.len(), cfg.block_count());
        assert_eq!(*postorder.last().unwrap(), cfg.entry());
    }

    #[test]
    fn test_reverse_postorder_respects_edges() {
        let cfg = ControlFlowGraph::build(&diamond()).unwrap();
        let rpo = cfg.reverse_postorder();

        assert_eq!(rpo[0], cfg.entry());
        let pos = |id: BlockId| rpo.iter().position(|&b| b == id).unwrap();
        for block in cfg.block_ids() {
            for &succ in &cfg.block(block).unwrap().successors {
                // Forward edges only; the diamond has no back edges.
                assert!(pos(block) < pos(succ));
            }
        }
    }

    #[test]
    fn test_postorder_terminates_on_loop() {
        let function = FunctionBuilder::new("f")
            .jmp("header")
            .label("header")
            .constant("cond", Type::Bool, true)
            .br("cond", "header", "exit")
            .label("exit")
            .ret_void()
            .finish();
        let cfg = ControlFlowGraph::build(&function).unwrap();
        let postorder = cfg.postorder();

        assert_eq!(postorder.len(), 3);
        assert_eq!(*postorder.last().unwrap(), cfg.entry());
    }

    #[test]
    fn test_unreachable_blocks_pruned() {
        let function = FunctionBuilder::new("f")
            .jmp("exit")
            .label("orphan")
            .constant("x", Type::Int, 1)
            .jmp("exit")
            .label("exit")
            .ret_void()
            .finish();
        let cfg = ControlFlowGraph::build(&function).unwrap();

        assert_eq!(cfg.block_count(), 2);
        assert!(cfg.block_by_label("orphan").is_none());

        // The pruned block leaves no trace in the edge relation.
        let exit = cfg.block_by_label("exit").unwrap();
        assert_eq!(cfg.block(exit).unwrap().predecessors.len(), 1);
    }
}
