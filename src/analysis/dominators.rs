//! Dominator tree computation using the Cooper–Harvey–Kennedy iterative
//! algorithm.
//!
//! This module computes, for every block of a [`ControlFlowGraph`], its
//! immediate dominator, its full dominator set, its children in the
//! dominator tree, and its dominance frontier. These are the inputs to SSA
//! construction: frontiers drive phi placement and the tree drives
//! renaming.
//!
//! # Theory
//!
//! A block `d` **dominates** a block `b` if every path from the entry to
//! `b` passes through `d`. The **immediate dominator** of `b` is its unique
//! closest strict dominator; making each block's immediate dominator its
//! parent yields the dominator tree, rooted at the entry.
//!
//! # Algorithm
//!
//! The iterative scheme of Cooper, Harvey and Kennedy ("A Simple, Fast
//! Dominance Algorithm") runs over postorder indices with the entry
//! assigned the highest index. Each block's dominator estimate is refined
//! by intersecting the estimates of its processed predecessors, where the
//! intersection walks both indices upward (toward the entry) until they
//! meet - the nearest common ancestor in the partially-built dominator
//! chain. Every estimate is non-decreasing and bounded by the entry's
//! index, so the fixpoint terminates for reducible and irreducible graphs
//! alike.

use std::collections::BTreeSet;

use crate::{
    analysis::cfg::{BlockId, ControlFlowGraph},
    Error, Result,
};

/// Sentinel for "no dominator estimate yet" in the fixpoint arrays.
const UNDEFINED: usize = usize::MAX;

/// Full passes allowed before the fixpoint is declared broken. The
/// algorithm needs two or three passes on reducible inputs; the cap only
/// trips on an implementation bug.
fn pass_bound(block_count: usize) -> usize {
    2 * block_count + 2
}

/// Result of dominance analysis over one control flow graph.
///
/// All queries are indexed by [`BlockId`]; the tree borrows nothing from
/// the graph it was computed over and never alters the graph's edges.
///
/// # Examples
///
/// ```rust
/// use ssaform::analysis::{ControlFlowGraph, DominatorTree};
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
/// let dominators = DominatorTree::compute(&cfg)?;
///
/// let merge = cfg.block_by_label("merge").unwrap();
/// // Neither arm dominates the merge; its immediate dominator is the entry.
/// assert_eq!(dominators.immediate_dominator(merge), Some(cfg.entry()));
/// # Ok::<(), ssaform::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// The entry (root) block
    entry: BlockId,
    /// Immediate dominator per block (arena-indexed); entry maps to itself
    idom: Vec<BlockId>,
    /// Dominator-tree children per block (inverse of `idom`)
    children: Vec<Vec<BlockId>>,
    /// Dominance frontier per block
    frontiers: Vec<BTreeSet<BlockId>>,
    /// The postorder the fixpoint ran over (entry last)
    postorder: Vec<BlockId>,
}

impl DominatorTree {
    /// Computes the dominator tree for a control flow graph.
    ///
    /// # Errors
    ///
    /// [`Error::Convergence`] if the fixpoint fails to stabilize within a
    /// bound proportional to the block count - an internal-invariant
    /// violation, never the input's fault.
    pub fn compute(cfg: &ControlFlowGraph) -> Result<Self> {
        let postorder = cfg.postorder();
        let n = postorder.len();

        // Arena index -> postorder index. The graph contains reachable
        // blocks only, so the mapping is total.
        let mut postorder_index = vec![UNDEFINED; n];
        for (idx, &block) in postorder.iter().enumerate() {
            postorder_index[block.index()] = idx;
        }

        // doms[i] is the current immediate-dominator estimate of the block
        // with postorder index i, itself a postorder index. The entry (the
        // highest index) seeds the fixpoint with itself.
        let mut doms = vec![UNDEFINED; n];
        doms[n - 1] = n - 1;

        // For each block, the postorder index of whichever predecessor was
        // discovered first while scanning in decreasing index order. The
        // DFS-tree parent finishes after its child, so this seed is always
        // processed before the block it seeds.
        let mut first_processed_pred = vec![UNDEFINED; n];
        for i in (0..n).rev() {
            for &succ in &cfg
                .block(postorder[i])
                .expect("postorder yields valid ids")
                .successors
            {
                let j = postorder_index[succ.index()];
                if first_processed_pred[j] == UNDEFINED {
                    first_processed_pred[j] = i;
                }
            }
        }

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;
            if passes > pass_bound(n) {
                return Err(Error::Convergence(passes));
            }

            for i in (0..n.saturating_sub(1)).rev() {
                let mut new_idom = first_processed_pred[i];
                for &pred in &cfg
                    .block(postorder[i])
                    .expect("postorder yields valid ids")
                    .predecessors
                {
                    let j = postorder_index[pred.index()];
                    if doms[j] != UNDEFINED {
                        new_idom = Self::intersect(j, new_idom, &doms);
                    }
                }
                if doms[i] != new_idom {
                    doms[i] = new_idom;
                    changed = true;
                }
            }
        }

        // Translate postorder indices back to arena ids and invert the
        // relation into child lists (processed entry-downward so children
        // come out in decreasing postorder, a valid traversal order).
        let mut idom = vec![cfg.entry(); n];
        let mut children = vec![Vec::new(); n];
        for i in (0..n.saturating_sub(1)).rev() {
            let block = postorder[i];
            let parent = postorder[doms[i]];
            idom[block.index()] = parent;
            children[parent.index()].push(block);
        }

        let mut tree = DominatorTree {
            entry: cfg.entry(),
            idom,
            children,
            frontiers: vec![BTreeSet::new(); n],
            postorder,
        };
        tree.compute_frontiers(cfg);
        Ok(tree)
    }

    /// Finds the nearest common ancestor of two postorder indices in the
    /// partially-built dominator chain.
    ///
    /// Walks upward (toward the entry, i.e. toward higher indices) one step
    /// at a time on whichever side currently has the smaller index.
    fn intersect(mut a: usize, mut b: usize, doms: &[usize]) -> usize {
        while a != b {
            while a < b {
                a = doms[a];
            }
            while b < a {
                b = doms[b];
            }
        }
        a
    }

    /// Computes dominance frontiers.
    ///
    /// For every block `b` with two or more predecessors: each predecessor
    /// `p` contributes `b` to the frontier of `p`, `idom(p)`,
    /// `idom(idom(p))`, ..., stopping (exclusive) at `idom(b)`. Blocks with
    /// fewer than two predecessors contribute nothing directly.
    fn compute_frontiers(&mut self, cfg: &ControlFlowGraph) {
        for block in cfg.block_ids() {
            let preds = &cfg.block(block).expect("arena id is valid").predecessors;
            if preds.len() < 2 {
                continue;
            }
            let stop = self.immediate_dominator(block);
            for &pred in preds {
                let mut runner = Some(pred);
                while runner != stop {
                    let Some(current) = runner else { break };
                    self.frontiers[current.index()].insert(block);
                    runner = self.immediate_dominator(current);
                }
            }
        }
    }

    /// Returns the entry (root) block of the dominator tree.
    #[must_use]
    #[inline]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Returns the immediate dominator of a block, or `None` for the entry.
    #[must_use]
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        if block == self.entry {
            None
        } else {
            Some(self.idom[block.index()])
        }
    }

    /// Checks if block `a` dominates block `b`.
    ///
    /// A block dominates itself; the entry dominates every block.
    #[must_use]
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.immediate_dominator(current) {
                Some(idom) => current = idom,
                None => return false,
            }
        }
    }

    /// Checks if block `a` strictly dominates block `b` (dominates and is
    /// not `b` itself).
    #[must_use]
    pub fn strictly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns the full dominator set of a block: the block itself and,
    /// transitively, its immediate dominator's dominators.
    #[must_use]
    pub fn dominators(&self, block: BlockId) -> BTreeSet<BlockId> {
        let mut set = BTreeSet::new();
        let mut current = Some(block);
        while let Some(b) = current {
            set.insert(b);
            current = self.immediate_dominator(b);
        }
        set
    }

    /// Returns the dominator-tree children of a block: every block whose
    /// immediate dominator it is.
    #[must_use]
    pub fn children(&self, block: BlockId) -> &[BlockId] {
        &self.children[block.index()]
    }

    /// Returns the dominance frontier of a block.
    #[must_use]
    pub fn frontier(&self, block: BlockId) -> &BTreeSet<BlockId> {
        &self.frontiers[block.index()]
    }

    /// Returns the postorder sequence the fixpoint ran over (entry last).
    #[must_use]
    pub fn postorder(&self) -> &[BlockId] {
        &self.postorder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FunctionBuilder, Function, Type};

    fn analyze(function: &Function) -> (ControlFlowGraph, DominatorTree) {
        let cfg = ControlFlowGraph::build(function).expect("CFG construction failed");
        let tree = DominatorTree::compute(&cfg).expect("dominance analysis failed");
        (cfg, tree)
    }

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
    fn test_entry_has_no_idom() {
        let (cfg, tree) = analyze(&diamond());
        assert_eq!(tree.immediate_dominator(cfg.entry()), None);
        assert_eq!(
            tree.dominators(cfg.entry()),
            std::iter::once(cfg.entry()).collect()
        );
    }

    #[test]
    fn test_linear_chain() {
        let function = FunctionBuilder::new("f")
            .jmp("a")
            .label("a")
            .jmp("b")
            .label("b")
            .ret_void()
            .finish();
        let (cfg, tree) = analyze(&function);

        let a = cfg.block_by_label("a").unwrap();
        let b = cfg.block_by_label("b").unwrap();

        assert_eq!(tree.immediate_dominator(a), Some(cfg.entry()));
        assert_eq!(tree.immediate_dominator(b), Some(a));
        assert!(tree.dominates(cfg.entry(), b));
        assert!(tree.dominates(a, b));
        assert!(!tree.dominates(b, a));
    }

    #[test]
    fn test_diamond_idoms() {
        let (cfg, tree) = analyze(&diamond());

        let left = cfg.block_by_label("left").unwrap();
        let right = cfg.block_by_label("right").unwrap();
        let merge = cfg.block_by_label("merge").unwrap();

        assert_eq!(tree.immediate_dominator(left), Some(cfg.entry()));
        assert_eq!(tree.immediate_dominator(right), Some(cfg.entry()));
        // Neither arm dominates the merge - alternative paths exist.
        assert_eq!(tree.immediate_dominator(merge), Some(cfg.entry()));
        assert!(!tree.strictly_dominates(left, merge));
        assert!(!tree.strictly_dominates(right, merge));
    }

    #[test]
    fn test_idom_is_strict_dominator() {
        let (cfg, tree) = analyze(&diamond());
        for block in cfg.block_ids() {
            if block == cfg.entry() {
                continue;
            }
            let idom = tree.immediate_dominator(block).unwrap();
            assert_ne!(idom, block);
            assert!(tree.dominators(block).contains(&idom));
            assert!(tree.strictly_dominates(idom, block));
        }
    }

    #[test]
    fn test_dominator_sets_chain() {
        let (cfg, tree) = analyze(&diamond());
        for block in cfg.block_ids() {
            let doms = tree.dominators(block);
            assert!(doms.contains(&block));
            assert!(doms.contains(&cfg.entry()));
            if let Some(idom) = tree.immediate_dominator(block) {
                // dom(b) = {b} ∪ dom(idom(b))
                let mut expected = tree.dominators(idom);
                expected.insert(block);
                assert_eq!(doms, expected);
            }
        }
    }

    #[test]
    fn test_children_form_tree() {
        let (cfg, tree) = analyze(&diamond());

        let mut seen = std::collections::BTreeSet::new();
        let mut stack = vec![cfg.entry()];
        while let Some(block) = stack.pop() {
            assert!(seen.insert(block), "dominator child relation has a cycle");
            stack.extend(tree.children(block).iter().copied());
        }
        assert_eq!(seen.len(), cfg.block_count());
    }

    #[test]
    fn test_diamond_frontiers() {
        let (cfg, tree) = analyze(&diamond());

        let left = cfg.block_by_label("left").unwrap();
        let right = cfg.block_by_label("right").unwrap();
        let merge = cfg.block_by_label("merge").unwrap();

        assert!(tree.frontier(left).contains(&merge));
        assert!(tree.frontier(right).contains(&merge));
        assert!(tree.frontier(cfg.entry()).is_empty());
        assert!(tree.frontier(merge).is_empty());
    }

    #[test]
    fn test_loop_header_in_own_frontier() {
        // entry -> header; header -> header | exit. The back edge gives the
        // header two predecessors, and the header dominates the predecessor
        // on the back edge (itself), so it lands in its own frontier.
        let function = FunctionBuilder::new("f")
            .jmp("header")
            .label("header")
            .constant("cond", Type::Bool, true)
            .br("cond", "header", "exit")
            .label("exit")
            .ret_void()
            .finish();
        let (cfg, tree) = analyze(&function);

        let header = cfg.block_by_label("header").unwrap();
        assert_eq!(cfg.block(header).unwrap().predecessors.len(), 2);
        assert!(tree.frontier(header).contains(&header));
    }

    #[test]
    fn test_loop_body_frontier_contains_header() {
        let function = FunctionBuilder::new("f")
            .jmp("header")
            .label("header")
            .constant("cond", Type::Bool, true)
            .br("cond", "body", "exit")
            .label("body")
            .jmp("header")
            .label("exit")
            .ret_void()
            .finish();
        let (cfg, tree) = analyze(&function);

        let header = cfg.block_by_label("header").unwrap();
        let body = cfg.block_by_label("body").unwrap();

        assert!(tree.frontier(body).contains(&header));
        assert!(tree.dominates(header, body));
        assert!(!tree.strictly_dominates(body, header));
    }

    #[test]
    fn test_frontier_membership_symmetry() {
        // b ∈ frontier(p) iff p does not strictly dominate b but dominates
        // some predecessor of b.
        let (cfg, tree) = analyze(&diamond());
        for p in cfg.block_ids() {
            for b in cfg.block_ids() {
                let in_frontier = tree.frontier(p).contains(&b);
                let derived = !tree.strictly_dominates(p, b)
                    && cfg
                        .block(b)
                        .unwrap()
                        .predecessors
                        .iter()
                        .any(|&pred| tree.dominates(p, pred));
                assert_eq!(in_frontier, derived, "mismatch for p={p} b={b}");
            }
        }
    }

    #[test]
    fn test_nested_joins() {
        //       entry
        //         |
        //        if1
        //       /   \
        //      a     b
        //     / \     \
        //    c   d     e
        //     \ /     /
        //     join1  /
        //       \   /
        //       join2
        let function = FunctionBuilder::new("f")
            .jmp("if1")
            .label("if1")
            .constant("c1", Type::Bool, true)
            .br("c1", "a", "b")
            .label("a")
            .constant("c2", Type::Bool, true)
            .br("c2", "c", "d")
            .label("b")
            .jmp("e")
            .label("c")
            .jmp("join1")
            .label("d")
            .jmp("join1")
            .label("e")
            .jmp("join2")
            .label("join1")
            .jmp("join2")
            .label("join2")
            .ret_void()
            .finish();
        let (cfg, tree) = analyze(&function);

        let by = |l: &str| cfg.block_by_label(l).unwrap();

        assert!(tree.frontier(by("c")).contains(&by("join1")));
        assert!(tree.frontier(by("d")).contains(&by("join1")));
        assert!(tree.frontier(by("join1")).contains(&by("join2")));
        assert!(tree.frontier(by("e")).contains(&by("join2")));

        assert_eq!(tree.immediate_dominator(by("join1")), Some(by("a")));
        assert_eq!(tree.immediate_dominator(by("join2")), Some(by("if1")));
    }

    #[test]
    fn test_irreducible_graph_converges() {
        // entry branches into the middle of a cycle: x <-> y, both entered
        // directly, so neither dominates the other.
        let function = FunctionBuilder::new("f")
            .constant("cond", Type::Bool, true)
            .br("cond", "x", "y")
            .label("x")
            .constant("c2", Type::Bool, true)
            .br("c2", "y", "out")
            .label("y")
            .constant("c3", Type::Bool, true)
            .br("c3", "x", "out")
            .label("out")
            .ret_void()
            .finish();
        let (cfg, tree) = analyze(&function);

        let x = cfg.block_by_label("x").unwrap();
        let y = cfg.block_by_label("y").unwrap();

        assert_eq!(tree.immediate_dominator(x), Some(cfg.entry()));
        assert_eq!(tree.immediate_dominator(y), Some(cfg.entry()));
        assert!(!tree.dominates(x, y));
        assert!(!tree.dominates(y, x));
    }

    #[test]
    fn test_single_block_tree() {
        let function = FunctionBuilder::new("f").ret_void().finish();
        let (cfg, tree) = analyze(&function);

        assert_eq!(tree.entry(), cfg.entry());
        assert!(tree.children(cfg.entry()).is_empty());
        assert!(tree.frontier(cfg.entry()).is_empty());
        assert_eq!(tree.postorder(), &[cfg.entry()]);
    }
}
