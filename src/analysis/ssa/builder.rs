//! SSA construction: definition collection, phi placement, renaming, and
//! stream reconstruction.
//!
//! [`SsaBuilder`] consumes a mutable [`ControlFlowGraph`] and the
//! [`DominatorTree`] computed over it. It rewrites instruction contents in
//! place - block structure and edges are never altered - and finally
//! flattens the renamed blocks back into the function's instruction list.
//!
//! # Usage
//!
//! ```rust
//! use ssaform::analysis::{ControlFlowGraph, DominatorTree, SsaBuilder};
//! use ssaform::ir::{FunctionBuilder, Opcode, Type};
//!
//! let mut function = FunctionBuilder::new("f")
//!     .constant("x", Type::Int, 1)
//!     .jmp("use")
//!     .label("use")
//!     .effect(Opcode::Print, ["x"])
//!     .ret_void()
//!     .finish();
//!
//! let mut cfg = ControlFlowGraph::build(&function)?;
//! let dominators = DominatorTree::compute(&cfg)?;
//! SsaBuilder::new(&mut cfg, &dominators).run(&mut function)?;
//!
//! // The use in the second block resolves to the entry's renamed `x`.
//! assert!(function
//!     .instructions
//!     .iter()
//!     .any(|i| i.args().contains(&"x.0".to_string())));
//! # Ok::<(), ssaform::Error>(())
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, trace, warn};

use crate::{
    analysis::{
        cfg::{BlockId, ControlFlowGraph},
        dominators::DominatorTree,
        ssa::rename::{base_name, RenameContext},
    },
    ir::{Function, Instruction, Opcode, Type},
    Error, Result,
};

/// What to do when renaming encounters a use with no dominating definition.
///
/// Such a use means some path from the entry reaches the read without
/// passing any definition of the variable. Neither option renames silently:
/// rejection surfaces an error, placeholding materializes an explicit
/// `undef` definition and logs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndefinedUsePolicy {
    /// Fail the whole function's transformation with
    /// [`Error::UndefinedUse`].
    #[default]
    Reject,
    /// Mint a fresh version backed by an explicit `undef` definition
    /// inserted at the head of the entry block.
    Placeholder,
}

/// Options controlling SSA construction.
///
/// # Examples
///
/// ```rust
/// use ssaform::{SsaOptions, UndefinedUsePolicy};
///
/// let options = SsaOptions {
///     undefined_uses: UndefinedUsePolicy::Placeholder,
/// };
/// assert_ne!(options.undefined_uses, SsaOptions::default().undefined_uses);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SsaOptions {
    /// Policy for uses with no dominating definition
    pub undefined_uses: UndefinedUsePolicy,
}

/// The worklist frame of the iterative dominator-tree walk.
///
/// `Enter` processes a block and schedules its children; `Leave` runs after
/// every descendant has been processed and pops exactly the names the block
/// pushed. This preserves the push-before-descend / pop-after-return
/// discipline that makes a use resolve to its nearest dominating
/// definition.
enum Frame {
    Enter(BlockId),
    Leave { pushed: Vec<String> },
}

/// Builder for constructing SSA form over a control flow graph.
///
/// The phases run strictly in order: definition collection, phi insertion,
/// renaming, reconstruction. Each phase consumes only the previous phase's
/// output, and the builder refuses input that already carries phi
/// instructions (re-running the pipeline would corrupt phi argument lists).
#[derive(Debug)]
pub struct SsaBuilder<'a> {
    /// The control flow graph being rewritten
    cfg: &'a mut ControlFlowGraph,
    /// Dominator tree computed over `cfg`
    dom: &'a DominatorTree,
    /// Construction options
    options: SsaOptions,
}

impl<'a> SsaBuilder<'a> {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new(cfg: &'a mut ControlFlowGraph, dom: &'a DominatorTree) -> Self {
        Self::with_options(cfg, dom, SsaOptions::default())
    }

    /// Creates a builder with explicit options.
    #[must_use]
    pub fn with_options(
        cfg: &'a mut ControlFlowGraph,
        dom: &'a DominatorTree,
        options: SsaOptions,
    ) -> Self {
        SsaBuilder { cfg, dom, options }
    }

    /// Runs the full SSA construction over `function`.
    ///
    /// On success the function's parameter names carry version suffixes and
    /// its instruction list has been replaced with the reconstructed
    /// SSA-form stream: every destination is unique across the function and
    /// every phi carries one operand and one predecessor tag per incoming
    /// control-flow edge.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyTransformed`] if the function already contains phi
    ///   instructions
    /// - [`Error::UndefinedUse`] under [`UndefinedUsePolicy::Reject`] when
    ///   a use has no dominating definition
    /// - [`Error::MissingType`] when a phi or placeholder cannot recover a
    ///   declared type for its variable
    /// - [`Error::InvalidVariable`] if a variable name contains `.`
    pub fn run(mut self, function: &mut Function) -> Result<()> {
        if self
            .cfg
            .blocks()
            .any(|b| b.instructions.iter().any(Instruction::is_phi))
        {
            return Err(Error::AlreadyTransformed(function.name.clone()));
        }

        let (globals, def_blocks, var_types) = self.collect_definitions(function);
        debug!(
            "function {}: {} globals, {} defined variables",
            function.name,
            globals.len(),
            def_blocks.len()
        );

        self.insert_phis(function, &globals, &def_blocks)?;
        self.rename(function, &var_types)?;
        self.reconstruct(function);
        Ok(())
    }

    /// Phase 1: finds the global variables and every variable's defining
    /// blocks.
    ///
    /// A variable is "global" (a phi candidate) if some block reads it
    /// before locally redefining it - its value may flow in from another
    /// block. Parameters are defined in the entry block before any
    /// instruction executes. The last declared type seen for each variable
    /// is recorded for placeholder typing.
    #[allow(clippy::type_complexity)]
    fn collect_definitions(
        &self,
        function: &Function,
    ) -> (
        BTreeSet<String>,
        BTreeMap<String, BTreeSet<BlockId>>,
        HashMap<String, Type>,
    ) {
        let mut globals = BTreeSet::new();
        let mut def_blocks: BTreeMap<String, BTreeSet<BlockId>> = BTreeMap::new();
        let mut var_types = HashMap::new();

        for param in &function.params {
            def_blocks
                .entry(param.name.clone())
                .or_default()
                .insert(self.cfg.entry());
            var_types.insert(param.name.clone(), param.param_type);
        }

        for id in self.cfg.block_ids() {
            let block = self.cfg.block(id).expect("arena id is valid");
            let mut killed: BTreeSet<&str> = BTreeSet::new();
            for instr in &block.instructions {
                for arg in instr.args() {
                    if !killed.contains(arg.as_str()) {
                        globals.insert(arg.clone());
                    }
                }
                if let Some(dest) = instr.dest() {
                    killed.insert(dest);
                    def_blocks.entry(dest.to_string()).or_default().insert(id);
                    if let Some(ty) = instr.op_type() {
                        var_types.insert(dest.to_string(), ty);
                    }
                }
            }
        }

        (globals, def_blocks, var_types)
    }

    /// Phase 2: plants phi instructions at dominance frontiers.
    ///
    /// For each global variable independently, a worklist seeded with its
    /// defining blocks: popping a block plants a phi for the variable in
    /// every frontier block not yet carrying one, and each planted phi
    /// makes its block a new definition site. Terminates because each
    /// (variable, block) pair plants at most once.
    fn insert_phis(
        &mut self,
        function: &Function,
        globals: &BTreeSet<String>,
        def_blocks: &BTreeMap<String, BTreeSet<BlockId>>,
    ) -> Result<()> {
        let dom = self.dom;
        let param_types: HashMap<&str, Type> = function
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.param_type))
            .collect();

        for var in globals {
            // A global never defined anywhere needs no phis; its use will
            // surface during renaming.
            let Some(defs) = def_blocks.get(var) else {
                continue;
            };
            let mut worklist: Vec<BlockId> = defs.iter().copied().collect();
            while let Some(block) = worklist.pop() {
                trace!("def of '{var}' in block {block}");
                // Type of the most recent same-block definition, else the
                // declared parameter type.
                let declared = self
                    .cfg
                    .block(block)
                    .expect("worklist holds valid ids")
                    .instructions
                    .iter()
                    .rev()
                    .find(|i| i.dest() == Some(var.as_str()))
                    .and_then(Instruction::op_type);
                let phi_type = declared.or_else(|| param_types.get(var.as_str()).copied());

                for &frontier in dom.frontier(block) {
                    let frontier_block =
                        self.cfg.block_mut(frontier).expect("frontier id is valid");
                    if frontier_block.has_phi_for(var) {
                        continue;
                    }
                    let ty = phi_type.ok_or_else(|| Error::MissingType(var.clone()))?;
                    frontier_block.instructions.insert(
                        0,
                        Instruction::Op {
                            op: Opcode::Phi,
                            dest: Some(var.clone()),
                            op_type: Some(ty),
                            args: Vec::new(),
                            labels: Vec::new(),
                            funcs: Vec::new(),
                            value: None,
                        },
                    );
                    worklist.push(frontier);
                }
            }
        }
        Ok(())
    }

    /// Phase 3: renames variables over the dominator tree.
    ///
    /// Parameters are renamed once, up front. The walk then carries the
    /// shared [`RenameContext`] through an explicit enter/leave frame
    /// stack: on entering a block, non-phi operands resolve to the top of
    /// their visibility stack and every destination (phis included) pushes
    /// a fresh version; each CFG successor's phis receive the current
    /// version of their variable tagged with this block's label; on
    /// leaving, exactly the pushed names are popped.
    fn rename(&mut self, function: &mut Function, var_types: &HashMap<String, Type>) -> Result<()> {
        let dom = self.dom;
        let policy = self.options.undefined_uses;
        let mut ctx = RenameContext::new();
        let mut placeholders: Vec<(String, Type)> = Vec::new();

        for param in &mut function.params {
            param.name = ctx.fresh(&param.name)?;
        }

        let mut stack = vec![Frame::Enter(dom.entry())];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(block) => {
                    let pushed = self.rename_block(
                        block,
                        &mut ctx,
                        policy,
                        var_types,
                        &mut placeholders,
                    )?;
                    stack.push(Frame::Leave { pushed });
                    // Children's subtrees are disjoint, so order between
                    // them is free; reversed push keeps the natural order.
                    for &child in dom.children(block).iter().rev() {
                        stack.push(Frame::Enter(child));
                    }
                }
                Frame::Leave { pushed } => {
                    for base in &pushed {
                        ctx.pop(base);
                    }
                }
            }
        }

        // Materialize placeholder definitions at the head of the entry
        // block, in discovery order.
        if !placeholders.is_empty() {
            let entry = self
                .cfg
                .block_mut(dom.entry())
                .expect("entry id is valid");
            for (index, (name, ty)) in placeholders.into_iter().enumerate() {
                entry.instructions.insert(
                    index,
                    Instruction::Op {
                        op: Opcode::Undef,
                        dest: Some(name),
                        op_type: Some(ty),
                        args: Vec::new(),
                        labels: Vec::new(),
                        funcs: Vec::new(),
                        value: None,
                    },
                );
            }
        }
        Ok(())
    }

    /// Renames one block's instructions and extends its CFG successors'
    /// phis. Returns the base names this block pushed, for the matching
    /// leave-frame pops.
    fn rename_block(
        &mut self,
        block: BlockId,
        ctx: &mut RenameContext,
        policy: UndefinedUsePolicy,
        var_types: &HashMap<String, Type>,
        placeholders: &mut Vec<(String, Type)>,
    ) -> Result<Vec<String>> {
        let mut pushed = Vec::new();

        let current = self.cfg.block_mut(block).expect("walk visits valid ids");
        trace!("renaming block '{}'", current.label);
        let block_label = current.label.clone();

        for instr in &mut current.instructions {
            let is_phi = instr.is_phi();
            if let Instruction::Op { args, dest, .. } = instr {
                // Phi operands are filled in from predecessors, never
                // rewritten in place.
                if !is_phi {
                    for arg in args.iter_mut() {
                        *arg = resolve_use(
                            ctx,
                            policy,
                            arg,
                            &block_label,
                            &mut pushed,
                            placeholders,
                            var_types,
                        )?;
                    }
                }
                if let Some(dest) = dest {
                    let fresh = ctx.fresh(dest)?;
                    pushed.push(std::mem::replace(dest, fresh));
                }
            }
        }

        // Extend each CFG successor's phis (CFG edges, not dominator-tree
        // edges) with the version visible at the end of this block.
        let successors: Vec<BlockId> = self
            .cfg
            .block(block)
            .expect("walk visits valid ids")
            .successors
            .iter()
            .copied()
            .collect();
        for succ in successors {
            let succ_block = self.cfg.block_mut(succ).expect("successor id is valid");
            for instr in &mut succ_block.instructions {
                if !instr.is_phi() {
                    continue;
                }
                if let Instruction::Op {
                    dest: Some(dest),
                    args,
                    labels,
                    ..
                } = instr
                {
                    let base = base_name(dest).to_string();
                    let name = resolve_use(
                        ctx,
                        policy,
                        &base,
                        &block_label,
                        &mut pushed,
                        placeholders,
                        var_types,
                    )?;
                    args.push(name);
                    labels.push(block_label.clone());
                }
            }
        }

        Ok(pushed)
    }

    /// Phase 4: flattens the renamed blocks back into the function's
    /// instruction list, a label marker before each block's run, in the
    /// original stream order (entry first).
    fn reconstruct(&mut self, function: &mut Function) {
        let mut instructions = Vec::new();
        for block in self.cfg.blocks() {
            instructions.push(Instruction::label(block.label.clone()));
            instructions.extend(block.instructions.iter().cloned());
        }
        function.instructions = instructions;
    }
}

/// Resolves a use of `base` to its currently visible versioned name.
///
/// An empty visibility stack means no definition dominates the use; the
/// policy decides between failing the transformation and minting a
/// placeholder version (recorded for an `undef` definition at the entry and
/// pushed so the rest of this dominator subtree reuses it).
fn resolve_use(
    ctx: &mut RenameContext,
    policy: UndefinedUsePolicy,
    base: &str,
    block_label: &str,
    pushed: &mut Vec<String>,
    placeholders: &mut Vec<(String, Type)>,
    var_types: &HashMap<String, Type>,
) -> Result<String> {
    if base.contains('.') {
        return Err(Error::InvalidVariable(base.to_string()));
    }
    if let Some(name) = ctx.current(base) {
        return Ok(name);
    }
    match policy {
        UndefinedUsePolicy::Reject => Err(Error::UndefinedUse {
            variable: base.to_string(),
            block: block_label.to_string(),
        }),
        UndefinedUsePolicy::Placeholder => {
            let ty = var_types
                .get(base)
                .copied()
                .ok_or_else(|| Error::MissingType(base.to_string()))?;
            let name = ctx.fresh(base)?;
            pushed.push(base.to_string());
            placeholders.push((name.clone(), ty));
            warn!(
                "no dominating definition for '{base}' in block '{block_label}'; \
                 synthesizing placeholder '{name}'"
            );
            Ok(name)
        }
    }
}
