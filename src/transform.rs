//! The strictly linear transformation pipeline and the program-level
//! driver.

use rayon::prelude::*;

use crate::{
    analysis::{ControlFlowGraph, DominatorTree, SsaBuilder, SsaOptions},
    ir::{Function, Program},
    Result,
};

/// Transforms a single function into SSA form with default options.
///
/// The pipeline is strictly linear: CFG construction, dominance analysis,
/// phi insertion, renaming, reconstruction. Each stage consumes only the
/// previous stage's output and there are no backward transitions. On
/// success the function's instruction list has been replaced in place with
/// the SSA-form stream and its parameters carry versioned names.
///
/// # Errors
///
/// Any stage's failure aborts the whole function's transformation. There is
/// no partial or recoverable transformation of one function: on error the
/// function must be considered unusable (its parameters may already carry
/// renamed forms).
///
/// # Examples
///
/// ```rust
/// use ssaform::construct_ssa;
/// use ssaform::ir::{FunctionBuilder, Type};
///
/// let mut function = FunctionBuilder::new("f")
///     .constant("x", Type::Int, 1)
///     .ret("x")
///     .finish();
/// construct_ssa(&mut function)?;
///
/// assert_eq!(function.instructions[1].dest(), Some("x.0"));
/// # Ok::<(), ssaform::Error>(())
/// ```
pub fn construct_ssa(function: &mut Function) -> Result<()> {
    construct_ssa_with(function, &SsaOptions::default())
}

/// Transforms a single function into SSA form with explicit options.
///
/// See [`construct_ssa`] for the pipeline; options select the
/// undefined-use policy.
pub fn construct_ssa_with(function: &mut Function, options: &SsaOptions) -> Result<()> {
    let mut cfg = ControlFlowGraph::build(function)?;
    let dominators = DominatorTree::compute(&cfg)?;
    SsaBuilder::with_options(&mut cfg, &dominators, *options).run(function)
}

/// Transforms every function of a program into SSA form.
///
/// Functions have no data dependencies on each other, so they are
/// transformed in parallel. The first failure aborts the batch, annotated
/// with the offending function's name; functions already processed keep
/// their transformed form.
///
/// # Errors
///
/// The first per-function error, wrapped in
/// [`Error::Function`](crate::Error::Function).
pub fn transform_program(program: &mut Program) -> Result<()> {
    transform_program_with(program, &SsaOptions::default())
}

/// Transforms every function of a program with explicit options.
///
/// See [`transform_program`].
pub fn transform_program_with(program: &mut Program, options: &SsaOptions) -> Result<()> {
    program
        .functions
        .par_iter_mut()
        .try_for_each(|function| {
            construct_ssa_with(function, options)
                .map_err(|e| e.in_function(&function.name))
        })
}
