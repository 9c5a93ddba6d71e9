//! Prints a function before and after SSA conversion.
//!
//! Run with `RUST_LOG=debug` to see the CFG block dumps and renaming
//! progress the pipeline emits through the `log` facade.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example ssa_dump
//! ```

use ssaform::construct_ssa;
use ssaform::ir::{FunctionBuilder, Opcode, Type};

fn main() -> ssaform::Result<()> {
    env_logger::init();

    // A loop whose body conditionally reassigns the accumulator: the
    // header merges three definitions of `acc` across its two incoming
    // edges.
    let mut function = FunctionBuilder::new("accumulate")
        .param("n", Type::Int)
        .constant("acc", Type::Int, 0)
        .constant("i", Type::Int, 0)
        .jmp("header")
        .label("header")
        .value(Opcode::Lt, "more", Type::Bool, ["i", "n"])
        .br("more", "body", "done")
        .label("body")
        .value(Opcode::Add, "acc", Type::Int, ["acc", "i"])
        .constant("one", Type::Int, 1)
        .value(Opcode::Add, "i", Type::Int, ["i", "one"])
        .jmp("header")
        .label("done")
        .ret("acc")
        .finish();

    println!("before:\n{function}\n");
    construct_ssa(&mut function)?;
    println!("after:\n{function}");
    Ok(())
}
