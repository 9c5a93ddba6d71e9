use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this
/// library can potentially return.
///
/// This enum covers all possible error conditions that can occur during CFG
/// construction, dominance analysis, and SSA transformation. Each variant
/// provides specific context about the failure mode.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::UnknownTarget`] - Control transfer to a label with no block
/// - [`Error::DuplicateLabel`] - Two blocks sharing one label
/// - [`Error::InvalidVariable`] - Variable name the renamer cannot version
/// - [`Error::Empty`] - Function with no transformable content
///
/// ## Internal Invariant Violations
/// - [`Error::Convergence`] - Dominator fixpoint failed to stabilize
/// - [`Error::MissingType`] - No declared type recoverable for a variable
///
/// ## Transformation Errors
/// - [`Error::UndefinedUse`] - Use with no dominating definition
/// - [`Error::AlreadyTransformed`] - Pipeline re-invoked on SSA-form input
/// - [`Error::Function`] - Per-function failure with function context
#[derive(Error, Debug)]
pub enum Error {
    /// A control instruction names a target label that does not correspond
    /// to any block in the function.
    ///
    /// Constructing an edge to a nonexistent block would corrupt every
    /// downstream predecessor/successor set, so this is surfaced rather
    /// than ignored, even when the offending block is unreachable.
    #[error("Control transfer in block '{block}' targets unknown label '{label}'")]
    UnknownTarget {
        /// The label that no block carries
        label: String,
        /// The block whose terminator names the label
        block: String,
    },

    /// Provided function was empty.
    ///
    /// A function must contain at least one instruction or label marker to
    /// be partitioned into basic blocks.
    #[error("Provided function was empty")]
    Empty,

    /// Two label markers in one function share a name.
    ///
    /// Block identity is the unique label, so a duplicate would silently
    /// collapse two blocks into one table slot.
    #[error("Duplicate label '{0}' in function")]
    DuplicateLabel(String),

    /// The dominator fixpoint failed to stabilize within its pass bound.
    ///
    /// The iterative algorithm provably terminates for any finite CFG,
    /// reducible or irreducible, so exceeding the bound indicates an
    /// implementation bug rather than bad input.
    ///
    /// The associated value is the number of full passes executed.
    #[error("Dominator computation did not converge after {0} passes")]
    Convergence(usize),

    /// A use was encountered during renaming whose base name has no
    /// visible definition at that point.
    ///
    /// No definition dominates the use. Under
    /// [`UndefinedUsePolicy::Reject`](crate::UndefinedUsePolicy::Reject)
    /// this fails the whole transformation; under
    /// [`UndefinedUsePolicy::Placeholder`](crate::UndefinedUsePolicy::Placeholder)
    /// an explicit `undef` definition is synthesized instead and the error
    /// is not raised.
    #[error("Variable '{variable}' is used in block '{block}' with no dominating definition")]
    UndefinedUse {
        /// The base variable name with the empty visibility stack
        variable: String,
        /// The block containing the offending use
        block: String,
    },

    /// A variable or parameter name cannot participate in renaming.
    ///
    /// Versioned names take the form `base.N`, so input names containing
    /// `.` would make the base name unrecoverable.
    #[error("Variable name '{0}' cannot be versioned (contains '.')")]
    InvalidVariable(String),

    /// No declared type could be recovered for a variable.
    ///
    /// Phi instructions and synthesized `undef` placeholders need a type;
    /// it is taken from the variable's most recent declared definition or
    /// its parameter declaration. A variable with neither cannot be typed.
    #[error("No declared type recoverable for variable '{0}'")]
    MissingType(String),

    /// The pipeline was invoked on a function that is already in SSA form.
    ///
    /// Re-running the transformation would corrupt phi argument lists, so a
    /// function already containing phi instructions is refused before any
    /// mutation takes place.
    #[error("Function '{0}' already contains phi instructions")]
    AlreadyTransformed(String),

    /// A per-function failure, annotated with the function's name.
    ///
    /// Produced by [`transform_program`](crate::transform_program) so that
    /// callers processing whole programs can tell which function failed.
    #[error("In function '{function}': {source}")]
    Function {
        /// The name of the function whose transformation failed
        function: String,
        /// The underlying failure
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps this error with the name of the function being transformed.
    pub(crate) fn in_function(self, name: &str) -> Self {
        Error::Function {
            function: name.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_target_display() {
        let err = Error::UnknownTarget {
            label: "loop".to_string(),
            block: "entry".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Control transfer in block 'entry' targets unknown label 'loop'"
        );
    }

    #[test]
    fn test_function_wrapping() {
        let err = Error::Empty.in_function("main");
        assert_eq!(
            err.to_string(),
            "In function 'main': Provided function was empty"
        );
    }

    #[test]
    fn test_convergence_display() {
        let err = Error::Convergence(42);
        assert!(err.to_string().contains("42 passes"));
    }
}
