use std::fmt;

/// Result of one migration operation.
///
/// Variants are ordered by severity so that the worst outcome of several
/// steps is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// Nothing needed to change.
    NoOp,
    /// The change was made and verified.
    Success,
    /// A precondition, the mutation, or its verification failed.
    Failure,
}

impl Outcome {
    pub fn is_error(self) -> bool {
        matches!(self, Outcome::Failure)
    }

    pub fn exit_code(self) -> i32 {
        if self.is_error() {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::NoOp => "no-op",
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        };
        f.write_str(label)
    }
}
