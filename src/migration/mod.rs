//! Default-branch migration core.
//!
//! A [`Migration`] moves one repository from a pre-branch (usually `master`)
//! to a post-branch (usually `main`) through the operations `info`, `create`,
//! `set`, `update-pulls`, `delete` and the compound `replace`.

pub mod branch;
pub mod identity;
pub mod log;
pub mod operations;
pub mod outcome;
pub mod repository;
pub mod validator;

#[cfg(test)]
pub(crate) mod mocks;

pub use branch::Branch;
pub use identity::{MalformedIdentity, RepositoryIdentity};
pub use log::{LogRecord, LogSink, Severity, TracingSink};
pub use operations::{Migration, Operation, DEFAULT_SETTLE_DELAY};
pub use outcome::Outcome;
pub use repository::{OperationScope, Repository};
pub use validator::{StepError, ValidationFailure, Validator};
