pub mod client;
pub mod errors;
pub mod gateway;

pub use client::OctocrabGateway;
pub use errors::GitHubError;
pub use gateway::{PullRequestRef, RepositoryGateway};
