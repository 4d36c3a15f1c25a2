//! Response types and errors shared across the `hello-world` function crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
pub use protocol::ProxyResponse;
