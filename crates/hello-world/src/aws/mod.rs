//! AWS SDK configuration and client instrumentation.
//!
//! Configuration failures here are fatal: a function that cannot resolve a
//! region or credentials cannot make any AWS call, so startup aborts. Clients
//! built here trace every operation through [`TracingInterceptor`].

pub mod clients;
pub mod interceptor;

pub use clients::AwsClients;
