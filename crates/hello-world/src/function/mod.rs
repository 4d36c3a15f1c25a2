//! The function proper: shared state, the outbound IP lookup, the request
//! handler and the per-invocation instrumentation wrapped around it.
//!
//! Spans nest strictly per invocation: `invocation` → `lambdaHandlerSpan` →
//! `getIpAddressSpan`.

pub mod handlers;
pub mod instrument;
pub mod lookup;
pub mod state;

pub use state::FunctionState;
