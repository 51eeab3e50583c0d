//! Operations the model can request, and the dispatcher that runs them.
//!
//! - [`catalog`] builds the tool definitions sent with every model call.
//! - [`dispatcher`] owns per-request session state and drives the gateways.
//! - [`memory`] provides in-process gateways for dry runs and tests.

pub mod catalog;
pub mod dispatcher;
pub mod memory;

pub use dispatcher::OperationDispatcher;
pub use memory::{InMemoryPresentations, InMemorySharing};
