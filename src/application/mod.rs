// Application layer - the expense service and the reports it builds.
// The service owns the ledger and flushes it to storage after every mutation.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
