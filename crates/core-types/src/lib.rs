pub mod documents;
pub mod error;
pub mod ids;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use documents::{AlgoMetadata, BacktestResult, REMOTE_ID_KEY};
pub use error::CoreError;
pub use ids::{HarnessId, RemoteId};
pub use structs::Kline;
