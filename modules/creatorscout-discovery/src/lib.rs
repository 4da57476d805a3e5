pub mod discovery;
pub mod error;
pub mod export;
pub mod infra;
pub mod links;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use discovery::{Discovery, DiscoveryDeps};
pub use error::{DiscoveryError, Stage, UpstreamError};
