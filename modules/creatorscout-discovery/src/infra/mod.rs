pub mod cache;
pub mod retry;

pub use cache::{cache_key, MemoryCache};
pub use retry::{with_retry, RetryPolicy};
