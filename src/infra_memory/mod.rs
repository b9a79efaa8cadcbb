mod clock;
mod rate_limiter_memory;
mod response_cache_memory;

pub use clock::*;
pub use rate_limiter_memory::*;
pub use response_cache_memory::*;
