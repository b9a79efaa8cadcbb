mod clock;
mod response_cache;

pub use clock::*;
pub use response_cache::*;
