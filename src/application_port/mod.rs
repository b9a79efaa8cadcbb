mod auth_flow;
mod media_service;
mod session_codec;
mod token_exchange;
mod upstream;

pub use auth_flow::*;
pub use media_service::*;
pub use session_codec::*;
pub use token_exchange::*;
pub use upstream::*;
