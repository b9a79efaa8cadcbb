mod auth_flow_impl;
mod media_service_fake;
mod media_service_impl;
mod provider_config;
mod provider_http;
mod session_codec_impl;
mod token_exchange_fake;
mod token_exchange_impl;

pub use auth_flow_impl::*;
pub use media_service_fake::*;
pub use media_service_impl::*;
pub use provider_config::*;
pub use session_codec_impl::*;
pub use token_exchange_fake::*;
pub use token_exchange_impl::*;
