mod error;
mod handler;
mod router;

pub use error::{ApiError, recover_error};
pub use handler::{ApiResponse, STATE_COOKIE};
pub use router::{RequestTarget, routes};
