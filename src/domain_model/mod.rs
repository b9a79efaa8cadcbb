mod media;
mod session;
mod token;
mod user;

pub use media::*;
pub use session::*;
pub use token::*;
pub use user::*;
