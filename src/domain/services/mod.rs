pub mod actions;
mod auth_session;
mod controller;
mod key_rotator;
mod preferences;
pub mod prompts;
mod quota;
mod rate_limiter;

pub use auth_session::*;
pub use controller::*;
pub use key_rotator::*;
pub use preferences::*;
pub use quota::*;
pub use rate_limiter::*;
