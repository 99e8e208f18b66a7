pub mod error;
pub use error::{ApiError, Detail};

pub mod traits;
pub use traits::Validator;

pub mod users;
pub mod auth;

#[cfg(feature = "client")]
pub mod client;
