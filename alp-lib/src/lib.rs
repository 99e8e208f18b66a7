pub mod validation;
pub mod users;
pub mod phone;
