//! Client side session and authentication orchestration for the login
//! portal: session polling, credential submission, multi factor
//! verification, and the guided enrollment wizard. Rendering, routing,
//! and navigation stay with the consumer.

pub mod alert;
pub mod config;
pub mod session;
pub mod login;
pub mod mfa;
pub mod enroll;

pub use alert::{Alert, Severity};
pub use config::Timing;
