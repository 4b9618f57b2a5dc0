//! Records exchanged with the shared user directory and message log.

pub mod message;
pub mod user;
