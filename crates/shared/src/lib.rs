//! Ephemchat shared library: ids, wire records and the error type shared by
//! the crypto core and its callers.

pub mod api;
pub mod constants;
pub mod error;
pub mod ids;
