//! Request handlers, one module per route group.

pub mod experience;
pub mod user;
pub mod words;
