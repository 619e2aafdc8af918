//! External delivery channels for monitoring notifications.

pub mod email;
pub mod webhook;
