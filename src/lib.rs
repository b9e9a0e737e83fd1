//! Authentication and session lifecycle for a multi-tenant laboratory platform.
//!
//! The HTTP surface lives under [`api`], token signing and verification under
//! [`token`], and the command-line entrypoint under [`cli`].

pub mod api;
pub mod cli;
pub mod token;
