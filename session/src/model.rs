//! Session data model

pub mod claims;
pub mod session;
