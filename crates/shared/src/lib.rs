//! Types shared by the flow controllers, the reminder store and the CLI shell.

pub mod bundle;
pub mod domain;
pub mod error;
