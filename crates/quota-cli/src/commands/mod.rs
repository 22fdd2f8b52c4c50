//! Command handlers for the provision and reset paths.

pub mod provision;
pub mod reset;
pub mod token;

pub use provision::{Created, ProvisionError, ProvisionReport, ProvisionState, provision};
pub use reset::{ResetReport, reset};
pub use token::fetch_token;
