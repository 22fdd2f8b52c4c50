#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Provisioning CLI for the Apigee Edge quota demo.
//!
//! Layout:
//! - `cli.rs`: argument parsing, credential resolution, and dispatch
//! - `commands/`: provision, reset, and token handlers
//! - `demo.rs`: discriminator names, resolved configuration, and create payloads
//! - `client.rs`: CLI error type and shared context
//! - `output.rs`: stdout renderers for credentials and example commands
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub mod client;
pub mod commands;
pub mod demo;
pub(crate) mod output;

pub use cli::run;
