//! extshift bulk-renames file extensions and asks a remote model about the
//! results.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the ingestion pipeline (entry traversal, extension
//!   rewriting, concurrent reads), exports, the persisted workspace, and the
//!   streaming chat client.
//! - [`cli`] parses arguments and runs one-shot commands or the interactive
//!   shell.
//! - [`api`] defines the request payloads sent to the generation endpoint.
//! - [`utils`] holds logging, URL and serialization helpers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
