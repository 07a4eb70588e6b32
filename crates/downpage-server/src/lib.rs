//! Downpage Server - HTTP routes for the app download page.
//!
//! The binary in `main.rs` only parses arguments and sets up logging; the
//! router lives here so it can be driven in-process by tests.

pub mod handlers;
pub mod server;

pub use server::{build_router, normalize_base_path, start_server, AppState};
