//! Shared end-to-end test tooling: a spawned server, an HTTP client that
//! speaks the API, and fixed test values.
#![allow(dead_code)]

mod client;
mod constants;
mod server;

pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;
