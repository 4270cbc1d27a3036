//! Integration test common infrastructure.
//!
//! Provides utilities for spawning test servers and driving raw telnet
//! clients against them.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

/// Password used for every character the tests create.
#[allow(dead_code)]
pub const PASSWORD: &str = "hunter22";
