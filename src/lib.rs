//! ToyHttpd - a small embeddable HTTP/1.1 server
//!
//! Core library: connection handling, request parsing, response
//! serialization and the server lifecycle.

pub mod config;
pub mod http;
pub mod server;

pub use config::Config;
pub use http::handler::Handler;
pub use http::request::Request;
pub use http::response::{Response, StatusCode};
pub use server::{Server, ServerState};
