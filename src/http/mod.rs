//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 connection core: one request per
//! connection by default, optional keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine (read, dispatch, write)
//! - **`parser`**: parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation
//! - **`response`**: buffered response handed to the application handler
//! - **`writer`**: serializes and writes HTTP responses to the client
//! - **`codec`**: trait joining parser and writer, so either can be swapped
//! - **`handler`**: the application callback and its dispatch
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data (read timeout)
//!        └──────┬──────┘
//!               │ Request received          malformed → 400, Closed
//!               ▼                           timeout / EOF → Closed
//!        ┌──────────────────┐
//!        │   Processing     │ ← Run the handler
//!        └──────┬───────────┘
//!               │ Response sealed
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive (if enabled) → Reading
//!               └─ Close → Closed
//! ```

pub mod codec;
pub mod connection;
pub mod handler;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
