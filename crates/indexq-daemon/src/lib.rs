//! indexq-daemon - Query service for indexq
//!
//! This crate provides the network side of indexq:
//! - The newline-delimited JSON wire protocol
//! - Method routing and parameter validation
//! - A TCP server handling concurrent client connections
//! - A small client used by the CLI

pub mod client;
pub mod dispatch;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use dispatch::Dispatcher;
pub use protocol::{Method, Request, Response, ResultVariant, Status};
pub use server::Server;
