//! Core request abstractions shared by the edge crates.
//!
//! This crate provides:
//! - `RequestContext` - Typed request metadata handed to handlers
//! - `RequestId` - Unique request identifier for log correlation
//! - `HandlerError` - Abnormal-response signal raised by handlers

mod context;
mod handler;

pub use context::*;
pub use handler::*;
