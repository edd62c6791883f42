//! Wire protocol for the handin submission endpoint.
//!
//! The endpoint is a plain HTTP intermediary: every request is a POST whose
//! body is a JSON document, sent with a plain-text content type, and every
//! reply is a small JSON status envelope.

pub mod constants;
pub mod messages;
