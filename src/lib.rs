//! The client half of a server-driven UI.
//!
//! The server renders HTML fragments and signs each component's state into a scope attribute.
//! This crate triggers server actions from declarative attributes, optimistically predicts their effect on that
//! state before the round trip completes, and then either reconciles the server's response into the document or
//! restores the pre-speculation envelope byte-for-byte.
//!
//! At most one action is in flight per component scope. A second trigger in the same scope is dropped, not queued.

#![doc(html_root_url = "https://docs.rs/live-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod action;
pub mod config;
pub mod dispatch;
pub mod dom;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod memory;
pub mod morph;
pub mod predict;
pub mod reconcile;
pub mod transport;
pub mod value;
#[cfg(feature = "web")]
pub mod web;

pub use action::ActionDescriptor;
pub use config::Config;
pub use dispatch::{ActionOutcome, Client};
pub use dom::Dom;
pub use envelope::SignaturePolicy;
pub use error::{Error, RequestFailure};
pub use morph::{Morph, MorphOptions, NoMorph};
pub use transport::{Response, Transport};
pub use value::{StateMapping, Value};
