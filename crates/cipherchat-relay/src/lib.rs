//! # CipherChat Relay
//!
//! The real-time core: a process-wide registry of live channels and the
//! engine that validates, persists, and forwards message submissions.
//!
//! One engine instance serves every transport. The live-channel path and the
//! one-shot request path both call [`RelayEngine::submit`]; only the
//! acknowledgment differs (a frame pushed back to the channel versus a
//! response body), and that last step belongs to the transport adapter.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod engine;
pub mod error;
pub mod registry;

pub use engine::{RelayEngine, Submission};
pub use error::{RelayError, Result};
pub use registry::{ChannelHandle, ConnectionRegistry};
