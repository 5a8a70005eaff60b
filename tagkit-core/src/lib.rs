#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
//! `TagKit` turns a phone into an NFC Forum Type 4 Tag that serves a single
//! NDEF message, typically a URI carrying an out-of-band invitation.
//!
//! The host app activates a [`T4tHostService`] with the message and forwards
//! every command APDU it receives from the NFC runtime to it.

pub mod apdu;
pub mod capability_container;

mod error;
pub use error::*;

pub mod invitation;
/// Forwards log output to the host app.
pub mod logger;
pub mod ndef;
pub mod reader;

mod responder;
pub use responder::*;

mod service;
pub use service::*;

uniffi::setup_scaffolding!("tagkit_core");
