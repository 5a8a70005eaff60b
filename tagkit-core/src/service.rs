//! Entry point for the host NFC runtime.
//!
//! On Android the `HostApduService` subclass owns one [`T4tHostService`] and
//! forwards its callbacks to it:
//!
//! ```kotlin
//! class T4tHostApduService : HostApduService() {
//!     private val tag = T4tHostService()
//!
//!     override fun onStartCommand(intent: Intent?, flags: Int, startId: Int): Int {
//!         tag.activate(intent!!.getByteArrayExtra(EXTRA_NDEF_MESSAGE)!!)
//!         return START_REDELIVER_INTENT
//!     }
//!
//!     override fun processCommandApdu(commandApdu: ByteArray, extras: Bundle?) =
//!         tag.processCommandApdu(commandApdu)
//!
//!     override fun onDeactivated(reason: Int) = tag.onDeactivated(reason)
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TagKitResult;
use crate::ndef::ndef_uri_message;
use crate::responder::{DeactivationReason, T4tResponder, TagState};

/// A Type 4 Tag emulation session, shared with the host NFC runtime.
///
/// The host may activate the tag with a new message from one thread while the
/// NFC thread is processing commands. The responder is kept behind a single
/// lock so that every command observes either the old or the new NDEF file,
/// never a mix of both.
#[derive(Debug, Default, uniffi::Object)]
pub struct T4tHostService {
    responder: Mutex<T4tResponder>,
}

#[uniffi::export]
impl T4tHostService {
    /// Creates a tag that has not been activated yet.
    #[uniffi::constructor]
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Activates the tag with an NDEF message built by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TagKitError::NdefMessageTooLarge`] if the message is
    /// longer than 65535 bytes. The tag keeps serving the previous message.
    pub fn activate(&self, ndef_message: Vec<u8>) -> TagKitResult<()> {
        self.responder().set_ndef_message(&ndef_message)
    }

    /// Activates the tag with a single URI record pointing at `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TagKitError::InvalidUri`] if the URI is empty and
    /// [`crate::TagKitError::NdefMessageTooLarge`] if it is too long for the NDEF file.
    pub fn activate_with_uri(&self, uri: &str) -> TagKitResult<()> {
        let message = ndef_uri_message(uri)?;
        log::info!("activating tag with uri {uri}");
        self.responder().set_ndef_message(&message)
    }

    /// Answers one command APDU. Never fails: anything the tag does not
    /// understand is answered with `6A 82`.
    #[must_use]
    pub fn process_command_apdu(&self, command_apdu: Vec<u8>) -> Vec<u8> {
        self.responder().process_command_apdu(&command_apdu)
    }

    /// Notifies the tag that the reader went away or selected another application.
    pub fn on_deactivated(&self, reason: i32) {
        self.responder().deactivate(DeactivationReason::from(reason));
    }

    /// The current selection state.
    #[must_use]
    pub fn state(&self) -> TagState {
        self.responder().state()
    }
}

impl T4tHostService {
    /// A panic while holding the lock cannot leave the responder half updated,
    /// every mutation is a single assignment, so a poisoned lock is still usable.
    fn responder(&self) -> MutexGuard<'_, T4tResponder> {
        self.responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
