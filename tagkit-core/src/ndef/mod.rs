//! NDEF data served by the tag.
//!
//! [`NdefFile`] is the content of the `E1 04` file: a 2-byte big-endian NLEN
//! followed by the NDEF message. The [`record`] and [`uri`] modules build and
//! decode the message itself.

pub mod record;
pub mod uri;

pub use record::{NdefRecord, TypeNameFormat};
pub use uri::{ndef_uri_message, parse_uri, parse_uri_message, uri_record};

use crate::error::{TagKitError, TagKitResult};

/// Size of the NLEN field in front of the NDEF message.
pub const NLEN_SIZE: usize = 2;

/// Largest NDEF message the 2-byte NLEN field can describe.
pub const MAX_NDEF_MESSAGE_LEN: usize = u16::MAX as usize;

/// Content of the NDEF file: `NLEN ++ message`.
///
/// An `NdefFile` is immutable. Activating the tag with a new message builds a
/// new file instead of patching the old one, so a reader never sees the NLEN
/// of one message in front of the payload of another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NdefFile(Vec<u8>);

impl NdefFile {
    /// Wraps an NDEF message into the file layout.
    ///
    /// # Errors
    ///
    /// Returns [`TagKitError::NdefMessageTooLarge`] if the message is longer
    /// than [`MAX_NDEF_MESSAGE_LEN`].
    pub fn new(message: &[u8]) -> TagKitResult<Self> {
        let nlen = u16::try_from(message.len()).map_err(|_| TagKitError::NdefMessageTooLarge {
            len: message.len() as u64,
            max: MAX_NDEF_MESSAGE_LEN as u64,
        })?;

        let mut file = Vec::with_capacity(NLEN_SIZE + message.len());
        file.extend_from_slice(&nlen.to_be_bytes());
        file.extend_from_slice(message);
        Ok(Self(file))
    }

    /// The whole file, NLEN included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The NDEF message without NLEN.
    #[must_use]
    pub fn message(&self) -> &[u8] {
        &self.0[NLEN_SIZE..]
    }

    /// Length of the message as announced in NLEN.
    #[must_use]
    pub fn nlen(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`, the file holds at least NLEN.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&[u8]> for NdefFile {
    type Error = TagKitError;

    fn try_from(message: &[u8]) -> TagKitResult<Self> {
        Self::new(message)
    }
}

impl AsRef<[u8]> for NdefFile {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
