use thiserror::Error;

/// Error outputs from `TagKit`
///
/// Errors only ever surface on the host-facing side (activation, encoding,
/// reader procedure). Command APDU processing never fails; reader-side
/// problems are answered with a status word instead.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum TagKitError {
    /// The NDEF message does not fit behind the 2-byte NLEN prefix of the NDEF file
    #[error("ndef_message_too_large: {len} bytes, at most {max} allowed")]
    NdefMessageTooLarge {
        /// Length of the rejected message
        len: u64,
        /// Largest message the NDEF file can carry
        max: u64,
    },
    /// The URI cannot be carried by an NDEF URI record
    #[error("invalid_uri: {0}")]
    InvalidUri(String),
    /// The bytes are not a well-formed NDEF message
    #[error("invalid_ndef: {0}")]
    InvalidNdef(String),
    /// The Capability Container file is malformed or describes an unsupported layout
    #[error("invalid_capability_container: {0}")]
    InvalidCapabilityContainer(String),
    /// The tag answered a command with something other than `90 00`
    #[error("unexpected_status_word: {0:#06x}")]
    UnexpectedStatus(u16),
    /// The tag answered without a status word, or with less data than requested
    #[error("truncated_response: {0} bytes")]
    TruncatedResponse(u64),
    /// The out-of-band invitation could not be extracted from the URI
    #[error("invalid_invitation: {0}")]
    InvalidInvitation(String),
}

/// Result type used across `TagKit`
pub type TagKitResult<T, E = TagKitError> = std::result::Result<T, E>;
