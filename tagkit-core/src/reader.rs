//! Reader side of the Type 4 Tag NDEF read procedure.
//!
//! [`NdefReader`] performs the NDEF detection and read procedure against
//! anything that answers command APDUs, which lets the CLI and the tests drive
//! the responder exactly like a phone held against the device would.

use crate::apdu::{
    read_binary, split_status, StatusWord, CAPABILITY_CONTAINER_SELECT, NDEF_FILE_SELECT,
    NDEF_TAG_APPLICATION_SELECT,
};
use crate::capability_container::{CapabilityContainer, CAPABILITY_CONTAINER_LEN, NDEF_FILE_ID};
use crate::error::{TagKitError, TagKitResult};
use crate::ndef::{parse_uri_message, NdefFile, NLEN_SIZE};
use crate::responder::T4tResponder;
use crate::service::T4tHostService;

/// Largest data size a short READ BINARY can ask for.
pub const MAX_SHORT_READ: u8 = u8::MAX;

/// Exchanges APDUs with a tag.
pub trait Transceiver {
    /// Sends one command APDU and returns the full response APDU, status word included.
    ///
    /// # Errors
    ///
    /// Transport failures. Status words other than `90 00` are not errors at
    /// this level.
    fn transceive(&mut self, command: &[u8]) -> TagKitResult<Vec<u8>>;
}

impl Transceiver for T4tResponder {
    fn transceive(&mut self, command: &[u8]) -> TagKitResult<Vec<u8>> {
        Ok(self.process_command_apdu(command))
    }
}

impl Transceiver for &T4tHostService {
    fn transceive(&mut self, command: &[u8]) -> TagKitResult<Vec<u8>> {
        Ok(self.process_command_apdu(command.to_vec()))
    }
}

/// Everything read from a tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NdefReadout {
    /// The Capability Container as advertised by the tag
    pub capability_container: CapabilityContainer,
    /// The NDEF file, NLEN included
    pub ndef_file: NdefFile,
    /// The NDEF message
    pub message: Vec<u8>,
}

impl NdefReadout {
    /// The URI of the first record.
    ///
    /// # Errors
    ///
    /// See [`parse_uri_message`].
    pub fn uri(&self) -> TagKitResult<String> {
        parse_uri_message(&self.message)
    }
}

/// Reads the NDEF message of a Type 4 Tag.
#[derive(Clone, Copy, Debug)]
pub struct NdefReader {
    max_read: u8,
}

impl Default for NdefReader {
    fn default() -> Self {
        Self::new(MAX_SHORT_READ)
    }
}

impl NdefReader {
    /// Creates a reader that asks for at most `max_read` bytes per READ BINARY.
    ///
    /// The tag's MLe further limits the chunk size. A `max_read` of zero is
    /// treated as one.
    #[must_use]
    pub fn new(max_read: u8) -> Self {
        Self {
            max_read: max_read.max(1),
        }
    }

    /// Runs the NDEF detection and read procedure.
    ///
    /// # Errors
    ///
    /// - [`TagKitError::UnexpectedStatus`] if the tag answers any command with
    ///   something other than `90 00`.
    /// - [`TagKitError::TruncatedResponse`] if a response lacks a status word or
    ///   returns less data than requested.
    /// - [`TagKitError::InvalidCapabilityContainer`] if the container is malformed,
    ///   names another NDEF file or denies read access.
    pub fn read<T: Transceiver + ?Sized>(&self, tag: &mut T) -> TagKitResult<NdefReadout> {
        exchange(tag, &NDEF_TAG_APPLICATION_SELECT)?;

        exchange(tag, &CAPABILITY_CONTAINER_SELECT)?;
        #[allow(clippy::cast_possible_truncation)]
        let cc = read_exact(tag, 0, CAPABILITY_CONTAINER_LEN as u8)?;
        let capability_container = CapabilityContainer::parse(&cc)?;
        log::debug!("capability container: {capability_container:?}");

        if capability_container.ndef_file.file_id != NDEF_FILE_ID {
            return Err(TagKitError::InvalidCapabilityContainer(format!(
                "unsupported NDEF file id {}",
                hex::encode(capability_container.ndef_file.file_id)
            )));
        }
        if !capability_container.is_readable() {
            return Err(TagKitError::InvalidCapabilityContainer(format!(
                "NDEF file is not readable, access condition {:#04x}",
                capability_container.ndef_file.read_access
            )));
        }

        exchange(tag, &NDEF_FILE_SELECT)?;
        #[allow(clippy::cast_possible_truncation)]
        let nlen = read_exact(tag, 0, NLEN_SIZE as u8)?;
        let nlen = usize::from(u16::from_be_bytes([nlen[0], nlen[1]]));
        log::debug!("NLEN: {nlen}");

        let chunk = usize::from(self.max_read).min(usize::from(capability_container.max_le.max(1)));
        let end = NLEN_SIZE + nlen;
        let mut message = Vec::with_capacity(nlen);
        let mut offset = NLEN_SIZE;
        while offset < end {
            // P1-P2 stop at 0xFFFF; the last byte of a full file is read together with its predecessor
            let start = u16::try_from(offset).unwrap_or(u16::MAX);
            let skip = offset - usize::from(start);
            let length = (chunk.min(end - offset) + skip).min(usize::from(MAX_SHORT_READ));
            let data = read_exact(tag, start, u8::try_from(length).unwrap_or(MAX_SHORT_READ))?;
            message.extend_from_slice(&data[skip..]);
            offset += length - skip;
        }

        let ndef_file = NdefFile::new(&message)?;
        Ok(NdefReadout {
            capability_container,
            ndef_file,
            message,
        })
    }
}

/// Sends `command` and returns the response data if the tag answered `90 00`.
fn exchange<T: Transceiver + ?Sized>(tag: &mut T, command: &[u8]) -> TagKitResult<Vec<u8>> {
    let response = tag.transceive(command)?;
    let (data, sw) =
        split_status(&response).ok_or_else(|| TagKitError::TruncatedResponse(response.len() as u64))?;
    if sw != u16::from(StatusWord::Success) {
        return Err(TagKitError::UnexpectedStatus(sw));
    }
    Ok(data.to_vec())
}

fn read_exact<T: Transceiver + ?Sized>(
    tag: &mut T,
    offset: u16,
    length: u8,
) -> TagKitResult<Vec<u8>> {
    let data = exchange(tag, &read_binary(offset, length))?;
    if data.len() != usize::from(length) {
        return Err(TagKitError::TruncatedResponse(data.len() as u64));
    }
    Ok(data)
}
