//! The Capability Container file (`E1 03`) of the emulated tag.
//!
//! The container is fixed for the lifetime of the process and does not depend
//! on the NDEF message currently being served.

use crate::error::{TagKitError, TagKitResult};

/// File identifier of the Capability Container.
pub const CAPABILITY_CONTAINER_FILE_ID: [u8; 2] = [0xE1, 0x03];

/// File identifier of the NDEF file.
pub const NDEF_FILE_ID: [u8; 2] = [0xE1, 0x04];

/// Size of a Capability Container holding exactly one NDEF File Control TLV.
pub const CAPABILITY_CONTAINER_LEN: usize = 15;

/// T field of the NDEF File Control TLV.
const NDEF_FILE_CONTROL_TAG: u8 = 0x04;

/// L field of the NDEF File Control TLV.
const NDEF_FILE_CONTROL_LEN: u8 = 0x06;

/// Access condition granting access without any security.
const ACCESS_GRANTED: u8 = 0x00;

/// Access condition denying access.
const ACCESS_DENIED: u8 = 0xFF;

/// Content of the NDEF File Control TLV.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NdefFileControl {
    /// Identifier to SELECT the NDEF file with
    pub file_id: [u8; 2],
    /// Maximum size of the NDEF file, NLEN included
    pub max_size: u16,
    /// Read access condition
    pub read_access: u8,
    /// Write access condition
    pub write_access: u8,
}

/// The Capability Container of a mapping version 2.0 Type 4 Tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilityContainer {
    /// Major version in the high nibble, minor in the low nibble
    pub mapping_version: u8,
    /// MLe, the maximum data size a single READ BINARY may return
    pub max_le: u16,
    /// MLc, the maximum data size a single UPDATE BINARY may carry
    pub max_lc: u16,
    /// Where and how the NDEF file can be accessed
    pub ndef_file: NdefFileControl,
}

impl CapabilityContainer {
    /// The container served by the responder: mapping version 2.0, unrestricted
    /// MLe/MLc, a 65534 byte NDEF file at `E1 04` that is readable but not writable.
    pub const DEFAULT: Self = Self {
        mapping_version: 0x20,
        max_le: 0xFFFF,
        max_lc: 0xFFFF,
        ndef_file: NdefFileControl {
            file_id: NDEF_FILE_ID,
            max_size: 0xFFFE,
            read_access: ACCESS_GRANTED,
            write_access: ACCESS_DENIED,
        },
    };

    /// Encodes the container file.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn to_bytes(&self) -> [u8; CAPABILITY_CONTAINER_LEN] {
        let [cclen_hi, cclen_lo] = (CAPABILITY_CONTAINER_LEN as u16).to_be_bytes();
        let [mle_hi, mle_lo] = self.max_le.to_be_bytes();
        let [mlc_hi, mlc_lo] = self.max_lc.to_be_bytes();
        let [size_hi, size_lo] = self.ndef_file.max_size.to_be_bytes();
        [
            cclen_hi,
            cclen_lo,
            self.mapping_version,
            mle_hi,
            mle_lo,
            mlc_hi,
            mlc_lo,
            NDEF_FILE_CONTROL_TAG,
            NDEF_FILE_CONTROL_LEN,
            self.ndef_file.file_id[0],
            self.ndef_file.file_id[1],
            size_hi,
            size_lo,
            self.ndef_file.read_access,
            self.ndef_file.write_access,
        ]
    }

    /// Decodes a container file as read from a tag.
    ///
    /// Only the first TLV is inspected, which must be an NDEF File Control TLV.
    /// Bytes after it (further TLVs) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TagKitError::InvalidCapabilityContainer`] if the file is too
    /// short, CCLEN disagrees with the data or the first TLV is not an NDEF
    /// File Control TLV.
    pub fn parse(bytes: &[u8]) -> TagKitResult<Self> {
        if bytes.len() < CAPABILITY_CONTAINER_LEN {
            return Err(TagKitError::InvalidCapabilityContainer(format!(
                "{} bytes, expected at least {CAPABILITY_CONTAINER_LEN}",
                bytes.len()
            )));
        }
        let cclen = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
        if cclen < CAPABILITY_CONTAINER_LEN || cclen > bytes.len() {
            return Err(TagKitError::InvalidCapabilityContainer(format!(
                "CCLEN {cclen} does not match {} bytes of data",
                bytes.len()
            )));
        }
        if bytes[7] != NDEF_FILE_CONTROL_TAG || bytes[8] != NDEF_FILE_CONTROL_LEN {
            return Err(TagKitError::InvalidCapabilityContainer(format!(
                "expected NDEF File Control TLV, found T={:#04x} L={:#04x}",
                bytes[7], bytes[8]
            )));
        }

        Ok(Self {
            mapping_version: bytes[2],
            max_le: u16::from_be_bytes([bytes[3], bytes[4]]),
            max_lc: u16::from_be_bytes([bytes[5], bytes[6]]),
            ndef_file: NdefFileControl {
                file_id: [bytes[9], bytes[10]],
                max_size: u16::from_be_bytes([bytes[11], bytes[12]]),
                read_access: bytes[13],
                write_access: bytes[14],
            },
        })
    }

    /// Whether the NDEF file may be read without any security.
    #[must_use]
    pub const fn is_readable(&self) -> bool {
        self.ndef_file.read_access == ACCESS_GRANTED
    }

    /// Whether the NDEF file may be written without any security.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.ndef_file.write_access == ACCESS_GRANTED
    }
}

impl Default for CapabilityContainer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Content of the Capability Container file served by the responder.
pub static CAPABILITY_CONTAINER_FILE: [u8; CAPABILITY_CONTAINER_LEN] =
    CapabilityContainer::DEFAULT.to_bytes();
