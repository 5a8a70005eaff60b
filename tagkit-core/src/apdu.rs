//! ISO 7816-4 command and response APDUs of the NFC Forum Type 4 Tag read flow.
//!
//! The responder only understands four fixed command shapes. Everything else
//! is [`Command::Unknown`] and is answered with [`StatusWord::FileNotFound`].

use strum::Display;

/// SELECT of the NDEF Tag Application by name (AID `D2 76 00 00 85 01 01`).
pub const NDEF_TAG_APPLICATION_SELECT: [u8; 13] = [
    0x00, // CLA
    0xA4, // INS: SELECT
    0x04, // P1: select by name
    0x00, // P2
    0x07, // Lc
    0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01, // NDEF Tag Application name
    0x00, // Le
];

/// SELECT of the Capability Container file (`E1 03`) by identifier.
pub const CAPABILITY_CONTAINER_SELECT: [u8; 7] = [
    0x00, // CLA
    0xA4, // INS: SELECT
    0x00, // P1: select by identifier
    0x0C, // P2: first or only occurrence, no response data
    0x02, // Lc
    0xE1, 0x03, // file identifier of the CC file
];

/// SELECT of the NDEF file (`E1 04`) by identifier.
pub const NDEF_FILE_SELECT: [u8; 7] = [
    0x00, // CLA
    0xA4, // INS: SELECT
    0x00, // P1: select by identifier
    0x0C, // P2: first or only occurrence, no response data
    0x02, // Lc
    0xE1, 0x04, // file identifier of the NDEF file
];

/// CLA and INS of READ BINARY. P1 P2 carry the offset, Le the length.
pub const READ_BINARY: [u8; 2] = [0x00, 0xB0];

/// CLA | INS | P1 | P2 | Le
const READ_BINARY_LEN: usize = 5;

/// Status word appended to every response APDU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[repr(u16)]
pub enum StatusWord {
    /// Command completed
    #[strum(to_string = "90 00")]
    Success = 0x90_00,
    /// File or application not found. Also the generic answer to anything the tag does not support.
    #[strum(to_string = "6A 82")]
    FileNotFound = 0x6A_82,
}

impl StatusWord {
    /// SW1 SW2 as sent on the wire.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }
}

impl From<StatusWord> for u16 {
    fn from(sw: StatusWord) -> Self {
        sw as Self
    }
}

/// A command APDU as recognized by the responder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Exact [`NDEF_TAG_APPLICATION_SELECT`]
    SelectNdefApplication,
    /// Exact [`CAPABILITY_CONTAINER_SELECT`]
    SelectCapabilityContainer,
    /// Exact [`NDEF_FILE_SELECT`]
    SelectNdefFile,
    /// READ BINARY of `length` bytes starting at `offset` in the selected file
    ReadBinary {
        /// P1 P2, big endian
        offset: u16,
        /// Le, 0 to 255
        length: u8,
    },
    /// Anything else, including truncated READ BINARY commands
    Unknown,
}

impl From<&[u8]> for Command {
    fn from(apdu: &[u8]) -> Self {
        if apdu == NDEF_TAG_APPLICATION_SELECT {
            return Self::SelectNdefApplication;
        }
        if apdu == CAPABILITY_CONTAINER_SELECT {
            return Self::SelectCapabilityContainer;
        }
        if apdu == NDEF_FILE_SELECT {
            return Self::SelectNdefFile;
        }
        match apdu {
            [cla, ins, p1, p2, le, ..] if [*cla, *ins] == READ_BINARY => Self::ReadBinary {
                offset: u16::from_be_bytes([*p1, *p2]),
                length: *le,
            },
            _ => Self::Unknown,
        }
    }
}

/// Builds a READ BINARY command APDU.
#[must_use]
pub const fn read_binary(offset: u16, length: u8) -> [u8; READ_BINARY_LEN] {
    let [p1, p2] = offset.to_be_bytes();
    [READ_BINARY[0], READ_BINARY[1], p1, p2, length]
}

/// A response APDU produced by the responder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Status word only
    Status(StatusWord),
    /// Response data followed by `90 00`
    Data(Vec<u8>),
}

impl Response {
    /// Status word this response ends with.
    #[must_use]
    pub const fn status(&self) -> StatusWord {
        match self {
            Self::Status(sw) => *sw,
            Self::Data(_) => StatusWord::Success,
        }
    }

    /// Serializes the response as sent back to the reader.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Status(sw) => sw.to_bytes().to_vec(),
            Self::Data(mut data) => {
                data.extend_from_slice(&StatusWord::Success.to_bytes());
                data
            }
        }
    }
}

/// Splits a response APDU into its data field and status word.
///
/// Returns `None` when the response is shorter than a status word.
#[must_use]
pub fn split_status(response: &[u8]) -> Option<(&[u8], u16)> {
    let split = response.len().checked_sub(2)?;
    let (data, sw) = response.split_at(split);
    Some((data, u16::from_be_bytes([sw[0], sw[1]])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_select_templates_are_recognized() {
        assert_eq!(
            Command::from(&NDEF_TAG_APPLICATION_SELECT[..]),
            Command::SelectNdefApplication
        );
        assert_eq!(
            Command::from(&CAPABILITY_CONTAINER_SELECT[..]),
            Command::SelectCapabilityContainer
        );
        assert_eq!(Command::from(&NDEF_FILE_SELECT[..]), Command::SelectNdefFile);
    }

    #[test]
    fn test_select_templates_match_wire_format() {
        assert_eq!(
            hex::encode_upper(NDEF_TAG_APPLICATION_SELECT),
            "00A4040007D276000085010100"
        );
        assert_eq!(hex::encode_upper(CAPABILITY_CONTAINER_SELECT), "00A4000C02E103");
        assert_eq!(hex::encode_upper(NDEF_FILE_SELECT), "00A4000C02E104");
    }

    #[test_case("00B000000F", 0x0000, 0x0F ; "capability container read")]
    #[test_case("00B0000200", 0x0002, 0x00 ; "zero length")]
    #[test_case("00B0FFFFFF", 0xFFFF, 0xFF ; "maximum offset and length")]
    #[test_case("00B0012380AABB", 0x0123, 0x80 ; "trailing bytes ignored")]
    fn test_read_binary_decoding(apdu: &str, offset: u16, length: u8) {
        let apdu = hex::decode(apdu).unwrap();
        assert_eq!(
            Command::from(apdu.as_slice()),
            Command::ReadBinary { offset, length }
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("00B0" ; "read binary without parameters")]
    #[test_case("00B00000" ; "read binary without le")]
    #[test_case("00A4040007D2760000850101" ; "application select without le")]
    #[test_case("00A4040007D27600008501010000" ; "application select with trailing byte")]
    #[test_case("00A4000C02E105" ; "select of another file")]
    #[test_case("80B000000F" ; "proprietary class")]
    #[test_case("00D6000005" ; "update binary")]
    fn test_unknown_commands(apdu: &str) {
        let apdu = hex::decode(apdu).unwrap();
        assert_eq!(Command::from(apdu.as_slice()), Command::Unknown);
    }

    #[test]
    fn test_read_binary_builder() {
        assert_eq!(read_binary(0x0102, 0x80), [0x00, 0xB0, 0x01, 0x02, 0x80]);
        assert_eq!(
            Command::from(&read_binary(300, 15)[..]),
            Command::ReadBinary {
                offset: 300,
                length: 15
            }
        );
    }

    #[test]
    fn test_response_serialization() {
        assert_eq!(
            Response::Status(StatusWord::Success).into_bytes(),
            vec![0x90, 0x00]
        );
        assert_eq!(
            Response::Status(StatusWord::FileNotFound).into_bytes(),
            vec![0x6A, 0x82]
        );
        assert_eq!(
            Response::Data(b"hi".to_vec()).into_bytes(),
            vec![0x68, 0x69, 0x90, 0x00]
        );
        assert_eq!(Response::Data(Vec::new()).into_bytes(), vec![0x90, 0x00]);
    }

    #[test]
    fn test_split_status() {
        assert_eq!(split_status(&[0x00, 0x05, 0x90, 0x00]), Some((&[0x00, 0x05][..], 0x9000)));
        assert_eq!(split_status(&[0x6A, 0x82]), Some((&[][..], 0x6A82)));
        assert_eq!(split_status(&[0x90]), None);
    }

    #[test]
    fn test_status_word_display() {
        assert_eq!(StatusWord::Success.to_string(), "90 00");
        assert_eq!(u16::from(StatusWord::FileNotFound), 0x6A82);
    }
}
