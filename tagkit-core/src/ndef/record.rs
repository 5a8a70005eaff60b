//! NDEF records and messages (NFC Forum NDEF 1.0).

use crate::error::{TagKitError, TagKitResult};

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// The 3-bit Type Name Format of a record header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeNameFormat {
    /// Record without type, id or payload
    Empty = 0x00,
    /// NFC Forum well-known type (RTD), e.g. `U` for URI records
    WellKnown = 0x01,
    /// Media type as defined in RFC 2046
    Mime = 0x02,
    /// Absolute URI as defined in RFC 3986
    AbsoluteUri = 0x03,
    /// NFC Forum external type
    External = 0x04,
    /// Unknown payload type
    Unknown = 0x05,
    /// Middle or terminating chunk of a chunked record
    Unchanged = 0x06,
    /// Reserved by the NFC Forum
    Reserved = 0x07,
}

impl From<u8> for TypeNameFormat {
    fn from(header: u8) -> Self {
        match header & TNF_MASK {
            0x00 => Self::Empty,
            0x01 => Self::WellKnown,
            0x02 => Self::Mime,
            0x03 => Self::AbsoluteUri,
            0x04 => Self::External,
            0x05 => Self::Unknown,
            0x06 => Self::Unchanged,
            _ => Self::Reserved,
        }
    }
}

/// A single, unchunked NDEF record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NdefRecord {
    /// Type Name Format
    pub tnf: TypeNameFormat,
    /// Record type, interpreted according to `tnf`
    pub record_type: Vec<u8>,
    /// Optional record identifier, empty when absent
    pub id: Vec<u8>,
    /// Record payload
    pub payload: Vec<u8>,
}

impl NdefRecord {
    /// Creates a record without identifier.
    #[must_use]
    pub const fn new(tnf: TypeNameFormat, record_type: Vec<u8>, payload: Vec<u8>) -> Self {
        Self {
            tnf,
            record_type,
            id: Vec::new(),
            payload,
        }
    }

    /// Appends the record to `out`. MB and ME are taken from the caller, SR
    /// and IL follow from the record itself.
    fn encode_into(&self, out: &mut Vec<u8>, begin: bool, end: bool) -> TagKitResult<()> {
        let type_len = u8::try_from(self.record_type.len())
            .map_err(|_| TagKitError::InvalidNdef("record type longer than 255 bytes".into()))?;
        let id_len = u8::try_from(self.id.len())
            .map_err(|_| TagKitError::InvalidNdef("record id longer than 255 bytes".into()))?;
        let payload_len = u32::try_from(self.payload.len())
            .map_err(|_| TagKitError::InvalidNdef("payload longer than 2^32 - 1 bytes".into()))?;
        let short = u8::try_from(payload_len).ok();

        let mut header = self.tnf as u8;
        if begin {
            header |= FLAG_MB;
        }
        if end {
            header |= FLAG_ME;
        }
        if short.is_some() {
            header |= FLAG_SR;
        }
        if id_len > 0 {
            header |= FLAG_IL;
        }

        out.push(header);
        out.push(type_len);
        match short {
            Some(len) => out.push(len),
            None => out.extend_from_slice(&payload_len.to_be_bytes()),
        }
        if id_len > 0 {
            out.push(id_len);
        }
        out.extend_from_slice(&self.record_type);
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// Encodes records into an NDEF message.
///
/// # Errors
///
/// Returns [`TagKitError::InvalidNdef`] if there are no records or a record
/// field exceeds what its length field can express.
pub fn encode_message(records: &[NdefRecord]) -> TagKitResult<Vec<u8>> {
    if records.is_empty() {
        return Err(TagKitError::InvalidNdef("message without records".into()));
    }

    let last = records.len() - 1;
    let mut message = Vec::new();
    for (index, record) in records.iter().enumerate() {
        record.encode_into(&mut message, index == 0, index == last)?;
    }
    Ok(message)
}

/// Cursor over the message bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> TagKitResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                TagKitError::InvalidNdef(format!(
                    "record truncated at byte {} of {}",
                    self.position,
                    self.bytes.len()
                ))
            })?;
        let field = &self.bytes[self.position..end];
        self.position = end;
        Ok(field)
    }

    fn byte(&mut self) -> TagKitResult<u8> {
        Ok(self.take(1)?[0])
    }

    const fn is_done(&self) -> bool {
        self.position >= self.bytes.len()
    }
}

/// Decodes an NDEF message into its records.
///
/// # Errors
///
/// Returns [`TagKitError::InvalidNdef`] for truncated records, missing MB/ME
/// flags, data after the ME record and chunked records, which are not supported.
pub fn parse_message(bytes: &[u8]) -> TagKitResult<Vec<NdefRecord>> {
    let mut reader = Reader { bytes, position: 0 };
    let mut records = Vec::new();

    loop {
        let header = reader.byte()?;
        if records.is_empty() != (header & FLAG_MB != 0) {
            return Err(TagKitError::InvalidNdef(format!(
                "unexpected MB flag on record {}",
                records.len()
            )));
        }
        if header & FLAG_CF != 0 {
            return Err(TagKitError::InvalidNdef("chunked records are not supported".into()));
        }

        let type_len = usize::from(reader.byte()?);
        let payload_len = if header & FLAG_SR != 0 {
            usize::from(reader.byte()?)
        } else {
            let len = reader.take(4)?;
            let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]);
            usize::try_from(len)
                .map_err(|_| TagKitError::InvalidNdef(format!("payload length {len}")))?
        };
        let id_len = if header & FLAG_IL != 0 {
            usize::from(reader.byte()?)
        } else {
            0
        };

        records.push(NdefRecord {
            tnf: TypeNameFormat::from(header),
            record_type: reader.take(type_len)?.to_vec(),
            id: reader.take(id_len)?.to_vec(),
            payload: reader.take(payload_len)?.to_vec(),
        });

        if header & FLAG_ME != 0 {
            break;
        }
        if reader.is_done() {
            return Err(TagKitError::InvalidNdef("message ends without ME flag".into()));
        }
    }

    if !reader.is_done() {
        return Err(TagKitError::InvalidNdef(format!(
            "{} bytes after the last record",
            bytes.len() - reader.position
        )));
    }
    Ok(records)
}
