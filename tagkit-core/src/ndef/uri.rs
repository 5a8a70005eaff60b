//! NFC Forum URI Record Type Definition.
//!
//! A URI record is a well-known record of type `U` whose payload is one
//! identifier code byte, abbreviating a common URI prefix, followed by the
//! rest of the URI in UTF-8.

use std::borrow::Cow;

use super::record::{encode_message, parse_message, NdefRecord, TypeNameFormat};
use crate::error::{TagKitError, TagKitResult};

/// Record type of URI records.
pub const URI_RECORD_TYPE: &[u8] = b"U";

/// Prefixes abbreviated by the URI identifier code, indexed by code.
///
/// Encoders pick the first entry, in code order, the URI starts with.
pub const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Builds a URI record, abbreviating the URI prefix where possible.
///
/// The scheme is lowercased before the prefix lookup, so `HTTPS://a.b` is
/// stored as `https://a.b`. The rest of the URI is kept as is.
///
/// # Errors
///
/// Returns [`TagKitError::InvalidUri`] if the URI is empty.
pub fn uri_record(uri: &str) -> TagKitResult<NdefRecord> {
    if uri.is_empty() {
        return Err(TagKitError::InvalidUri("uri is empty".into()));
    }

    let uri = normalize_scheme(uri);
    let (code, rest) = URI_PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(code, prefix)| uri.strip_prefix(prefix).map(|rest| (code, rest)))
        .unwrap_or((0, &*uri));

    let mut payload = Vec::with_capacity(1 + rest.len());
    // at most 35, always fits
    payload.push(u8::try_from(code).unwrap_or_default());
    payload.extend_from_slice(rest.as_bytes());

    Ok(NdefRecord::new(
        TypeNameFormat::WellKnown,
        URI_RECORD_TYPE.to_vec(),
        payload,
    ))
}

/// Lowercases the scheme, the part before the first `:`, if there is one.
fn normalize_scheme(uri: &str) -> Cow<'_, str> {
    let Some((scheme, rest)) = uri.split_once(':') else {
        return Cow::Borrowed(uri);
    };
    let is_scheme = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme || !scheme.bytes().any(|b| b.is_ascii_uppercase()) {
        return Cow::Borrowed(uri);
    }
    Cow::Owned(format!("{}:{rest}", scheme.to_ascii_lowercase()))
}

/// Recovers the URI carried by a URI record.
///
/// # Errors
///
/// Returns [`TagKitError::InvalidUri`] if the record is not a well-known `U`
/// record, has an empty payload, uses an unknown identifier code or the URI
/// is not valid UTF-8.
pub fn parse_uri(record: &NdefRecord) -> TagKitResult<String> {
    if record.tnf != TypeNameFormat::WellKnown || record.record_type != URI_RECORD_TYPE {
        return Err(TagKitError::InvalidUri(format!(
            "not a URI record: {:?} {}",
            record.tnf,
            hex::encode(&record.record_type)
        )));
    }

    let (code, rest) = record
        .payload
        .split_first()
        .ok_or_else(|| TagKitError::InvalidUri("empty URI record payload".into()))?;
    let prefix = URI_PREFIXES
        .get(usize::from(*code))
        .ok_or_else(|| TagKitError::InvalidUri(format!("unknown identifier code {code:#04x}")))?;
    let rest = std::str::from_utf8(rest)
        .map_err(|e| TagKitError::InvalidUri(format!("URI is not UTF-8: {e}")))?;

    Ok(format!("{prefix}{rest}"))
}

/// Builds the single-record NDEF message a tag is activated with to publish `uri`.
///
/// # Errors
///
/// Returns [`TagKitError::InvalidUri`] if the URI is empty.
#[uniffi::export]
pub fn ndef_uri_message(uri: &str) -> TagKitResult<Vec<u8>> {
    encode_message(&[uri_record(uri)?])
}

/// Extracts the URI from an NDEF message whose first record is a URI record.
///
/// # Errors
///
/// Returns [`TagKitError::InvalidNdef`] if the message is malformed and
/// [`TagKitError::InvalidUri`] if its first record is not a valid URI record.
pub fn parse_uri_message(message: &[u8]) -> TagKitResult<String> {
    let records = parse_message(message)?;
    let first = records
        .first()
        .ok_or_else(|| TagKitError::InvalidNdef("message without records".into()))?;
    parse_uri(first)
}
