//! Out-of-band invitation URIs.
//!
//! The admission app publishes its invitation as `<wallet url>?oob=<base64>`
//! where the `oob` parameter is the invitation JSON in standard base64. A
//! wallet that reads the tag resolves the URI, or decodes the parameter itself.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{TagKitError, TagKitResult};

/// Wallet landing page the invitation is attached to.
pub const DEFAULT_WALLET_URL: &str = "https://my-wallet.me/ssi";

/// Query parameter carrying the encoded invitation.
pub const OOB_PARAMETER: &str = "oob";

/// Attaches an invitation to a wallet URL.
///
/// The parameter goes into the query, ahead of any fragment of `wallet_url`.
#[must_use]
#[uniffi::export]
pub fn oob_invitation_uri(wallet_url: &str, invitation_json: &str) -> String {
    let (base, fragment) = wallet_url
        .split_once('#')
        .map_or((wallet_url, None), |(base, fragment)| (base, Some(fragment)));
    let separator = if base.contains('?') { '&' } else { '?' };
    let mut uri = format!(
        "{base}{separator}{OOB_PARAMETER}={}",
        STANDARD.encode(invitation_json)
    );
    if let Some(fragment) = fragment {
        uri.push('#');
        uri.push_str(fragment);
    }
    uri
}

/// Extracts the invitation JSON from an out-of-band invitation URI.
///
/// # Errors
///
/// Returns [`TagKitError::InvalidInvitation`] if the URI has no query, no
/// `oob` parameter, or the parameter is not base64 encoded UTF-8.
#[uniffi::export]
pub fn decode_oob_invitation(uri: &str) -> TagKitResult<String> {
    let query = uri
        .split_once('?')
        .map(|(_, query)| query.split_once('#').map_or(query, |(query, _)| query))
        .ok_or_else(|| TagKitError::InvalidInvitation("uri has no query".into()))?;

    let encoded = query
        .split('&')
        .find_map(|pair| {
            pair.split_once('=')
                .filter(|(name, _)| *name == OOB_PARAMETER)
                .map(|(_, value)| value)
        })
        .ok_or_else(|| TagKitError::InvalidInvitation(format!("no {OOB_PARAMETER} parameter")))?;

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| TagKitError::InvalidInvitation(format!("invalid base64: {e}")))?;
    String::from_utf8(decoded)
        .map_err(|e| TagKitError::InvalidInvitation(format!("invitation is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVITATION: &str = r#"{"id":"d8e9","label":"Summer Concert","goal":"Checkin event with VaccinationCertificate","goalCode":"streamlined-vp","from":"ws://192.168.0.2:9090/ws"}"#;

    #[test]
    fn test_invitation_uri() {
        let uri = oob_invitation_uri(DEFAULT_WALLET_URL, "{}");
        assert_eq!(uri, "https://my-wallet.me/ssi?oob=e30=");
    }

    #[test]
    fn test_invitation_uri_with_existing_query() {
        let uri = oob_invitation_uri("https://wallet.example/accept?lang=de", "{}");
        assert_eq!(uri, "https://wallet.example/accept?lang=de&oob=e30=");
    }

    #[test]
    fn test_invitation_uri_keeps_fragment_last() {
        let uri = oob_invitation_uri("https://w.example/a#x", "{}");
        assert_eq!(uri, "https://w.example/a?oob=e30=#x");
        assert_eq!(decode_oob_invitation(&uri).unwrap(), "{}");

        let uri = oob_invitation_uri("https://w.example/a?lang=de#x", "{}");
        assert_eq!(uri, "https://w.example/a?lang=de&oob=e30=#x");
    }

    #[test]
    fn test_decode_invitation() {
        let uri = oob_invitation_uri(DEFAULT_WALLET_URL, INVITATION);
        assert_eq!(decode_oob_invitation(&uri).unwrap(), INVITATION);
    }

    #[test]
    fn test_decode_stops_at_next_parameter() {
        let uri = "https://my-wallet.me/ssi?oob=e30=&lang=de#top";
        assert_eq!(decode_oob_invitation(uri).unwrap(), "{}");
    }

    #[test]
    fn test_decode_errors() {
        for uri in [
            "https://my-wallet.me/ssi",
            "https://my-wallet.me/ssi?lang=de",
            "https://my-wallet.me/ssi?oob=***",
            "https://my-wallet.me/ssi?oob=/w==",
        ] {
            assert!(
                matches!(decode_oob_invitation(uri), Err(TagKitError::InvalidInvitation(_))),
                "{uri} should not decode"
            );
        }
    }
}
