use strum::Display;

use crate::apdu::{Command, Response, StatusWord};
use crate::capability_container::CAPABILITY_CONTAINER_FILE;
use crate::error::TagKitResult;
use crate::ndef::NdefFile;

/// The file READ BINARY currently operates on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, uniffi::Enum)]
pub enum SelectedFile {
    /// No file selected yet, or the selection was reset by a deactivation
    #[default]
    Nothing,
    /// The Capability Container file `E1 03`
    CapabilityContainer,
    /// The NDEF file `E1 04`
    NdefFile,
}

/// Selection state of an ISO-DEP session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, uniffi::Record)]
pub struct TagState {
    /// Whether the NDEF Tag Application was selected. Informational only,
    /// file selection and reads do not depend on it.
    pub ndef_application_selected: bool,
    /// The file READ BINARY reads from
    pub selected_file: SelectedFile,
}

/// Why the host NFC runtime ended the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum DeactivationReason {
    /// The NFC link was lost
    LinkLoss,
    /// The reader selected another application
    Deselected,
    /// A code this crate does not know
    Other(i32),
}

impl From<i32> for DeactivationReason {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::LinkLoss,
            1 => Self::Deselected,
            other => Self::Other(other),
        }
    }
}

/// Computes the response to one command APDU and the state after it.
///
/// `ndef_file` is `None` while the tag was never activated; selecting the
/// NDEF file still succeeds, but reading from it does not.
#[must_use]
pub fn transition(
    state: TagState,
    apdu: &[u8],
    ndef_file: Option<&NdefFile>,
) -> (TagState, Response) {
    let ok = Response::Status(StatusWord::Success);
    match Command::from(apdu) {
        Command::SelectNdefApplication => (
            TagState {
                ndef_application_selected: true,
                ..state
            },
            ok,
        ),
        Command::SelectCapabilityContainer => (
            TagState {
                selected_file: SelectedFile::CapabilityContainer,
                ..state
            },
            ok,
        ),
        Command::SelectNdefFile => (
            TagState {
                selected_file: SelectedFile::NdefFile,
                ..state
            },
            ok,
        ),
        Command::ReadBinary { offset, length } => {
            let file = match state.selected_file {
                SelectedFile::CapabilityContainer => Some(&CAPABILITY_CONTAINER_FILE[..]),
                SelectedFile::NdefFile => ndef_file.map(NdefFile::as_bytes),
                SelectedFile::Nothing => None,
            };
            let response = file.map_or(Response::Status(StatusWord::FileNotFound), |file| {
                read_binary(file, offset, length)
            });
            (state, response)
        }
        Command::Unknown => (state, Response::Status(StatusWord::FileNotFound)),
    }
}

/// All or nothing: a read past the end of the file is rejected, not truncated.
fn read_binary(file: &[u8], offset: u16, length: u8) -> Response {
    let start = usize::from(offset);
    let end = start + usize::from(length);
    file.get(start..end).map_or(
        Response::Status(StatusWord::FileNotFound),
        |data| Response::Data(data.to_vec()),
    )
}

/// Type 4 Tag responder serving the Capability Container and one NDEF file.
///
/// The responder is single-flight: one command in, one response out. It owns
/// the selection state and the NDEF file of one emulation context.
#[derive(Debug, Default)]
pub struct T4tResponder {
    state: TagState,
    ndef_file: Option<NdefFile>,
}

impl T4tResponder {
    /// Creates a responder that has not been activated yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the NDEF message served from the NDEF file.
    ///
    /// The selection state is left untouched, so a session in progress keeps
    /// reading, now from the new file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TagKitError::NdefMessageTooLarge`] if the message does not fit
    /// behind NLEN. The previous message stays in place.
    pub fn set_ndef_message(&mut self, message: &[u8]) -> TagKitResult<()> {
        let file = NdefFile::new(message)?;
        log::info!("NDEF message set: {} bytes", file.nlen());
        self.ndef_file = Some(file);
        Ok(())
    }

    /// Processes one command APDU and returns the response APDU.
    pub fn process_command_apdu(&mut self, apdu: &[u8]) -> Vec<u8> {
        let (state, response) = transition(self.state, apdu, self.ndef_file.as_ref());
        if state != self.state {
            log::debug!("{:?} -> {:?}", self.state, state);
        }
        self.state = state;

        let response = response.into_bytes();
        log::debug!(
            "command {} on {}: {}",
            hex::encode(apdu),
            self.state.selected_file,
            hex::encode(&response)
        );
        response
    }

    /// Ends the current session. Only the selection is reset, the NDEF file
    /// stays until the next activation replaces it.
    pub fn deactivate(&mut self, reason: DeactivationReason) {
        log::debug!("nfc link deactivated: {reason}");
        self.state = TagState::default();
    }

    /// The current selection state.
    #[must_use]
    pub const fn state(&self) -> TagState {
        self.state
    }

    /// The NDEF file currently served, if the tag was activated.
    #[must_use]
    pub const fn ndef_file(&self) -> Option<&NdefFile> {
        self.ndef_file.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::{
        read_binary as read, CAPABILITY_CONTAINER_SELECT, NDEF_FILE_SELECT,
        NDEF_TAG_APPLICATION_SELECT,
    };
    use test_case::test_case;

    const OK: [u8; 2] = [0x90, 0x00];
    const FILE_NOT_FOUND: [u8; 2] = [0x6A, 0x82];

    fn activated(message: &[u8]) -> T4tResponder {
        let mut responder = T4tResponder::new();
        responder.set_ndef_message(message).unwrap();
        responder
    }

    fn with_ok(data: &[u8]) -> Vec<u8> {
        [data, &OK[..]].concat()
    }

    #[test]
    fn test_hello_scenario() {
        let mut responder = activated(b"hello");

        assert_eq!(responder.process_command_apdu(&NDEF_TAG_APPLICATION_SELECT), OK);
        assert_eq!(responder.process_command_apdu(&CAPABILITY_CONTAINER_SELECT), OK);
        assert_eq!(
            responder.process_command_apdu(&read(0, 15)),
            with_ok(&CAPABILITY_CONTAINER_FILE)
        );
        assert_eq!(responder.process_command_apdu(&NDEF_FILE_SELECT), OK);
        assert_eq!(
            responder.process_command_apdu(&read(0, 2)),
            [0x00, 0x05, 0x90, 0x00]
        );
        assert_eq!(
            responder.process_command_apdu(&read(2, 5)),
            [0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x90, 0x00]
        );
    }

    #[test]
    fn test_application_select_does_not_select_a_file() {
        let mut responder = activated(b"hello");
        responder.process_command_apdu(&NDEF_TAG_APPLICATION_SELECT);
        assert_eq!(
            responder.state(),
            TagState {
                ndef_application_selected: true,
                selected_file: SelectedFile::Nothing,
            }
        );
        assert_eq!(responder.process_command_apdu(&read(0, 2)), FILE_NOT_FOUND);
    }

    #[test]
    fn test_files_can_be_selected_without_application_select() {
        let mut responder = activated(b"hello");
        assert_eq!(responder.process_command_apdu(&NDEF_FILE_SELECT), OK);
        assert_eq!(
            responder.process_command_apdu(&read(0, 2)),
            [0x00, 0x05, 0x90, 0x00]
        );
    }

    #[test_case(0, 0 ; "no offset no length")]
    #[test_case(0, 15 ; "whole file")]
    #[test_case(0xFFFF, 0xFF ; "far out of bounds")]
    fn test_read_without_select(offset: u16, length: u8) {
        let mut responder = activated(b"hello");
        assert_eq!(responder.process_command_apdu(&read(offset, length)), FILE_NOT_FOUND);
        assert_eq!(responder.state(), TagState::default());
    }

    #[test]
    fn test_capability_container_bounds() {
        let mut responder = activated(b"hello");
        responder.process_command_apdu(&CAPABILITY_CONTAINER_SELECT);

        assert_eq!(
            responder.process_command_apdu(&read(14, 1)),
            with_ok(&[0xFF])
        );
        assert_eq!(responder.process_command_apdu(&read(14, 2)), FILE_NOT_FOUND);
        assert_eq!(responder.process_command_apdu(&read(0, 16)), FILE_NOT_FOUND);
        assert_eq!(responder.process_command_apdu(&read(15, 0)), OK);
        assert_eq!(responder.process_command_apdu(&read(16, 0)), FILE_NOT_FOUND);
    }

    #[test]
    fn test_ndef_file_bounds() {
        let mut responder = activated(b"hello");
        responder.process_command_apdu(&NDEF_FILE_SELECT);

        // file size is 7: NLEN + 5
        assert_eq!(
            responder.process_command_apdu(&read(0, 7)),
            with_ok(b"\x00\x05hello")
        );
        assert_eq!(responder.process_command_apdu(&read(0, 8)), FILE_NOT_FOUND);
        assert_eq!(responder.process_command_apdu(&read(6, 1)), with_ok(b"o"));
        assert_eq!(responder.process_command_apdu(&read(6, 2)), FILE_NOT_FOUND);
        assert_eq!(responder.process_command_apdu(&read(0xFFFF, 0xFF)), FILE_NOT_FOUND);
    }

    #[test]
    fn test_read_binary_never_changes_state() {
        let mut responder = activated(b"hello");
        responder.process_command_apdu(&CAPABILITY_CONTAINER_SELECT);
        let before = responder.state();
        responder.process_command_apdu(&read(0, 15));
        responder.process_command_apdu(&read(0, 200));
        assert_eq!(responder.state(), before);
    }

    #[test_case(&[] ; "empty")]
    #[test_case(&[0x00, 0xB0, 0x00] ; "truncated read binary")]
    #[test_case(&[0x00, 0xA4, 0x04, 0x00, 0x08, 0xA0, 0x00, 0x00, 0x06, 0x47, 0x2F, 0x00, 0x01] ; "select of another application")]
    #[test_case(&[0x00, 0xA4, 0x00, 0x0C, 0x02, 0xE1, 0x05] ; "select of unknown file")]
    #[test_case(&[0x00, 0xD6, 0x00, 0x00, 0x01, 0x00] ; "update binary")]
    fn test_unknown_command_changes_nothing(apdu: &[u8]) {
        let mut responder = activated(b"hello");
        responder.process_command_apdu(&NDEF_TAG_APPLICATION_SELECT);
        responder.process_command_apdu(&NDEF_FILE_SELECT);
        let before = responder.state();

        assert_eq!(responder.process_command_apdu(apdu), FILE_NOT_FOUND);
        assert_eq!(responder.state(), before);
        assert_eq!(
            responder.process_command_apdu(&read(0, 2)),
            [0x00, 0x05, 0x90, 0x00]
        );
    }

    #[test]
    fn test_deactivation_resets_selection_only() {
        let mut responder = activated(b"hello");
        responder.process_command_apdu(&NDEF_TAG_APPLICATION_SELECT);
        responder.process_command_apdu(&NDEF_FILE_SELECT);

        responder.deactivate(DeactivationReason::LinkLoss);
        assert_eq!(responder.state(), TagState::default());
        assert_eq!(responder.process_command_apdu(&read(0, 2)), FILE_NOT_FOUND);

        // the old message is still served after a new SELECT
        responder.process_command_apdu(&NDEF_FILE_SELECT);
        assert_eq!(
            responder.process_command_apdu(&read(2, 5)),
            with_ok(b"hello")
        );
    }

    #[test]
    fn test_deactivation_without_session() {
        let mut responder = T4tResponder::new();
        responder.deactivate(DeactivationReason::Other(42));
        assert_eq!(responder.state(), TagState::default());
    }

    #[test]
    fn test_read_before_activation() {
        let mut responder = T4tResponder::new();
        assert_eq!(responder.process_command_apdu(&NDEF_FILE_SELECT), OK);
        assert_eq!(responder.process_command_apdu(&read(0, 2)), FILE_NOT_FOUND);

        // the Capability Container does not depend on activation
        responder.process_command_apdu(&CAPABILITY_CONTAINER_SELECT);
        assert_eq!(
            responder.process_command_apdu(&read(0, 15)),
            with_ok(&CAPABILITY_CONTAINER_FILE)
        );
    }

    #[test]
    fn test_content_swap_mid_session() {
        let mut responder = activated(b"hello");
        responder.process_command_apdu(&NDEF_FILE_SELECT);
        responder.set_ndef_message(b"goodbye!").unwrap();

        assert_eq!(responder.state().selected_file, SelectedFile::NdefFile);
        assert_eq!(
            responder.process_command_apdu(&read(0, 2)),
            [0x00, 0x08, 0x90, 0x00]
        );
    }

    #[test]
    fn test_oversized_message_keeps_previous_content() {
        let mut responder = activated(b"hello");
        assert!(responder.set_ndef_message(&vec![0; 65_536]).is_err());
        assert_eq!(responder.ndef_file().map(NdefFile::message), Some(&b"hello"[..]));
    }

    #[test]
    fn test_transition_is_pure() {
        let file = NdefFile::new(b"hello").unwrap();
        let state = TagState::default();

        let (next, response) = transition(state, &NDEF_FILE_SELECT, Some(&file));
        assert_eq!(next.selected_file, SelectedFile::NdefFile);
        assert_eq!(response, Response::Status(StatusWord::Success));

        let (again, response) = transition(next, &read(0, 2), Some(&file));
        assert_eq!(again, next);
        assert_eq!(response, Response::Data(vec![0x00, 0x05]));
    }

    #[test_case(0, DeactivationReason::LinkLoss ; "link loss")]
    #[test_case(1, DeactivationReason::Deselected ; "deselected")]
    #[test_case(-3, DeactivationReason::Other(-3) ; "unknown")]
    fn test_deactivation_reason(code: i32, reason: DeactivationReason) {
        assert_eq!(DeactivationReason::from(code), reason);
    }
}
