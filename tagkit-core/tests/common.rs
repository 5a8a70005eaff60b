//! Common test utilities shared across integration tests.

use tagkit_core::reader::Transceiver;
use tagkit_core::{T4tHostService, TagKitResult};

/// Routes the core's log records to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A reader session against a [`T4tHostService`] that keeps every exchange.
pub struct RecordingTag<'a> {
    service: &'a T4tHostService,
    /// Every `(command, response)` pair, in order.
    pub exchanges: Vec<(Vec<u8>, Vec<u8>)>,
}

impl<'a> RecordingTag<'a> {
    /// Creates a recorder with no exchanges yet.
    pub const fn new(service: &'a T4tHostService) -> Self {
        Self {
            service,
            exchanges: Vec::new(),
        }
    }

    /// Status words of every response, in order.
    pub fn status_words(&self) -> Vec<String> {
        self.exchanges
            .iter()
            .map(|(_, response)| hex::encode_upper(&response[response.len() - 2..]))
            .collect()
    }
}

impl Transceiver for RecordingTag<'_> {
    fn transceive(&mut self, command: &[u8]) -> TagKitResult<Vec<u8>> {
        let response = self.service.process_command_apdu(command.to_vec());
        self.exchanges.push((command.to_vec(), response.clone()));
        Ok(response)
    }
}
