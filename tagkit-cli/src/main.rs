//! Developer CLI for `TagKit`.
//!
//! Every subcommand activates an in-process [`T4tHostService`] and talks to it
//! the way an NFC reader would, so tag content can be checked without a phone.

use std::fs;
use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use eyre::{bail, Result, WrapErr};
use tagkit_core::invitation::{decode_oob_invitation, oob_invitation_uri, DEFAULT_WALLET_URL};
use tagkit_core::ndef::{ndef_uri_message, NdefFile};
use tagkit_core::reader::{NdefReader, Transceiver};
use tagkit_core::{T4tHostService, TagKitResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "tagkit", about = "NFC Type 4 Tag emulation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the NDEF message and the NDEF file the tag would serve
    Encode(Content),
    /// Run the NDEF read procedure against the tag and print what a reader sees
    Read {
        #[command(flatten)]
        content: Content,
        /// Largest READ BINARY the reader asks for
        #[arg(long, env = "TAGKIT_MAX_READ", default_value_t = 255)]
        max_read: u8,
    },
    /// Send raw command APDUs to the tag, in order
    Apdu {
        #[command(flatten)]
        content: Content,
        /// Command APDUs in hex
        #[arg(required = true)]
        apdus: Vec<String>,
    },
}

/// What the tag is activated with.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["uri", "invitation"])))]
struct Content {
    /// Publish this URI
    #[arg(long)]
    uri: Option<String>,
    /// Publish the out-of-band invitation JSON in this file
    #[arg(long)]
    invitation: Option<PathBuf>,
    /// Wallet URL the invitation is attached to
    #[arg(long, env = "TAGKIT_WALLET_URL", default_value = DEFAULT_WALLET_URL)]
    wallet_url: String,
}

impl Content {
    fn uri(&self) -> Result<String> {
        if let Some(uri) = &self.uri {
            return Ok(uri.clone());
        }
        let Some(path) = &self.invitation else {
            bail!("either --uri or --invitation is required");
        };
        let invitation = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read invitation {}", path.display()))?;
        Ok(oob_invitation_uri(&self.wallet_url, invitation.trim()))
    }

    fn activate(&self) -> Result<std::sync::Arc<T4tHostService>> {
        let service = T4tHostService::new();
        service.activate_with_uri(&self.uri()?)?;
        Ok(service)
    }
}

/// Logs every exchange with the tag.
struct Traced<'a>(&'a T4tHostService);

impl Transceiver for Traced<'_> {
    fn transceive(&mut self, command: &[u8]) -> TagKitResult<Vec<u8>> {
        let response = self.0.process_command_apdu(command.to_vec());
        tracing::info!(
            command = %hex::encode_upper(command),
            response = %hex::encode_upper(&response),
            "apdu"
        );
        Ok(response)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Encode(content) => {
            let uri = content.uri()?;
            let message = ndef_uri_message(&uri)?;
            let file = NdefFile::new(&message)?;
            println!("uri:          {uri}");
            println!("ndef message: {}", hex::encode_upper(&message));
            println!("ndef file:    {}", hex::encode_upper(file.as_bytes()));
        }
        Command::Read { content, max_read } => {
            let service = content.activate()?;
            let readout = NdefReader::new(max_read).read(&mut Traced(&service))?;
            tracing::debug!(capability_container = ?readout.capability_container);

            let uri = readout.uri()?;
            println!("uri: {uri}");
            match decode_oob_invitation(&uri) {
                Ok(invitation) => println!("invitation: {invitation}"),
                Err(e) => tracing::debug!("no invitation in uri: {e}"),
            }
        }
        Command::Apdu { content, apdus } => {
            let service = content.activate()?;
            for apdu in &apdus {
                let command = hex::decode(apdu.replace(' ', ""))
                    .wrap_err_with(|| format!("invalid command APDU {apdu}"))?;
                let response = service.process_command_apdu(command);
                println!("{apdu} -> {}", hex::encode_upper(&response));
            }
            tracing::debug!(state = ?service.state(), "tag state after the last command");
        }
    }

    Ok(())
}
