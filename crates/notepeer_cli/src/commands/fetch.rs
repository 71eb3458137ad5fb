//! Fetch command implementation.

use crate::error::{CliError, CliResult};
use crate::prompt::LinePrompt;
use notepeer_client::{confirm_push, PeerClient, PushPrompt};
use notepeer_protocol::{is_not_found, ShareKey};
use std::io;
use std::path::Path;
use tracing::info;

/// Fetches the note behind `share`.
///
/// Without `into` the note is printed. With `into` the user is shown the
/// current file and the incoming note, and the file is written only if the
/// note is taken.
pub async fn run(client: &PeerClient, share: &ShareKey, into: Option<&Path>) -> CliResult<()> {
    let incoming = client.request_note(&share.address, &share.key).await?;
    if is_not_found(&incoming) {
        return Err(CliError::NoteNotFound {
            key: share.key.clone(),
            peer: share.address.to_string(),
        });
    }

    match into {
        None => println!("{}", incoming),
        Some(path) => {
            let written = apply(&mut LinePrompt::terminal(), path, &incoming)?;
            if written {
                println!("Wrote '{}' to {}", share.key, path.display());
            } else {
                println!("Kept {} unchanged", path.display());
            }
        }
    }
    Ok(())
}

/// Asks `prompt` about `incoming` and writes the chosen text to `path`.
///
/// A missing file counts as empty. Returns true if the file was written.
fn apply<P: PushPrompt + ?Sized>(prompt: &mut P, path: &Path, incoming: &str) -> CliResult<bool> {
    let current = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(CliError::file(path, e)),
    };

    match confirm_push(prompt, &current, incoming) {
        Some(text) => {
            std::fs::write(path, &text).map_err(|e| CliError::file(path, e))?;
            info!(path = %path.display(), "note written");
            Ok(true)
        }
        None => Ok(false),
    }
}
