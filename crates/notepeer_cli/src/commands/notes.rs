//! Single-request commands against one peer.

use crate::error::{CliError, CliResult};
use crate::{ContentArgs, OutputFormat};
use notepeer_client::PeerClient;
use notepeer_protocol::{is_not_found, ServerAddress};
use serde::Serialize;
use std::io::Read;

/// A note as printed in JSON output.
#[derive(Debug, Serialize)]
pub struct NoteOutput<'a> {
    /// Note key.
    pub key: &'a str,
    /// Note content.
    pub content: &'a str,
}

impl ContentArgs {
    /// Returns the note content from `--content`, `--file` or stdin.
    pub fn read(&self) -> CliResult<String> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path).map_err(|e| CliError::file(path, e));
        }
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    }
}

/// Prints the content of `key` held by `peer`.
pub async fn get(
    client: &PeerClient,
    peer: &ServerAddress,
    key: &str,
    format: OutputFormat,
) -> CliResult<()> {
    let content = client.request_note(peer, key).await?;
    if is_not_found(&content) {
        return Err(CliError::NoteNotFound {
            key: key.to_string(),
            peer: peer.to_string(),
        });
    }

    match format {
        OutputFormat::Text => println!("{}", content),
        OutputFormat::Json => {
            let output = NoteOutput {
                key,
                content: &content,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Registers `content` under `key` on `peer`.
pub async fn register(
    client: &PeerClient,
    peer: &ServerAddress,
    key: &str,
    content: &str,
) -> CliResult<()> {
    let ack = client.register_note(peer, key, content).await?;
    println!("{}", ack);
    Ok(())
}

/// Pushes `content` into the vault of `peer`.
pub async fn push(
    client: &PeerClient,
    peer: &ServerAddress,
    key: &str,
    content: &str,
) -> CliResult<()> {
    let path = client.push_note(peer, key, content).await?;
    println!("Written to {} on {}", path, peer);
    Ok(())
}

/// Deletes `key` on `peer`.
pub async fn delete(client: &PeerClient, peer: &ServerAddress, key: &str) -> CliResult<()> {
    let ack = client.delete_note(peer, key).await?;
    println!("{}", ack);
    Ok(())
}

/// Lists the keys registered on `peer`.
pub async fn list(client: &PeerClient, peer: &ServerAddress, format: OutputFormat) -> CliResult<()> {
    let keys = client.list_keys(peer).await?;
    match format {
        OutputFormat::Text => {
            for key in &keys {
                println!("{}", key);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&keys)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_content_wins() {
        let args = ContentArgs {
            file: None,
            content: Some("inline".into()),
        };
        assert_eq!(args.read().unwrap(), "inline");
    }

    #[test]
    fn content_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "# Title\nbody").unwrap();

        let args = ContentArgs {
            file: Some(path),
            content: None,
        };
        assert_eq!(args.read().unwrap(), "# Title\nbody");
    }

    #[test]
    fn missing_file_names_the_path() {
        let args = ContentArgs {
            file: Some("/definitely/not/here.md".into()),
            content: None,
        };
        let err = args.read().unwrap_err();
        assert!(err.to_string().starts_with("/definitely/not/here.md"));
    }

    #[test]
    fn json_note_shape() {
        let output = NoteOutput {
            key: "k",
            content: "v",
        };
        assert_eq!(
            serde_json::to_string(&output).unwrap(),
            r#"{"key":"k","content":"v"}"#
        );
    }
}
