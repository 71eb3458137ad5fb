//! Resolve command implementation.

use crate::error::CliResult;
use crate::prompt::LinePrompt;
use notepeer_client::{ConflictSession, PeerClient};
use notepeer_protocol::ServerAddress;

/// Gathers offers for `key` from `peers`, asks about each one in order and
/// commits the result to `local`.
pub async fn run(
    client: &PeerClient,
    local: &ServerAddress,
    peers: &[ServerAddress],
    key: &str,
) -> CliResult<()> {
    let session = ConflictSession::gather(client, local, peers, key).await?;

    for skipped in session.skipped_peers() {
        eprintln!("Skipped {}: {}", skipped.address, skipped.reason);
    }
    if session.offers().is_empty() {
        println!("No differing copies of '{}'; nothing to resolve", key);
        return Ok(());
    }

    let resolution = session.resolve(&mut LinePrompt::terminal());
    if ConflictSession::commit(client, local, &resolution).await? {
        println!(
            "Resolved '{}' on {} ({} of {} offers accepted)",
            key,
            local,
            resolution.accepted(),
            resolution.decisions.len()
        );
    } else {
        println!("Kept the local copy of '{}'", key);
    }
    Ok(())
}
