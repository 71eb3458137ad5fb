//! Gathering offers from peers and committing the resolved note.

use crate::client::PeerClient;
use crate::error::ClientResult;
use crate::resolve::{Offer, OfferPrompt, OfferSet, Resolution};
use notepeer_protocol::{is_not_found, ServerAddress};
use tracing::{debug, info, warn};

/// A peer that contributed no offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPeer {
    /// Peer address.
    pub address: ServerAddress,
    /// Why it was skipped.
    pub reason: String,
}

/// A conflict resolution session for one note.
#[derive(Debug, Clone)]
pub struct ConflictSession {
    offers: OfferSet,
    skipped: Vec<SkippedPeer>,
}

impl ConflictSession {
    /// Fetches the current content from `local` and one offer per peer.
    ///
    /// The local server must answer; a missing local note starts from empty
    /// content. Peers that fail or do not hold the note are skipped, and
    /// offers identical to the current content are dropped.
    pub async fn gather(
        client: &PeerClient,
        local: &ServerAddress,
        peers: &[ServerAddress],
        key: &str,
    ) -> ClientResult<Self> {
        let current = client.request_note(local, key).await?;
        let current = if is_not_found(&current) {
            String::new()
        } else {
            current
        };

        let mut offers = Vec::new();
        let mut skipped = Vec::new();
        for peer in peers {
            match client.request_note(peer, key).await {
                Ok(content) if is_not_found(&content) => {
                    debug!(%peer, key, "peer does not hold the note");
                    skipped.push(SkippedPeer {
                        address: peer.clone(),
                        reason: "note not found".into(),
                    });
                }
                Ok(content) if content == current => {
                    debug!(%peer, key, "peer already matches local content");
                }
                Ok(content) => offers.push(Offer::new(peer.to_string(), content)),
                Err(e) => {
                    warn!(%peer, key, error = %e, "skipping unreachable peer");
                    skipped.push(SkippedPeer {
                        address: peer.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(key, offers = offers.len(), skipped = skipped.len(), "gathered offers");
        Ok(Self {
            offers: OfferSet::new(key, current, offers),
            skipped,
        })
    }

    /// Returns the gathered offers.
    pub fn offers(&self) -> &OfferSet {
        &self.offers
    }

    /// Returns the peers that contributed nothing.
    pub fn skipped_peers(&self) -> &[SkippedPeer] {
        &self.skipped
    }

    /// Runs the accept/skip fold.
    pub fn resolve<P: OfferPrompt + ?Sized>(&self, prompt: &mut P) -> Resolution {
        self.offers.resolve(prompt)
    }

    /// Registers the resolved master on `local` if it changed.
    ///
    /// Returns true if anything was written.
    pub async fn commit(
        client: &PeerClient,
        local: &ServerAddress,
        resolution: &Resolution,
    ) -> ClientResult<bool> {
        if !resolution.changed() {
            return Ok(false);
        }
        client
            .register_note(local, &resolution.key, &resolution.content)
            .await?;
        info!(key = %resolution.key, accepted = resolution.accepted(), "committed resolved note");
        Ok(true)
    }
}
