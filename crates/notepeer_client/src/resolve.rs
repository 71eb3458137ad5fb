//! Conflict resolution over incoming offers.
//!
//! A resolution is a strict left-to-right fold over the offers:
//! `current' = if accepted { offer } else { current }`. There is no
//! backtracking; the content left after the last offer is the resolved
//! master.

/// The user's answer to one offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The offer becomes the current content.
    Accept,
    /// The offer is discarded.
    Skip,
}

/// An incoming content proposal for a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Where the offer came from (a peer address or any other label).
    pub source: String,
    /// Proposed content.
    pub content: String,
}

impl Offer {
    /// Creates an offer.
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// What a prompt sees when asked about one offer.
#[derive(Debug, Clone, Copy)]
pub struct OfferView<'a> {
    /// Note key.
    pub key: &'a str,
    /// Content accepted so far.
    pub current: &'a str,
    /// The offer under consideration.
    pub offer: &'a Offer,
    /// Zero-based position of the offer.
    pub index: usize,
    /// Number of offers in the session.
    pub total: usize,
}

/// Asks the user about one offer at a time.
pub trait OfferPrompt {
    /// Decides whether to accept the offer.
    fn decide(&mut self, view: &OfferView<'_>) -> Decision;
}

impl<F> OfferPrompt for F
where
    F: FnMut(&OfferView<'_>) -> Decision,
{
    fn decide(&mut self, view: &OfferView<'_>) -> Decision {
        self(view)
    }
}

/// Offers for one note key, paired with the currently accepted content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferSet {
    key: String,
    current: String,
    offers: Vec<Offer>,
}

impl OfferSet {
    /// Creates an offer set.
    pub fn new(key: impl Into<String>, current: impl Into<String>, offers: Vec<Offer>) -> Self {
        Self {
            key: key.into(),
            current: current.into(),
            offers,
        }
    }

    /// Returns the note key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the starting content.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Returns the offers in presentation order.
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    /// Returns true if there is nothing to decide.
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Presents each offer to `prompt` in order and folds the answers.
    pub fn resolve<P: OfferPrompt + ?Sized>(&self, prompt: &mut P) -> Resolution {
        let total = self.offers.len();
        let mut current = self.current.clone();
        let mut decisions = Vec::with_capacity(total);

        for (index, offer) in self.offers.iter().enumerate() {
            let view = OfferView {
                key: &self.key,
                current: &current,
                offer,
                index,
                total,
            };
            let decision = prompt.decide(&view);
            if decision == Decision::Accept {
                current = offer.content.clone();
            }
            decisions.push(decision);
        }

        Resolution {
            key: self.key.clone(),
            initial: self.current.clone(),
            content: current,
            decisions,
        }
    }

    /// Applies precomputed decisions; offers without one are skipped.
    pub fn resolve_with(&self, decisions: &[Decision]) -> Resolution {
        let mut answers = decisions.iter().copied();
        self.resolve(&mut |_: &OfferView<'_>| answers.next().unwrap_or(Decision::Skip))
    }
}

/// Outcome of a resolution session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Note key.
    pub key: String,
    /// Content before the session.
    pub initial: String,
    /// Resolved master content.
    pub content: String,
    /// One decision per offer, in order.
    pub decisions: Vec<Decision>,
}

impl Resolution {
    /// Returns true if the resolved content differs from the starting content.
    pub fn changed(&self) -> bool {
        self.content != self.initial
    }

    /// Returns the number of accepted offers.
    pub fn accepted(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| **d == Decision::Accept)
            .count()
    }
}

/// Answer to a single pushed note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOutcome {
    /// Whether the incoming note is taken.
    pub accepted: bool,
    /// Hand-edited text replacing the incoming note, if any.
    pub final_text: Option<String>,
}

impl PromptOutcome {
    /// Accepts the incoming text unchanged.
    pub fn accept() -> Self {
        Self {
            accepted: true,
            final_text: None,
        }
    }

    /// Accepts with edited text.
    pub fn accept_edited(text: impl Into<String>) -> Self {
        Self {
            accepted: true,
            final_text: Some(text.into()),
        }
    }

    /// Rejects the incoming text.
    pub fn reject() -> Self {
        Self {
            accepted: false,
            final_text: None,
        }
    }
}

/// Asks the user to confirm one incoming note.
pub trait PushPrompt {
    /// Shows `current` and `incoming` and returns the user's answer.
    fn confirm(&mut self, current: &str, incoming: &str) -> PromptOutcome;
}

impl<F> PushPrompt for F
where
    F: FnMut(&str, &str) -> PromptOutcome,
{
    fn confirm(&mut self, current: &str, incoming: &str) -> PromptOutcome {
        self(current, incoming)
    }
}

/// Single-offer variant of the workflow.
///
/// Returns the text to keep, or `None` if the incoming note was rejected.
pub fn confirm_push<P: PushPrompt + ?Sized>(
    prompt: &mut P,
    current: &str,
    incoming: &str,
) -> Option<String> {
    let outcome = prompt.confirm(current, incoming);
    if !outcome.accepted {
        return None;
    }
    Some(outcome.final_text.unwrap_or_else(|| incoming.to_string()))
}
