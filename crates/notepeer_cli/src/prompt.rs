//! Interactive prompts over a line-oriented terminal.

use notepeer_client::{Decision, OfferPrompt, OfferView, PromptOutcome, PushPrompt};
use std::io::{self, BufRead, Write};

/// Terminator line ending hand-edited text.
const EDIT_TERMINATOR: &str = ".";

/// Line-based prompt reading answers from `input` and writing to `output`.
///
/// End of input answers every remaining question with "no".
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl LinePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompts on stderr and reads answers from stdin.
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    /// Creates a prompt over arbitrary streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        // A closed terminal only loses the question text.
        let _ = write!(self.output, "{} ", question);
        let _ = self.output.flush();
        self.read_line().map(|answer| answer.trim().to_lowercase())
    }

    fn show(&mut self, label: &str, text: &str) {
        let _ = writeln!(self.output, "--- {} ---", label);
        let _ = writeln!(self.output, "{}", text);
    }

    fn read_edited(&mut self) -> String {
        let _ = writeln!(
            self.output,
            "Enter the new text, ending with a line containing only '{}':",
            EDIT_TERMINATOR
        );
        let mut lines = Vec::new();
        while let Some(line) = self.read_line() {
            if line == EDIT_TERMINATOR {
                break;
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

impl<R: BufRead, W: Write> OfferPrompt for LinePrompt<R, W> {
    fn decide(&mut self, view: &OfferView<'_>) -> Decision {
        let _ = writeln!(
            self.output,
            "[{}/{}] '{}' from {}",
            view.index + 1,
            view.total,
            view.key,
            view.offer.source
        );
        self.show("current", view.current);
        self.show("offer", &view.offer.content);
        match self.ask("Accept this offer? [y/N]").as_deref() {
            Some("y") | Some("yes") => Decision::Accept,
            _ => Decision::Skip,
        }
    }
}

impl<R: BufRead, W: Write> PushPrompt for LinePrompt<R, W> {
    fn confirm(&mut self, current: &str, incoming: &str) -> PromptOutcome {
        self.show("current", current);
        self.show("incoming", incoming);
        match self.ask("Take the incoming note? [y]es/[e]dit/[N]o").as_deref() {
            Some("y") | Some("yes") => PromptOutcome::accept(),
            Some("e") | Some("edit") => PromptOutcome::accept_edited(self.read_edited()),
            _ => PromptOutcome::reject(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notepeer_client::{confirm_push, Offer, OfferSet};
    use std::io::Cursor;

    fn prompt(input: &str) -> LinePrompt<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn offers() -> OfferSet {
        OfferSet::new(
            "plan",
            "A",
            vec![Offer::new("peer-1", "B"), Offer::new("peer-2", "C")],
        )
    }

    #[test]
    fn answers_drive_the_fold() {
        let resolution = offers().resolve(&mut prompt("n\nyes\n"));
        assert_eq!(resolution.content, "C");
        assert_eq!(resolution.decisions, vec![Decision::Skip, Decision::Accept]);
    }

    #[test]
    fn end_of_input_skips() {
        let resolution = offers().resolve(&mut prompt("Y\n"));
        assert_eq!(resolution.content, "B");
        assert_eq!(resolution.decisions, vec![Decision::Accept, Decision::Skip]);
    }

    #[test]
    fn offer_prompt_shows_both_sides() {
        let mut p = prompt("n\nn\n");
        offers().resolve(&mut p);
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("[1/2] 'plan' from peer-1"));
        assert!(shown.contains("--- offer ---\nC"));
    }

    #[test]
    fn push_prompt_accepts_and_rejects() {
        assert_eq!(confirm_push(&mut prompt("y\n"), "old", "new"), Some("new".into()));
        assert_eq!(confirm_push(&mut prompt("\n"), "old", "new"), None);
        assert_eq!(confirm_push(&mut prompt(""), "old", "new"), None);
    }

    #[test]
    fn push_prompt_reads_edited_text() {
        let mut p = prompt("e\nline one\nline two\n.\n");
        assert_eq!(
            confirm_push(&mut p, "old", "new"),
            Some("line one\nline two".into())
        );
    }
}
