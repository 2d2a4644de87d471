use super::{Rule, finding};
use crate::diagnostic::Diagnostic;
use crate::prose::{Paragraph, Prose, Word};

/// Words that are legitimately doubled ("I had had enough", "that that").
const ALLOWED_REPEATS: &[&str] = &["had", "that"];

/// Flags a word written twice or more in a row.
pub struct RepeatedWords;

impl RepeatedWords {
    fn check_paragraph(&self, paragraph: &Paragraph, found: &mut Vec<Diagnostic>) {
        let words = paragraph.words();
        let mut i = 0;
        while i < words.len() {
            let run = run_length(paragraph, &words[i..]);
            let word = &words[i];
            let lower = word.lowercase();
            let numeric = word.text.chars().all(|c| c.is_ascii_digit());
            if run > 1 && !numeric && !ALLOWED_REPEATS.contains(&lower.as_str()) {
                let last = &words[i + run - 1];
                found.push(finding(
                    self,
                    paragraph,
                    word.start..last.end,
                    format!("Expected `{}` once, not {run} times", word.text),
                ));
            }
            i += run;
        }
    }
}

/// How many times `words[0]` repeats, whitespace-separated, at the start.
fn run_length(paragraph: &Paragraph, words: &[Word<'_>]) -> usize {
    let Some(first) = words.first() else {
        return 0;
    };
    let lower = first.lowercase();
    1 + words
        .windows(2)
        .take_while(|pair| paragraph.adjacent(&pair[0], &pair[1]) && pair[1].lowercase() == lower)
        .count()
}

impl Rule for RepeatedWords {
    fn id(&self) -> &'static str {
        "repeated-words"
    }

    fn source(&self) -> &'static str {
        "grammar"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for paragraph in prose.paragraphs() {
            self.check_paragraph(paragraph, &mut found);
        }
        found
    }
}
