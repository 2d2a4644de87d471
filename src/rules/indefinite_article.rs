use super::passive::BE_VERBS;
use super::{Rule, finding};
use crate::diagnostic::Diagnostic;
use crate::prose::Prose;

/// Vowel-initial words pronounced with a leading consonant sound.
const CONSONANT_SOUND_PREFIXES: &[&str] = &[
    "uni", "use", "usu", "uti", "ure", "uro", "eu", "ewe", "one", "once", "ouija",
];

/// Consonant-initial words pronounced with a leading vowel sound.
const VOWEL_SOUND_PREFIXES: &[&str] = &["hour", "honest", "honor", "honour", "heir"];

/// Letters whose spoken name starts with a vowel sound (`an FBI agent`).
const VOWEL_SOUND_LETTERS: &str = "AEFHILMNORSX";

/// Checks `a` versus `an` against the sound of the following word.
pub struct IndefiniteArticle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Article {
    A,
    An,
}

impl Article {
    fn as_str(self) -> &'static str {
        match self {
            Article::A => "a",
            Article::An => "an",
        }
    }
}

fn is_acronym(word: &str) -> bool {
    word.len() > 1 && word.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// The article a word takes, when it can be told from the spelling.
fn expected_article(word: &str) -> Option<Article> {
    let first = word.chars().next()?;

    if first.is_ascii_digit() {
        let digits: String = word.chars().take_while(char::is_ascii_digit).collect();
        // "an 8", "an 11", "an 18", "an 80", "an 800"
        let an = digits.starts_with('8')
            || digits == "11"
            || digits == "18"
            || (digits.len() % 3 == 2 && (digits.starts_with("11") || digits.starts_with("18")));
        return Some(if an { Article::An } else { Article::A });
    }

    if is_acronym(word) {
        let vowel = VOWEL_SOUND_LETTERS.contains(first);
        return Some(if vowel { Article::An } else { Article::A });
    }

    if !first.is_alphabetic() {
        return None;
    }

    let lower = word.to_lowercase();
    if VOWEL_SOUND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return Some(Article::An);
    }
    if CONSONANT_SOUND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return Some(Article::A);
    }
    let vowel = matches!(lower.chars().next(), Some('a' | 'e' | 'i' | 'o' | 'u'));
    Some(if vowel { Article::An } else { Article::A })
}

fn article(word: &str) -> Option<Article> {
    match word.to_lowercase().as_str() {
        "a" => Some(Article::A),
        "an" => Some(Article::An),
        _ => None,
    }
}

impl Rule for IndefiniteArticle {
    fn id(&self) -> &'static str {
        "indefinite-article"
    }

    fn source(&self) -> &'static str {
        "grammar"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for paragraph in prose.paragraphs() {
            let words = paragraph.words();
            for (i, pair) in words.windows(2).enumerate() {
                let (current, next) = (&pair[0], &pair[1]);
                let Some(used) = article(current.text) else {
                    continue;
                };
                // "point a, then b": not an article in front of a word.
                if !paragraph.adjacent(current, next) {
                    continue;
                }
                // "Plan A is ready", "A is for apple": a name, not an article.
                if current.text == "A" {
                    let after_name = i
                        .checked_sub(1)
                        .map(|j| &words[j])
                        .is_some_and(|prev| {
                            paragraph.adjacent(prev, current)
                                && prev.text.starts_with(char::is_uppercase)
                        });
                    if after_name || BE_VERBS.contains(&next.lowercase().as_str()) {
                        continue;
                    }
                }
                let Some(expected) = expected_article(next.text) else {
                    continue;
                };
                if used != expected {
                    found.push(finding(
                        self,
                        paragraph,
                        current.span(),
                        format!(
                            "Use `{}` before `{}`, not `{}`",
                            expected.as_str(),
                            next.text,
                            used.as_str()
                        ),
                    ));
                }
            }
        }
        found
    }
}
