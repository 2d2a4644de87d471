use super::{Rule, finding};
use crate::diagnostic::Diagnostic;
use crate::prose::Prose;

pub(super) const BE_VERBS: &[&str] = &["am", "are", "is", "was", "were", "be", "been", "being"];

const IRREGULAR_PARTICIPLES: &[&str] = &[
    "awoken", "beaten", "become", "begun", "bent", "bitten", "blown", "bought", "bound", "broken",
    "brought", "built", "caught", "chosen", "done", "drawn", "driven", "drunk", "eaten", "fallen",
    "fed", "felt", "forbidden", "forgotten", "forgiven", "found", "frozen", "given", "gone",
    "grown", "heard", "held", "hidden", "hit", "hung", "hurt", "kept", "known", "laid", "led",
    "left", "lent", "lost", "made", "meant", "met", "paid", "put", "read", "ridden", "run", "said",
    "seen", "sent", "set", "shaken", "shot", "shown", "shut", "sold", "spent", "spoken", "stolen",
    "struck", "sung", "sunk", "taken", "taught", "thrown", "told", "understood", "woken", "won",
    "worn", "written",
];

/// Words ending in `-ed` that are adjectives, not participles.
const ED_ADJECTIVES: &[&str] = &["bed", "need", "red", "seed", "shed", "sled", "speed", "wed"];

/// Flags passive constructions: a form of "to be" followed by a participle.
pub struct Passive;

fn is_participle(word: &str) -> bool {
    let lower = word.to_lowercase();
    if IRREGULAR_PARTICIPLES.contains(&lower.as_str()) {
        return true;
    }
    lower.len() > 3 && lower.ends_with("ed") && !ED_ADJECTIVES.contains(&lower.as_str())
}

impl Rule for Passive {
    fn id(&self) -> &'static str {
        "passive"
    }

    fn source(&self) -> &'static str {
        "style"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for paragraph in prose.paragraphs() {
            let words = paragraph.words();
            for pair in words.windows(2) {
                let (verb, participle) = (&pair[0], &pair[1]);
                if BE_VERBS.contains(&verb.lowercase().as_str())
                    && paragraph.adjacent(verb, participle)
                    && is_participle(participle.text)
                {
                    found.push(finding(
                        self,
                        paragraph,
                        verb.start..participle.end,
                        "Don't use the passive voice",
                    ));
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::check_text;

    #[test]
    fn flags_irregular_participles() {
        let found = check_text(&Passive, "<p>The cake was eaten by the dog.</p>");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].actual, "was eaten");
        assert_eq!(found[0].reason, "Don't use the passive voice");
        assert_eq!(found[0].source, "style");
    }

    #[test]
    fn flags_regular_participles() {
        let found = check_text(&Passive, "<p>Mistakes were made. The file is deleted.</p>");
        let actual: Vec<_> = found.iter().map(|d| d.actual.as_str()).collect();
        assert_eq!(actual, vec!["were made", "is deleted"]);
    }

    #[test]
    fn active_voice_passes() {
        assert!(check_text(&Passive, "<p>The dog ate the cake.</p>").is_empty());
    }

    #[test]
    fn words_must_be_adjacent() {
        assert!(check_text(&Passive, "<p>It was. Eaten, it was.</p>").is_empty());
    }

    #[test]
    fn adjectives_ending_in_ed_pass() {
        assert!(check_text(&Passive, "<p>The barn is red.</p>").is_empty());
    }
}
