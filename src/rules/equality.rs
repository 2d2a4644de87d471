use super::{Rule, finding, phrase_regex};
use crate::diagnostic::Diagnostic;
use crate::prose::Prose;
use regex::Regex;
use std::sync::LazyLock;

/// Insensitive or gendered terms and neutral alternatives.
const TERMS: &[(&str, &str)] = &[
    ("whitelist", "allowlist"),
    ("whitelisted", "allowlisted"),
    ("blacklist", "denylist"),
    ("blacklisted", "denylisted"),
    ("master", "primary"),
    ("slave", "replica"),
    ("slaves", "replicas"),
    ("guys", "folks"),
    ("manpower", "workforce"),
    ("man-hours", "person-hours"),
    ("mankind", "humankind"),
    ("chairman", "chair"),
    ("chairmen", "chairs"),
    ("sanity check", "quick check"),
    ("crazy", "surprising"),
    ("insane", "extreme"),
    ("dummy", "placeholder"),
    ("lame", "disappointing"),
    ("cripple", "hinder"),
    ("crippled", "hindered"),
];

static PATTERN: LazyLock<Regex> =
    LazyLock::new(|| phrase_regex(TERMS.iter().map(|(term, _)| *term)));

/// Flags possibly insensitive phrasing.
pub struct Equality;

fn alternative(matched: &str) -> Option<&'static str> {
    let key = matched
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    TERMS
        .iter()
        .find(|(term, _)| *term == key)
        .map(|(_, alternative)| *alternative)
}

impl Rule for Equality {
    fn id(&self) -> &'static str {
        "equality"
    }

    fn source(&self) -> &'static str {
        "inclusive"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        prose
            .paragraphs()
            .iter()
            .flat_map(|paragraph| {
                PATTERN.find_iter(paragraph.text()).filter_map(move |m| {
                    let suggestion = alternative(m.as_str())?;
                    Some(finding(
                        self,
                        paragraph,
                        m.range(),
                        format!(
                            "`{}` may be insensitive, use `{suggestion}` instead",
                            m.as_str()
                        ),
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::check_text;

    #[test]
    fn suggests_neutral_terms() {
        let found = check_text(&Equality, "<p>Add the host to the whitelist.</p>");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].actual, "whitelist");
        assert_eq!(
            found[0].reason,
            "`whitelist` may be insensitive, use `allowlist` instead"
        );
        assert_eq!(found[0].source, "inclusive");
    }

    #[test]
    fn finds_several_terms() {
        let found = check_text(&Equality, "<p>Hey guys, run a sanity check on the slave.</p>");
        let actual: Vec<_> = found.iter().map(|d| d.actual.as_str()).collect();
        assert_eq!(actual, vec!["guys", "sanity check", "slave"]);
    }

    #[test]
    fn inflected_forms_have_their_own_entries() {
        let found = check_text(&Equality, "<p>The address was blacklisted.</p>");
        assert!(found[0].reason.contains("`denylisted`"));
    }

    #[test]
    fn neutral_text_passes() {
        assert!(check_text(&Equality, "<p>Mastery takes practice, folks.</p>").is_empty());
    }
}
