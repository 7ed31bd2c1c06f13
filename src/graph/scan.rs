//! Best-effort dependency detection over SQL definition text
//!
//! A conservative token scan, not a SQL parser: schema-qualified identifiers
//! are extracted from the definition and matched against the set of known
//! object names. False negatives are possible (aliases, dynamic SQL); the
//! scanner sits behind a narrow trait so a SQL-aware implementation can be
//! swapped in without touching the resolver or the generator.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::model::QualifiedName;

/// Extracts referenced object names from one definition.
pub trait DependencyScanner {
    fn scan(&self, definition: &str, candidates: &[QualifiedName]) -> BTreeSet<QualifiedName>;
}

/// Schema-qualified identifier, with or without brackets:
/// `dbo.Orders`, `[dbo].[Orders]`, `[dbo].Orders`.
static QUALIFIED_IDENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[?([A-Za-z_][A-Za-z0-9_]*)\]?\.\[?([A-Za-z_][A-Za-z0-9_]*)\]?").unwrap()
});

/// Default textual scanner.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextScanner;

impl DependencyScanner for TextScanner {
    fn scan(&self, definition: &str, candidates: &[QualifiedName]) -> BTreeSet<QualifiedName> {
        let mut mentioned = BTreeSet::new();
        for capture in QUALIFIED_IDENT.captures_iter(definition) {
            mentioned.insert(QualifiedName::new(&capture[1], &capture[2]).to_lowercase());
        }
        candidates
            .iter()
            .filter(|candidate| mentioned.contains(&candidate.to_lowercase()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_qualified_references_in_any_quoting_style() {
        let definition =
            "CREATE VIEW dbo.vw_X AS SELECT a.n FROM [dbo].[Y] a JOIN Dbo.Z b ON a.id = b.id";
        let candidates = vec![
            QualifiedName::parse("dbo.Y"),
            QualifiedName::parse("dbo.Z"),
            QualifiedName::parse("dbo.NotMentioned"),
        ];
        let found = TextScanner.scan(definition, &candidates);
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec![QualifiedName::parse("dbo.Y"), QualifiedName::parse("dbo.Z")]
        );
    }

    #[test]
    fn does_not_match_bare_names() {
        let definition = "CREATE VIEW dbo.vw_X AS SELECT n FROM Y";
        let candidates = vec![QualifiedName::parse("dbo.Y")];
        assert!(TextScanner.scan(definition, &candidates).is_empty());
    }
}
