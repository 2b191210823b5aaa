//! Keyword matching of extracted page text against the certification table.

use std::collections::BTreeSet;

use certsweep_shared::{CertKind, KeywordTable};

/// Match extracted page text against every certification kind's keywords.
///
/// A kind matches when any of its keywords occurs as a substring of the
/// text. Matching is independent per kind, so a single page may match
/// zero, one, or several kinds. `text` is expected to be lowercased
/// already (the extractor guarantees this); table keywords are stored
/// lowercased, which together makes the match case-insensitive.
pub fn match_keywords(text: &str, table: &KeywordTable) -> BTreeSet<CertKind> {
    let mut matched = BTreeSet::new();
    for (kind, keywords) in table.iter() {
        if keywords
            .iter()
            .any(|kw| !kw.is_empty() && text.contains(kw.as_str()))
        {
            matched.insert(kind);
        }
    }
    matched
}
