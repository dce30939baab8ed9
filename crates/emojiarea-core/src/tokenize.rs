//! Plain text -> node sequence.
//!
//! Tokens match `:[a-z0-9-_+]+:`. A token the catalog does not know stays
//! literal text; scanning resumes at its closing colon so that colon may open
//! the next token (`10:30:smile:` still finds `:smile:`).

use std::sync::LazyLock;

#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
use regex::Regex;
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
use regex_lite::Regex;

use crate::catalog::PictogramCatalog;
use crate::node::{ContentNode, NodeSequence, PictogramRef, TextSpan};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[a-z0-9_+-]+:").expect("token pattern is valid"));

/// A token occurrence in source text, as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub token: &'a str,
}

/// Iterate every grammar match, resolved or not, left to right.
///
/// Matches may share a colon: `:a:b:` yields `:a:` and `:b:`.
pub fn scan_tokens(text: &str) -> impl Iterator<Item = TokenMatch<'_>> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let m = TOKEN_RE.find_at(text, pos)?;
        // Resume on the closing colon.
        pos = m.end() - 1;
        Some(TokenMatch {
            start: m.start(),
            end: m.end(),
            token: m.as_str(),
        })
    })
}

/// Split `text` into a normalized node sequence.
pub fn tokenize(text: &str, catalog: &PictogramCatalog) -> NodeSequence {
    let mut nodes = Vec::new();
    let mut text_start = 0;
    // Matches overlapping an already-consumed token are skipped.
    let mut consumed = 0;

    for m in scan_tokens(text) {
        if m.start < consumed {
            continue;
        }
        let Some(image) = catalog.lookup(m.token) else {
            tracing::trace!(target: "emojiarea::tokenize", token = m.token, "unknown token left as text");
            continue;
        };
        nodes.push(ContentNode::Text(TextSpan::new(&text[text_start..m.start])));
        nodes.push(ContentNode::Pictogram(PictogramRef::new(m.token, image.clone())));
        text_start = m.end;
        consumed = m.end;
    }

    if text_start < text.len() {
        nodes.push(ContentNode::Text(TextSpan::new(&text[text_start..])));
    }

    NodeSequence::from_nodes(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogConfig, GroupConfig};

    fn catalog(tokens: &[&str]) -> PictogramCatalog {
        let config = CatalogConfig {
            path: "img".into(),
            groups: vec![GroupConfig {
                id: "people".into(),
                name: None,
                icons: tokens
                    .iter()
                    .map(|t| (t.to_string(), format!("{t}.png")))
                    .collect(),
            }],
        };
        PictogramCatalog::from_config(&config).unwrap()
    }

    #[test]
    fn test_tokenize_text_around_pictogram() {
        let seq = tokenize("hi :smile: there", &catalog(&["smile"]));
        insta::assert_snapshot!(seq.to_string(), @r#"["hi ", <:smile:>, " there"]"#);
        assert_eq!(seq[1].source_text(), ":smile:");
    }

    #[test]
    fn test_tokenize_adjacent_pictograms() {
        let seq = tokenize(":a::b:", &catalog(&["a", "b"]));
        insta::assert_snapshot!(seq.to_string(), @r#"["", <:a:>, "", <:b:>, ""]"#);
    }

    #[test]
    fn test_tokenize_unknown_is_literal() {
        let seq = tokenize(":unknown:", &catalog(&["smile"]));
        insta::assert_snapshot!(seq.to_string(), @r#"[":unknown:"]"#);
    }

    #[test]
    fn test_tokenize_empty() {
        let seq = tokenize("", &catalog(&["smile"]));
        assert_eq!(seq, NodeSequence::new());
    }

    #[test]
    fn test_unknown_token_colon_reused() {
        let seq = tokenize("at 10:30:smile:", &catalog(&["smile"]));
        insta::assert_snapshot!(seq.to_string(), @r#"["at 10:30", <:smile:>, ""]"#);
    }

    #[test]
    fn test_known_token_colon_not_shared() {
        // `:a:` consumes its closing colon, so `:b:` cannot start there.
        let seq = tokenize(":a:b:", &catalog(&["a", "b"]));
        insta::assert_snapshot!(seq.to_string(), @r#"["", <:a:>, "b:"]"#);
    }

    #[test]
    fn test_uppercase_not_a_token() {
        let seq = tokenize(":Smile:", &catalog(&["smile"]));
        assert_eq!(seq.as_single_text(), Some(":Smile:"));
    }

    #[test]
    fn test_tokenize_with_empty_catalog() {
        let seq = tokenize("a :smile: b", &PictogramCatalog::empty());
        assert_eq!(seq.as_single_text(), Some("a :smile: b"));
    }

    #[test]
    fn test_scan_tokens_shares_colons() {
        let found: Vec<_> = scan_tokens(":a:b:").map(|m| m.token).collect();
        assert_eq!(found, vec![":a:", ":b:"]);
    }

    #[test]
    fn test_multibyte_text_preserved() {
        let seq = tokenize("héllo :smile: wörld", &catalog(&["smile"]));
        assert_eq!(seq.to_text(), "héllo :smile: wörld");
        insta::assert_snapshot!(seq.to_string(), @r#"["héllo ", <:smile:>, " wörld"]"#);
    }
}
