//! Pictogram catalog: group -> token -> image file.
//!
//! The catalog is built once from a [`CatalogConfig`] and is immutable
//! afterwards. Sessions share it through an `Arc`, so there is no process-wide
//! mutable option object.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::error::{EmojiAreaError, Result};

/// Serialized catalog configuration.
///
/// ```toml
/// path = "img/emoji"
///
/// [[groups]]
/// id = "people"
/// name = "People"
/// icons = { smile = "smile.png", ":wink:" = "wink.png" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Prefix prepended to every icon file name.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: String,
    /// Display name for picker tabs. Falls back to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// Token (with or without surrounding colons) -> file name.
    #[serde(default)]
    pub icons: BTreeMap<String, String>,
}

impl CatalogConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a catalog file, picking the format from the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            other => Err(EmojiAreaError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Resolved image for one token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    /// Image source, base path already applied.
    pub src: String,
    /// Accessible alt text. Always the full `:token:` form, which is what the
    /// serializer reads back.
    pub alt: SmolStr,
}

impl ImageHandle {
    pub fn new(src: impl Into<String>, alt: impl Into<SmolStr>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
        }
    }

    /// The token this image stands for, e.g. `:smile:`.
    pub fn token(&self) -> &str {
        &self.alt
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pictogram {
    /// Bare token name without colons.
    pub name: SmolStr,
    pub image: ImageHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictogramGroup {
    pub id: SmolStr,
    pub name: SmolStr,
    pub icons: Vec<Pictogram>,
}

impl PictogramGroup {
    pub fn find(&self, token: &str) -> Option<&Pictogram> {
        let name = token_body(token);
        self.icons.iter().find(|p| p.name == name)
    }
}

/// Immutable token lookup table.
#[derive(Debug, Clone, Default)]
pub struct PictogramCatalog {
    base_path: String,
    groups: Vec<PictogramGroup>,
    /// Bare name -> (group index, icon index). First group wins.
    index: HashMap<SmolStr, (usize, usize)>,
}

impl PictogramCatalog {
    /// A catalog with no pictograms. Every token stays plain text.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let base_path = normalize_base_path(&config.path);
        let mut groups: Vec<PictogramGroup> = Vec::with_capacity(config.groups.len());
        let mut index = HashMap::new();

        for group in &config.groups {
            if groups.iter().any(|g| g.id == group.id) {
                return Err(EmojiAreaError::DuplicateGroup(group.id.clone()));
            }

            let mut icons = Vec::with_capacity(group.icons.len());
            for (token, file) in &group.icons {
                let name = token_body(token);
                if !is_token_body(name) {
                    return Err(EmojiAreaError::InvalidToken {
                        group: group.id.clone(),
                        token: token.clone(),
                    });
                }
                let name = SmolStr::new(name);
                index
                    .entry(name.clone())
                    .or_insert((groups.len(), icons.len()));
                icons.push(Pictogram {
                    image: ImageHandle::new(
                        format!("{base_path}{file}"),
                        format_smolstr!(":{}:", name),
                    ),
                    name,
                });
            }

            groups.push(PictogramGroup {
                id: SmolStr::new(&group.id),
                name: SmolStr::new(group.name.as_deref().unwrap_or(&group.id)),
                icons,
            });
        }

        tracing::debug!(
            groups = groups.len(),
            tokens = index.len(),
            base_path = %base_path,
            "built pictogram catalog"
        );

        Ok(Self {
            base_path,
            groups,
            index,
        })
    }

    /// Global lookup. Accepts `:smile:` or `smile`.
    pub fn lookup(&self, token: &str) -> Option<&ImageHandle> {
        let (g, i) = self.index.get(token_body(token))?;
        Some(&self.groups[*g].icons[*i].image)
    }

    /// Group-scoped lookup, used by the picker and programmatic insertion.
    pub fn icon(&self, group: &str, token: &str) -> Option<&ImageHandle> {
        self.group(group)?.find(token).map(|p| &p.image)
    }

    pub fn group(&self, id: &str) -> Option<&PictogramGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn groups(&self) -> &[PictogramGroup] {
        &self.groups
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Strip one pair of surrounding colons, if present.
pub fn token_body(token: &str) -> &str {
    token
        .strip_prefix(':')
        .and_then(|t| t.strip_suffix(':'))
        .unwrap_or(token)
}

/// Whether `s` is a valid token body (`[a-z0-9-_+]+`).
pub fn is_token_body(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'+'))
}

fn normalize_base_path(path: &str) -> String {
    if !path.is_empty() && !path.ends_with('/') {
        format!("{path}/")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CatalogConfig {
        CatalogConfig::from_toml_str(
            r#"
            path = "img/emoji"

            [[groups]]
            id = "people"
            name = "People"
            icons = { smile = "smile.png", ":wink:" = "wink.png" }

            [[groups]]
            id = "nature"
            icons = { sun = "sun.png", smile = "other-smile.png" }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_with_and_without_colons() {
        let catalog = PictogramCatalog::from_config(&config()).unwrap();
        let a = catalog.lookup(":smile:").unwrap();
        let b = catalog.lookup("smile").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.src, "img/emoji/smile.png");
        assert_eq!(a.alt, ":smile:");
        assert!(catalog.lookup(":missing:").is_none());
    }

    #[test]
    fn test_first_group_wins_globally() {
        let catalog = PictogramCatalog::from_config(&config()).unwrap();
        assert_eq!(catalog.lookup("smile").unwrap().src, "img/emoji/smile.png");
        assert_eq!(
            catalog.icon("nature", "smile").unwrap().src,
            "img/emoji/other-smile.png"
        );
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_colon_keys_are_normalized() {
        let catalog = PictogramCatalog::from_config(&config()).unwrap();
        let wink = catalog.icon("people", "wink").unwrap();
        assert_eq!(wink.alt, ":wink:");
    }

    #[test]
    fn test_group_name_falls_back_to_id() {
        let catalog = PictogramCatalog::from_config(&config()).unwrap();
        assert_eq!(catalog.group("people").unwrap().name, "People");
        assert_eq!(catalog.group("nature").unwrap().name, "nature");
    }

    #[test]
    fn test_base_path_gets_trailing_slash() {
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("img"), "img/");
        assert_eq!(normalize_base_path("img/"), "img/");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = CatalogConfig {
            path: String::new(),
            groups: vec![GroupConfig {
                id: "people".into(),
                name: None,
                icons: [("Smile".to_string(), "smile.png".to_string())].into(),
            }],
        };
        let err = PictogramCatalog::from_config(&config).unwrap_err();
        assert!(matches!(err, EmojiAreaError::InvalidToken { .. }));
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let group = GroupConfig {
            id: "people".into(),
            name: None,
            icons: BTreeMap::new(),
        };
        let config = CatalogConfig {
            path: String::new(),
            groups: vec![group.clone(), group],
        };
        assert!(matches!(
            PictogramCatalog::from_config(&config),
            Err(EmojiAreaError::DuplicateGroup(_))
        ));
    }

    #[test]
    fn test_json_config() {
        let config = CatalogConfig::from_json_str(
            r#"{ "path": "/e", "groups": [ { "id": "p", "icons": { "+1": "thumbs.png" } } ] }"#,
        )
        .unwrap();
        let catalog = PictogramCatalog::from_config(&config).unwrap();
        assert_eq!(catalog.lookup(":+1:").unwrap().src, "/e/thumbs.png");
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = PictogramCatalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.lookup(":smile:").is_none());
    }

    #[test]
    fn test_token_body() {
        assert_eq!(token_body(":smile:"), "smile");
        assert_eq!(token_body("smile"), "smile");
        assert_eq!(token_body(":smile"), ":smile");
        assert!(is_token_body("a-b_c+1"));
        assert!(!is_token_body(""));
        assert!(!is_token_body("A"));
        assert!(!is_token_body("a b"));
    }
}
