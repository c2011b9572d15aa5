//! Named styles offered by the style-menu flow.
//!
//! The built-in catalog can be replaced by a YAML file:
//!
//! ```yaml
//! styles:
//!   - key: noir
//!     label: "🎞 Film noir"
//!     prompt: "black-and-white film noir portrait, hard key light"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StyleCatalogError;

/// A selectable style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    /// Stable identifier carried in button callbacks.
    pub key: String,
    /// Button label shown to the user.
    pub label: String,
    /// Style description embedded in the generation prompt.
    pub prompt: String,
}

impl Style {
    fn new(key: &str, label: &str, prompt: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    styles: Vec<Style>,
}

/// Ordered, validated set of styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleCatalog {
    styles: Vec<Style>,
}

impl StyleCatalog {
    /// Builds a catalog, rejecting empty lists, blank or spaced keys, and duplicates.
    pub fn new(styles: Vec<Style>) -> Result<Self, StyleCatalogError> {
        if styles.is_empty() {
            return Err(StyleCatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for style in &styles {
            if style.key.is_empty() || style.key.chars().any(char::is_whitespace) {
                return Err(StyleCatalogError::InvalidKey(style.key.clone()));
            }
            if !seen.insert(style.key.as_str()) {
                return Err(StyleCatalogError::DuplicateKey(style.key.clone()));
            }
        }
        Ok(Self { styles })
    }

    /// The catalog shipped with the bot.
    pub fn builtin() -> Self {
        Self {
            styles: vec![
                Style::new(
                    "cinematic",
                    "🎬 Cinematic",
                    "cinematic film still, dramatic rim light, shallow depth of field, teal and orange grade",
                ),
                Style::new(
                    "business",
                    "💼 Business portrait",
                    "professional corporate headshot, neutral studio backdrop, soft key light, sharp suit",
                ),
                Style::new(
                    "anime",
                    "🌸 Anime",
                    "high quality anime illustration, clean line art, vibrant cel shading",
                ),
                Style::new(
                    "oil",
                    "🖼 Oil painting",
                    "classical oil painting on canvas, visible brush strokes, Rembrandt lighting",
                ),
                Style::new(
                    "cyberpunk",
                    "🌃 Cyberpunk",
                    "neon-lit cyberpunk city at night, rain reflections, magenta and cyan glow",
                ),
                Style::new(
                    "vintage",
                    "📷 Vintage film",
                    "1970s analog film photo, warm faded colors, natural grain",
                ),
            ],
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, StyleCatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.styles)
    }

    pub fn load(path: &Path) -> Result<Self, StyleCatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| StyleCatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn get(&self, key: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_catalog_is_valid() {
        let builtin = StyleCatalog::builtin();
        let rebuilt = StyleCatalog::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt, builtin);
        assert!(builtin.get("anime").is_some());
        assert!(builtin.get("watercolor").is_none());
    }

    #[test]
    fn parses_yaml_in_order() {
        let catalog = StyleCatalog::from_yaml_str(
            r#"
styles:
  - key: noir
    label: "Film noir"
    prompt: "black-and-white film noir portrait"
  - key: pop
    label: "Pop art"
    prompt: "bold pop art print"
"#,
        )
        .unwrap();
        let keys: Vec<&str> = catalog.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["noir", "pop"]);
        assert_eq!(catalog.get("pop").unwrap().label, "Pop art");
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = StyleCatalog::from_yaml_str("styles: []").unwrap_err();
        assert!(matches!(err, StyleCatalogError::Empty));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = StyleCatalog::new(vec![
            Style::new("a", "A", "a"),
            Style::new("a", "A again", "a"),
        ])
        .unwrap_err();
        assert!(matches!(err, StyleCatalogError::DuplicateKey(k) if k == "a"));
    }

    #[test]
    fn rejects_keys_with_whitespace() {
        let err = StyleCatalog::new(vec![Style::new("film noir", "Noir", "noir")]).unwrap_err();
        assert!(matches!(err, StyleCatalogError::InvalidKey(_)));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = StyleCatalog::from_yaml_str("styles: [key: 1").unwrap_err();
        assert!(matches!(err, StyleCatalogError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "styles:\n  - key: sketch\n    label: Sketch\n    prompt: pencil sketch"
        )
        .unwrap();

        let catalog = StyleCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("sketch").unwrap().prompt, "pencil sketch");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = StyleCatalog::load(&dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, StyleCatalogError::Read { .. }));
    }
}
