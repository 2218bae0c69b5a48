//! Provenance frontmatter embedded in installed artifacts.
//!
//! Installed markdown artifacts carry a `__dotkit` mapping inside a
//! `---`-delimited YAML block at the top of the file:
//!
//! ```text
//! ---
//! __dotkit:
//!   kit_id: demo
//!   kit_version: 1.0.0
//!   artifact_type: agent
//!   artifact_path: agents/a.md
//! ---
//! # Original content
//! ```
//!
//! When the source already has a frontmatter block the mapping is inserted as
//! its first entry and the author's own lines are left untouched, so
//! `strip(inject(x)) == x`.

use dotkit_types::{ArtifactType, KitId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// Mapping key holding dotkit provenance inside the frontmatter block.
pub const MARKER_KEY: &str = "__dotkit";

const FENCE: &str = "---";

/// Provenance metadata embedded in an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFrontmatter {
    /// Kit the artifact was installed from
    pub kit_id: KitId,
    /// Kit version at install time
    #[serde(deserialize_with = "crate::manifest::version_string")]
    pub kit_version: String,
    /// Artifact type
    pub artifact_type: ArtifactType,
    /// Installed path relative to the managed root
    pub artifact_path: String,
    /// Free-form tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArtifactFrontmatter {
    /// Create frontmatter for a freshly installed artifact.
    pub fn new(
        kit_id: KitId,
        kit_version: impl Into<String>,
        artifact_type: ArtifactType,
        artifact_path: impl Into<String>,
    ) -> Self {
        Self {
            kit_id,
            kit_version: kit_version.into(),
            artifact_type,
            artifact_path: artifact_path.into(),
            tags: None,
            description: None,
        }
    }
}

struct Block {
    yaml: Range<usize>,
    end: usize,
}

/// Locate a leading `---` ... `---` block.
fn locate(content: &str) -> Option<Block> {
    let first_newline = content.find('\n')?;
    if content[..first_newline].trim_end_matches('\r') != FENCE {
        return None;
    }

    let yaml_start = first_newline + 1;
    let mut pos = yaml_start;

    loop {
        let line_end = content[pos..].find('\n').map(|i| pos + i);
        let line = &content[pos..line_end.unwrap_or(content.len())];

        if line.trim_end_matches('\r') == FENCE {
            return Some(Block {
                yaml: yaml_start..pos,
                end: line_end.map(|e| e + 1).unwrap_or(content.len()),
            });
        }

        match line_end {
            Some(e) => pos = e + 1,
            None => return None,
        }
    }
}

/// Parse embedded provenance, if any.
///
/// Returns `None` for files without a frontmatter block, without the marker
/// key, or with a marker that doesn't deserialize.
pub fn parse(content: &str) -> Option<ArtifactFrontmatter> {
    let block = locate(content)?;
    let yaml = &content[block.yaml];

    let value: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        Err(e) => {
            debug!("Ignoring unparseable frontmatter: {}", e);
            return None;
        }
    };

    let marker = value.get(MARKER_KEY)?.clone();
    match serde_yaml::from_value(marker) {
        Ok(frontmatter) => Some(frontmatter),
        Err(e) => {
            debug!("Ignoring malformed {} block: {}", MARKER_KEY, e);
            None
        }
    }
}

/// Remove embedded provenance, returning the content as authored.
pub fn strip(content: &str) -> String {
    let block = match locate(content) {
        Some(block) => block,
        None => return content.to_string(),
    };

    let marker_line = format!("{}:", MARKER_KEY);
    let mut kept = String::new();
    let mut removed = false;
    let mut in_marker = false;

    for line in content[block.yaml.clone()].split_inclusive('\n') {
        if in_marker {
            if line.starts_with(' ') || line.starts_with('\t') {
                continue;
            }
            in_marker = false;
        }
        if !removed && line.trim_end() == marker_line {
            in_marker = true;
            removed = true;
            continue;
        }
        kept.push_str(line);
    }

    if !removed {
        return content.to_string();
    }

    if kept.is_empty() {
        content[block.end..].to_string()
    } else {
        format!(
            "{}{}{}",
            &content[..block.yaml.start],
            kept,
            &content[block.yaml.end..]
        )
    }
}

/// Embed provenance, replacing any previous dotkit block.
pub fn inject(content: &str, frontmatter: &ArtifactFrontmatter) -> Result<String> {
    let base = strip(content);

    let mut wrapper = BTreeMap::new();
    wrapper.insert(MARKER_KEY, frontmatter);
    let rendered = serde_yaml::to_string(&wrapper)?;

    Ok(match locate(&base) {
        Some(block) => format!(
            "{}{}{}",
            &base[..block.yaml.start],
            rendered,
            &base[block.yaml.start..]
        ),
        None => format!("{}\n{}{}\n{}", FENCE, rendered, FENCE, base),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn demo() -> ArtifactFrontmatter {
        ArtifactFrontmatter::new(
            KitId::new("demo").unwrap(),
            "1.0.0",
            ArtifactType::Agent,
            "agents/a.md",
        )
    }

    #[test]
    fn test_inject_prepends_block_to_plain_content() {
        let injected = inject("# Agent A\n\nDoes things.\n", &demo()).unwrap();

        assert!(injected.starts_with("---\n__dotkit:\n"));
        assert!(injected.ends_with("---\n# Agent A\n\nDoes things.\n"));
        assert_eq!(parse(&injected), Some(demo()));
    }

    #[test]
    fn test_inject_merges_into_existing_frontmatter() {
        let source = "---\nname: reviewer\ndescription: Reviews code\n---\nBody\n";
        let injected = inject(source, &demo()).unwrap();

        assert!(injected.starts_with("---\n__dotkit:\n"));
        assert!(injected.contains("name: reviewer\ndescription: Reviews code\n---\nBody\n"));
        assert_eq!(parse(&injected), Some(demo()));

        let value: serde_yaml::Value =
            serde_yaml::from_str(&injected[4..injected.find("\n---\n").unwrap()]).unwrap();
        assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("reviewer"));
    }

    #[test]
    fn test_reinject_replaces_previous_block() {
        let first = inject("Body\n", &demo()).unwrap();
        let mut newer = demo();
        newer.kit_version = "2.0.0".to_string();

        let second = inject(&first, &newer).unwrap();
        assert_eq!(second.matches(MARKER_KEY).count(), 1);
        assert_eq!(parse(&second).unwrap().kit_version, "2.0.0");
    }

    #[test]
    fn test_parse_ignores_foreign_frontmatter() {
        assert_eq!(parse("---\nname: x\n---\nBody"), None);
        assert_eq!(parse("no frontmatter"), None);
        assert_eq!(parse("---\n__dotkit: nonsense\n---\n"), None);
        assert_eq!(parse("---\nunterminated: true\n"), None);
    }

    #[test]
    fn test_strip_leaves_unmarked_content_alone() {
        let source = "---\ntitle: t\n---\nBody\n";
        assert_eq!(strip(source), source);
    }

    proptest! {
        #[test]
        fn prop_strip_inverts_inject_plain(body in "[a-zA-Z0-9 #\n]{0,200}") {
            prop_assume!(!body.starts_with("---"));
            let injected = inject(&body, &demo()).unwrap();
            prop_assert_eq!(strip(&injected), body);
        }

        #[test]
        fn prop_strip_inverts_inject_with_frontmatter(
            key in "[a-z]{1,10}",
            value in "[a-z0-9]{1,10}",
            body in "[a-zA-Z0-9 \n]{0,100}",
        ) {
            let source = format!("---\n{}: {}\n---\n{}", key, value, body);
            let injected = inject(&source, &demo()).unwrap();
            prop_assert_eq!(strip(&injected), source);
        }
    }
}
