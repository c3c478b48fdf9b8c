//! Script descriptors - the parsed metadata block plus the raw body
//!
//! Metadata lives in the first `/** ... */` comment in the file:
//!
//! ```text
//! /**
//!     {
//!         "name": "Uppercase",
//!         "description": "Convert the text to upper case",
//!         "author": "someone",
//!         "tags": "text,case",
//!         "icon": "type",
//!         "api": 1
//!     }
//! **/
//! ```
//!
//! Interior lines are stripped of `*` framing and whitespace, then parsed
//! as a flat JSON object. Missing keys fall back to defaults; unknown keys
//! are ignored. The `api` marker is accepted but not interpreted.

use std::io;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Why a script file could not be turned into a descriptor.
///
/// A failing script is excluded from the available set; it never aborts
/// the host.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("script metadata block not found")]
    MetadataMissing,
    #[error("invalid script metadata: {0}")]
    MetadataInvalid(#[from] serde_json::Error),
    #[error("failed to read script: {0}")]
    Io(#[from] io::Error),
}

/// The metadata block as written. Unknown keys (including the `api`
/// version marker) are ignored; missing keys default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    name: Option<String>,
    description: String,
    author: String,
    tags: String,
    icon: String,
}

/// Parsed, cached metadata and body for one script.
///
/// Created once at discovery time and reused read-only across any number
/// of invocations.
#[derive(Debug, Clone)]
pub struct ScriptDescriptor {
    pub name: String,
    pub description: String,
    pub author: String,
    pub tags: Vec<String>,
    pub icon: String,
    /// The full original source, metadata block included. The block is an
    /// inert rhai comment, so the body is executed as-is.
    pub body: String,
}

impl ScriptDescriptor {
    /// Parse a script source into a descriptor.
    ///
    /// Pure parse, no file I/O. Fails with [`LoadError::MetadataMissing`]
    /// when the source has no `/** ... */` block and
    /// [`LoadError::MetadataInvalid`] when the block is not a JSON object.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let block = metadata_block(source).ok_or(LoadError::MetadataMissing)?;

        let cleaned: Vec<&str> = block
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim())
            .collect();
        let meta: RawMetadata = serde_json::from_str(&cleaned.join("\n"))?;

        let tags = meta
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let descriptor = Self {
            name: meta.name.unwrap_or_else(|| "Unnamed".to_string()),
            description: meta.description,
            author: meta.author,
            tags,
            icon: meta.icon,
            body: source.to_string(),
        };
        debug!(name = %descriptor.name, "parsed script descriptor");
        Ok(descriptor)
    }
}

/// Text between the first `/**` and the `*/` that follows it, exclusive.
fn metadata_block(source: &str) -> Option<&str> {
    let start = source.find("/**")? + 3;
    let len = source[start..].find("*/")?;
    Some(&source[start..start + len])
}
