//! Script discovery - scan a directory and keep whatever loads
//!
//! A script that fails to parse is skipped with a warning and recorded;
//! one bad file never hides the rest of the set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::descriptor::{LoadError, ScriptDescriptor};

/// The set of scripts discovered in one directory scan.
pub struct ScriptLibrary {
    scripts: Vec<ScriptDescriptor>,
    failures: Vec<(PathBuf, LoadError)>,
}

impl ScriptLibrary {
    /// Load every `*.rhai` file in `dir`, sorted by display name.
    ///
    /// Only a missing/unreadable directory is an error; per-file problems
    /// end up in [`failures`](Self::failures).
    pub fn load_dir(dir: &Path) -> io::Result<Self> {
        let mut scripts = Vec::new();
        let mut failures = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("rhai") {
                continue;
            }
            let loaded = fs::read_to_string(&path)
                .map_err(LoadError::from)
                .and_then(|source| ScriptDescriptor::parse(&source));
            match loaded {
                Ok(script) => scripts.push(script),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping script");
                    failures.push((path, err));
                }
            }
        }

        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(
            count = scripts.len(),
            skipped = failures.len(),
            dir = %dir.display(),
            "loaded script library"
        );
        Ok(Self { scripts, failures })
    }

    pub fn scripts(&self) -> &[ScriptDescriptor] {
        &self.scripts
    }

    pub fn failures(&self) -> &[(PathBuf, LoadError)] {
        &self.failures
    }

    /// Look up a script by its display name.
    pub fn find(&self, name: &str) -> Option<&ScriptDescriptor> {
        self.scripts.iter().find(|s| s.name == name)
    }
}

/// Default location for user scripts: `~/.config/plume/scripts`.
pub fn default_scripts_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config").join("plume").join("scripts"))
}
