// ============================================================
// Layer 6 — Profile Store
// ============================================================
// Loads and saves TemplateProfile as pretty-printed JSON.
//
// A profile file only needs the fields that differ from the
// stock template; everything else falls back to the defaults:
//
//   {
//     "office_placeholder": "越秀办事处",
//     "markers": { "start": { "all_of": ["批复如下："] } }
//   }

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::engine::profile::TemplateProfile;

pub struct ProfileStore;

impl ProfileStore {
    /// Read a profile from JSON.
    pub fn load(path: &Path) -> Result<TemplateProfile> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read profile '{}'", path.display()))?;

        let profile = serde_json::from_str(&json)
            .with_context(|| format!("Invalid profile JSON in '{}'", path.display()))?;

        tracing::info!("Loaded template profile from '{}'", path.display());
        Ok(profile)
    }

    /// The profile at `path`, or the built-in default when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<TemplateProfile> {
        match path {
            Some(p) => Self::load(p),
            None    => Ok(TemplateProfile::default()),
        }
    }

    /// Write a profile as JSON, creating parent directories as needed.
    pub fn save(profile: &TemplateProfile, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(profile)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write profile to '{}'", path.display()))?;

        tracing::debug!("Saved template profile to '{}'", path.display());
        Ok(())
    }
}
