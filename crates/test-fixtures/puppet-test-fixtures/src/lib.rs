use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    models: HashMap<String, String>,
    settings: HashMap<String, SettingsEntry>,
}

/// Side-car settings for one model; either file may be absent.
#[derive(Debug, Deserialize)]
struct SettingsEntry {
    #[serde(default)]
    render: Option<String>,
    #[serde(default)]
    parts: Option<String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod models {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.models.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.models, "model", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.models, "model", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.models, "model", name)?;
        Ok(resolve_path(rel))
    }
}

pub mod settings {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.settings.keys().cloned().collect()
    }

    pub fn render_json(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.settings, "settings", name)?;
        match &entry.render {
            Some(rel) => read_to_string(rel).map(Some),
            None => Ok(None),
        }
    }

    pub fn parts_json(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.settings, "settings", name)?;
        match &entry.parts {
            Some(rel) => read_to_string(rel).map(Some),
            None => Ok(None),
        }
    }

    pub fn render_path(name: &str) -> Result<Option<PathBuf>> {
        let entry = lookup(&MANIFEST.settings, "settings", name)?;
        Ok(entry.render.as_deref().map(resolve_path))
    }

    pub fn parts_path(name: &str) -> Result<Option<PathBuf>> {
        let entry = lookup(&MANIFEST.settings, "settings", name)?;
        Ok(entry.parts.as_deref().map(resolve_path))
    }
}
