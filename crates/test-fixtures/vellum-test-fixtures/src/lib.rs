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
    assets: HashMap<String, AssetEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AssetEntry {
    Path(String),
    Located { path: String, locator: String },
}

impl AssetEntry {
    fn as_path(&self) -> &str {
        match self {
            AssetEntry::Path(path) => path,
            AssetEntry::Located { path, .. } => path,
        }
    }

    fn locator(&self) -> Option<&str> {
        match self {
            AssetEntry::Path(_) => None,
            AssetEntry::Located { locator, .. } => Some(locator),
        }
    }
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

fn lookup(name: &str) -> Result<&'static AssetEntry> {
    MANIFEST
        .assets
        .get(name)
        .ok_or_else(|| anyhow!("unknown asset fixture '{name}'"))
}

pub mod assets {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.assets.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(name)?.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        super::load_json(lookup(name)?.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(lookup(name)?.as_path()))
    }

    /// Locator other fixtures use to reference this asset, if it has one.
    pub fn locator(name: &str) -> Result<Option<String>> {
        Ok(lookup(name)?.locator().map(str::to_string))
    }

    /// `(locator, json)` for every fixture that can be referenced.
    pub fn located() -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for name in keys() {
            let entry = lookup(&name)?;
            if let Some(locator) = entry.locator() {
                out.push((locator.to_string(), read_to_string(entry.as_path())?));
            }
        }
        Ok(out)
    }
}
