use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::types::{Character, Route, Stop};

/// Everything authored for one museum: the guides and the route.
#[derive(Debug, Clone)]
pub struct Content {
    pub characters: Vec<Character>,
    pub route: Route,
}

impl Content {
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }
}

#[derive(Deserialize)]
struct CharacterFile {
    #[serde(rename = "character", default)]
    characters: Vec<Character>,
}

pub fn load_stop(path: &Path) -> Result<Stop> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading stop {}", path.display()))?;
    let stop: Stop =
        toml::from_str(&content).with_context(|| format!("parsing stop {}", path.display()))?;
    Ok(stop)
}

pub fn load_route(stops_dir: &Path) -> Result<Route> {
    let dir = stops_dir
        .to_str()
        .ok_or_else(|| anyhow!("stops directory {} is not valid UTF-8", stops_dir.display()))?;
    let pattern = format!("{}/stop_*.toml", glob::Pattern::escape(dir));
    let mut paths: Vec<_> = glob::glob(&pattern)?.filter_map(|p| p.ok()).collect();

    // Sort by filename so stop_01, stop_02, stop_03 are in order
    paths.sort();

    let mut stops = Vec::with_capacity(paths.len());
    for path in paths {
        stops.push(load_stop(&path)?);
    }

    let route = Route::new(stops).with_context(|| format!("validating {}", stops_dir.display()))?;
    Ok(route)
}

pub fn load_characters(path: &Path) -> Result<Vec<Character>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading characters {}", path.display()))?;
    let file: CharacterFile = toml::from_str(&content)
        .with_context(|| format!("parsing characters {}", path.display()))?;
    Ok(file.characters)
}

/// Loads `characters.toml` and every `stops/stop_*.toml` under `content_dir`.
pub fn load_content(content_dir: &Path) -> Result<Content> {
    let characters = load_characters(&content_dir.join("characters.toml"))?;
    let route = load_route(&content_dir.join("stops"))?;
    tracing::debug!(
        stops = route.len(),
        characters = characters.len(),
        "loaded content from {}",
        content_dir.display()
    );
    Ok(Content { characters, route })
}
