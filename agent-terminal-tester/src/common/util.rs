use agent_terminal_game::{Coordinate, TerminalConfig};
use anyhow::{Context, Result, anyhow, ensure};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn position_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*$").ok())
        .as_ref()
}

/// Parse `--position` as `lat,lon` in decimal degrees.
pub fn parse_position(text: &str) -> Result<Coordinate> {
    let caps = position_pattern()
        .and_then(|re| re.captures(text))
        .ok_or_else(|| anyhow!("position must look like `lat,lon` (got {text:?})"))?;
    let latitude: f64 = caps[1].parse().context("latitude")?;
    let longitude: f64 = caps[2].parse().context("longitude")?;
    let position = Coordinate::new(latitude, longitude);
    ensure!(
        position.is_valid(),
        "position {latitude},{longitude} is off the globe"
    );
    Ok(position)
}

/// Load `--config` if given, otherwise the configuration shipped with the core.
pub fn load_config(path: Option<&Path>) -> Result<TerminalConfig> {
    let Some(path) = path else {
        return Ok(TerminalConfig::load_from_static());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    TerminalConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}
