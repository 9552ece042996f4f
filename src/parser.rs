use crate::error::{RabError, RabResult};
use crate::types::Report;
use std::path::Path;

/// Load a report from a YAML or JSON file
///
/// Files ending in `.json` are read as JSON, everything else as YAML.
pub fn load_report(path: &Path) -> RabResult<Report> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RabError::Parse(format!("Failed to read '{}': {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        parse_report_yaml(&content)
    }
}

/// Parse a report from YAML text
pub fn parse_report_yaml(content: &str) -> RabResult<Report> {
    Ok(serde_yaml::from_str(content)?)
}
