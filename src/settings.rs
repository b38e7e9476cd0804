//! User settings, stored as JSON

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use recolor_formula::ColorFormula;

use crate::error::Result;
use crate::landscape::FormulaSets;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Strip vertex colors instead of recoloring them
    pub remove_all_vertex_colors: bool,
    pub advanced: Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Advanced {
    /// Formulas for vertices covered by snow
    pub snow: ChannelSources,
    /// Formulas for everything else
    pub standard: ChannelSources,
}

impl Default for Advanced {
    fn default() -> Self {
        Self {
            snow: ChannelSources::power_curve("0.1"),
            standard: ChannelSources::power_curve("0.5"),
        }
    }
}

/// Formula source per channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSources {
    pub red: String,
    pub green: String,
    pub blue: String,
}

impl ChannelSources {
    /// `Pow(C/255.0,exponent)*255` on every channel
    fn power_curve(exponent: &str) -> Self {
        let curve = |c: char| format!("Pow({}/255.0,{})*255", c, exponent);
        Self { red: curve('R'), green: curve('G'), blue: curve('B') }
    }

    pub fn compile(&self) -> ColorFormula {
        ColorFormula::compile(&self.red, &self.green, &self.blue)
    }
}

impl Default for ChannelSources {
    fn default() -> Self {
        Self { red: "R".into(), green: "G".into(), blue: "B".into() }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// `<config dir>/landscape-recolor/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("landscape-recolor").join("settings.json"))
    }

    /// Load from `path`, else the default location when it exists, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                info!("Using settings from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn compile(&self) -> FormulaSets {
        FormulaSets {
            snow: self.advanced.snow.compile(),
            standard: self.advanced.standard.compile(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landscape::FormulaKind;

    #[test]
    fn test_default_formulas() {
        let settings = Settings::default();
        assert!(!settings.remove_all_vertex_colors);
        assert_eq!(settings.advanced.snow.red, "Pow(R/255.0,0.1)*255");
        assert_eq!(settings.advanced.standard.blue, "Pow(B/255.0,0.5)*255");

        let formulas = settings.compile();
        // 64/255 ^ 0.5 * 255 = 127.75
        assert_eq!(formulas.get(FormulaKind::Standard).apply([64, 0, 255]), [127, 0, 255]);
        assert_eq!(formulas.get(FormulaKind::Snow).apply([0, 255, 0]), [0, 255, 0]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "advanced": { "snow": { "green": "G / 2" } } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(!settings.remove_all_vertex_colors);
        assert_eq!(settings.advanced.snow.green, "G / 2");
        // Missing channels of a given set are identity
        assert_eq!(settings.advanced.snow.red, "R");
        // Missing sets keep the default curve
        assert_eq!(settings.advanced.standard, ChannelSources::power_curve("0.5"));
    }

    #[test]
    fn test_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_remove_all_flag() {
        let settings: Settings = serde_json::from_str(r#"{ "remove_all_vertex_colors": true }"#).unwrap();
        assert!(settings.remove_all_vertex_colors);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("landscape-recolor-missing-settings.json");
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_invalid_formula_falls_back_to_identity() {
        let mut settings = Settings::default();
        settings.advanced.standard.red = "R +* 2".into();
        let formulas = settings.compile();
        assert_eq!(formulas.standard.error_count(), 1);
        assert_eq!(formulas.standard.red.evaluate([77, 0, 0]), 77);
    }
}
