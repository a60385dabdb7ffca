use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::simulation::{Gains, DEFAULT_PADDING};

pub const PREFS_PATH: &str = "./preferences.json";

fn radius_default() -> f64 {
    5.0
}

fn padding_default() -> f64 {
    DEFAULT_PADDING
}

fn steps_per_round_default() -> usize {
    500
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Preferences {
    #[serde(default = "radius_default")]
    pub radius: f64,
    #[serde(default = "padding_default")]
    pub padding: f64,
    /// Solver iterations between reports.
    #[serde(default = "steps_per_round_default")]
    pub steps_per_round: usize,
    #[serde(default)]
    pub gains: Gains,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            radius: radius_default(),
            padding: padding_default(),
            steps_per_round: steps_per_round_default(),
            gains: Gains::default(),
        }
    }
}

impl Preferences {
    pub fn save(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reads preferences from `path`, or the defaults if there is no such file.
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Default::default());
        }
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sphere_coloring_{}_{name}", std::process::id()))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let prefs = Preferences::load(scratch("missing.json")).unwrap();
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.steps_per_round, 500);
        assert_eq!(prefs.padding, 1e-4);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"radius": 7.5, "gains": {"close": 0.1}}"#).unwrap();
        assert_eq!(prefs.radius, 7.5);
        assert_eq!(prefs.padding, DEFAULT_PADDING);
        assert_eq!(prefs.gains.close, 0.1);
        assert_eq!(prefs.gains.far, Gains::default().far);
    }

    #[test]
    fn save_then_load() {
        let path = scratch("saved.json");
        let prefs = Preferences {
            radius: 3.0,
            steps_per_round: 20,
            ..Default::default()
        };
        prefs.save(&path).unwrap();
        assert_eq!(Preferences::load(&path).unwrap(), prefs);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = scratch("malformed.json");
        std::fs::write(&path, "{ radius: ").unwrap();
        assert!(Preferences::load(&path).is_err());
        std::fs::remove_file(path).unwrap();
    }
}
