use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::matcher::MatchPolicy;

const CONFIG_FILE: &str = "manual-finder";
const ENV_PREFIX: &str = "MANUALS";

/// Runtime settings. Layered: built-in defaults, then an optional
/// `manual-finder.toml`, then `MANUALS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the manual corpus, one subdirectory per brand.
    pub manuals_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub products_path: PathBuf,
    /// Where matched manuals are copied, keyed by brand.
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub pool_size: usize,
    pub chunk_size: usize,
    pub match_threshold: u8,
    pub candidate_limit: usize,
    /// Brand directories that are never scanned; their entries come from
    /// hand-made manifests instead.
    pub skip_brands: Vec<String>,
    pub extra_manifests: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            manuals_dir: PathBuf::from("data/manuals"),
            manifest_path: PathBuf::from("data/manifest.csv"),
            products_path: PathBuf::from("data/manualNames.csv"),
            output_dir: PathBuf::from("manuals"),
            log_dir: PathBuf::from("logs"),
            pool_size: 25,
            chunk_size: 200,
            match_threshold: 65,
            candidate_limit: 5,
            skip_brands: vec![
                "Modern Flames".into(),
                "Napoleon".into(),
                "True North".into(),
                "Timberwolf".into(),
            ],
            extra_manifests: vec![
                PathBuf::from("data/manifest_modernflames.csv"),
                PathBuf::from("data/manifest_napoleon.csv"),
                PathBuf::from("data/manifest_truenorth.csv"),
                PathBuf::from("data/manifest_timberwolf.csv"),
            ],
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("skip_brands")
                    .with_list_parse_key("extra_manifests"),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy {
            threshold: self.match_threshold,
            limit: self.candidate_limit.max(1),
        }
    }

    pub fn found_log(&self) -> PathBuf {
        self.log_dir.join("found_manuals.csv")
    }

    pub fn not_found_log(&self) -> PathBuf {
        self.log_dir.join("not_found_manuals.csv")
    }

    pub fn is_skipped(&self, brand: &str) -> bool {
        self.skip_brands.iter().any(|b| b == brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let s = Settings::default();
        assert_eq!(s.pool_size, 25);
        assert_eq!(s.match_threshold, 65);
        assert_eq!(s.candidate_limit, 5);
        assert!(s.is_skipped("Napoleon"));
        assert!(!s.is_skipped("Empire"));
    }

    #[test]
    fn result_logs_live_under_log_dir() {
        let s = Settings {
            log_dir: PathBuf::from("out/logs"),
            ..Settings::default()
        };
        assert_eq!(s.found_log(), PathBuf::from("out/logs/found_manuals.csv"));
        assert_eq!(s.not_found_log(), PathBuf::from("out/logs/not_found_manuals.csv"));
    }
}
