use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use finport_core::time::{parse_time_of_day, parse_time_zone};
use finport_core::DecodeOptions;

use crate::state::ensure_finport_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub decode: DecodeSection,
    pub detect: DetectSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeSection {
    /// IANA zone applied to bare statement dates
    pub time_zone: String,
    /// `HH:MM` local time applied to bare statement dates
    pub def_time_of_day: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectSection {
    /// How much of a file `detect` reads
    pub prefix_bytes: usize,
}

impl Default for DecodeSection {
    fn default() -> Self {
        Self {
            time_zone: "America/New_York".to_string(),
            def_time_of_day: None,
        }
    }
}

impl Default for DetectSection {
    fn default() -> Self {
        Self { prefix_bytes: 4096 }
    }
}

impl Config {
    /// Decode options from config, validated.
    pub fn decode_options(&self) -> Result<DecodeOptions> {
        let tz = parse_time_zone(&self.decode.time_zone).context("config decode.time_zone")?;
        let mut opts = DecodeOptions::default().with_time_zone(tz);
        if let Some(tod) = &self.decode.def_time_of_day {
            parse_time_of_day(tod).context("config decode.def_time_of_day")?;
            opts = opts.with_time_of_day(tod.clone());
        }
        Ok(opts)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_finport_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.detect.prefix_bytes, 4096);
    }

    #[test]
    fn test_roundtrip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.decode.time_zone = "America/Denver".to_string();
        cfg.decode.def_time_of_day = Some("13:00".to_string());
        save_config_to(&p, &cfg).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);

        fs::write(&p, "[detect]\nprefix_bytes = 512\n").unwrap();
        let partial = load_config_from(&p).unwrap();
        assert_eq!(partial.detect.prefix_bytes, 512);
        assert_eq!(partial.decode.time_zone, "America/New_York");
    }

    #[test]
    fn test_decode_options() {
        let mut cfg = Config::default();
        cfg.decode.time_zone = "America/Denver".to_string();
        cfg.decode.def_time_of_day = Some("13:00".to_string());
        let opts = cfg.decode_options().unwrap();
        assert_eq!(opts.time_zone.name(), "America/Denver");
        assert_eq!(opts.def_time_of_day.as_deref(), Some("13:00"));

        cfg.decode.time_zone = "Nowhere/Special".to_string();
        assert!(cfg.decode_options().is_err());
    }

    #[test]
    fn test_bad_time_of_day() {
        let mut cfg = Config::default();
        cfg.decode.def_time_of_day = Some("noon".to_string());
        assert!(cfg.decode_options().is_err());
    }
}
