use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$FINPORT_HOME`, else `$HOME/.finport`.
pub fn finport_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINPORT_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finport"))
}

pub fn ensure_finport_home() -> Result<PathBuf> {
    let dir = finport_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
