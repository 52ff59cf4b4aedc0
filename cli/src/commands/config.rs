//! `sca config`

use crate::config::{self, ScaConfig};
use anyhow::{Context, Result};

pub fn show() -> Result<()> {
    let path = config::get_config_path()?;
    let cfg = config::load_config().context("Failed to load config")?;

    println!("# {}", path.display());
    if cfg == ScaConfig::default() {
        println!("# (defaults)");
    }
    print!(
        "{}",
        toml::to_string_pretty(&cfg).context("Failed to serialize config")?
    );
    Ok(())
}

pub fn path() -> Result<()> {
    println!("{}", config::get_config_path()?.display());
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = config::init_config(force).context("Failed to initialize config")?;
    println!("Created {}", path.display());
    Ok(())
}
