//! `groundwire config`: Print the effective configuration.

use std::path::Path;

use groundwire_config::AppConfig;

const REDACTED: &str = "[REDACTED]";

pub fn run(config_path: Option<&Path>, default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if default {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = super::load_config(config_path)?;
    print!("{}", render_redacted(&config)?);
    Ok(())
}

/// TOML of `config` with every credential replaced.
fn render_redacted(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    for key in [
        &mut shown.generation.api_key,
        &mut shown.encoder.api_key,
        &mut shown.vector_store.api_key,
    ] {
        if key.is_some() {
            *key = Some(REDACTED.into());
        }
    }
    toml::to_string_pretty(&shown)
}
