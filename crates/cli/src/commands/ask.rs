//! `groundwire ask`: Answer one question with no history.

use std::path::Path;

pub async fn run(config_path: Option<&Path>, message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let pipeline = groundwire_agent::bootstrap(&config).await?;

    eprint!("  Thinking...");
    let response = pipeline.generate(&message, &[]).await;
    eprint!("\r              \r");

    println!("{}", response?);
    Ok(())
}
