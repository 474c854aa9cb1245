//! `groundwire init-index`: Probe the encoder and ready the index.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    println!("Preparing index '{}'...", config.vector_store.index_name);
    let retrieval = groundwire_agent::prepare_retrieval(&config).await?;

    println!("   Store:      {}", retrieval.store.name());
    println!("   Encoder:    {} ({})", config.encoder.model, config.encoder.backend);
    println!("   Dimension:  {}", retrieval.index.dims);
    println!("   Metric:     {}", retrieval.index.metric.as_str());
    println!("   Index ready.");

    Ok(())
}
