//! `groundwire doctor`: Diagnose configuration and service health.

use std::path::Path;

use groundwire_config::AppConfig;
use groundwire_providers::{ProbedEncoder, build_encoder, build_provider};
use groundwire_vector::PineconeStore;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Groundwire Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the config file before running other checks.");
            return Ok(());
        }
    };

    match config.require_credentials() {
        Ok(()) => println!("  ✅ Credentials present"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    issues += check_encoder(&config).await;
    issues += check_store(&config).await;
    issues += check_generation(&config).await;

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

async fn check_encoder(config: &AppConfig) -> u32 {
    let encoder = match build_encoder(&config.encoder) {
        Ok(e) => e,
        Err(e) => {
            println!("  ❌ Encoder: {e}");
            return 1;
        }
    };
    match ProbedEncoder::probe(encoder, &config.encoder.probe_text).await {
        Ok(probed) => {
            println!(
                "  ✅ Encoder reachable at {} ({} dims)",
                config.encoder.url,
                probed.dims()
            );
            0
        }
        Err(e) => {
            println!("  ❌ Encoder at {}: {e}", config.encoder.url);
            1
        }
    }
}

async fn check_store(config: &AppConfig) -> u32 {
    let vs = &config.vector_store;
    if vs.backend == "memory" {
        match &vs.seed_path {
            Some(path) if !path.exists() => {
                println!("  ❌ Seed file {} not found", path.display());
                1
            }
            Some(path) => {
                println!("  ✅ In-memory store, seeded from {}", path.display());
                0
            }
            None => {
                println!("  ⚠️  In-memory store with no seed file; retrieval will return nothing");
                0
            }
        }
    } else if vs.api_key.is_none() {
        println!("  ⏭️  Skipping vector store check (no credential)");
        0
    } else {
        let store = match PineconeStore::from_config(vs) {
            Ok(s) => s,
            Err(e) => {
                println!("  ❌ Vector store: {e}");
                return 1;
            }
        };
        match store.list_indexes().await {
            Ok(names) if names.contains(&vs.index_name) => {
                match store.describe_index_stats(&vs.index_name).await {
                    Ok(stats) => println!(
                        "  ✅ Index '{}' has {} vectors ({} dims)",
                        vs.index_name, stats.total_vector_count, stats.dimension
                    ),
                    Err(e) => println!("  ⚠️  Index '{}' exists but stats failed: {e}", vs.index_name),
                }
                0
            }
            Ok(_) => {
                println!(
                    "  ⚠️  Index '{}' does not exist yet — run `groundwire init-index`",
                    vs.index_name
                );
                1
            }
            Err(e) => {
                println!("  ❌ Vector store: {e}");
                1
            }
        }
    }
}

async fn check_generation(config: &AppConfig) -> u32 {
    let provider = match build_provider(&config.generation) {
        Ok(p) => p,
        Err(e) => {
            println!("  ❌ Generation provider: {e}");
            return 1;
        }
    };
    match provider.health_check().await {
        Ok(true) => {
            println!(
                "  ✅ {} reachable (model {})",
                provider.name(),
                config.generation.model
            );
            0
        }
        Ok(false) => {
            println!("  ❌ {} rejected the health check", provider.name());
            1
        }
        Err(e) => {
            println!("  ❌ {}: {e}", provider.name());
            1
        }
    }
}
