//! `groundwire chat`: Interactive chat.
//!
//! The REPL is the caller: it keeps the exchanges and hands the whole
//! history to the pipeline on every turn.

use std::io::Write;
use std::path::Path;

use groundwire_core::message::Exchange;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let pipeline = groundwire_agent::bootstrap(&config).await?;

    println!();
    println!("  Groundwire — Interactive Mode");
    println!();
    println!("  Provider:  {}", config.generation.provider);
    println!("  Model:     {}", config.generation.model);
    println!("  Index:     {} (top {})", pipeline.index(), config.assembly.top_k);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/reset' to start over, 'exit' or Ctrl+D to quit.");
    println!();

    let mut history: Vec<Exchange> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();

        match query {
            "" => {}
            "exit" | "quit" => break,
            "/reset" => {
                history.clear();
                println!("  (history cleared)");
                println!();
            }
            _ => {
                eprint!("  ...");
                match pipeline.generate(query, &history).await {
                    Ok(response) => {
                        eprint!("\r     \r");
                        println!();
                        for line in response.lines() {
                            println!("  Assistant > {line}");
                        }
                        println!();
                        history.push(Exchange::new(query, response));
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [{}] {e}", e.kind());
                        println!();
                    }
                }
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
