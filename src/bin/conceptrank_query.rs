

use std::env;
use std::path::PathBuf;

use conceptrank::{RankerConfig, RelevanceRanker};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("conceptrank=info".parse()?))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut limit: Option<usize> = None;
    let mut threshold: Option<f64> = None;
    let mut tag: Option<String> = None;
    let mut no_prerequisites = false;
    let mut words: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--limit" | "-n" => {
                if i + 1 < args.len() {
                    limit = Some(args[i + 1].parse()?);
                    i += 1;
                }
            }
            "--threshold" | "-t" => {
                if i + 1 < args.len() {
                    threshold = Some(args[i + 1].parse()?);
                    i += 1;
                }
            }
            "--tag" => {
                if i + 1 < args.len() {
                    tag = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--no-prerequisites" => no_prerequisites = true,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => words.push(other.to_string()),
        }
        i += 1;
    }

    let text = words.join(" ");
    if text.trim().is_empty() {
        print_help();
        std::process::exit(2);
    }

    let config = RankerConfig::load(config_path.as_deref())?;
    let ranker = RelevanceRanker::from_config(&config)?;

    let mut options = config.default_options();
    if let Some(limit) = limit {
        options = options.with_limit(limit);
    }
    if let Some(threshold) = threshold {
        options = options.with_threshold(threshold);
    }
    if let Some(tag) = tag {
        options = options.with_tag(tag);
    }
    if no_prerequisites {
        options = options.without_prerequisites();
    }

    let matches = ranker.find_relevant_concepts(&text, &options).await?;
    println!("{}", serde_json::to_string_pretty(&matches)?);

    Ok(())
}

fn print_help() {
    println!("conceptrank-query - rank curriculum concepts for a piece of text");
    println!();
    println!("USAGE:");
    println!("    conceptrank-query [OPTIONS] <TEXT>...");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>       Config file (TOML/YAML/JSON); CONCEPTRANK_* env vars override it");
    println!("    -n, --limit <N>           Maximum concepts to return [default: 5]");
    println!("    -t, --threshold <SCORE>   Minimum semantic similarity in [0, 1] [default: 0.3]");
    println!("        --tag <TAG>           Only consider concepts carrying this tag");
    println!("        --no-prerequisites    Skip prerequisite expansion");
    println!("    -h, --help                Print this help");
}
