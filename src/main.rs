use clap::{Parser, Subcommand};
use sanctions_pipeline::common::constants::{
    DEFAULT_CREDENTIALS_FILE, DEFAULT_KEYWORDS, MAX_CONTRACT_KEYS,
};
use sanctions_pipeline::config::Config;
use sanctions_pipeline::logging;
use sanctions_pipeline::pipeline::{RunContext, Runner, Stage};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sanctions_pipeline")]
#[command(about = "Maps sanctioned Russian entities to their top public-contract suppliers")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct KeyArgs {
    /// Sanctions API key (prompted for when omitted)
    #[arg(long)]
    sanctions_key: Option<String>,

    /// Contracts API key, repeatable up to 3 times (prompted for when omitted)
    #[arg(long = "contracts-key")]
    contracts_keys: Vec<String>,

    /// Search keyword, repeatable; added to the military preset unless
    /// --custom-keywords is set
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    /// Use only the provided --keyword values, skipping the preset
    #[arg(long)]
    custom_keywords: bool,

    /// Path to the translation service credentials file
    #[arg(long)]
    credentials: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full six-stage pipeline
    Run {
        #[command(flatten)]
        keys: KeyArgs,
    },
    /// Re-run the pipeline starting from a later stage, reusing the
    /// output files already in the output directory
    Resume {
        /// First stage to run
        #[arg(long, value_enum)]
        from: Stage,

        #[command(flatten)]
        keys: KeyArgs,
    },
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn gather_sanctions_key(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(key) = flag.filter(|k| !k.trim().is_empty()) {
        return Ok(key.trim().to_string());
    }
    if let Ok(key) = std::env::var("SANCTIONS_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }
    loop {
        let key = prompt("Please enter your sanctions API key: ")?;
        if !key.is_empty() {
            return Ok(key);
        }
        println!("A key is required.");
    }
}

fn gather_contract_keys(flags: Vec<String>) -> anyhow::Result<Vec<String>> {
    let mut keys: Vec<String> = flags
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        if let Ok(env_keys) = std::env::var("CLEARSPENDING_API_KEYS") {
            keys = env_keys
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
    }
    if keys.is_empty() {
        println!("Enter up to {MAX_CONTRACT_KEYS} contracts API keys (press Enter to skip any):");
        for i in 0..MAX_CONTRACT_KEYS {
            let key = prompt(&format!("Contracts API key #{}: ", i + 1))?;
            if key.is_empty() {
                break;
            }
            keys.push(key);
        }
    }
    keys.truncate(MAX_CONTRACT_KEYS);
    Ok(keys)
}

fn military_preset() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|kw| kw.to_string()).collect()
}

fn gather_keywords(extra: Vec<String>, custom_only: bool) -> anyhow::Result<Vec<String>> {
    if custom_only {
        if extra.is_empty() {
            anyhow::bail!("--custom-keywords requires at least one --keyword");
        }
        return Ok(extra);
    }
    if !extra.is_empty() {
        let mut keywords = military_preset();
        keywords.extend(extra);
        return Ok(keywords);
    }

    println!("\nChoose your keyword preset:");
    println!("1. Military preset (default military-related keywords)");
    println!("2. Custom preset (define your own keyword list)");
    loop {
        let choice = prompt("Enter 1 for the military preset or 2 for a custom preset: ")?;
        match choice.as_str() {
            "1" => {
                println!("\nYou selected the military preset.");
                let mut keywords = military_preset();
                loop {
                    let keyword = prompt("Enter an additional keyword (or press Enter to finish): ")?;
                    if keyword.is_empty() {
                        break;
                    }
                    keywords.push(keyword);
                }
                return Ok(keywords);
            }
            "2" => {
                println!("\nYou selected the custom preset.");
                let mut keywords = Vec::new();
                loop {
                    let keyword = prompt("Enter a custom keyword (or press Enter to finish): ")?;
                    if keyword.is_empty() {
                        break;
                    }
                    keywords.push(keyword);
                }
                return Ok(keywords);
            }
            _ => println!("Invalid choice. Please enter 1 or 2."),
        }
    }
}

fn credentials_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("TRANSLATE_CREDENTIALS").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE))
}

/// Gather only the credentials the stages from `first` onward will use.
fn build_context(first: Stage, keys: KeyArgs, config: Config) -> anyhow::Result<RunContext> {
    let sanctions_key = if first <= Stage::Fetch {
        Some(gather_sanctions_key(keys.sanctions_key)?)
    } else {
        None
    };
    let keywords = if first <= Stage::Fetch {
        gather_keywords(keys.keywords, keys.custom_keywords)?
    } else {
        Vec::new()
    };
    let contract_keys = if first <= Stage::Enrich {
        gather_contract_keys(keys.contracts_keys)?
    } else {
        Vec::new()
    };

    Ok(RunContext {
        sanctions_key,
        contract_keys,
        keywords,
        credentials_path: credentials_path(keys.credentials),
        config,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    let (first, keys) = match cli.command {
        Commands::Run { keys } => (Stage::Fetch, keys),
        Commands::Resume { from, keys } => (from, keys),
    };

    let ctx = build_context(first, keys, config)?;
    Runner::new(ctx).run_from(first).await?;
    Ok(())
}
