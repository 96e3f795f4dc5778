use clap::{Parser, Subcommand};
use relgen::{EnumCatalog, GenerateOptions, Generation};
use std::path::PathBuf;
use std::process;

/// relgen CLI — derive schema statements and preload plans from a model
/// definition file
#[derive(Parser)]
#[command(name = "relgen", version, about)]
struct Cli {
    /// Path to the model definition YAML file
    #[arg(long, default_value = "models.yaml")]
    models: PathBuf,

    /// Optional enum catalog YAML file
    #[arg(long)]
    enums: Option<PathBuf>,

    /// Maximum preload traversal depth
    #[arg(long, default_value_t = relgen::DEFAULT_PRELOAD_DEPTH)]
    depth: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ordered schema statements
    Schema,

    /// Print the preload plan as JSON
    Preload {
        /// Write the plan to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> relgen::Result<()> {
    let models = relgen::parse_models(&cli.models)?;

    let catalog = match &cli.enums {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str::<EnumCatalog>(&content)?
        }
        None => EnumCatalog::default(),
    };

    let options = GenerateOptions {
        preload_depth: cli.depth,
        ..GenerateOptions::default()
    };
    let generation: Generation = relgen::generate(&models.entities, &options, &catalog)?;

    match cli.command {
        Command::Schema => {
            for statement in &generation.schema.statements {
                println!("{statement}");
            }
        }
        Command::Preload { out } => {
            let json = serde_json::to_string_pretty(&generation.preloads)?;
            match out {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}
