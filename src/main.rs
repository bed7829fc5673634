use abc_import::import::{collect_abc_files, import_files};
use abc_import::{parse_tune_json, split_tunebook, ImportConfig};
use clap::{ArgGroup, Parser, Subcommand};
use log::error;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "abc-import", about = "ABC tune parser and Song JSON converter")]
#[command(version)]
struct Cli {
    /// Log every skipped field and ignored tie
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert .abc files into Song JSON files
    #[command(group(ArgGroup::new("input").required(true).args(["file", "input_dir"])))]
    Convert {
        /// Single .abc file to convert
        #[arg(long)]
        file: Option<PathBuf>,

        /// Directory searched recursively for .abc files
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Where the .json files are written
        #[arg(long, default_value = "./songs-json")]
        output_dir: PathBuf,

        /// YAML import settings
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Parse a .abc file and print each tune's notes (or error) as JSON
    Parse {
        /// Path to a .abc file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .init();

    match cli.command {
        Command::Convert {
            file,
            input_dir,
            output_dir,
            config,
        } => {
            let config = match config {
                Some(path) => ImportConfig::load(&path).unwrap_or_else(|e| {
                    error!("{}", e);
                    process::exit(1);
                }),
                None => ImportConfig::default(),
            };

            let files = match (file, input_dir) {
                (Some(file), _) => vec![file],
                (None, Some(dir)) => collect_abc_files(&dir),
                (None, None) => {
                    error!("Provide either --file or --input-dir");
                    process::exit(1);
                }
            };

            match import_files(&files, &output_dir, &config) {
                Ok(summary) => {
                    println!("\nDone! Converted {}/{} tunes", summary.converted, summary.total);
                }
                Err(e) => {
                    error!("{}", e);
                    process::exit(1);
                }
            }
        }
        Command::Parse { file } => {
            let text = fs::read_to_string(&file).unwrap_or_else(|e| {
                error!("Error reading file '{}': {}", file.display(), e);
                process::exit(1);
            });

            for tune_text in split_tunebook(&text) {
                match parse_tune_json(tune_text) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("{}", e);
                        process::exit(1);
                    }
                }
            }
        }
    }
}
