//! w2v-doc-vectorizer CLI.

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;

use w2v_doc_vectorizer::{pipeline, Config, JsonLinesSource, Result, VectorStore};

/// Document embeddings from pretrained word vectors
#[derive(Parser, Debug)]
#[command(name = "w2v-doc-vectorizer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a JSON lines corpus with every configured method
    Score {
        /// TOML run configuration
        #[arg(short, long)]
        config: PathBuf,
        /// JSON lines input: {"text", "row_index", "source_id"} per line
        #[arg(short, long)]
        input: PathBuf,
        /// Override `parallel` from the configuration
        #[arg(long)]
        sequential: bool,
    },
    /// List groups, methods and matrix shapes in a store
    Inspect {
        #[arg(short, long)]
        store: PathBuf,
    },
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Score { config, input, sequential } => {
            let mut config = Config::load(&config)?;
            if sequential {
                config.parallel = false;
            }
            let reports = pipeline::run(&config, JsonLinesSource::new(input))?;
            for report in reports {
                println!(
                    "{}: {} documents in {} groups",
                    report.method,
                    report.documents(),
                    report.groups.len()
                );
            }
        }
        Command::Inspect { store } => {
            let store = VectorStore::open(store)?;
            for (group, method, (rows, cols)) in store.summary()? {
                println!("{group}\t{method}\t{rows}x{cols}");
            }
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
