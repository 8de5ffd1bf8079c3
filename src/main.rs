//! CLI entry point for the partitioned similarity engine.
//!
//! Loads an embedding table, partitions it across in-process workers, and
//! runs the interactive query loop until the operator types EXIT.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wordshard::{
    CoordinatorSession, FrameCodec, QueryOutcome, Settings, VectorDimension, WorkerId, channel_pair,
    read_embedding_file, worker,
};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "wordshard",
    version,
    about = "Distributed top-K similarity lookup over partitioned word embeddings",
    styles = clap_cargo_style()
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a table, distribute it across workers, and answer queries
    Run {
        /// Tab-separated embedding file: word, then one float per dimension
        #[arg(short, long)]
        file: PathBuf,

        /// Number of workers to partition across
        #[arg(short, long)]
        workers: Option<usize>,

        /// Results per query
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Embedding dimension
        #[arg(short, long)]
        dimension: Option<usize>,
    },
    /// Display active settings
    Config,
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so query results stay clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    match cli.command {
        Commands::Run {
            file,
            workers,
            top_k,
            dimension,
        } => {
            if let Some(workers) = workers {
                settings.workers = workers;
            }
            if let Some(top_k) = top_k {
                settings.top_k = top_k;
            }
            if let Some(dimension) = dimension {
                settings.dimension = dimension;
            }
            run(&settings, &file)
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn run(settings: &Settings, file: &PathBuf) -> anyhow::Result<()> {
    let dimension = VectorDimension::new(settings.dimension)?;
    let rows = read_embedding_file(
        file,
        dimension,
        settings.max_word_len,
        settings.load.on_malformed,
    )?;

    let codec = FrameCodec::new(settings.dimension, settings.max_word_len);
    let mut links = Vec::with_capacity(settings.workers);
    let mut handles = Vec::with_capacity(settings.workers);
    for id in 0..settings.workers {
        let (link, endpoint) = channel_pair(WorkerId::new(id as u16));
        handles.push(worker::spawn(endpoint, codec, dimension));
        links.push(link);
    }

    let timeout = Duration::from_millis(settings.reply_timeout_ms);
    let mut session = CoordinatorSession::new(links, codec, timeout)?;
    session.distribute(rows)?;
    info!("ready: {} workers, top_k {}", settings.workers, settings.top_k);

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        println!("Please type a query word (EXIT to quit):");
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF behaves like EXIT
            break;
        }
        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        if word == "EXIT" {
            break;
        }

        match session.query(word, settings.top_k)? {
            QueryOutcome::NotFound => println!("'{word}' is not in the table"),
            QueryOutcome::Found { results, partial } => {
                if partial {
                    println!("(partial results: some workers were unreachable)");
                }
                for (rank, result) in results.iter().enumerate() {
                    println!("{:>3}. {:<20} {:.6}", rank + 1, result.word, result.score);
                }
            }
        }
    }

    session.shutdown();
    for handle in handles {
        let _ = handle.join();
    }
    Ok(())
}
