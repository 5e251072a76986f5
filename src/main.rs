use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use irbm::core::config::Config;
use irbm::core::error::{Error, ErrorKind, Result};
use irbm::corpus::{DirectoryCorpus, DocumentSource};
use irbm::index::inverted::InvertedIndex;
use irbm::parallel::builder::IndexBuilder;
use irbm::query::parser::QueryParser;
use irbm::search::results::SearchResults;
use irbm::search::searcher::Searcher;
use irbm::storage::serializer::{index_file_path, load, save};

#[derive(Parser)]
#[command(name = "irbm", about = "Boolean-model information retrieval engine")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a collection directory (one .txt file per document) and save it.
    CreateIndex { collection: PathBuf },
    /// Load a saved index by corpus name and print its statistics.
    LoadIndex { name: String },
    /// Run one query against a saved index.
    Query {
        query: String,
        #[arg(long)]
        index: String,
        /// Emit results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive query loop against a saved index.
    Repl {
        #[arg(long)]
        index: String,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &Error) -> i32 {
    match err.kind {
        ErrorKind::MalformedQuery => 2,
        ErrorKind::NotFound => 4,
        ErrorKind::Io | ErrorKind::IndexCorruption => 3,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::CreateIndex { collection } => create_index(&config, &collection),
        Command::LoadIndex { name } => {
            let index = open_index(&config, &name)?;
            println!(
                "index '{}': {} documents, {} terms",
                name,
                index.doc_count(),
                index.term_count()
            );
            Ok(())
        }
        Command::Query { query, index, json } => {
            let index = open_index(&config, &index)?;
            let searcher = Searcher::new(&index);
            let results = searcher.search(&query)?;
            print_results(&results, json)
        }
        Command::Repl { index, page_size } => {
            let index = open_index(&config, &index)?;
            repl(&index, page_size)
        }
    }
}

fn create_index(config: &Config, collection: &PathBuf) -> Result<()> {
    let corpus = DirectoryCorpus::open(collection)?;
    let builder = IndexBuilder::new(config.clone());
    let (index, stats) = builder.build(&corpus)?;
    let path = index_file_path(config, corpus.name());
    save(&index, &path)?;
    println!(
        "indexed '{}': {} documents, {} terms, {} tokens in {} ms -> {}",
        stats.corpus,
        stats.doc_count,
        stats.term_count,
        stats.token_count,
        stats.duration_ms,
        path.display()
    );
    Ok(())
}

fn open_index(config: &Config, name: &str) -> Result<InvertedIndex> {
    let path = index_file_path(config, name);
    if !path.exists() {
        return Err(Error::new(
            ErrorKind::NotFound,
            format!("no index available at {}", path.display()),
        ));
    }
    load(&path, config)
}

fn print_results(results: &SearchResults, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(results)
            .map_err(|e| Error::new(ErrorKind::Internal, e.to_string()))?;
        println!("{}", rendered);
        return Ok(());
    }
    if let Some(note) = &results.correction {
        println!("({})", note);
    }
    for hit in &results.hits {
        println!("{:>6}  {:>8.3}  {}", hit.doc_id.0, hit.score, hit.title);
    }
    println!("{} hits in {} ms", results.total_hits, results.took_ms);
    Ok(())
}

/// One query per line; `-q` exits; long result sets paginate with `[y/n]`.
fn repl(index: &InvertedIndex, page_size: usize) -> Result<()> {
    let searcher = Searcher::new(index);
    let parser = QueryParser::new();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = match parser.parse(line, index.analyzer()) {
            Ok(parsed) => parsed,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };
        if parsed.flags.quit {
            return Ok(());
        }

        match searcher.run(parsed) {
            Ok(results) => paginate(&results, page_size, &stdin, &mut stdout)?,
            Err(err) => eprintln!("{}", err),
        }
    }
}

fn paginate(
    results: &SearchResults,
    page_size: usize,
    stdin: &std::io::Stdin,
    stdout: &mut std::io::Stdout,
) -> Result<()> {
    if let Some(note) = &results.correction {
        println!("({})", note);
    }
    let mut page = 0;
    loop {
        let hits = results.page(page, page_size);
        if hits.is_empty() {
            break;
        }
        for hit in hits {
            println!("{:>6}  {:>8.3}  {}", hit.doc_id.0, hit.score, hit.title);
        }
        if (page + 1) * page_size >= results.total_hits {
            break;
        }
        print!("more? [y/n] ");
        stdout.flush()?;
        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer)? == 0 {
            break;
        }
        if !answer.trim().eq_ignore_ascii_case("y") {
            break;
        }
        page += 1;
    }
    println!("{} hits in {} ms", results.total_hits, results.took_ms);
    Ok(())
}
