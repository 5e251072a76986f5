/// Build an index over a tiny in-memory corpus, run a few queries, save the
/// index and reopen it.

use irbm::core::config::Config;
use irbm::corpus::InMemoryCorpus;
use irbm::parallel::builder::IndexBuilder;
use irbm::search::searcher::Searcher;
use irbm::storage::serializer::{index_file_path, load, save};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus = InMemoryCorpus::from_pairs(
        "movies",
        &[
            ("space jam", "a basketball team plays for its freedom"),
            ("the sandlot", "a summer of baseball and a legendary dog"),
            ("space movie", "a documentary about the history of space flight"),
        ],
    );

    let config = Config::default();
    let builder = IndexBuilder::new(config.clone());
    let (index, stats) = builder.build(&corpus)?;
    println!(
        "indexed {} documents, {} terms in {} ms",
        stats.doc_count, stats.term_count, stats.duration_ms
    );

    let searcher = Searcher::new(&index);
    for query in [
        "space & jam",
        "space | sandlot",
        "!space",
        "\"space jam\"",
        "sp*e",
        "-s2 spacc",
    ] {
        let results = searcher.search(query)?;
        let ids: Vec<u64> = results.doc_ids().iter().map(|d| d.0).collect();
        println!("{:<16} -> {:?}", query, ids);
    }

    let path = index_file_path(&config, "movies");
    save(&index, &path)?;
    let reopened = load(&path, &config)?;
    println!(
        "reopened '{}': {} documents",
        path.display(),
        reopened.doc_count()
    );
    Ok(())
}
