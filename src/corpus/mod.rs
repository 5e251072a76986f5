use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Document, Language, ZoneRank};

/// Contract every corpus loader fulfils. Parsers for concrete formats live
/// outside the engine and emit plain `Document` records.
pub trait DocumentSource {
    /// Parsed documents with zones and a detected language.
    fn iter(&self) -> Box<dyn Iterator<Item = Document> + '_>;

    fn name(&self) -> &str;

    /// Stable bytes keying the saved index file for this corpus.
    fn stable_identifier(&self) -> Vec<u8>;
}

/// In-memory corpus for tests and demos.
pub struct InMemoryCorpus {
    name: String,
    documents: Vec<Document>,
}

impl InMemoryCorpus {
    pub fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        InMemoryCorpus {
            name: name.into(),
            documents,
        }
    }

    /// Tiny convenience constructor: each `(title, body)` pair becomes a
    /// document with a title zone and a body zone.
    pub fn from_pairs(name: impl Into<String>, pairs: &[(&str, &str)]) -> Self {
        let documents = pairs
            .iter()
            .map(|(title, body)| {
                Document::new(*title, Language::English)
                    .with_zone(ZoneRank::Title, *title)
                    .with_zone(ZoneRank::Body, *body)
            })
            .collect();
        Self::new(name, documents)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for InMemoryCorpus {
    fn iter(&self) -> Box<dyn Iterator<Item = Document> + '_> {
        Box::new(self.documents.iter().cloned())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stable_identifier(&self) -> Vec<u8> {
        self.name.as_bytes().to_vec()
    }
}

/// Directory corpus for the CLI: every `.txt` file is one document, the file
/// stem is its title zone and the contents its body zone.
pub struct DirectoryCorpus {
    name: String,
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl DirectoryCorpus {
    pub fn open(root: &Path) -> Result<Self> {
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("collection")
            .to_string();
        let mut files = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("no .txt documents under {}", root.display()),
            ));
        }
        files.sort();
        Ok(DirectoryCorpus {
            name,
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentSource for DirectoryCorpus {
    fn iter(&self) -> Box<dyn Iterator<Item = Document> + '_> {
        Box::new(self.files.iter().filter_map(|path| {
            let title = path.file_stem()?.to_str()?.to_string();
            let body = fs::read_to_string(path).ok()?;
            Some(
                Document::new(title.clone(), Language::English)
                    .with_zone(ZoneRank::Title, title)
                    .with_zone(ZoneRank::Body, body),
            )
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stable_identifier(&self) -> Vec<u8> {
        self.name.as_bytes().to_vec()
    }
}
