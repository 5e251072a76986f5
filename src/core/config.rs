use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::core::types::Language;

/// Stemmer selection, fixed for the lifetime of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemmerKind {
    None,
    Porter,
    Snowball,
}

impl StemmerKind {
    pub fn id(&self) -> u8 {
        match self {
            StemmerKind::None => 0,
            StemmerKind::Porter => 1,
            StemmerKind::Snowball => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(StemmerKind::None),
            1 => Some(StemmerKind::Porter),
            2 => Some(StemmerKind::Snowball),
            _ => None,
        }
    }
}

/// Dictionary backing structure. `Trie` selects the FST automaton backend,
/// which accelerates prefix wildcard scans; `Hash` is the default point-lookup
/// map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    Hash,
    Trie,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub working_directory: PathBuf,
    pub exclude_stop_words: bool,
    pub stemmer: StemmerKind,
    pub snowball_language: Language,
    pub rank_query_results: bool,
    pub use_wf_idf: bool,
    pub dictionary: DictionaryKind,
    pub default_edit_distance: u32,
    pub progress_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            working_directory: PathBuf::from("workingDirectory"),
            exclude_stop_words: false,
            stemmer: StemmerKind::Porter,
            snowball_language: Language::English,
            rank_query_results: true,
            use_wf_idf: true,
            dictionary: DictionaryKind::Hash,
            default_edit_distance: 1,
            progress_interval_secs: 5,
        }
    }
}

impl Config {
    /// Load a TOML config file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text)?;
        Ok(raw.into_config())
    }
}

// Raw deserialization layer mirroring the dotted key layout of the config
// file ([workingDirectory], [app], [index], [query.default]).

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "workingDirectory", default)]
    working_directory: RawWorkingDirectory,
    #[serde(default)]
    app: RawApp,
    #[serde(default)]
    index: RawIndex,
    #[serde(default)]
    query: RawQuery,
}

#[derive(Debug, Deserialize)]
struct RawWorkingDirectory {
    #[serde(default = "default_working_directory")]
    name: String,
}

impl Default for RawWorkingDirectory {
    fn default() -> Self {
        RawWorkingDirectory {
            name: default_working_directory(),
        }
    }
}

fn default_working_directory() -> String {
    "workingDirectory".to_string()
}

#[derive(Debug, Deserialize)]
struct RawApp {
    #[serde(default)]
    exclude_stop_words: bool,
    #[serde(default = "default_stemmer")]
    stemmer: String,
    #[serde(default = "default_snowball_language")]
    snowball_language: String,
    #[serde(default = "default_true")]
    rank_query_results: bool,
    #[serde(default = "default_true")]
    use_wf_idf: bool,
}

impl Default for RawApp {
    fn default() -> Self {
        RawApp {
            exclude_stop_words: false,
            stemmer: default_stemmer(),
            snowball_language: default_snowball_language(),
            rank_query_results: true,
            use_wf_idf: true,
        }
    }
}

fn default_stemmer() -> String {
    "porter".to_string()
}

fn default_snowball_language() -> String {
    "english".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(rename = "dataStructure", default)]
    data_structure: RawDataStructure,
    #[serde(default = "default_progress_interval")]
    progress_interval_secs: u64,
}

impl Default for RawIndex {
    fn default() -> Self {
        RawIndex {
            data_structure: RawDataStructure::default(),
            progress_interval_secs: default_progress_interval(),
        }
    }
}

fn default_progress_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct RawDataStructure {
    #[serde(rename = "type", default = "default_data_structure")]
    kind: String,
}

impl Default for RawDataStructure {
    fn default() -> Self {
        RawDataStructure {
            kind: default_data_structure(),
        }
    }
}

fn default_data_structure() -> String {
    "hash".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct RawQuery {
    #[serde(default)]
    default: RawQueryDefault,
}

#[derive(Debug, Deserialize)]
struct RawQueryDefault {
    #[serde(default = "default_edit_distance")]
    edit_distance: u32,
}

impl Default for RawQueryDefault {
    fn default() -> Self {
        RawQueryDefault {
            edit_distance: default_edit_distance(),
        }
    }
}

fn default_edit_distance() -> u32 {
    1
}

impl RawConfig {
    fn into_config(self) -> Config {
        let stemmer = match self.app.stemmer.as_str() {
            "none" => StemmerKind::None,
            "snowball" => StemmerKind::Snowball,
            _ => StemmerKind::Porter,
        };
        let snowball_language = match self.app.snowball_language.as_str() {
            "italian" => Language::Italian,
            "french" => Language::French,
            "german" => Language::German,
            "spanish" => Language::Spanish,
            "portuguese" => Language::Portuguese,
            _ => Language::English,
        };
        let dictionary = match self.index.data_structure.kind.as_str() {
            "trie" => DictionaryKind::Trie,
            _ => DictionaryKind::Hash,
        };
        Config {
            working_directory: PathBuf::from(self.working_directory.name),
            exclude_stop_words: self.app.exclude_stop_words,
            stemmer,
            snowball_language,
            rank_query_results: self.app.rank_query_results,
            use_wf_idf: self.app.use_wf_idf,
            dictionary,
            default_edit_distance: self.query.default.edit_distance.max(1),
            progress_interval_secs: self.index.progress_interval_secs.max(1),
        }
    }
}
