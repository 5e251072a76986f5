use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use tracing::info;

use crate::analysis::analyzer::ZoneSpan;
use crate::core::config::{Config, DictionaryKind, StemmerKind};
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Language, ZoneRank};
use crate::index::dictionary::{TermDictionary, TermId};
use crate::index::documents::{DocumentEntry, DocumentTable};
use crate::index::inverted::InvertedIndex;
use crate::index::permuterm::PermutermIndex;
use crate::index::phonetic::PhoneticIndex;
use crate::index::posting::{Posting, PostingList};
use crate::storage::varint::{read_deltas, read_u64, write_deltas, write_u64};

const MAGIC: &[u8; 4] = b"IRBM";
const VERSION: u16 = 1;

const FLAG_RANK: u8 = 1 << 0;
const FLAG_STOP_WORDS: u8 = 1 << 1;
const FLAG_WF_IDF: u8 = 1 << 2;
const FLAG_TRIE: u8 = 1 << 3;
const STEMMER_SHIFT: u8 = 4;

/// Path of the saved index for a corpus, under the working directory.
pub fn index_file_path(config: &Config, corpus_name: &str) -> PathBuf {
    config
        .working_directory
        .join(format!("{}.irbm", corpus_name))
}

/// Serialize the index to `<path>.tmp`, CRC-validate the written file, then
/// atomically rename into place. No partial index is ever published.
pub fn save(index: &InvertedIndex, path: &Path) -> Result<()> {
    let payload = encode(index)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("irbm.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&payload)?;
        file.sync_all()?;
    }

    // re-read and verify before publishing
    let written = fs::read(&tmp)?;
    if let Err(err) = verify(&written) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), bytes = payload.len(), "index saved");
    Ok(())
}

/// Load a saved index. The file's recorded analysis flags override the
/// runtime config so queries are analyzed exactly as the corpus was.
pub fn load(path: &Path, base_config: &Config) -> Result<InvertedIndex> {
    let data = fs::read(path)?;
    verify(&data)?;
    decode(&data, base_config)
}

fn encode(index: &InvertedIndex) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.push(config_flags(&index.config));

    write_chunk(&mut out, &encode_dictionary(index.dictionary()));
    write_chunk(&mut out, &encode_postings(index));
    write_chunk(&mut out, &encode_permuterm(index.permuterm()));
    write_chunk(&mut out, &encode_phonetic(index.phonetic()));
    write_chunk(&mut out, &encode_documents(index.documents()));

    let mut hasher = Hasher::new();
    hasher.update(&out);
    let crc = u64::from(hasher.finalize());
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

fn verify(data: &[u8]) -> Result<()> {
    if data.len() < MAGIC.len() + 2 + 1 + 8 {
        return Err(Error::corruption("file too short"));
    }
    if &data[..4] != MAGIC {
        return Err(Error::corruption("bad magic"));
    }
    let (payload, trailer) = data.split_at(data.len() - 8);
    let mut hasher = Hasher::new();
    hasher.update(payload);
    let expected = u64::from(hasher.finalize());
    let stored = u64::from_le_bytes(trailer.try_into().map_err(|_| Error::corruption("bad trailer"))?);
    if expected != stored {
        return Err(Error::corruption(format!(
            "CRC mismatch: stored {:#x}, computed {:#x}",
            stored, expected
        )));
    }
    Ok(())
}

fn config_flags(config: &Config) -> u8 {
    let mut flags = 0u8;
    if config.rank_query_results {
        flags |= FLAG_RANK;
    }
    if config.exclude_stop_words {
        flags |= FLAG_STOP_WORDS;
    }
    if config.use_wf_idf {
        flags |= FLAG_WF_IDF;
    }
    if config.dictionary == DictionaryKind::Trie {
        flags |= FLAG_TRIE;
    }
    let stemmer_id = match config.stemmer {
        StemmerKind::None => 0,
        StemmerKind::Porter => 1,
        StemmerKind::Snowball => 2 + config.snowball_language.id().min(5),
    };
    flags | (stemmer_id << STEMMER_SHIFT)
}

fn apply_flags(base: &Config, flags: u8) -> Config {
    let mut config = base.clone();
    config.rank_query_results = flags & FLAG_RANK != 0;
    config.exclude_stop_words = flags & FLAG_STOP_WORDS != 0;
    config.use_wf_idf = flags & FLAG_WF_IDF != 0;
    config.dictionary = if flags & FLAG_TRIE != 0 {
        DictionaryKind::Trie
    } else {
        DictionaryKind::Hash
    };
    match flags >> STEMMER_SHIFT {
        0 => config.stemmer = StemmerKind::None,
        1 => config.stemmer = StemmerKind::Porter,
        id => {
            config.stemmer = StemmerKind::Snowball;
            config.snowball_language = Language::from_id(id - 2);
        }
    }
    config
}

fn write_chunk(out: &mut Vec<u8>, chunk: &[u8]) {
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(chunk);
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn encode_dictionary(dictionary: &TermDictionary) -> Vec<u8> {
    let mut out = Vec::new();
    write_u64(&mut out, dictionary.len() as u64);
    for (_, info) in dictionary.iter_sorted() {
        write_string(&mut out, &info.text);
        write_u64(&mut out, u64::from(info.df));
    }
    out
}

fn encode_postings(index: &InvertedIndex) -> Vec<u8> {
    let mut out = Vec::new();
    write_u64(&mut out, index.all_postings().len() as u64);
    for list in index.all_postings() {
        let doc_ids: Vec<u64> = list.iter().map(|p| p.doc_id.0).collect();
        write_deltas(&mut out, &doc_ids);
        for posting in list.iter() {
            let positions: Vec<u64> = posting.positions.iter().map(|&p| u64::from(p)).collect();
            write_deltas(&mut out, &positions);
        }
    }
    out
}

fn encode_permuterm(permuterm: &PermutermIndex) -> Vec<u8> {
    let mut out = Vec::new();
    let pairs = permuterm.iter();
    write_u64(&mut out, pairs.len() as u64);
    for (rotation, term) in pairs {
        write_string(&mut out, &rotation);
        write_u64(&mut out, u64::from(term.0));
    }
    out
}

fn encode_phonetic(phonetic: &PhoneticIndex) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buckets: Vec<(&String, &Vec<TermId>)> = phonetic.iter().collect();
    buckets.sort_by(|a, b| a.0.cmp(b.0));
    write_u64(&mut out, buckets.len() as u64);
    for (code, ids) in buckets {
        write_string(&mut out, code);
        write_u64(&mut out, ids.len() as u64);
        for id in ids {
            write_u64(&mut out, u64::from(id.0));
        }
    }
    out
}

fn encode_documents(documents: &DocumentTable) -> Vec<u8> {
    let mut out = Vec::new();
    write_u64(&mut out, documents.len() as u64);
    for entry in documents.iter() {
        write_u64(&mut out, entry.doc_id.0);
        write_string(&mut out, &entry.title);
        out.push(entry.language.id());
        write_u64(&mut out, entry.attributes.len() as u64);
        let mut attributes: Vec<(&String, &String)> = entry.attributes.iter().collect();
        attributes.sort();
        for (key, value) in attributes {
            write_string(&mut out, key);
            write_string(&mut out, value);
        }
        write_u64(&mut out, entry.zones.len() as u64);
        for zone in &entry.zones {
            out.push(zone.rank.ordinal());
            write_u64(&mut out, u64::from(zone.start));
            write_u64(&mut out, u64::from(zone.len));
        }
        write_u64(&mut out, u64::from(entry.token_count));
    }
    out
}

fn decode(data: &[u8], base_config: &Config) -> Result<InvertedIndex> {
    let mut reader = ByteReader::new(&data[..data.len() - 8]);
    reader.expect(MAGIC)?;
    let version = reader.read_u16()?;
    if version != VERSION {
        return Err(Error::corruption(format!("unsupported version {}", version)));
    }
    let flags = reader.read_u8()?;
    let config = apply_flags(base_config, flags);

    let dictionary_chunk = reader.read_chunk()?;
    let postings_chunk = reader.read_chunk()?;
    let permuterm_chunk = reader.read_chunk()?;
    let phonetic_chunk = reader.read_chunk()?;
    let documents_chunk = reader.read_chunk()?;
    if !reader.is_empty() {
        return Err(Error::corruption("trailing bytes after document table"));
    }

    let terms = decode_dictionary(dictionary_chunk)?;
    let dictionary = TermDictionary::build(config.dictionary, terms)?;
    let postings = decode_postings(postings_chunk, dictionary.len())?;
    let permuterm = PermutermIndex::from_sorted_pairs(decode_permuterm(permuterm_chunk)?)?;
    let phonetic = PhoneticIndex::from_buckets(decode_phonetic(phonetic_chunk)?);
    let documents = decode_documents(documents_chunk)?;

    Ok(InvertedIndex::from_parts(
        config, dictionary, postings, permuterm, phonetic, documents,
    ))
}

fn decode_dictionary(chunk: &[u8]) -> Result<Vec<(String, u32)>> {
    let mut reader = ByteReader::new(chunk);
    let count = reader.read_varint()?;
    let mut terms = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let text = reader.read_string()?;
        let df = reader.read_varint()? as u32;
        terms.push((text, df));
    }
    reader.finish()?;
    Ok(terms)
}

fn decode_postings(chunk: &[u8], term_count: usize) -> Result<Vec<PostingList>> {
    let mut reader = ByteReader::new(chunk);
    let count = reader.read_varint()? as usize;
    if count != term_count {
        return Err(Error::corruption("postings chunk disagrees with dictionary"));
    }
    let mut lists = Vec::with_capacity(count);
    for _ in 0..count {
        let doc_ids = reader.read_deltas()?;
        let mut postings = Vec::with_capacity(doc_ids.len());
        for doc_id in doc_ids {
            let positions = reader.read_deltas()?;
            postings.push(Posting::new(
                DocId(doc_id),
                positions.into_iter().map(|p| p as u32).collect(),
            ));
        }
        lists.push(PostingList::from_postings(postings));
    }
    reader.finish()?;
    Ok(lists)
}

fn decode_permuterm(chunk: &[u8]) -> Result<Vec<(String, TermId)>> {
    let mut reader = ByteReader::new(chunk);
    let count = reader.read_varint()?;
    let mut pairs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let rotation = reader.read_string()?;
        let term = TermId(reader.read_varint()? as u32);
        pairs.push((rotation, term));
    }
    reader.finish()?;
    Ok(pairs)
}

fn decode_phonetic(chunk: &[u8]) -> Result<HashMap<String, Vec<TermId>>> {
    let mut reader = ByteReader::new(chunk);
    let count = reader.read_varint()?;
    let mut buckets = HashMap::with_capacity(count as usize);
    for _ in 0..count {
        let code = reader.read_string()?;
        let len = reader.read_varint()?;
        let mut ids = Vec::with_capacity(len as usize);
        for _ in 0..len {
            ids.push(TermId(reader.read_varint()? as u32));
        }
        buckets.insert(code, ids);
    }
    reader.finish()?;
    Ok(buckets)
}

fn decode_documents(chunk: &[u8]) -> Result<DocumentTable> {
    let mut reader = ByteReader::new(chunk);
    let count = reader.read_varint()?;
    let mut table = DocumentTable::new();
    for _ in 0..count {
        let doc_id = DocId(reader.read_varint()?);
        let title = reader.read_string()?;
        let language = Language::from_id(reader.read_u8()?);
        let attr_count = reader.read_varint()?;
        let mut attributes = HashMap::with_capacity(attr_count as usize);
        for _ in 0..attr_count {
            let key = reader.read_string()?;
            let value = reader.read_string()?;
            attributes.insert(key, value);
        }
        let zone_count = reader.read_varint()?;
        let mut zones = Vec::with_capacity(zone_count as usize);
        for _ in 0..zone_count {
            let rank = ZoneRank::from_ordinal(reader.read_u8()?)
                .ok_or_else(|| Error::corruption("unknown zone rank"))?;
            let start = reader.read_varint()? as u32;
            let len = reader.read_varint()? as u32;
            zones.push(ZoneSpan { rank, start, len });
        }
        let token_count = reader.read_varint()? as u32;
        table.insert(DocumentEntry {
            doc_id,
            title,
            language,
            attributes,
            zones,
            token_count,
        });
    }
    reader.finish()?;
    Ok(table)
}

/// Cursor over a byte slice; every short read is an `IndexCorruption`.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(Error::corruption("truncated chunk"));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn expect(&mut self, bytes: &[u8]) -> Result<()> {
        if self.take(bytes.len())? != bytes {
            return Err(Error::corruption("bad magic"));
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_varint(&mut self) -> Result<u64> {
        let (value, used) = read_u64(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    fn read_deltas(&mut self) -> Result<Vec<u64>> {
        let (values, used) = read_deltas(&self.data[self.pos..])?;
        self.pos += used;
        Ok(values)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::corruption("invalid UTF-8 string"))
    }

    fn read_chunk(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    fn finish(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::corruption("unread bytes at end of chunk"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::corpus::InMemoryCorpus;
    use crate::parallel::builder::IndexBuilder;
    use crate::search::searcher::Searcher;

    fn build_index() -> InvertedIndex {
        let corpus = InMemoryCorpus::from_pairs(
            "movies",
            &[
                ("space jam", "a space movie about basketball"),
                ("the sandlot", "a baseball movie"),
                ("space movie", "documentary about space"),
            ],
        );
        let (index, _) = IndexBuilder::new(Config::default()).build(&corpus).unwrap();
        index
    }

    #[test]
    fn round_trip_preserves_query_answers() {
        let index = build_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.irbm");
        save(&index, &path).unwrap();

        let loaded = load(&path, &Config::default()).unwrap();
        assert_eq!(loaded.doc_count(), index.doc_count());
        assert_eq!(loaded.term_count(), index.term_count());

        for query in ["space & jam", "space | sandlot", "!space", "\"space jam\"", "sp*e"] {
            let a = Searcher::new(&index).search(query).unwrap();
            let b = Searcher::new(&loaded).search(query).unwrap();
            assert_eq!(a.doc_ids(), b.doc_ids(), "query {:?}", query);
            let scores_a: Vec<f32> = a.hits.iter().map(|h| h.score).collect();
            let scores_b: Vec<f32> = b.hits.iter().map(|h| h.score).collect();
            assert_eq!(scores_a, scores_b, "query {:?}", query);
        }
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let index = build_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.irbm");
        save(&index, &path).unwrap();

        let mut data = fs::read(&path).unwrap();
        let middle = data.len() / 2;
        data[middle] ^= 0xff;
        fs::write(&path, &data).unwrap();

        let err = load(&path, &Config::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexCorruption);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.irbm");
        fs::write(&path, b"NOPE................").unwrap();
        let err = load(&path, &Config::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexCorruption);
    }

    #[test]
    fn truncated_file_is_rejected() {
        let index = build_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.irbm");
        save(&index, &path).unwrap();
        let data = fs::read(&path).unwrap();
        fs::write(&path, &data[..data.len() - 16]).unwrap();
        let err = load(&path, &Config::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexCorruption);
    }

    #[test]
    fn flags_byte_round_trips_analysis_settings() {
        let mut config = Config::default();
        config.stemmer = StemmerKind::Snowball;
        config.snowball_language = Language::Italian;
        config.exclude_stop_words = true;
        config.rank_query_results = false;
        config.dictionary = DictionaryKind::Trie;
        let flags = config_flags(&config);
        let restored = apply_flags(&Config::default(), flags);
        assert_eq!(restored.stemmer, StemmerKind::Snowball);
        assert_eq!(restored.snowball_language, Language::Italian);
        assert!(restored.exclude_stop_words);
        assert!(!restored.rank_query_results);
        assert_eq!(restored.dictionary, DictionaryKind::Trie);
    }
}
