use crate::error::{Error, Result};
use crate::index::Snapshot;
use crate::raw::RawIndex;
use crate::searchindex;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Bumped whenever the cached snapshot layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_title_terms: usize,
    pub num_objects: usize,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn describe(snapshot: &Snapshot) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into());
        Self {
            num_docs: snapshot.num_docs(),
            num_terms: snapshot.num_terms(),
            num_title_terms: snapshot.num_title_terms(),
            num_objects: snapshot.num_objects(),
            created_at,
            version: FORMAT_VERSION,
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn snapshot(&self) -> PathBuf { self.root.join("snapshot.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_snapshot(paths: &IndexPaths, snapshot: &Snapshot) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.snapshot())?;
    let bytes = bincode::serialize(snapshot)?;
    f.write_all(&bytes)?;
    let meta = MetaFile::describe(snapshot);
    save_meta(paths, &meta)?;
    Ok(meta)
}

/// Read a cached snapshot and re-validate it before handing it out.
pub fn load_snapshot(paths: &IndexPaths) -> Result<Snapshot> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::malformed(format!(
            "snapshot format version {} is not supported (expected {FORMAT_VERSION})",
            meta.version
        )));
    }
    let mut f = File::open(paths.snapshot())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let snapshot: Snapshot = bincode::deserialize(&buf)?;
    snapshot.validate()?;
    if snapshot.num_docs() != meta.num_docs {
        return Err(Error::malformed(format!(
            "meta.json records {} documents but the snapshot has {}",
            meta.num_docs,
            snapshot.num_docs()
        )));
    }
    Ok(snapshot)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Load a snapshot from a cache directory, a raw `.json` index, or a Sphinx
/// `searchindex.js` file.
pub fn open_index<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let path = path.as_ref();
    if path.is_dir() {
        return load_snapshot(&IndexPaths::new(path));
    }
    let text = std::fs::read_to_string(path)?;
    let raw = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => RawIndex::from_json_str(&text)?,
        _ => searchindex::parse(&text)?,
    };
    Snapshot::load(raw)
}
