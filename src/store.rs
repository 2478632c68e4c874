use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;

use crate::cli::ShowArgs;
use crate::formats::{DocumentRecord, StoredDocument};

/// Decisions keyed by process number, persisted as one JSON object.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
    docs: BTreeMap<String, StoredDocument>,
    saves: usize,
}

impl DocumentStore {
    /// Loads the store at `path`, or starts empty when the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let docs = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse store: {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(
                    anyhow::Error::new(err).context(format!("read store: {}", path.display()))
                );
            }
        };
        tracing::debug!(path = %path.display(), documents = docs.len(), "store loaded");
        Ok(Self {
            path,
            docs,
            saves: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, process: &str) -> Option<&StoredDocument> {
        self.docs.get(process)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.docs.keys().map(String::as_str)
    }

    /// Number of full rewrites performed through this handle.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Trims the record and stores it under its process number, replacing any
    /// earlier entry. Returns the key.
    pub fn insert(&mut self, record: DocumentRecord) -> String {
        let (key, doc) = record.into_entry();
        if self.docs.insert(key.clone(), doc).is_some() {
            tracing::debug!(process = %key, "replaced existing entry");
        }
        key
    }

    /// Rewrites the whole file.
    pub fn save(&mut self) -> anyhow::Result<()> {
        let json = to_pretty_json(&self.docs)?;
        write_atomic(&self.path, &json)?;
        self.saves += 1;
        Ok(())
    }
}

/// Four-space indented JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .context("serialize json")?;
    out.push(b'\n');
    Ok(out)
}

fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    std::fs::write(&tmp_path, data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

pub fn show(args: ShowArgs) -> anyhow::Result<()> {
    let store = DocumentStore::open(&args.store)?;
    let doc = store
        .get(&args.process)
        .ok_or_else(|| anyhow::anyhow!("process not in store: {}", args.process))?;

    let json = to_pretty_json(doc)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(&json).context("write record")?;
    out.flush().context("flush stdout")?;
    Ok(())
}
