use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sha2::{Digest as _, Sha256};

pub fn ensure_cache_dir(cache_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("create cache dir: {}", cache_dir.display()))
}

/// `<cache_dir>/<sha256-hex(url)>.<suffix>`
pub fn cache_path(cache_dir: &Path, url: &str, suffix: &str) -> PathBuf {
    let digest = Sha256::digest(url.as_bytes());
    cache_dir.join(format!("{}.{suffix}", hex::encode(digest)))
}

pub fn read_cached(path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(anyhow::Error::new(err).context(format!("read cached: {}", path.display())))
        }
    }
}

/// Replaces any previous entry at `path`.
pub fn write_cached(path: &Path, body: &[u8]) -> anyhow::Result<()> {
    let parent_dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("cache path must have parent: {}", path.display()))?;
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("create cache parent dir: {}", parent_dir.display()))?;

    std::fs::write(path, body).with_context(|| format!("write cached: {}", path.display()))?;

    Ok(())
}
