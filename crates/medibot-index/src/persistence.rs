//! Persistence layer for medibot-index.
//!
//! An index directory holds two files:
//! - `{path}/manifest.json` - how the index was built ([`IndexManifest`])
//! - `{path}/chunks.jsonl` - one [`ChunkRecord`] per line, in insertion order
//!
//! Both files are written to a temporary name first and renamed into place.
//! The manifest is renamed last, so a directory without a manifest is never
//! treated as a valid index.

use crate::error::{Error, Result};
use crate::types::{ChunkRecord, IndexManifest, FORMAT_VERSION};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info};

/// File name of the manifest inside an index directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the chunk records inside an index directory.
pub const CHUNKS_FILE: &str = "chunks.jsonl";

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write an index to `dir`, creating the directory if needed.
pub async fn save_index(dir: &Path, manifest: &IndexManifest, records: &[ChunkRecord]) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    let chunks_path = dir.join(CHUNKS_FILE);
    let chunks_tmp = tmp_path(&chunks_path);
    {
        let file = tokio::fs::File::create(&chunks_tmp).await?;
        let mut writer = BufWriter::new(file);
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| Error::Persistence(format!("Failed to serialize chunk: {}", e)))?;
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
        writer.flush().await?;
    }
    tokio::fs::rename(&chunks_tmp, &chunks_path).await?;

    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_tmp = tmp_path(&manifest_path);
    let manifest_json = serde_json::to_string_pretty(manifest)
        .map_err(|e| Error::Persistence(format!("Failed to serialize manifest: {}", e)))?;
    tokio::fs::write(&manifest_tmp, manifest_json).await?;
    tokio::fs::rename(&manifest_tmp, &manifest_path).await?;

    info!(path = ?dir, records = records.len(), "Saved index");
    Ok(())
}

const MAX_PREALLOCATED_RECORDS: usize = 4096;

/// Load the manifest and all records from `dir`.
pub async fn load_index(dir: &Path) -> Result<(IndexManifest, Vec<ChunkRecord>)> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
        return Err(Error::NotFound(dir.to_path_buf()));
    }

    let manifest_json = tokio::fs::read_to_string(&manifest_path).await?;
    let manifest: IndexManifest = serde_json::from_str(&manifest_json)
        .map_err(|e| Error::Persistence(format!("Failed to parse manifest: {}", e)))?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "Unsupported index format version {} (expected {})",
            manifest.format_version, FORMAT_VERSION
        )));
    }

    let chunks_path = dir.join(CHUNKS_FILE);
    let file = tokio::fs::File::open(&chunks_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(chunks_path.clone())
        } else {
            Error::Io(e)
        }
    })?;

    // The manifest count is untrusted until the records are read.
    let mut records = Vec::with_capacity(manifest.record_count.min(MAX_PREALLOCATED_RECORDS));
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: ChunkRecord = serde_json::from_str(&line).map_err(|e| {
            Error::Persistence(format!("Malformed chunk on line {}: {}", line_no, e))
        })?;
        if record.vector.len() != manifest.dimensions {
            return Err(Error::DimensionMismatch {
                expected: manifest.dimensions,
                actual: record.vector.len(),
            });
        }
        records.push(record);
    }

    if records.len() != manifest.record_count {
        return Err(Error::Persistence(format!(
            "Manifest lists {} records but {} were found",
            manifest.record_count,
            records.len()
        )));
    }

    debug!(path = ?dir, records = records.len(), "Loaded index records");
    Ok((manifest, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;
    use tempfile::TempDir;

    fn record(id: &str, vector: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            content: format!("content of {}", id),
            source: "notes.txt".to_string(),
            page: Some(2),
            vector,
        }
    }

    #[tokio::test]
    async fn test_save_load_roundtrip_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = IndexManifest::new("hash-2".into(), 2, DistanceMetric::Cosine);
        let records = vec![record("b", vec![0.0, 1.0]), record("a", vec![1.0, 0.0])];
        manifest.record_count = records.len();

        save_index(temp_dir.path(), &manifest, &records).await.unwrap();
        let (loaded_manifest, loaded) = load_index(temp_dir.path()).await.unwrap();

        assert_eq!(loaded_manifest, manifest);
        assert_eq!(loaded, records);
        assert!(!temp_dir.path().join("manifest.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let err = load_index(&missing).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_record_count_mismatch_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = IndexManifest::new("hash-2".into(), 2, DistanceMetric::Cosine);
        manifest.record_count = 5;
        save_index(temp_dir.path(), &manifest, &[record("a", vec![1.0, 0.0])])
            .await
            .unwrap();

        let err = load_index(temp_dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[tokio::test]
    async fn test_oversized_record_count_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = IndexManifest::new("hash-2".into(), 2, DistanceMetric::Cosine);
        manifest.record_count = usize::MAX;
        save_index(temp_dir.path(), &manifest, &[]).await.unwrap();

        let err = load_index(temp_dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[tokio::test]
    async fn test_corrupt_chunk_line_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = IndexManifest::new("hash-2".into(), 2, DistanceMetric::Cosine);
        manifest.record_count = 1;
        save_index(temp_dir.path(), &manifest, &[]).await.unwrap();
        tokio::fs::write(temp_dir.path().join(CHUNKS_FILE), "{not json}\n")
            .await
            .unwrap();

        let err = load_index(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
