//! Document ingestion: files → pages → chunks → embeddings → index
//!
//! Plain text and Markdown files are supported. A form feed (`\x0c`, as
//! emitted by `pdftotext`) separates pages; files without one have no page
//! numbers.

use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Result};
use medibot_index::{ChunkRecord, DistanceMetric, VectorIndex};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];
const EMBED_BATCH_SIZE: usize = 32;
const PAGE_BREAK: char = '\x0c';

/// How documents are split and whether an existing index may be replaced.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub overwrite: bool,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub files: usize,
    pub chunks: usize,
    pub skipped: Vec<PathBuf>,
    pub index_path: PathBuf,
}

/// A chunk of text waiting to be embedded.
#[derive(Debug, Clone, PartialEq)]
struct PendingChunk {
    id: String,
    content: String,
    source: String,
    page: Option<u32>,
}

/// Expand files and directories into the supported documents they contain,
/// sorted by path.
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(AppError::InvalidInput(format!(
                "Path not found: {}",
                path.display()
            )));
        }

        for entry in WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if is_supported(entry.path()) {
                documents.push(entry.into_path());
            }
        }
    }

    documents.sort();
    documents.dedup();
    Ok(documents)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Split one document into chunks with page numbers.
fn split_document(source: &str, text: &str, chunker: &TextChunker) -> Vec<PendingChunk> {
    let pages: Vec<&str> = text.split(PAGE_BREAK).collect();
    let paged = pages.len() > 1;

    let mut chunks = Vec::new();
    for (page_index, page) in pages.iter().enumerate() {
        let page_number = paged.then(|| page_index as u32 + 1);
        for content in chunker.chunk(page) {
            chunks.push(PendingChunk {
                id: format!("{}:{}", source, chunks.len()),
                content,
                source: source.to_string(),
                page: page_number,
            });
        }
    }
    chunks
}

/// Build an index at `index_path` from the documents under `paths`.
#[instrument(skip_all, fields(index = %index_path.display()))]
pub async fn ingest(
    paths: &[PathBuf],
    index_path: &Path,
    embedder: &dyn Embedder,
    options: &IngestOptions,
) -> Result<IngestReport> {
    let chunker = TextChunker::new(options.chunk_size, options.chunk_overlap)?;
    let documents = collect_documents(paths)?;

    let mut pending = Vec::new();
    let mut skipped = Vec::new();
    let mut files = 0;

    for document in &documents {
        let text = match tokio::fs::read_to_string(document).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %document.display(), error = %e, "Skipping unreadable document");
                skipped.push(document.clone());
                continue;
            }
        };

        let source = document.display().to_string();
        let chunks = split_document(&source, &text, &chunker);
        if chunks.is_empty() {
            skipped.push(document.clone());
            continue;
        }
        files += 1;
        pending.extend(chunks);
    }

    if pending.is_empty() {
        return Err(AppError::InvalidInput(
            "No text found to index (supported: .txt, .md)".to_string(),
        ));
    }

    let mut index = VectorIndex::new(embedder.name(), embedder.dimensions(), DistanceMetric::Cosine);

    for batch in pending.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != batch.len() {
            return Err(AppError::Internal(format!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }

        for (chunk, vector) in batch.iter().zip(vectors) {
            index
                .insert(ChunkRecord {
                    id: chunk.id.clone(),
                    content: chunk.content.clone(),
                    source: chunk.source.clone(),
                    page: chunk.page,
                    vector,
                })
                .map_err(|e| AppError::Internal(format!("Failed to index chunk: {}", e)))?;
        }
    }

    index
        .save(index_path, options.overwrite)
        .await
        .map_err(|e| match e {
            medibot_index::Error::AlreadyExists(path) => AppError::InvalidInput(format!(
                "An index already exists at {} (use --force to replace it)",
                path.display()
            )),
            other => AppError::Internal(format!("Failed to write index: {}", other)),
        })?;

    info!(files, chunks = index.len(), "Index written");

    Ok(IngestReport {
        files,
        chunks: index.len(),
        skipped,
        index_path: index_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_document_assigns_pages_on_form_feed() {
        let chunker = TextChunker::new(500, 50).unwrap();
        let chunks = split_document("book.txt", "First page.\x0cSecond page.", &chunker);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, Some(1));
        assert_eq!(chunks[1].page, Some(2));
        assert_eq!(chunks[1].id, "book.txt:1");
    }

    #[test]
    fn test_split_document_without_pages() {
        let chunker = TextChunker::new(500, 50).unwrap();
        let chunks = split_document("note.md", "Just one page.", &chunker);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, None);
        assert_eq!(chunks[0].source, "note.md");
    }

    #[test]
    fn test_blank_pages_produce_no_chunks_but_keep_numbering() {
        let chunker = TextChunker::new(500, 50).unwrap();
        let chunks = split_document("b.txt", "\x0c  \x0cThird.", &chunker);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, Some(3));
    }

    #[test]
    fn test_collect_documents_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("b.MD"), "b").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "c").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("d.txt"), "d").unwrap();

        let docs = collect_documents(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.MD", "d.txt"]);
    }

    #[test]
    fn test_collect_documents_missing_path() {
        let err = collect_documents(&[PathBuf::from("/no/such/dir")]).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
