//! # Ingestor Module
//!
//! Corpus admission for the graph pipeline.
//!
//! - Keep only markdown documents
//! - Skip archive and tooling noise (`__MACOSX/`, `node_modules/`, `.git/`)
//! - Enforce document-count and cumulative-size ceilings
//! - No parsing or enrichment: the builder does that

use crate::SkillGraphError;
use crate::primitives::{MAX_DOCUMENT_COUNT, MAX_TOTAL_TEXT_BYTES};
use serde::{Deserialize, Serialize};

/// Directory names whose documents are never admitted.
pub const IGNORED_DIRECTORIES: [&str; 3] = ["__MACOSX", "node_modules", ".git"];

/// A raw input document: a path and its full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub path: String,
    pub content: String,
}

impl SourceDocument {
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Check whether the path names a markdown file outside ignored folders.
    #[must_use]
    pub fn is_markdown(&self) -> bool {
        let path = self.path.replace('\\', "/");
        let mut folders = path.split('/').rev().skip(1);
        path.to_ascii_lowercase().ends_with(".md")
            && !folders.any(|folder| IGNORED_DIRECTORIES.contains(&folder))
    }
}

/// The Ingestor gates a corpus before it reaches the builder.
pub struct Ingestor;

impl Ingestor {
    /// Admit a corpus with the default limits.
    pub fn admit(documents: Vec<SourceDocument>) -> Result<Vec<SourceDocument>, SkillGraphError> {
        Self::admit_with_limits(documents, MAX_DOCUMENT_COUNT, MAX_TOTAL_TEXT_BYTES)
    }

    /// Admit a corpus, keeping markdown documents in their original order.
    ///
    /// # Errors
    /// - `NoDocuments` if no markdown document remains
    /// - `TooManyDocuments` if more than `max_documents` remain
    /// - `CorpusTooLarge` if the cumulative text exceeds `max_bytes`
    pub fn admit_with_limits(
        documents: Vec<SourceDocument>,
        max_documents: usize,
        max_bytes: usize,
    ) -> Result<Vec<SourceDocument>, SkillGraphError> {
        let admitted: Vec<SourceDocument> = documents
            .into_iter()
            .filter(SourceDocument::is_markdown)
            .collect();

        if admitted.is_empty() {
            return Err(SkillGraphError::NoDocuments);
        }
        if admitted.len() > max_documents {
            return Err(SkillGraphError::TooManyDocuments {
                count: admitted.len(),
                max: max_documents,
            });
        }

        let total_bytes = admitted
            .iter()
            .fold(0usize, |acc, doc| acc.saturating_add(doc.content.len()));
        if total_bytes > max_bytes {
            return Err(SkillGraphError::CorpusTooLarge {
                bytes: total_bytes,
                max: max_bytes,
            });
        }

        tracing::debug!(
            documents = admitted.len(),
            bytes = total_bytes,
            "corpus admitted"
        );
        Ok(admitted)
    }
}
