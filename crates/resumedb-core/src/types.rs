//! Domain types shared by the index, the ranking engine and the service.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

pub type DocId = String;
pub type Embedding = Vec<f32>;

/// Kind of source document a chunk was cut from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Resume,
    JobDescription,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::JobDescription => "job_description",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-chunk payload stored alongside each vector.
///
/// Resume-level fields (`name`, `category`) are copied onto every chunk of a
/// resume; `title` is only set for job descriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub doc_id: DocId,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChunkMetadata {
    pub fn resume(doc_id: impl Into<DocId>, section: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            doc_type: DocType::Resume,
            section: section.into(),
            name: None,
            category: None,
            title: None,
        }
    }

    pub fn job_description(doc_id: impl Into<DocId>, section: impl Into<String>) -> Self {
        Self {
            doc_type: DocType::JobDescription,
            ..Self::resume(doc_id, section)
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A bounded span of a source document, the atomic unit stored and searched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// `{doc_id}_{section}_{n}`, unique within one build.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// One similarity hit. `score` is the raw inner product and is not clamped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// A clean document ready for chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: DocId,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub text: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl SourceDocument {
    /// Reject documents that cannot produce a usable chunk and fill the
    /// resume-level defaults.
    pub fn validated(mut self) -> Result<Self> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidDocument("document id is empty".into()));
        }
        if self.text.trim().is_empty() {
            return Err(Error::InvalidDocument(format!("document '{}' has no text", self.id)));
        }
        if self.doc_type == DocType::Resume {
            self.name.get_or_insert_with(|| "Unknown Candidate".to_string());
            self.category.get_or_insert_with(|| "Unknown".to_string());
        }
        Ok(self)
    }
}

/// Caller-supplied chunk for standalone explanations.
///
/// Accepts `{content | text, section?}` as well as hit-shaped chunks that
/// carry the section under `metadata.section`; a top-level `section` wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "ResumeChunkWire")]
pub struct ResumeChunk {
    pub content: String,
    pub section: Option<String>,
}

#[derive(Deserialize)]
struct ResumeChunkWire {
    #[serde(alias = "text")]
    content: String,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    metadata: Option<SectionTag>,
}

#[derive(Deserialize)]
struct SectionTag {
    #[serde(default)]
    section: Option<String>,
}

impl From<ResumeChunkWire> for ResumeChunk {
    fn from(wire: ResumeChunkWire) -> Self {
        let section = wire.section.or_else(|| wire.metadata.and_then(|m| m.section));
        Self { content: wire.content, section }
    }
}

impl From<&SearchHit> for ResumeChunk {
    fn from(hit: &SearchHit) -> Self {
        Self { content: hit.content.clone(), section: Some(hit.metadata.section.clone()) }
    }
}
