use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata, DocType, SourceDocument};

pub const RESUME_SECTIONS: &[&str] = &[
    "Skills",
    "Education",
    "Experience",
    "Projects",
    "Tools",
    "Technologies",
    "Achievements",
    "Responsibilities",
    "Summary",
    "Profile",
];

pub const JD_SECTIONS: &[&str] = &[
    "Responsibilities",
    "Requirements",
    "Qualifications",
    "Basic Qualifications",
    "Preferred Qualifications",
    "Job Description",
];

pub const DEFAULT_SECTION: &str = "General";

/// A run of text under one section header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub text: String,
}

/// Reads clean documents and cuts them into section-tagged windows.
pub struct DataProcessor {
    chunking: ChunkingConfig,
    resume_headers: Regex,
    jd_headers: Regex,
}

impl DataProcessor {
    pub fn new(chunking: ChunkingConfig) -> Result<Self> {
        if chunking.chunk_size == 0 || chunking.overlap >= chunking.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap {} must be smaller than chunk size {}",
                chunking.overlap, chunking.chunk_size
            )));
        }
        Ok(Self {
            chunking,
            resume_headers: header_regex(RESUME_SECTIONS)?,
            jd_headers: header_regex(JD_SECTIONS)?,
        })
    }

    /// Load documents from a `.jsonl` file, or from every `.jsonl` file under a
    /// directory (sorted by path). Invalid lines are skipped with a warning.
    pub fn load_documents(&self, input: &Path) -> Result<Vec<SourceDocument>> {
        if !input.exists() {
            return Err(Error::NotFound(input.display().to_string()));
        }
        let files = if input.is_dir() {
            list_jsonl_files(input)
        } else {
            vec![input.to_path_buf()]
        };
        let mut documents = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "reading {}/{}", file_index + 1, files.len());
            let raw = fs::read_to_string(file_path)?;
            for (line_no, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let parsed = serde_json::from_str::<SourceDocument>(line)
                    .map_err(Error::from)
                    .and_then(SourceDocument::validated);
                match parsed {
                    Ok(doc) => documents.push(doc),
                    Err(e) => warn!(
                        file = %file_path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping document"
                    ),
                }
            }
        }
        info!(files = files.len(), documents = documents.len(), "loaded documents");
        Ok(documents)
    }

    pub fn process_documents(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = documents.iter().flat_map(|d| self.chunk_document(d)).collect();
        info!(documents = documents.len(), chunks = chunks.len(), "chunked documents");
        chunks
    }

    pub fn chunk_document(&self, doc: &SourceDocument) -> Vec<Chunk> {
        let headers = match doc.doc_type {
            DocType::Resume => &self.resume_headers,
            DocType::JobDescription => &self.jd_headers,
        };
        let mut chunks = Vec::new();
        for section in split_by_sections(&doc.text, headers) {
            for (chunk_idx, window) in self.windows(&section.text).into_iter().enumerate() {
                let metadata = ChunkMetadata {
                    doc_id: doc.id.clone(),
                    doc_type: doc.doc_type,
                    section: section.name.clone(),
                    name: doc.name.clone(),
                    category: doc.category.clone(),
                    title: doc.title.clone(),
                };
                chunks.push(Chunk {
                    id: format!("{}_{}_{}", doc.id, section.name, chunk_idx),
                    content: window,
                    metadata,
                });
            }
        }
        chunks
    }

    /// Fixed-size character windows advancing by `chunk_size - overlap`.
    fn windows(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunking.chunk_size - self.chunking.overlap;
        let mut out = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunking.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            start += step;
        }
        out
    }
}

fn header_regex(headers: &[&str]) -> Result<Regex> {
    let alternation = headers.iter().map(|h| regex::escape(h)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&format!("({})", alternation))
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidConfig(e.to_string()))
}

/// Split `text` at every header occurrence. Text before the first header is
/// filed under [`DEFAULT_SECTION`]; the header keeps the casing found in the
/// text.
pub fn split_by_sections(text: &str, headers: &Regex) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = DEFAULT_SECTION.to_string();
    let mut last = 0;
    let mut push = |name: &str, part: &str| {
        let part = part.trim();
        if !part.is_empty() {
            sections.push(Section { name: name.to_string(), text: part.to_string() });
        }
    };
    for m in headers.find_iter(text) {
        push(&current, &text[last..m.start()]);
        current = m.as_str().trim().to_string();
        last = m.end();
    }
    push(&current, &text[last..]);
    sections
}

fn list_jsonl_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("jsonl"))
        .collect();
    files.sort();
    files
}
