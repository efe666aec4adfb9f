use std::fs;
use tempfile::TempDir;

use resumedb_core::config::{ChunkingConfig, Config, LlmBackend, Settings};
use resumedb_core::data_processor::DataProcessor;
use resumedb_core::types::{DocType, ResumeChunk, SourceDocument};
use resumedb_core::Error;

fn resume(id: &str, text: &str) -> SourceDocument {
    SourceDocument {
        id: id.to_string(),
        doc_type: DocType::Resume,
        text: text.to_string(),
        name: None,
        category: Some("Data Science".to_string()),
        title: None,
    }
}

#[test]
fn resume_sections_become_tagged_chunks() {
    let processor = DataProcessor::new(ChunkingConfig::default()).expect("processor");
    let doc = resume("resume_1", "Jane Doe. Skills Python, Rust EXPERIENCE Five years at Acme");
    let chunks = processor.chunk_document(&doc);

    let sections: Vec<&str> = chunks.iter().map(|c| c.metadata.section.as_str()).collect();
    assert_eq!(sections, vec!["General", "Skills", "EXPERIENCE"]);
    assert_eq!(chunks[1].content, "Python, Rust");
    assert_eq!(chunks[1].id, "resume_1_Skills_0");
    assert!(chunks.iter().all(|c| c.metadata.doc_type == DocType::Resume));
    assert!(chunks.iter().all(|c| c.metadata.category.as_deref() == Some("Data Science")));
}

#[test]
fn job_description_uses_its_own_headers() {
    let processor = DataProcessor::new(ChunkingConfig::default()).expect("processor");
    let doc = SourceDocument {
        id: "jd_7".into(),
        doc_type: DocType::JobDescription,
        text: "Requirements SQL and dashboards Skills are listed above".into(),
        name: None,
        category: None,
        title: Some("Analyst".into()),
    };
    let chunks = processor.chunk_document(&doc);
    assert_eq!(chunks.len(), 1, "'Skills' is not a job description header");
    assert_eq!(chunks[0].metadata.section, "Requirements");
    assert_eq!(chunks[0].metadata.title.as_deref(), Some("Analyst"));
}

#[test]
fn long_sections_are_windowed_with_overlap() {
    let chunking = ChunkingConfig { chunk_size: 10, overlap: 4 };
    let processor = DataProcessor::new(chunking).expect("processor");
    let doc = resume("r", "abcdefghijklmnopqrst");
    let chunks = processor.chunk_document(&doc);
    let windows: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(windows, vec!["abcdefghij", "ghijklmnop", "mnopqrst", "st"]);
}

#[test]
fn overlap_must_be_smaller_than_window() {
    let chunking = ChunkingConfig { chunk_size: 5, overlap: 5 };
    let err = DataProcessor::new(chunking).err().expect("rejected");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn load_documents_skips_invalid_lines_and_fills_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("docs.jsonl");
    let lines = [
        r#"{"id":"resume_1","type":"resume","text":"Skills Go"}"#,
        r#"{"id":"","type":"resume","text":"no id"}"#,
        "not json",
        "",
        r#"{"id":"jd_1","type":"job_description","text":"Requirements Go","title":"Backend"}"#,
    ];
    fs::write(&path, lines.join("\n")).unwrap();

    let processor = DataProcessor::new(ChunkingConfig::default()).unwrap();
    let docs = processor.load_documents(&path).expect("load");
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].name.as_deref(), Some("Unknown Candidate"));
    assert_eq!(docs[0].category.as_deref(), Some("Unknown"));
    assert_eq!(docs[1].doc_type, DocType::JobDescription);
    assert_eq!(docs[1].name, None);
}

#[test]
fn load_documents_missing_path_is_not_found() {
    let processor = DataProcessor::new(ChunkingConfig::default()).unwrap();
    let missing = std::path::Path::new("/definitely/missing.jsonl");
    let err = processor.load_documents(missing).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn config_layers_files_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[server]\nport = 9100\n[scoring]\nmax_chunks = 8\n")?;
        jail.create_file("config.test.toml", "[llm]\nbackend = \"ollama\"\n")?;
        jail.set_env("APP_SERVER__HOST", "0.0.0.0");

        let config = Config::load_from(jail.directory(), "test").expect("config");
        let settings = config.settings().expect("settings");
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.scoring.max_chunks, 8);
        assert_eq!(settings.llm.backend, LlmBackend::Ollama);
        assert_eq!(settings.search.min_candidates, 500, "untouched sections keep defaults");
        Ok(())
    });
}

#[test]
fn settings_validation_rejects_bad_chunking() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());
    settings.chunking.overlap = settings.chunking.chunk_size;
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn resume_chunk_reads_flat_and_hit_shaped_payloads() {
    let flat: ResumeChunk =
        serde_json::from_str(r#"{"content":"Rust, tokio","section":"Skills"}"#).unwrap();
    assert_eq!(flat.section.as_deref(), Some("Skills"));

    let hit_shaped: ResumeChunk = serde_json::from_value(serde_json::json!({
        "text": "Rust, tokio",
        "metadata": {"doc_id": "r1", "type": "resume", "section": "Skills"},
        "score": 0.9
    }))
    .unwrap();
    assert_eq!(hit_shaped.content, "Rust, tokio");
    assert_eq!(hit_shaped.section.as_deref(), Some("Skills"));

    let both: ResumeChunk = serde_json::from_str(
        r#"{"text":"x","section":"Projects","metadata":{"section":"Skills"}}"#,
    )
    .unwrap();
    assert_eq!(both.section.as_deref(), Some("Projects"));

    let bare: ResumeChunk = serde_json::from_str(r#"{"text":"x","metadata":{}}"#).unwrap();
    assert_eq!(bare.section, None);
}
