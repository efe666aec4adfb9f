use resumedb_core::data_processor::DEFAULT_SECTION;
use resumedb_core::types::ResumeChunk;

const INSTRUCTIONS: &str = "You are an AI hiring assistant.

Analyze the candidate against the job description and respond STRICTLY in the format below.

Rules:
- Be concise
- Use short bullet points starting with \"-\" with new lines
- Do NOT use bold text
- Do NOT use markdown
- Do NOT use headings
- Plain text only
";

const RESPONSE_FORMAT: &str = "RESPONSE FORMAT:

Fit:
- point
- point

Gaps:
- point (if none, write \"No major gaps\")

Recommendation:
- Hire / Maybe / No-Hire (1 line reason)
";

/// Resume context block: one `Section:`/`Content:` pair per chunk.
pub fn resume_context(chunks: &[ResumeChunk]) -> String {
    chunks
        .iter()
        .map(|c| {
            let section = c.section.as_deref().unwrap_or(DEFAULT_SECTION);
            format!("\nSection: {}\nContent: {}\n", section, c.content)
        })
        .collect()
}

pub fn build_explanation_prompt(job_description: &str, chunks: &[ResumeChunk]) -> String {
    format!(
        "{INSTRUCTIONS}\nJOB DESCRIPTION:\n{}\n\nCANDIDATE RESUME:\n{}\n{RESPONSE_FORMAT}",
        job_description.trim(),
        resume_context(chunks)
    )
}
