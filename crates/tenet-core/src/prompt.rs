//! Prompt contract shared by every generator.

use std::path::Path;

use tenet_ingest::Chunk;

pub const BASE_ROLE: &str =
    "You are a helpful company policy assistant. Cite sources by title and section when relevant.";

pub const OUTPUT_FORMAT: &str = "You MUST respond in the following format:

Answer:
<2-4 sentence direct answer for the user>

Sources:
- <Document_Title.md> — <Section>
- <Document_Title.md> — <Section>

Details:
<Any additional explanation or important policy notes>";

const CLOSING_INSTRUCTION: &str =
    "Write a concise, accurate answer grounded in the sources. If unsure, say so.";

/// Characters of each chunk quoted in the user prompt and in stub details.
pub const EXCERPT_CHARS: usize = 600;

/// First `max` characters of `s`.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Read the agent guide, treating a missing file as an empty guide.
pub async fn load_agent_guide(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "agent guide not loaded");
            String::new()
        }
    }
}

/// System prompt: base role, optional agent guide, required output format.
#[must_use]
pub fn system_prompt(agent_guide: &str) -> String {
    let mut prompt = BASE_ROLE.to_owned();
    if !agent_guide.trim().is_empty() {
        prompt.push_str("\n\nInternal SOP for agents:\n");
        prompt.push_str(agent_guide);
    }
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_FORMAT);
    prompt
}

#[must_use]
pub fn user_prompt(query: &str, chunks: &[Chunk]) -> String {
    let mut prompt = format!("Question: {query}\nSources:\n");
    for c in chunks {
        prompt.push_str(&format!(
            "- {} | {}\n{}\n---\n",
            c.title,
            c.section,
            truncate_chars(&c.text, EXCERPT_CHARS)
        ));
    }
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}
