//! Heading-aware word-window chunking.
//!
//! Documents are first cut into Markdown sections; every section is then windowed into
//! overlapping runs of whitespace-separated words. Each chunk carries its section label,
//! heading depth and a keyword-derived priority used later as a ranking boost.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::identity::{chunk_id, content_hash};

const BODY_LABEL: &str = "Body";
const MAX_HEADING_LEVEL: usize = 3;

const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "sla",
    "policy",
    "terms",
    "conditions",
    "refund",
    "warranty",
    "compliance",
];
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &[
    "guide",
    "catalog",
    "exclusions",
    "cut-off",
    "shipping",
    "delivery",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPriority {
    High,
    Medium,
}

impl SectionPriority {
    /// Case-insensitive keyword match against a section label.
    #[must_use]
    pub fn detect(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if HIGH_PRIORITY_KEYWORDS.iter().any(|k| label.contains(k)) {
            Some(Self::High)
        } else if MEDIUM_PRIORITY_KEYWORDS.iter().any(|k| label.contains(k)) {
            Some(Self::Medium)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            _ => None,
        }
    }
}

impl fmt::Display for SectionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub title: String,
    pub section: String,
    pub text: String,
    pub heading_level: Option<u8>,
    pub section_priority: Option<SectionPriority>,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    /// `None` for the leading body and for headings deeper than level 3.
    pub heading_level: Option<u8>,
    /// Section text including its heading line.
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Window length in words.
    pub chunk_size: usize,
    /// Words shared by consecutive windows; must be smaller than `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 700,
            overlap: 80,
        }
    }
}

fn is_heading(line: &str) -> bool {
    let rest = line.trim_start_matches('#');
    rest.len() < line.len() && (rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Split a document into Markdown sections.
#[must_use]
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            if is_heading(line) {
                parts.push(std::mem::take(&mut current));
            } else {
                current.push('\n');
            }
        }
        current.push_str(line);
    }
    parts.push(current);

    let sections: Vec<Section> = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| {
            let first_line = p.lines().next().unwrap_or_default();
            if is_heading(first_line) {
                let level = first_line.len() - first_line.trim_start_matches('#').len();
                Section {
                    label: first_line.trim_start_matches(['#', ' ']).trim().to_owned(),
                    heading_level: u8::try_from(level)
                        .ok()
                        .filter(|_| level <= MAX_HEADING_LEVEL),
                    text: p.to_owned(),
                }
            } else {
                Section {
                    label: BODY_LABEL.to_owned(),
                    heading_level: None,
                    text: p.to_owned(),
                }
            }
        })
        .collect();

    if sections.is_empty() {
        vec![Section {
            label: BODY_LABEL.to_owned(),
            heading_level: None,
            text: text.to_owned(),
        }]
    } else {
        sections
    }
}

/// Window `text` into runs of `size` words advancing by `size - overlap`.
#[must_use]
pub fn word_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let step = size.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + size).min(tokens.len());
        windows.push(tokens[start..end].join(" "));
        if start + size >= tokens.len() {
            break;
        }
        start += step;
    }
    windows
}

/// Chunk one document, assigning every chunk its content-addressed id.
#[must_use]
pub fn chunk_document(document: &Document, config: &ChunkerConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for section in split_sections(&document.text) {
        let priority = SectionPriority::detect(&section.label);
        for text in word_windows(&section.text, config.chunk_size, config.overlap) {
            chunks.push(Chunk {
                id: chunk_id(&document.title, &section.label, &text).to_string(),
                content_hash: content_hash(&document.title, &section.label, &text),
                title: document.title.clone(),
                section: section.label.clone(),
                text,
                heading_level: section.heading_level,
                section_priority: priority,
            });
        }
    }
    chunks
}
