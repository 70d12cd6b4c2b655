//! Answer generation: a deterministic stub or a networked chat provider.
//!
//! A networked provider that fails for any reason (auth, rate limit, timeout, transport,
//! empty reply) is replaced by the stub for that one request. The caller learns about it
//! through [`Generation::degraded`]; the request itself never fails.

use std::fmt::Write as _;
use std::time::Duration;

use tenet_ingest::Chunk;
use tenet_llm::{AnyProvider, LlmError, LlmProvider, Message};

use crate::format::parse_answer;
use crate::prompt::{EXCERPT_CHARS, truncate_chars};

const NO_MATCH_ANSWER: &str = "No relevant policy documents were found for this question.";
const NO_MATCH_DETAILS: &str =
    "Try rephrasing the question, or ingest the policy documents before asking.";
const LEAD_SENTENCE_CHARS: usize = 300;

#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    /// Retrieved chunks in rank order.
    pub chunks: &'a [Chunk],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Set when a networked provider failed and the stub answered instead.
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub enum Generator {
    Stub,
    Remote {
        provider: AnyProvider,
        timeout: Duration,
    },
}

impl Generator {
    /// Label used in metrics: `stub`, `openai:<model>` or `ollama:<model>`.
    #[must_use]
    pub fn model_label(&self) -> String {
        match self {
            Self::Stub => "stub".to_owned(),
            Self::Remote { provider, .. } => provider.model_label(),
        }
    }

    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Generation {
        match self {
            Self::Stub => Generation {
                text: stub_answer(request.chunks),
                degraded: false,
            },
            Self::Remote { provider, timeout } => {
                match call_provider(provider, *timeout, request).await {
                    Ok(text) => {
                        if !parse_answer(&text).has_sources {
                            tracing::debug!(
                                provider = provider.name(),
                                "generated answer has no Sources section"
                            );
                        }
                        Generation {
                            text,
                            degraded: false,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            provider = provider.name(),
                            error = %e,
                            "generation failed, answering with stub"
                        );
                        Generation {
                            text: stub_answer(request.chunks),
                            degraded: true,
                        }
                    }
                }
            }
        }
    }
}

async fn call_provider(
    provider: &AnyProvider,
    timeout: Duration,
    request: &GenerationRequest<'_>,
) -> Result<String, LlmError> {
    let messages = [
        Message::system(request.system_prompt),
        Message::user(request.user_prompt),
    ];
    let text = tokio::time::timeout(timeout, provider.chat(&messages))
        .await
        .map_err(|_| LlmError::Timeout)??;
    if text.trim().is_empty() {
        return Err(LlmError::Other(format!(
            "{} returned an empty answer",
            provider.name()
        )));
    }
    Ok(text)
}

/// Deterministic answer in the `Answer:` / `Sources:` / `Details:` layout.
#[must_use]
pub fn stub_answer(chunks: &[Chunk]) -> String {
    let Some(top) = chunks.first() else {
        return format!("Answer:\n{NO_MATCH_ANSWER}\n\nSources:\n\nDetails:\n{NO_MATCH_DETAILS}");
    };

    let mut out = String::from("Answer:\n");
    let lead = lead_sentence(top);
    if lead.is_empty() {
        let _ = writeln!(out, "See {} ({}).", top.title, top.section);
    } else {
        let _ = writeln!(out, "According to {} ({}): {lead}", top.title, top.section);
    }

    out.push_str("\nSources:\n");
    for c in chunks {
        let section = if c.section.is_empty() {
            "Section"
        } else {
            c.section.as_str()
        };
        let _ = writeln!(out, "- {} — {section}", c.title);
    }

    let joined = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let excerpt = truncate_chars(&joined, EXCERPT_CHARS);
    out.push_str("\nDetails:\n");
    out.push_str(excerpt);
    if excerpt.len() < joined.len() {
        out.push_str("...");
    }
    out
}

/// First sentence of a chunk, without the heading words that open its section.
fn lead_sentence(chunk: &Chunk) -> String {
    let mut text = chunk.text.trim();
    if text.starts_with('#') {
        text = text.trim_start_matches('#').trim_start();
        if let Some(rest) = text.strip_prefix(chunk.section.as_str()) {
            text = rest.trim_start();
        }
    }

    let mut end = text.len();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|(_, n)| n.is_whitespace()) {
            end = i + c.len_utf8();
            break;
        }
    }
    truncate_chars(&text[..end], LEAD_SENTENCE_CHARS).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(title: &str, section: &str, text: &str) -> Chunk {
        Chunk {
            id: String::new(),
            title: title.into(),
            section: section.into(),
            text: text.into(),
            heading_level: Some(2),
            section_priority: None,
            content_hash: String::new(),
        }
    }

    fn request<'a>(chunks: &'a [Chunk]) -> GenerationRequest<'a> {
        GenerationRequest {
            system_prompt: "system",
            user_prompt: "user",
            chunks,
        }
    }

    #[test]
    fn stub_uses_lead_sentence_of_top_chunk() {
        let chunks = [
            chunk(
                "Returns_and_Refunds.md",
                "Damaged Items",
                "## Damaged Items Damaged goods can be returned within 30 days. Bring the receipt.",
            ),
            chunk("Warranty_Policy.md", "Coverage", "Blenders are covered for 12 months."),
        ];
        let text = stub_answer(&chunks);
        let parsed = parse_answer(&text);
        assert_eq!(
            parsed.answer,
            "According to Returns_and_Refunds.md (Damaged Items): Damaged goods can be returned within 30 days."
        );
        assert_eq!(
            parsed.sources,
            vec![
                "Returns_and_Refunds.md — Damaged Items",
                "Warranty_Policy.md — Coverage"
            ]
        );
        assert!(parsed.details.starts_with("## Damaged Items Damaged goods"));
        assert!(!parsed.details.ends_with("..."));
    }

    #[test]
    fn stub_details_are_truncated() {
        let long = "word ".repeat(200);
        let text = stub_answer(&[chunk("A.md", "S", &long)]);
        let details = parse_answer(&text).details;
        assert!(details.ends_with("..."));
        assert!(details.chars().count() <= EXCERPT_CHARS + 3);
    }

    #[test]
    fn stub_without_chunks_says_nothing_found() {
        let parsed = parse_answer(&stub_answer(&[]));
        assert_eq!(parsed.answer, NO_MATCH_ANSWER);
        assert!(parsed.sources.is_empty());
        assert!(parsed.has_sources);
    }

    #[test]
    fn empty_section_label_is_named() {
        let text = stub_answer(&[chunk("A.md", "", "Plain text.")]);
        assert!(text.contains("- A.md — Section"));
    }

    #[test]
    fn lead_sentence_keeps_decimals() {
        let c = chunk("A.md", "Fees", "A fee of 4.50 applies. Other text.");
        assert_eq!(lead_sentence(&c), "A fee of 4.50 applies.");
    }

    #[tokio::test]
    async fn stub_generator_is_never_degraded() {
        let chunks = [chunk("A.md", "S", "Text.")];
        let g = Generator::Stub;
        let out = g.generate(&request(&chunks)).await;
        assert!(!out.degraded);
        assert_eq!(out.text, stub_answer(&chunks));
        assert_eq!(g.model_label(), "stub");
    }

    #[tokio::test]
    async fn remote_answer_is_returned() {
        use tenet_llm::mock::MockProvider;

        let mock = MockProvider::with_responses(vec![
            "Answer:\nYes.\n\nSources:\n- A.md — S\n\nDetails:\nNone.".into(),
        ]);
        let g = Generator::Remote {
            provider: AnyProvider::Mock(mock.clone()),
            timeout: Duration::from_secs(5),
        };
        let chunks = [chunk("A.md", "S", "Text.")];
        let out = g.generate(&request(&chunks)).await;
        assert!(!out.degraded);
        assert!(out.text.starts_with("Answer:\nYes."));

        let calls = mock.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].content, "system");
        assert_eq!(calls[0][1].content, "user");
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_stub() {
        use tenet_llm::mock::{MockFailure, MockProvider};

        for failure in [
            MockFailure::Unauthorized,
            MockFailure::RateLimited,
            MockFailure::Timeout,
        ] {
            let g = Generator::Remote {
                provider: AnyProvider::Mock(MockProvider::failing(failure)),
                timeout: Duration::from_secs(5),
            };
            let chunks = [chunk("A.md", "S", "Text.")];
            let out = g.generate(&request(&chunks)).await;
            assert!(out.degraded, "{failure:?} should degrade");
            assert_eq!(out.text, stub_answer(&chunks));
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_to_stub() {
        use tenet_llm::mock::MockProvider;

        let g = Generator::Remote {
            provider: AnyProvider::Mock(MockProvider::default().with_delay(500)),
            timeout: Duration::from_millis(20),
        };
        let out = g.generate(&request(&[])).await;
        assert!(out.degraded);
        assert_eq!(out.text, stub_answer(&[]));
    }

    #[tokio::test]
    async fn blank_reply_degrades() {
        use tenet_llm::mock::MockProvider;

        let g = Generator::Remote {
            provider: AnyProvider::Mock(MockProvider::with_responses(vec!["  \n".into()])),
            timeout: Duration::from_secs(5),
        };
        assert!(g.generate(&request(&[])).await.degraded);
    }
}
