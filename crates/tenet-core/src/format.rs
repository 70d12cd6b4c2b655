//! Parsing of the `Answer:` / `Sources:` / `Details:` response layout.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAnswer {
    pub answer: String,
    /// Source lines with the leading bullet removed.
    pub sources: Vec<String>,
    pub details: String,
    /// Whether a `Sources:` header was present at all.
    pub has_sources: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Part {
    Answer,
    Sources,
    Details,
}

/// Match a section header, returning the part and any text after the colon.
fn header(line: &str) -> Option<(Part, &str)> {
    let trimmed = line.trim_start();
    let (name, rest) = trimmed.split_once(':')?;
    let part = match name.trim().to_ascii_lowercase().as_str() {
        "answer" | "answer (stub)" => Part::Answer,
        "sources" => Part::Sources,
        "details" => Part::Details,
        _ => return None,
    };
    Some((part, rest.trim()))
}

/// Split a generated answer into its sections.
///
/// Text before any header counts as the answer. Missing sections come back empty.
#[must_use]
pub fn parse_answer(text: &str) -> ParsedAnswer {
    let mut answer = Vec::new();
    let mut sources = Vec::new();
    let mut details = Vec::new();
    let mut has_sources = false;
    let mut part = Part::Answer;

    for line in text.lines() {
        let content = if let Some((next, rest)) = header(line) {
            part = next;
            has_sources |= next == Part::Sources;
            if rest.is_empty() {
                continue;
            }
            rest
        } else {
            line
        };

        match part {
            Part::Answer => answer.push(content),
            Part::Details => details.push(content),
            Part::Sources => {
                let source = content.trim().trim_start_matches(['-', '*']).trim();
                if !source.is_empty() {
                    sources.push(source.to_owned());
                }
            }
        }
    }

    ParsedAnswer {
        answer: answer.join("\n").trim().to_owned(),
        sources,
        details: details.join("\n").trim().to_owned(),
        has_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let text = "Answer:\nReturns are accepted within 30 days.\n\nSources:\n- Returns_and_Refunds.md — Refund Window\n- Warranty_Policy.md — Coverage\n\nDetails:\nDamaged items follow the warranty process.";
        let parsed = parse_answer(text);
        assert_eq!(parsed.answer, "Returns are accepted within 30 days.");
        assert_eq!(
            parsed.sources,
            vec![
                "Returns_and_Refunds.md — Refund Window",
                "Warranty_Policy.md — Coverage"
            ]
        );
        assert_eq!(parsed.details, "Damaged items follow the warranty process.");
        assert!(parsed.has_sources);
    }

    #[test]
    fn inline_header_content_is_kept() {
        let parsed = parse_answer("Answer: Yes.\nDetails: None.");
        assert_eq!(parsed.answer, "Yes.");
        assert_eq!(parsed.details, "None.");
        assert!(!parsed.has_sources);
    }

    #[test]
    fn free_text_is_the_answer() {
        let parsed = parse_answer("Refunds take 5-7 business days.");
        assert_eq!(parsed.answer, "Refunds take 5-7 business days.");
        assert!(parsed.sources.is_empty());
        assert!(parsed.details.is_empty());
    }

    #[test]
    fn colons_inside_prose_are_not_headers() {
        let parsed = parse_answer("Answer:\nNote: bulky items ship separately.");
        assert_eq!(parsed.answer, "Note: bulky items ship separately.");
    }

    #[test]
    fn headers_are_case_insensitive() {
        let parsed = parse_answer("ANSWER:\nok\nsources:\n* A.md — B");
        assert_eq!(parsed.answer, "ok");
        assert_eq!(parsed.sources, vec!["A.md — B"]);
    }
}
