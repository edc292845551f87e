//! Content codec.
//!
//! Splits a document's YAML metadata block from its markdown body (and merges
//! them back), and converts text to and from the base64 transport encoding
//! the remote content API requires.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_yaml::{Mapping, Value};

use crate::errors::AppError;
use crate::models::DocumentMetadata;

const DELIMITER: &str = "---";

/// Split raw document text into its metadata block and body.
///
/// Text without a leading block comes back unchanged as the body. A block
/// whose YAML cannot be parsed yields empty metadata; the body is still the
/// text after the closing delimiter.
pub fn split_metadata_and_body(raw: &str) -> (DocumentMetadata, String) {
    match locate_block(raw) {
        Some((yaml, body)) => (parse_metadata(yaml), body.to_string()),
        None => (DocumentMetadata::default(), raw.to_string()),
    }
}

/// Merge metadata and body into raw document text.
///
/// Right inverse of [`split_metadata_and_body`].
pub fn merge_metadata_and_body(
    body: &str,
    metadata: &DocumentMetadata,
) -> Result<String, AppError> {
    if metadata.is_empty() {
        // A body that itself opens with a block needs an empty one in front.
        if locate_block(body).is_none() {
            return Ok(body.to_string());
        }
        return Ok(format!("{DELIMITER}\n{DELIMITER}\n{body}"));
    }

    let yaml = serde_yaml::to_string(metadata)
        .map_err(|e| AppError::Internal(format!("Failed to serialize metadata: {}", e)))?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{body}"))
}

/// Encode text for upload.
pub fn encode_for_transport(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a transport payload back to text.
///
/// The remote wraps its base64 at fixed widths, so embedded whitespace is
/// ignored.
pub fn decode_from_transport(blob: &str) -> Result<String, AppError> {
    let compact: String = blob.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::Decode(format!("Invalid base64 payload: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Decode(format!("Payload is not valid UTF-8: {}", e)))
}

/// Find the YAML between the opening and closing `---` lines.
fn locate_block(raw: &str) -> Option<(&str, &str)> {
    let opening_end = raw.find('\n')?;
    if raw[..opening_end].trim_end_matches('\r') != DELIMITER {
        return None;
    }

    let yaml_start = opening_end + 1;
    let mut pos = yaml_start;
    loop {
        let line_end = raw[pos..].find('\n').map(|i| pos + i);
        let line = &raw[pos..line_end.unwrap_or(raw.len())];
        if line.trim_end_matches('\r') == DELIMITER {
            let body = match line_end {
                Some(end) => &raw[end + 1..],
                None => "",
            };
            return Some((&raw[yaml_start..pos], body));
        }
        match line_end {
            Some(end) => pos = end + 1,
            None => return None,
        }
    }
}

fn parse_metadata(yaml: &str) -> DocumentMetadata {
    if yaml.trim().is_empty() {
        return DocumentMetadata::default();
    }

    let mapping = match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(_) => return DocumentMetadata::default(),
        Err(e) => {
            tracing::warn!("Ignoring malformed metadata block: {}", e);
            return DocumentMetadata::default();
        }
    };

    DocumentMetadata {
        title: scalar_text(&mapping, "title"),
        category: scalar_text(&mapping, "category"),
        order: integer(&mapping, "order"),
        priority: scalar_text(&mapping, "priority"),
    }
}

fn scalar_text(mapping: &Mapping, key: &str) -> Option<String> {
    match mapping.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer(mapping: &Mapping, key: &str) -> Option<i64> {
    match mapping.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(title: &str, category: &str, order: Option<i64>, priority: Option<&str>) -> DocumentMetadata {
        DocumentMetadata {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            order,
            priority: priority.map(str::to_string),
        }
    }

    #[test]
    fn test_split_reads_recognized_keys() {
        let raw = "---\ntitle: Getting Started\ncategory: documentation\norder: 2\npriority: high\nauthor: someone\n---\n# Hello\n";
        let (metadata, body) = split_metadata_and_body(raw);

        assert_eq!(
            metadata,
            meta("Getting Started", "documentation", Some(2), Some("high"))
        );
        assert_eq!(body, "# Hello\n");
    }

    #[test]
    fn test_split_without_block_returns_raw_body() {
        let raw = "# Just markdown\n\n---\n\nwith a rule";
        let (metadata, body) = split_metadata_and_body(raw);

        assert!(metadata.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_split_unterminated_block_is_body() {
        let raw = "---\ntitle: Oops\nno closing line";
        let (metadata, body) = split_metadata_and_body(raw);

        assert!(metadata.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_split_malformed_yaml_yields_empty_metadata() {
        let raw = "---\ntitle: [unclosed\n---\nbody text";
        let (metadata, body) = split_metadata_and_body(raw);

        assert!(metadata.is_empty());
        assert_eq!(body, "body text");
    }

    #[test]
    fn test_split_accepts_crlf_delimiters() {
        let raw = "---\r\ntitle: Windows\r\ncategory: tasks\r\n---\r\nline one\r\n";
        let (metadata, body) = split_metadata_and_body(raw);

        assert_eq!(metadata.title.as_deref(), Some("Windows"));
        assert_eq!(metadata.category.as_deref(), Some("tasks"));
        assert_eq!(body, "line one\r\n");
    }

    #[test]
    fn test_split_is_lenient_per_field() {
        let raw = "---\ntitle: 2024\norder: \"7\"\npriority: [a, b]\n---\n";
        let (metadata, body) = split_metadata_and_body(raw);

        assert_eq!(metadata.title.as_deref(), Some("2024"));
        assert_eq!(metadata.order, Some(7));
        assert_eq!(metadata.priority, None);
        assert_eq!(body, "");
    }

    #[test]
    fn test_merge_then_split_round_trips() {
        let cases = [
            (meta("Intro", "documentation", Some(1), None), "# Intro\n\nWelcome."),
            (meta("Plan: Q3", "current-plan", None, Some("medium")), ""),
            (meta("123", "tasks", Some(-4), Some("low")), "---\nnot metadata\n---\n"),
            (meta("Ünïcödé ✓ 日本語", "future-plans", Some(0), None), "Body — with → symbols\n"),
            (meta("multi\nline: title", "recipes", None, Some("urgent")), "text\r\nwith crlf\r\n"),
            (meta("---", "documentation", None, None), "---"),
            (DocumentMetadata::default(), "plain body\n"),
            (DocumentMetadata::default(), "---\ntitle: looks like metadata\n---\nbody"),
            (
                DocumentMetadata {
                    order: Some(3),
                    ..Default::default()
                },
                "",
            ),
        ];

        for (metadata, body) in cases {
            let raw = merge_metadata_and_body(body, &metadata).unwrap();
            let (split_meta, split_body) = split_metadata_and_body(&raw);
            assert_eq!(split_meta, metadata, "metadata mismatch for {:?}", raw);
            assert_eq!(split_body, body, "body mismatch for {:?}", raw);
        }
    }

    #[test]
    fn test_merge_without_metadata_keeps_body_verbatim() {
        let raw = merge_metadata_and_body("# Title\n", &DocumentMetadata::default()).unwrap();
        assert_eq!(raw, "# Title\n");
    }

    #[test]
    fn test_transport_round_trips_unicode() {
        let samples = [
            "",
            "plain ascii",
            "naïve café — “quotes”",
            "emoji 🚀🔥 and 中文 and العربية",
            "line\nbreaks\r\nand\ttabs",
        ];
        for text in samples {
            let blob = encode_for_transport(text);
            assert!(blob.is_ascii());
            assert_eq!(decode_from_transport(&blob).unwrap(), text);
        }
    }

    #[test]
    fn test_decode_ignores_line_wrapping() {
        let blob = encode_for_transport("a somewhat longer piece of text that wraps");
        let (head, tail) = blob.split_at(10);
        let wrapped = format!("{}\n{}\n", head, tail);
        assert_eq!(
            decode_from_transport(&wrapped).unwrap(),
            "a somewhat longer piece of text that wraps"
        );
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        assert!(matches!(
            decode_from_transport("not base64!!"),
            Err(AppError::Decode(_))
        ));
        // Valid base64, invalid UTF-8.
        let blob = STANDARD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(decode_from_transport(&blob), Err(AppError::Decode(_))));
    }
}
