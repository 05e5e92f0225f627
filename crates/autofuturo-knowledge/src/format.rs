//! Rendering of search matches into the text block handed to the LLM.

use crate::store::MatchRecord;
use serde_json::Value;
use std::fmt::Write;

/// Placeholder printed when a match has no identifier.
const MISSING_ID: &str = "N/A";

/// Converts CRLF line endings to LF and trims surrounding whitespace.
///
/// Every run of CRs directly before a LF is dropped, so `\r\r\n` also ends
/// up as `\n` and the output never contains a CRLF pair. Applying it twice
/// yields the same result as applying it once.
pub fn normalize_content(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pending_cr = 0usize;
    for c in content.chars() {
        match c {
            '\r' => pending_cr += 1,
            '\n' => {
                pending_cr = 0;
                out.push('\n');
            }
            other => {
                out.extend(std::iter::repeat('\r').take(pending_cr));
                pending_cr = 0;
                out.push(other);
            }
        }
    }
    out.extend(std::iter::repeat('\r').take(pending_cr));
    out.trim().to_string()
}

fn display_id(id: Option<&Value>) -> String {
    match id {
        None | Some(Value::Null) => MISSING_ID.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Renders matches as numbered reference blocks, in the order given.
///
/// Each block is followed by a blank line. An empty slice renders as an
/// empty string.
pub fn format_references(records: &[MatchRecord]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        let n = i + 1;
        let content = normalize_content(record.content.as_deref().unwrap_or_default());
        let similarity = record.similarity.unwrap_or(0.0);
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{n}. **referencia {n} - Inicio**\n\
             id: {id}\n\
             similarity: {similarity:.4}\n\
             content: {content}\n\
             **fin de referencia {n}**\n\n",
            id = display_id(record.id.as_ref()),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Value, similarity: f64, content: &str) -> MatchRecord {
        MatchRecord {
            id: Some(id),
            similarity: Some(similarity),
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn single_match_renders_exact_block() {
        let out = format_references(&[record(
            Value::from(7),
            0.8123,
            "Ofrecemos financiamiento a 36 meses.\r\n",
        )]);
        assert_eq!(
            out,
            "1. **referencia 1 - Inicio**\nid: 7\nsimilarity: 0.8123\ncontent: Ofrecemos financiamiento a 36 meses.\n**fin de referencia 1**\n\n"
        );
    }

    #[test]
    fn blocks_keep_store_order_and_numbering() {
        let records = vec![
            record(Value::from(3), 0.5, "tercero"),
            record(Value::from(1), 0.9, "primero"),
            record(Value::from(2), 0.7, "segundo"),
        ];
        let out = format_references(&records);

        assert_eq!(out.matches("- Inicio**").count(), 3);
        let first = out.find("content: tercero").unwrap();
        let second = out.find("content: primero").unwrap();
        let third = out.find("content: segundo").unwrap();
        assert!(first < second && second < third);
        assert!(out.contains("3. **referencia 3 - Inicio**\nid: 2\n"));
    }

    #[test]
    fn similarity_always_has_four_decimals() {
        let out = format_references(&[
            record(Value::from(1), 1.0, "a"),
            record(Value::from(2), 0.123456, "b"),
            record(Value::from(3), -0.5, "c"),
        ]);
        assert!(out.contains("similarity: 1.0000\n"));
        assert!(out.contains("similarity: 0.1235\n"));
        assert!(out.contains("similarity: -0.5000\n"));
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let out = format_references(&[MatchRecord::default()]);
        assert_eq!(
            out,
            "1. **referencia 1 - Inicio**\nid: N/A\nsimilarity: 0.0000\ncontent: \n**fin de referencia 1**\n\n"
        );
    }

    #[test]
    fn string_ids_are_printed_without_quotes() {
        let out = format_references(&[record(Value::from("doc-42"), 0.5, "x")]);
        assert!(out.contains("id: doc-42\n"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "  hola\r\nmundo \r\n",
            "\r\n\r\n",
            "sin cambios",
            "\t mixto\r\n\nlineas\r",
            "doble\r\r\nretorno",
            "solo\rcr",
            "",
        ];
        for sample in samples {
            let once = normalize_content(sample);
            assert_eq!(normalize_content(&once), once, "input: {sample:?}");
            assert!(!once.contains("\r\n"));
        }
    }

    #[test]
    fn carriage_return_runs_before_newline_are_dropped() {
        assert_eq!(normalize_content("a\r\r\nb"), "a\nb");
        assert_eq!(normalize_content("a\rb"), "a\rb");
    }

    #[test]
    fn empty_slice_renders_nothing() {
        assert_eq!(format_references(&[]), "");
    }
}
