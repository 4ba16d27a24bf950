//! Patterns pulled out of raw tool output

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// `ID: <token>` where token is word characters and hyphens
static DOCUMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ID: ([\w-]+)").expect("document id pattern is valid"));

/// `result ... is <number>` as printed by the calculator
static CALCULATOR_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"result.*?is\s*([\d.,]+)").expect("calculator result pattern is valid")
});

/// Every document id mentioned in `text`, deduplicated
pub fn extract_document_ids(text: &str) -> BTreeSet<String> {
    DOCUMENT_ID
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The number in the first `result ... is <number>` phrase, with thousands
/// separators removed. `None` when absent or not a number.
pub fn parse_calculator_result(text: &str) -> Option<f64> {
    let captured = CALCULATOR_RESULT.captures(text)?.get(1)?.as_str();
    captured.replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ids() {
        let text = "Found 2 documents:\n- ID: INV-001 (invoice)\n- ID: CON_7 (contract)";
        let ids = extract_document_ids(text);
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec!["CON_7".to_string(), "INV-001".to_string()]
        );
    }

    #[test]
    fn test_extract_ids_deduplicates() {
        let ids = extract_document_ids("ID: A-1 then ID: A-1 again, ID: B-2");
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_extract_ids_idempotent_and_order_independent() {
        let a = "ID: X-1\nID: Y-2";
        let b = "ID: Y-2\nID: X-1";
        assert_eq!(extract_document_ids(a), extract_document_ids(b));

        let rendered: String = extract_document_ids(a)
            .iter()
            .map(|id| format!("ID: {}\n", id))
            .collect();
        assert_eq!(extract_document_ids(&rendered), extract_document_ids(a));
    }

    #[test]
    fn test_extract_ids_requires_exact_marker() {
        assert!(extract_document_ids("id: INV-001, ID:INV-002").is_empty());
    }

    #[test]
    fn test_parse_result_with_separators() {
        assert_eq!(parse_calculator_result("The result is 1,234.50"), Some(1234.5));
    }

    #[test]
    fn test_parse_result_calculator_phrase() {
        assert_eq!(
            parse_calculator_result("The result of 1500 + 2500 is 4000"),
            Some(4000.0)
        );
    }

    #[test]
    fn test_parse_result_first_match_only() {
        assert_eq!(
            parse_calculator_result("result is 3\nresult is 9"),
            Some(3.0)
        );
    }

    #[test]
    fn test_parse_result_absent() {
        assert_eq!(parse_calculator_result("Error: division by zero"), None);
        assert_eq!(parse_calculator_result(""), None);
    }

    #[test]
    fn test_parse_result_unparsable_capture() {
        assert_eq!(parse_calculator_result("the result is ."), None);
        assert_eq!(parse_calculator_result("result is 1.2.3"), None);
    }
}
