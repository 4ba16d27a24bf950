//! In-memory document corpus backing the document tools

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const SAMPLE_DOCUMENTS: &str = include_str!("../../data/sample_documents.json");

/// Relative tolerance for an "approximate" amount match
const APPROXIMATE_TOLERANCE: f64 = 0.10;

/// A stored document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub doc_type: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub parties: Vec<String>,
    pub content: String,
}

impl Document {
    fn haystack(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.id,
            self.title,
            self.doc_type,
            self.parties.join(" "),
            self.content
        )
        .to_lowercase()
    }
}

/// How an amount is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Over,
    Under,
    Exact,
    Approximate,
}

impl Comparison {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "over" | "above" | "greater" => Some(Comparison::Over),
            "under" | "below" | "less" => Some(Comparison::Under),
            "exact" | "exactly" | "equal" => Some(Comparison::Exact),
            "approximate" | "around" | "about" => Some(Comparison::Approximate),
            _ => None,
        }
    }

    fn matches(&self, value: f64, target: f64) -> bool {
        match self {
            Comparison::Over => value > target,
            Comparison::Under => value < target,
            Comparison::Exact => (value - target).abs() < 0.005,
            Comparison::Approximate => (value - target).abs() <= target.abs() * APPROXIMATE_TOLERANCE,
        }
    }
}

/// Aggregate figures over the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total_documents: usize,
    pub by_type: BTreeMap<String, usize>,
    pub total_amount: f64,
    pub average_amount: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// The bundled invoices, contracts and claims
    pub fn sample() -> anyhow::Result<Self> {
        let documents: Vec<Document> =
            serde_json::from_str(SAMPLE_DOCUMENTS).context("Bundled sample corpus is invalid")?;
        Ok(Self::new(documents))
    }

    /// Load a JSON array of documents
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read documents from {}", path.display()))?;
        let documents: Vec<Document> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse documents in {}", path.display()))?;
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Documents containing any query term, most matching terms first
    pub fn search_keyword(&self, query: &str) -> Vec<&Document> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| {
                t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
                    .to_lowercase()
            })
            .filter(|t| t.len() > 1)
            .collect();
        if terms.is_empty() {
            return vec![];
        }

        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let haystack = doc.haystack();
                let score = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (score > 0).then_some((score, doc))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, doc)| doc).collect()
    }

    /// Documents of a type; a trailing plural `s` is ignored
    pub fn search_type(&self, doc_type: &str) -> Vec<&Document> {
        let wanted = doc_type.trim().to_lowercase();
        let wanted = wanted.strip_suffix('s').unwrap_or(&wanted);
        self.documents
            .iter()
            .filter(|d| d.doc_type.to_lowercase() == wanted)
            .collect()
    }

    pub fn search_amount(&self, comparison: Comparison, amount: f64) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| d.amount.is_some_and(|a| comparison.matches(a, amount)))
            .collect()
    }

    /// Documents with an amount in `[min, max]`; either bound may be open
    pub fn search_range(&self, min: Option<f64>, max: Option<f64>) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| {
                d.amount.is_some_and(|a| {
                    min.is_none_or(|min| a >= min) && max.is_none_or(|max| a <= max)
                })
            })
            .collect()
    }

    pub fn statistics(&self) -> Statistics {
        let mut by_type = BTreeMap::new();
        for doc in &self.documents {
            *by_type.entry(doc.doc_type.clone()).or_insert(0) += 1;
        }
        let amounts: Vec<f64> = self.documents.iter().filter_map(|d| d.amount).collect();
        let total_amount: f64 = amounts.iter().sum();
        Statistics {
            total_documents: self.documents.len(),
            by_type,
            total_amount,
            average_amount: (!amounts.is_empty()).then(|| total_amount / amounts.len() as f64),
        }
    }
}

/// `$1,234.50`
pub fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}${}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DocumentStore {
        DocumentStore::sample().unwrap()
    }

    #[test]
    fn test_sample_loads() {
        let store = store();
        assert_eq!(store.len(), 8);
        assert!(store.get("INV-001").is_some());
        assert!(store.get("inv-001").is_some());
        assert!(store.get("INV-999").is_none());
    }

    #[test]
    fn test_keyword_search_ranks() {
        let store = store();
        let results = store.search_keyword("TechStart license");
        assert!(!results.is_empty());
        assert_eq!(results[0].id, "CON-002");
        assert!(store.search_keyword("zzzz").is_empty());
        assert!(store.search_keyword("  ").is_empty());
    }

    #[test]
    fn test_type_search_plural() {
        let store = store();
        assert_eq!(store.search_type("contracts").len(), 2);
        assert_eq!(store.search_type("Invoice").len(), 4);
    }

    #[test]
    fn test_amount_comparisons() {
        let store = store();
        let over: Vec<_> = store
            .search_amount(Comparison::Over, 50_000.0)
            .iter()
            .map(|d| d.id.clone())
            .collect();
        assert_eq!(over, vec!["INV-002", "INV-003", "CON-001", "CON-002"]);
        assert_eq!(store.search_amount(Comparison::Exact, 22_000.0).len(), 1);
        assert_eq!(store.search_amount(Comparison::Approximate, 13_000.0)[0].id, "CLM-001");
        assert_eq!(store.search_amount(Comparison::Under, 4_000.0)[0].id, "CLM-002");
    }

    #[test]
    fn test_range_search() {
        let store = store();
        assert_eq!(store.search_range(Some(10_000.0), Some(25_000.0)).len(), 2);
        assert_eq!(store.search_range(None, Some(5_000.0)).len(), 2);
    }

    #[test]
    fn test_statistics() {
        let stats = store().statistics();
        assert_eq!(stats.total_documents, 8);
        assert_eq!(stats.by_type["claim"], 2);
        assert_eq!(stats.total_amount, 601_250.0);
        assert!(stats.average_amount.is_some());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(22000.0), "$22,000.00");
        assert_eq!(format_amount(1234.5), "$1,234.50");
        assert_eq!(format_amount(999.0), "$999.00");
        assert_eq!(format_amount(-1500.25), "-$1,500.25");
    }
}
