use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use super::stop_words::is_stop_word;

/// Vocabulary cap applied when fitting tag text
pub const MAX_FEATURES: usize = 5000;

/// Sparse row: `(feature index, weight)` pairs ordered by feature index
pub type SparseVector = Vec<(u32, f32)>;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Lowercased word tokens of at least two characters, stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// TF-IDF encoder with a capped vocabulary.
///
/// Term frequency is the raw count, idf is smoothed
/// (`ln((1 + n) / (1 + df)) + 1`) and every row is L2-normalised, so the
/// dot product of two rows is their cosine similarity.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn feature_index(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    /// Learns the vocabulary and idf weights, then encodes every document
    pub fn fit_transform(&mut self, documents: &[String]) -> Vec<SparseVector> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|doc| tokenize(doc)).collect();

        let mut totals: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            for token in tokens {
                *totals.entry(token.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();
        self.vocabulary = kept
            .iter()
            .enumerate()
            .map(|(index, term)| (term.to_string(), index as u32))
            .collect();

        let mut document_frequency = vec![0usize; self.vocabulary.len()];
        let counts: Vec<BTreeMap<u32, usize>> = tokenized
            .iter()
            .map(|tokens| self.term_counts(tokens))
            .collect();
        for row in &counts {
            for index in row.keys() {
                document_frequency[*index as usize] += 1;
            }
        }

        let n = documents.len() as f64;
        self.idf = document_frequency
            .iter()
            .map(|&df| (((1.0 + n) / (1.0 + df as f64)).ln() + 1.0) as f32)
            .collect();

        tracing::info!(
            documents = documents.len(),
            vocabulary = self.vocabulary.len(),
            "Fitted tf-idf vocabulary"
        );

        counts.iter().map(|row| self.weigh(row)).collect()
    }

    /// Encodes a document against the fitted vocabulary
    pub fn transform(&self, document: &str) -> SparseVector {
        self.weigh(&self.term_counts(&tokenize(document)))
    }

    fn term_counts(&self, tokens: &[String]) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_default() += 1;
            }
        }
        counts
    }

    fn weigh(&self, counts: &BTreeMap<u32, usize>) -> SparseVector {
        let mut row: SparseVector = counts
            .iter()
            .map(|(&index, &count)| (index, count as f32 * self.idf[index as usize]))
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, weight) in row.iter_mut() {
                *weight /= norm;
            }
        }
        row
    }
}
