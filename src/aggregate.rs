// src/aggregate.rs
//! Batch aggregation: label distribution, mean compound score, and top word frequencies.
//!
//! Top words are ranked by count (descending); equal counts keep first-occurrence order
//! in the combined normalized text.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnalyticsError, Result};
use crate::normalize::normalize;
use crate::sentiment::{SentimentLabel, SentimentResult, SentimentScorer};
use crate::stopwords::is_stopword;

pub const TOP_WORDS_LIMIT: usize = 20;
/// Tokens must be longer than this many characters.
pub const MIN_TOKEN_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// Sparse: labels that never occurred are absent.
    pub distribution: BTreeMap<SentimentLabel, usize>,
    pub average_compound: f64,
    pub total_texts: usize,
    pub top_words: Vec<WordCount>,
}

/// Lowercase, split on whitespace, drop stopwords and tokens of length <= 2.
pub fn tokens(normalized: &str) -> Vec<String> {
    normalized
        .to_lowercase()
        .split_whitespace()
        .filter(|w| !is_stopword(w) && w.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Count tokens and keep the `limit` most frequent.
pub fn top_words<S: AsRef<str>>(tokens: &[S], limit: usize) -> Vec<WordCount> {
    // word -> (count, first index)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, t) in tokens.iter().enumerate() {
        counts.entry(t.as_ref()).or_insert((0, i)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(w, (c, first))| (w, c, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(word, count, _)| WordCount {
            word: word.to_string(),
            count,
        })
        .collect()
}

/// Pure aggregation over already-scored results and their normalized texts.
pub fn summarize<S: AsRef<str>>(
    results: &[SentimentResult],
    normalized_texts: &[S],
) -> Result<BatchAnalysis> {
    if results.is_empty() {
        return Err(AnalyticsError::EmptyBatch);
    }

    let mut distribution = BTreeMap::new();
    for r in results {
        *distribution.entry(r.label).or_insert(0usize) += 1;
    }

    let sum: f64 = results.iter().map(|r| r.score_triple.compound).sum();
    let average_compound = sum / results.len() as f64;

    let combined = normalized_texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    let toks = tokens(&combined);

    Ok(BatchAnalysis {
        distribution,
        average_compound,
        total_texts: results.len(),
        top_words: top_words(&toks, TOP_WORDS_LIMIT),
    })
}

/// Score every text and aggregate. Fails with `EmptyBatch` before any estimator call.
pub async fn aggregate(scorer: &SentimentScorer, texts: &[String]) -> Result<BatchAnalysis> {
    Ok(aggregate_with_results(scorer, texts).await?.0)
}

/// Like [`aggregate`], also returning the per-text results in input order.
pub async fn aggregate_with_results(
    scorer: &SentimentScorer,
    texts: &[String],
) -> Result<(BatchAnalysis, Vec<SentimentResult>)> {
    if texts.is_empty() {
        return Err(AnalyticsError::EmptyBatch);
    }

    let results = scorer.score_all(texts).await?;
    let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();
    let analysis = summarize(&results, &normalized)?;

    info!(
        total = analysis.total_texts,
        average = analysis.average_compound,
        distinct_top_words = analysis.top_words.len(),
        "batch aggregated"
    );
    Ok((analysis, results))
}
