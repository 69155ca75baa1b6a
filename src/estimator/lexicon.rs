// src/estimator/lexicon.rs
//! Built-in lexicon estimator.
//!
//! Each lexicon entry is `word -> [polarity, subjectivity]`. A text scores the mean of its
//! matched words. A negator in the previous 1..=3 tokens flips and damps polarity (×-0.5);
//! an intensifier right before a word scales both values.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::{Estimate, Estimator};
use crate::error::Result;

static LEXICON: Lazy<HashMap<String, (f64, f64)>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, (f64, f64)>>(raw).expect("valid sentiment lexicon")
});

const NEGATION_FACTOR: f64 = -0.5;
const NEGATION_WINDOW: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct LexiconEstimator;

impl LexiconEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core, shared by the async trait impl and the CLI.
    pub fn estimate_sync(&self, text: &str) -> Estimate {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum_p = 0.0f64;
        let mut sum_s = 0.0f64;
        let mut hits = 0usize;

        for (i, tok) in tokens.iter().enumerate() {
            let Some(&(base_p, base_s)) = LEXICON.get(tok.as_str()) else {
                continue;
            };
            let (mut p, mut s) = (base_p, base_s);

            if i >= 1 {
                if let Some(f) = intensity(tokens[i - 1].as_str()) {
                    p *= f;
                    s *= f;
                }
            }

            let negated = (1..=NEGATION_WINDOW).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            if negated {
                p *= NEGATION_FACTOR;
            }

            sum_p += p.clamp(-1.0, 1.0);
            sum_s += s.clamp(0.0, 1.0);
            hits += 1;
        }

        if hits == 0 {
            return Estimate::new(0.0, 0.0);
        }
        let n = hits as f64;
        Estimate::new((sum_p / n).clamp(-1.0, 1.0), (sum_s / n).clamp(0.0, 1.0))
    }
}

#[async_trait]
impl Estimator for LexiconEstimator {
    async fn estimate(&self, text: &str) -> Result<Estimate> {
        Ok(self.estimate_sync(text))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

/// Lowercase runs of alphanumerics and apostrophes.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase().replace('\u{2019}', "'"))
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "nor" | "cannot" | "without" | "hardly"
    ) || tok.ends_with("n't")
}

fn intensity(tok: &str) -> Option<f64> {
    match tok {
        "very" | "really" | "super" => Some(1.3),
        "extremely" | "incredibly" | "absolutely" => Some(1.5),
        "so" | "too" | "totally" => Some(1.2),
        "quite" | "pretty" => Some(1.1),
        "somewhat" | "fairly" => Some(0.7),
        "slightly" | "barely" => Some(0.5),
        _ => None,
    }
}
