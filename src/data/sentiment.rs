use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Cleaned text shorter than this is scored neutral
const MIN_TEXT_LENGTH: usize = 10;

/// Neutral score on the [0,1] scale
pub const NEUTRAL_SENTIMENT: f64 = 0.5;

/// Weighted lexicon (AFINN-style, -5..+5) tuned for market coverage
const LEXICON: &[(&str, i32)] = &[
    // bullish
    ("adoption", 2),
    ("advance", 2),
    ("all-time", 1),
    ("approval", 2),
    ("approved", 2),
    ("beat", 2),
    ("boom", 3),
    ("boost", 2),
    ("breakout", 3),
    ("bull", 2),
    ("bullish", 3),
    ("buy", 1),
    ("climb", 2),
    ("confidence", 2),
    ("gain", 2),
    ("gains", 2),
    ("good", 3),
    ("great", 3),
    ("growth", 2),
    ("high", 1),
    ("improve", 2),
    ("innovation", 2),
    ("jump", 2),
    ("moon", 3),
    ("optimism", 2),
    ("optimistic", 2),
    ("outperform", 2),
    ("positive", 2),
    ("profit", 2),
    ("rally", 3),
    ("rebound", 2),
    ("record", 1),
    ("recovery", 2),
    ("resilience", 2),
    ("rise", 2),
    ("rises", 2),
    ("soar", 3),
    ("soars", 3),
    ("stronger", 2),
    ("strong", 2),
    ("success", 2),
    ("successful", 3),
    ("surge", 3),
    ("surges", 3),
    ("up", 1),
    ("upgrade", 2),
    ("win", 3),
    // bearish
    ("ban", -2),
    ("bear", -2),
    ("bearish", -3),
    ("collapse", -3),
    ("concern", -2),
    ("concerns", -2),
    ("crash", -3),
    ("crisis", -3),
    ("decline", -2),
    ("declines", -2),
    ("down", -1),
    ("drop", -2),
    ("drops", -2),
    ("dump", -2),
    ("fall", -2),
    ("falls", -2),
    ("fear", -2),
    ("fraud", -4),
    ("hack", -3),
    ("hacked", -3),
    ("lawsuit", -2),
    ("loss", -3),
    ("losses", -3),
    ("negative", -2),
    ("plunge", -3),
    ("plunges", -3),
    ("risk", -2),
    ("scam", -4),
    ("sell", -1),
    ("selloff", -3),
    ("slump", -3),
    ("tumble", -3),
    ("uncertainty", -2),
    ("volatile", -1),
    ("weak", -2),
    ("weakness", -2),
    ("worry", -2),
    ("worst", -3),
];

lazy_static! {
    static ref NON_LETTERS: Regex = Regex::new(r"[^a-zA-Z\s]").expect("static regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("static regex");
    static ref LEXICON_MAP: HashMap<&'static str, i32> = LEXICON.iter().copied().collect();
}

/// Raw lexicon analysis of one text
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentAnalysis {
    pub score: i32,
    pub comparative: f64,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// Lexicon-based polarity scorer producing normalized [0,1] scores
#[derive(Debug, Clone, Default)]
pub struct SentimentScorer;

impl SentimentScorer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize and score against the lexicon. Short text yields an empty analysis.
    pub fn analyze(&self, text: &str) -> SentimentAnalysis {
        let cleaned = clean_text(text);

        if cleaned.len() < MIN_TEXT_LENGTH {
            return SentimentAnalysis {
                score: 0,
                comparative: 0.0,
                positive: Vec::new(),
                negative: Vec::new(),
            };
        }

        let tokens: Vec<&str> = cleaned.split(' ').collect();
        let mut score = 0;
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        for token in &tokens {
            if let Some(&weight) = LEXICON_MAP.get(token) {
                score += weight;
                if weight > 0 {
                    positive.push(token.to_string());
                } else {
                    negative.push(token.to_string());
                }
            }
        }

        SentimentAnalysis {
            score,
            comparative: score as f64 / tokens.len() as f64,
            positive,
            negative,
        }
    }

    /// Normalized score in [0,1]; 0.5 is neutral
    pub fn score(&self, text: &str) -> f64 {
        let cleaned = clean_text(text);
        if cleaned.len() < MIN_TEXT_LENGTH {
            return NEUTRAL_SENTIMENT;
        }
        normalize_comparative(self.analyze(text).comparative)
    }

    /// Interpret a comparative score as a label
    pub fn label(comparative: f64) -> &'static str {
        if comparative > 0.1 {
            "bullish"
        } else if comparative < -0.1 {
            "bearish"
        } else {
            "neutral"
        }
    }
}

/// Map a comparative score from [-1,1] onto [0,1], clamped
pub fn normalize_comparative(comparative: f64) -> f64 {
    if comparative.is_nan() {
        return NEUTRAL_SENTIMENT;
    }
    ((comparative + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn clean_text(text: &str) -> String {
    let letters_only = NON_LETTERS.replace_all(text, " ");
    WHITESPACE
        .replace_all(&letters_only, " ")
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_neutral() {
        let scorer = SentimentScorer::new();
        assert_eq!(scorer.score(""), 0.5);
        assert_eq!(scorer.score("crash!!"), 0.5);
        assert_eq!(scorer.score("12345 67890 $$$"), 0.5);
    }

    #[test]
    fn test_polarity_direction() {
        let scorer = SentimentScorer::new();
        let bullish = scorer.score("Bitcoin surges in a strong rally as adoption grows");
        let bearish = scorer.score("Bitcoin plunges after exchange hack sparks fear and losses");
        let flat = scorer.score("Bitcoin developers publish quarterly meeting notes");

        assert!(bullish > 0.5, "bullish = {}", bullish);
        assert!(bearish < 0.5, "bearish = {}", bearish);
        assert_eq!(flat, 0.5);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let scorer = SentimentScorer::new();
        let samples = [
            "surge surge surge surge surge surge",
            "scam fraud scam fraud crash collapse",
            "moon moon moon",
            "a perfectly ordinary sentence about nothing",
            "ETH/BTC ratio 0.05 -- up 3% w/ volume",
        ];
        for text in samples {
            let s = scorer.score(text);
            assert!((0.0..=1.0).contains(&s), "{} -> {}", text, s);
        }
    }

    #[test]
    fn test_analysis_collects_matched_words() {
        let scorer = SentimentScorer::new();
        let analysis = scorer.analyze("Strong gains offset by regulatory concern");
        assert_eq!(analysis.positive, vec!["strong", "gains"]);
        assert_eq!(analysis.negative, vec!["concern"]);
        assert_eq!(analysis.score, 2);
        assert_eq!(SentimentScorer::label(analysis.comparative), "bullish");
    }

    #[test]
    fn test_normalize_comparative_clamps() {
        assert_eq!(normalize_comparative(0.0), 0.5);
        assert_eq!(normalize_comparative(3.0), 1.0);
        assert_eq!(normalize_comparative(-3.0), 0.0);
    }
}
