//! Human-scale equivalents of a monthly usage volume.

use serde::{Deserialize, Serialize};

use crate::catalog::BusinessRules;

/// Pages per training module.
const PAGES_PER_MODULE: f64 = 25.0;
/// Script minutes per training video.
const MINUTES_PER_VIDEO: f64 = 15.0;
/// Tokens per Q&A exchange.
const TOKENS_PER_EXCHANGE: f64 = 1000.0;
/// Voice minutes per audio segment.
const MINUTES_PER_SEGMENT: f64 = 5.0;

/// What a month of tokens and voice characters amounts to.
///
/// Every figure is rounded to the nearest whole unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageEquivalents {
    pub words: u64,
    pub pages: u64,
    pub training_modules: u64,
    pub script_minutes: u64,
    pub training_videos: u64,
    pub qa_exchanges: u64,
    pub voice_words: u64,
    pub voice_minutes: u64,
    pub voice_segments: u64,
}

impl UsageEquivalents {
    pub fn from_volume(tokens: f64, characters: f64, rules: &BusinessRules) -> Self {
        let words = whole(tokens * rules.words_per_token);
        let pages = whole(words as f64 / rules.words_per_page);
        let script_minutes = whole(words as f64 / rules.words_per_minute);
        let voice_words = whole(characters / rules.chars_per_word);
        let voice_minutes = whole(voice_words as f64 / rules.words_per_minute);

        Self {
            words,
            pages,
            training_modules: whole(pages as f64 / PAGES_PER_MODULE),
            script_minutes,
            training_videos: whole(script_minutes as f64 / MINUTES_PER_VIDEO),
            qa_exchanges: whole(tokens / TOKENS_PER_EXCHANGE),
            voice_words,
            voice_minutes,
            voice_segments: whole(voice_minutes as f64 / MINUTES_PER_SEGMENT),
        }
    }
}

// Saturating cast: NaN and negatives become 0.
fn whole(value: f64) -> u64 {
    value.round() as u64
}
