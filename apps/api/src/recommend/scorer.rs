//! LLM relevance scorer — sends a job + profile pair to the chat-completion
//! client and extracts a 0-100 score with short reason strings.
//!
//! The remote model is untrusted output: scores arrive as ints, floats, or
//! numeric strings, reasons may be missing or over-long. Anything without a
//! usable score is an error, which the blender turns into a vector-only
//! entry for that one job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::llm_client::{LlmClient, LlmError};
use crate::recommend::prompts::{RELEVANCE_PROMPT_TEMPLATE, RELEVANCE_SYSTEM};

/// Reasons are advisory; keep at most this many.
const MAX_REASONS: usize = 3;

/// Parsed verdict from the scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceJudgment {
    /// Relevance in [0, 100].
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Seam between the blender and the chat-completion provider.
/// Carried as `Arc<dyn RelevanceScorer>` so tests can swap in fakes.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, job_text: &str, profile_text: &str)
        -> Result<RelevanceJudgment, LlmError>;
}

/// Production scorer over the shared `LlmClient`.
pub struct LlmRelevanceScorer {
    llm: LlmClient,
}

impl LlmRelevanceScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RelevanceScorer for LlmRelevanceScorer {
    async fn score(
        &self,
        job_text: &str,
        profile_text: &str,
    ) -> Result<RelevanceJudgment, LlmError> {
        let prompt = RELEVANCE_PROMPT_TEMPLATE
            .replace("{job_text}", job_text)
            .replace("{profile_text}", profile_text);

        let raw: Value = self.llm.call_json(&prompt, RELEVANCE_SYSTEM).await?;

        let judgment = sanitize_judgment(&raw)
            .ok_or_else(|| LlmError::Schema(format!("no usable relevance score in {raw}")))?;

        debug!("Relevance score: {}", judgment.score);
        Ok(judgment)
    }
}

/// Extracts a judgment from whatever JSON the model produced.
/// Returns `None` when there is no usable numeric score.
pub fn sanitize_judgment(value: &Value) -> Option<RelevanceJudgment> {
    let raw_score = value.get("score")?;
    let score = raw_score
        .as_f64()
        .or_else(|| raw_score.as_str().and_then(|s| s.trim().parse::<f64>().ok()))?;

    if !score.is_finite() {
        return None;
    }
    let score = score.round().clamp(0.0, 100.0) as u32;

    let reasons = value
        .get("reasons")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|r| r.as_str())
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .take(MAX_REASONS)
                .collect()
        })
        .unwrap_or_default();

    Some(RelevanceJudgment { score, reasons })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_integer_score_and_reasons() {
        let value = json!({
            "score": 85,
            "reasons": ["Strong Python overlap", "Experience level matches"]
        });
        let judgment = sanitize_judgment(&value).unwrap();
        assert_eq!(judgment.score, 85);
        assert_eq!(judgment.reasons.len(), 2);
    }

    #[test]
    fn test_sanitize_float_score_rounds() {
        let value = json!({ "score": 72.6, "reasons": [] });
        assert_eq!(sanitize_judgment(&value).unwrap().score, 73);
    }

    #[test]
    fn test_sanitize_numeric_string_score() {
        let value = json!({ "score": "90", "reasons": ["Good fit"] });
        assert_eq!(sanitize_judgment(&value).unwrap().score, 90);
    }

    #[test]
    fn test_sanitize_clamps_out_of_range_scores() {
        assert_eq!(sanitize_judgment(&json!({ "score": 140 })).unwrap().score, 100);
        assert_eq!(sanitize_judgment(&json!({ "score": -5 })).unwrap().score, 0);
    }

    #[test]
    fn test_sanitize_missing_score_is_none() {
        assert!(sanitize_judgment(&json!({ "reasons": ["No score here"] })).is_none());
        assert!(sanitize_judgment(&json!({ "score": "high" })).is_none());
        assert!(sanitize_judgment(&json!("not an object")).is_none());
    }

    #[test]
    fn test_sanitize_truncates_reasons_to_three() {
        let value = json!({
            "score": 50,
            "reasons": ["one", "two", "three", "four", "five"]
        });
        assert_eq!(sanitize_judgment(&value).unwrap().reasons.len(), 3);
    }

    #[test]
    fn test_sanitize_drops_non_string_and_blank_reasons() {
        let value = json!({
            "score": 50,
            "reasons": ["valid", 42, "  ", { "nested": true }]
        });
        let judgment = sanitize_judgment(&value).unwrap();
        assert_eq!(judgment.reasons, vec!["valid".to_string()]);
    }

    #[test]
    fn test_sanitize_missing_reasons_defaults_to_empty() {
        let judgment = sanitize_judgment(&json!({ "score": 60 })).unwrap();
        assert!(judgment.reasons.is_empty());
    }
}
