// LLM prompt constants for the relevance scorer.

/// System prompt for relevance scoring — enforces JSON-only output.
pub const RELEVANCE_SYSTEM: &str =
    "You are an expert technical recruiter assessing how well a candidate \
    matches a job posting. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Relevance scoring prompt template.
/// Replace `{job_text}` and `{profile_text}` before sending.
pub const RELEVANCE_PROMPT_TEMPLATE: &str = r#"Rate how relevant this job is for this candidate.

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 85,
  "reasons": [
    "Strong Python and FastAPI overlap with the core requirements",
    "Five years of backend experience matches the seniority"
  ]
}

Rules:
- "score" is an integer from 0 (no fit) to 100 (ideal fit).
- "reasons" is a list of 2 to 3 short sentences citing concrete overlaps or gaps.
- Judge skills, experience level, and domain; ignore location and salary.

JOB:
{job_text}

CANDIDATE PROFILE:
{profile_text}"#;
