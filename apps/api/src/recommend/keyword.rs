//! Keyword fallback matcher — literal skill-set overlap, used when the
//! vector/LLM path is unavailable. Pure function, no failure modes.

/// Fraction of required skills covered by the candidate's skills,
/// case-insensitive, in [0, 1]. An empty requirement list scores 0.
pub fn keyword_overlap_score(candidate: &[String], required: &[String]) -> f64 {
    let candidate: Vec<String> = candidate.iter().map(|s| s.trim().to_lowercase()).collect();

    let overlap = required
        .iter()
        .filter(|skill| candidate.contains(&skill.trim().to_lowercase()))
        .count();

    overlap as f64 / required.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_overlap_scores_one() {
        let score = keyword_overlap_score(
            &skills(&["Python", "FastAPI", "Docker"]),
            &skills(&["Python", "FastAPI"]),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        let score = keyword_overlap_score(
            &skills(&["Python"]),
            &skills(&["Python", "FastAPI", "Kubernetes", "AWS"]),
        );
        assert_eq!(score, 0.25);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let score = keyword_overlap_score(&skills(&["Java"]), &skills(&["Python", "FastAPI"]));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let score = keyword_overlap_score(&skills(&["python", "fastapi"]), &skills(&["Python", "FastAPI"]));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let score = keyword_overlap_score(&skills(&[" Python "]), &skills(&["python"]));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_empty_required_scores_zero_without_panicking() {
        let score = keyword_overlap_score(&skills(&["Python"]), &[]);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        let score = keyword_overlap_score(&[], &skills(&["Python"]));
        assert_eq!(score, 0.0);
    }
}
