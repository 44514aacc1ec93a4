//! Text representations fed to the embedding and scoring providers.
//! Built fresh on each request; never persisted.

use crate::models::job::JobRow;
use crate::models::user::UserRow;

/// Concatenates a seeker's skills, bio, and experience into one string.
pub fn profile_text(user: &UserRow) -> String {
    let mut parts = Vec::new();

    if !user.skills.is_empty() {
        parts.push(format!("Skills: {}", user.skills.join(", ")));
    }
    if let Some(bio) = user.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        parts.push(bio.trim().to_string());
    }
    if user.experience_years > 0 {
        parts.push(format!("{} years of experience", user.experience_years));
    }

    parts.join(". ")
}

/// The job text indexed into the vector store and shown to the LLM scorer.
pub fn job_text(job: &JobRow) -> String {
    let mut text = format!("{} at {}. {}", job.title, job.company, job.description.trim());
    if !job.required_skills.is_empty() {
        text.push_str(&format!(
            " Required skills: {}",
            job.required_skills.join(", ")
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_user(skills: Vec<&str>, bio: Option<&str>, years: i32) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            name: "Dev".to_string(),
            role: "seeker".to_string(),
            skills: skills.into_iter().map(String::from).collect(),
            bio: bio.map(String::from),
            experience_years: years,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_text_includes_all_sections() {
        let user = make_user(vec!["Python", "FastAPI"], Some("Backend engineer."), 5);
        let text = profile_text(&user);
        assert!(text.contains("Skills: Python, FastAPI"));
        assert!(text.contains("Backend engineer."));
        assert!(text.contains("5 years of experience"));
    }

    #[test]
    fn test_profile_text_skips_empty_sections() {
        let user = make_user(vec![], None, 0);
        assert_eq!(profile_text(&user), "");

        let user = make_user(vec!["Rust"], Some("   "), 0);
        assert_eq!(profile_text(&user), "Skills: Rust");
    }

    #[test]
    fn test_job_text_includes_required_skills() {
        let job = JobRow {
            id: Uuid::new_v4(),
            title: "Backend Developer".to_string(),
            company: "Acme".to_string(),
            description: "Build APIs.".to_string(),
            required_skills: vec!["Python".to_string(), "FastAPI".to_string()],
            location: None,
            salary_min: None,
            salary_max: None,
            status: "open".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let text = job_text(&job);
        assert!(text.starts_with("Backend Developer at Acme."));
        assert!(text.contains("Required skills: Python, FastAPI"));
    }
}
