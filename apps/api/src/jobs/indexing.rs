//! Best-effort vector indexing of job postings.
//!
//! Indexing failures are logged and swallowed: the vector index is allowed
//! to go stale relative to the jobs table, and the blender's keyword
//! fallback covers the gap.

use tracing::warn;
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::models::job::JobRow;
use crate::recommend::profile::job_text;
use crate::vector_store::VectorIndex;

/// Embeds the job text and writes it into the jobs collection, replacing any
/// vector from an earlier version of the posting.
pub async fn index_job(embedder: &dyn EmbeddingProvider, index: &dyn VectorIndex, job: &JobRow) {
    let text = job_text(job);

    let embedding = match embedder.embed(&text).await {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!("Failed to embed job {} ({e}), leaving it unindexed", job.id);
            return;
        }
    };

    if let Err(e) = index.upsert(job.id, &embedding, &text).await {
        warn!("Failed to index job {} ({e})", job.id);
    }
}

/// Removes a job's vector. Best-effort, like the upsert.
pub async fn deindex_job(index: &dyn VectorIndex, id: Uuid) {
    if let Err(e) = index.delete(id).await {
        warn!("Failed to remove job {id} from index ({e})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedding, EmbeddingError};
    use crate::vector_store::{VectorHit, VectorStoreError};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn dimension(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> Result<Embedding, EmbeddingError> {
            Ok(Embedding::new("fixed", vec![0.0; 4]))
        }
    }

    /// In-memory index holding one document per id.
    #[derive(Default)]
    struct MemoryIndex {
        documents: Mutex<HashMap<Uuid, String>>,
    }

    #[async_trait]
    impl VectorIndex for MemoryIndex {
        fn collection(&self) -> &str {
            "jobs"
        }
        async fn upsert(
            &self,
            id: Uuid,
            _embedding: &Embedding,
            document: &str,
        ) -> Result<(), VectorStoreError> {
            self.documents
                .lock()
                .unwrap()
                .insert(id, document.to_string());
            Ok(())
        }
        async fn query(
            &self,
            _embedding: &Embedding,
            _top_k: usize,
        ) -> Result<Vec<VectorHit>, VectorStoreError> {
            Ok(Vec::new())
        }
        async fn delete(&self, id: Uuid) -> Result<(), VectorStoreError> {
            self.documents.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    fn make_job(description: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: description.to_string(),
            required_skills: vec!["Python".to_string()],
            location: None,
            salary_min: None,
            salary_max: None,
            status: "open".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reindex_replaces_document_for_existing_id() {
        let index = MemoryIndex::default();
        let mut job = make_job("Build APIs in Python.");

        index_job(&FixedEmbedder, &index, &job).await;
        job.description = "Build APIs in Python and Go.".to_string();
        index_job(&FixedEmbedder, &index, &job).await;

        let documents = index.documents.lock().unwrap();
        assert_eq!(documents.len(), 1);
        assert!(documents[&job.id].contains("Go"));
    }

    #[tokio::test]
    async fn test_deindex_removes_entry() {
        let index = MemoryIndex::default();
        let job = make_job("Operate clusters.");

        index_job(&FixedEmbedder, &index, &job).await;
        deindex_job(&index, job.id).await;

        assert!(index.documents.lock().unwrap().is_empty());
    }
}
