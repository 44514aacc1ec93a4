//! Recommendation path: embed profile → vector search → LLM re-score the top
//! hits → blend → rank. Degrades to keyword matching when the AI services or
//! the vector index are unavailable.

pub mod blender;
pub mod handlers;
pub mod keyword;
pub mod profile;
pub mod prompts;
pub mod scorer;
