//! Similarity search over stored resource chunks

use crate::types::Resource;
use rayon::prelude::*;
use std::cmp::Ordering;

/// A chunk eligible for retrieval, tagged with its resource
#[derive(Debug, Clone)]
pub struct CandidateChunk {
    pub text: String,
    pub resource_name: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub resource_name: String,
    pub similarity: f32,
}

/// Every embedded chunk of every resource
pub fn candidates(resources: Vec<Resource>) -> Vec<CandidateChunk> {
    resources
        .into_iter()
        .flat_map(|resource| {
            let name = resource.name;
            resource
                .chunks
                .into_iter()
                .filter(|c| !c.embedding.is_empty())
                .map(move |c| CandidateChunk {
                    text: c.text,
                    resource_name: name.clone(),
                    embedding: c.embedding,
                })
        })
        .collect()
}

/// Cosine similarity; None when the lengths differ or either vector is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return None;
    }
    Some(dot / denom)
}

/// The `top_k` chunks most similar to the query, best first
pub fn top_k(query: &[f32], chunks: &[CandidateChunk], top_k: usize) -> Vec<ScoredChunk> {
    if query.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredChunk> = chunks
        .par_iter()
        .filter_map(|chunk| {
            cosine_similarity(query, &chunk.embedding).map(|similarity| ScoredChunk {
                text: chunk.text.clone(),
                resource_name: chunk.resource_name.clone(),
                similarity,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
