//! Vectorized ranking: cosine similarity against the query embedding.
//!
//! Candidates without an embedding, or whose embedding yields a non-finite
//! similarity, score below every other candidate and keep their relative
//! order among themselves.

use attune_core::memory::Recallable;
use attune_memory::cosine_similarity;

/// Similarity of one candidate to the query.
pub fn score<M: Recallable>(query_embedding: &[f32], candidate: &M) -> f32 {
    match candidate.embedding() {
        Some(embedding) => {
            let similarity = cosine_similarity(query_embedding, embedding);
            if similarity.is_finite() {
                similarity
            } else {
                f32::NEG_INFINITY
            }
        }
        None => f32::NEG_INFINITY,
    }
}

/// Order candidates by descending similarity; ties keep their input order.
pub fn rank<M: Recallable>(query_embedding: &[f32], candidates: Vec<M>) -> Vec<M> {
    let mut scored: Vec<(f32, M)> = candidates
        .into_iter()
        .map(|c| (score(query_embedding, &c), c))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::memory::SemanticMemory;

    fn mem(id: &str, embedding: Option<Vec<f32>>) -> SemanticMemory {
        let m = SemanticMemory::new(id, "d", id);
        match embedding {
            Some(e) => m.with_embedding(e),
            None => m,
        }
    }

    fn ids(ranked: &[SemanticMemory]) -> Vec<&str> {
        ranked.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn closest_vector_first() {
        let query = [1.0, 0.0];
        let ranked = rank(
            &query,
            vec![
                mem("far", Some(vec![0.0, 1.0])),
                mem("near", Some(vec![0.9, 0.1])),
                mem("opposite", Some(vec![-1.0, 0.0])),
            ],
        );
        assert_eq!(ids(&ranked), vec!["near", "far", "opposite"]);
    }

    #[test]
    fn missing_embeddings_sink_in_order() {
        let query = [1.0, 0.0];
        let ranked = rank(
            &query,
            vec![
                mem("none-a", None),
                mem("opposite", Some(vec![-1.0, 0.0])),
                mem("none-b", None),
            ],
        );
        assert_eq!(ids(&ranked), vec!["opposite", "none-a", "none-b"]);
    }

    #[test]
    fn non_finite_embedding_sinks_without_blocking_others() {
        let query = [1.0, 0.0];
        let overflowed: Vec<f32> = serde_json::from_str("[1e39, 0.0]").unwrap();
        assert!(overflowed[0].is_infinite());

        let ranked = rank(
            &query,
            vec![
                mem("far", Some(vec![0.0, 1.0])),
                mem("bad", Some(overflowed)),
                mem("none", None),
                mem("near", Some(vec![1.0, 0.0])),
            ],
        );
        assert_eq!(ids(&ranked), vec!["near", "far", "bad", "none"]);
    }

    #[test]
    fn nan_embedding_scores_as_missing() {
        let candidate = mem("nan", Some(vec![f32::NAN, 0.0]));
        assert_eq!(score(&[1.0, 0.0], &candidate), f32::NEG_INFINITY);
    }

    #[test]
    fn equal_scores_keep_order() {
        let query = [1.0, 1.0];
        let ranked = rank(
            &query,
            vec![
                mem("x", Some(vec![1.0, 0.0])),
                mem("y", Some(vec![0.0, 1.0])),
            ],
        );
        assert_eq!(ids(&ranked), vec!["x", "y"]);
    }
}
