//! Prompt similarity strategies.
//!
//! Strategies are tried in order; the first one that answers wins. The
//! production chain is embedding cosine followed by Jaro-Winkler.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::DependencyError;

/// Text embedding capability.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One embedding per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, DependencyError>;
}

/// One way of scoring two prompt lists in [0, 100].
#[async_trait]
pub trait PromptSimilarity: Send + Sync {
    fn name(&self) -> &'static str;

    /// Both lists are non-empty when called.
    async fn similarity(&self, a: &[String], b: &[String]) -> Result<f64, DependencyError>;
}

/// Mean cosine similarity over all prompt-embedding pairs.
pub struct EmbeddingSimilarity {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl EmbeddingSimilarity {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl PromptSimilarity for EmbeddingSimilarity {
    fn name(&self) -> &'static str {
        "embedding"
    }

    async fn similarity(&self, a: &[String], b: &[String]) -> Result<f64, DependencyError> {
        let inputs: Vec<String> = a.iter().chain(b.iter()).cloned().collect();
        let embeddings = tokio::time::timeout(self.timeout, self.provider.embed(&inputs))
            .await
            .map_err(|_| DependencyError::Timeout(self.timeout.as_millis() as u64))??;

        if embeddings.len() != inputs.len() {
            return Err(DependencyError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                embeddings.len()
            )));
        }

        let (left, right) = embeddings.split_at(a.len());
        let mut total = 0.0;
        for x in left {
            for y in right {
                total += cosine(x, y)?.max(0.0);
            }
        }
        Ok(total / (left.len() * right.len()) as f64 * 100.0)
    }
}

/// Mean Jaro-Winkler similarity over all prompt pairs.
///
/// Prompts are lowercased and cut to `max_chars` characters, and the
/// comparison runs on the blocking pool so a large pool cannot starve the
/// async workers.
#[derive(Debug, Clone, Copy)]
pub struct JaroWinklerSimilarity {
    max_chars: usize,
}

impl JaroWinklerSimilarity {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }
}

fn prepare(prompts: &[String], max_chars: usize) -> Vec<String> {
    prompts
        .iter()
        .map(|p| p.chars().take(max_chars).collect::<String>().to_lowercase())
        .collect()
}

/// Mean pairwise Jaro-Winkler in [0, 100]; both lists non-empty.
fn mean_jaro_winkler(a: &[String], b: &[String]) -> f64 {
    let mut total = 0.0;
    for x in a {
        for y in b {
            total += jaro_winkler(x, y);
        }
    }
    total / (a.len() * b.len()) as f64 * 100.0
}

#[async_trait]
impl PromptSimilarity for JaroWinklerSimilarity {
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }

    async fn similarity(&self, a: &[String], b: &[String]) -> Result<f64, DependencyError> {
        let a = prepare(a, self.max_chars);
        let b = prepare(b, self.max_chars);
        tokio::task::spawn_blocking(move || mean_jaro_winkler(&a, &b))
            .await
            .map_err(|e| DependencyError::Unavailable(format!("string similarity task failed: {e}")))
    }
}

/// Result of running the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptScore {
    pub score: f64,
    /// An earlier strategy failed and a fallback answered.
    pub degraded: bool,
}

/// Ordered fallback chain of similarity strategies.
#[derive(Clone)]
pub struct PromptSimilarityChain {
    strategies: Vec<Arc<dyn PromptSimilarity>>,
}

impl PromptSimilarityChain {
    pub fn new(strategies: Vec<Arc<dyn PromptSimilarity>>) -> Self {
        Self { strategies }
    }

    /// Chain without embeddings.
    pub fn string_only(max_chars: usize) -> Self {
        let strategies: Vec<Arc<dyn PromptSimilarity>> =
            vec![Arc::new(JaroWinklerSimilarity::new(max_chars))];
        Self::new(strategies)
    }

    /// Embedding cosine, falling back to Jaro-Winkler.
    pub fn with_embeddings(
        provider: Arc<dyn EmbeddingProvider>,
        timeout: Duration,
        max_chars: usize,
    ) -> Self {
        let strategies: Vec<Arc<dyn PromptSimilarity>> = vec![
            Arc::new(EmbeddingSimilarity::new(provider, timeout)),
            Arc::new(JaroWinklerSimilarity::new(max_chars)),
        ];
        Self::new(strategies)
    }

    pub async fn score(&self, a: &[String], b: &[String]) -> PromptScore {
        if a.is_empty() || b.is_empty() {
            return PromptScore {
                score: 0.0,
                degraded: false,
            };
        }

        let mut degraded = false;
        for strategy in &self.strategies {
            match strategy.similarity(a, b).await {
                Ok(score) if score.is_finite() => {
                    return PromptScore {
                        score: score.clamp(0.0, 100.0),
                        degraded,
                    };
                }
                Ok(score) => {
                    tracing::warn!(strategy = strategy.name(), score, "Non-finite prompt similarity");
                    degraded = true;
                }
                Err(e) => {
                    tracing::debug!(strategy = strategy.name(), error = %e, "Prompt similarity strategy failed");
                    degraded = true;
                }
            }
        }

        PromptScore {
            score: 0.0,
            degraded: true,
        }
    }
}

/// Cosine similarity; zero vectors have similarity 0.
pub fn cosine(x: &[f32], y: &[f32]) -> Result<f64, DependencyError> {
    if x.len() != y.len() {
        return Err(DependencyError::InvalidResponse(format!(
            "embedding dimensions differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let mut dot = 0.0f64;
    let mut nx = 0.0f64;
    let mut ny = 0.0f64;
    for (a, b) in x.iter().zip(y) {
        let (a, b) = (*a as f64, *b as f64);
        dot += a * b;
        nx += a * a;
        ny += b * b;
    }
    if nx == 0.0 || ny == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (nx.sqrt() * ny.sqrt()))
}

const PREFIX_SCALE: f64 = 0.1;
const MAX_PREFIX: usize = 4;

/// Jaro-Winkler similarity in [0, 1].
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let sim = jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(MAX_PREFIX)
        .take_while(|(x, y)| x == y)
        .count();
    sim + prefix as f64 * PREFIX_SCALE * (1.0 - sim)
}

fn jaro(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(b.len());
        for j in start..end {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }

    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let transpositions = a_seq.zip(b_seq).filter(|(x, y)| x != y).count() / 2;

    let m = matches as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions as f64) / m) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbeddings(Vec<Vec<f32>>);

    #[async_trait]
    impl EmbeddingProvider for FixedEmbeddings {
        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, DependencyError> {
            Ok(self.0.clone())
        }
    }

    struct DownEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for DownEmbeddings {
        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, DependencyError> {
            Err(DependencyError::Unavailable("connection refused".to_string()))
        }
    }

    struct SlowEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbeddings {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, DependencyError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![vec![1.0]; inputs.len()])
        }
    }

    const MAX_CHARS: usize = 280;

    fn prompts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_jaro_winkler_known_values() {
        assert!((jaro_winkler("martha", "marhta") - 0.9611).abs() < 1e-3);
        assert!((jaro_winkler("dwayne", "duane") - 0.84).abs() < 1e-3);
        assert_eq!(jaro_winkler("abc", "abc"), 1.0);
        assert_eq!(jaro_winkler("abc", "xyz"), 0.0);
        assert_eq!(jaro_winkler("", "abc"), 0.0);
    }

    #[test]
    fn test_cosine() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-9);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-9);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
        assert!(cosine(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[tokio::test]
    async fn test_empty_prompts_score_zero() {
        let chain = PromptSimilarityChain::string_only(MAX_CHARS);
        let score = chain.score(&[], &prompts(&["hello"])).await;
        assert_eq!(score.score, 0.0);
        assert!(!score.degraded);
    }

    #[tokio::test]
    async fn test_embedding_negative_cosine_clamps() {
        let provider = Arc::new(FixedEmbeddings(vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![-1.0, 0.0],
        ]));
        let chain =
            PromptSimilarityChain::with_embeddings(provider, Duration::from_millis(250), MAX_CHARS);
        let score = chain.score(&prompts(&["a"]), &prompts(&["b", "c"])).await;
        // mean of (1.0, 0.0)
        assert!((score.score - 50.0).abs() < 1e-9);
        assert!(!score.degraded);
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back() {
        let chain = PromptSimilarityChain::with_embeddings(
            Arc::new(DownEmbeddings),
            Duration::from_millis(250),
            MAX_CHARS,
        );
        let a = prompts(&["weekend hikes"]);
        let score = chain.score(&a, &a).await;
        assert_eq!(score.score, 100.0);
        assert!(score.degraded);
    }

    #[tokio::test]
    async fn test_embedding_wrong_count_falls_back() {
        let chain = PromptSimilarityChain::with_embeddings(
            Arc::new(FixedEmbeddings(vec![vec![1.0]])),
            Duration::from_millis(250),
            MAX_CHARS,
        );
        let score = chain.score(&prompts(&["a"]), &prompts(&["a"])).await;
        assert!(score.degraded);
        assert_eq!(score.score, 100.0);
    }

    #[tokio::test]
    async fn test_embedding_timeout_falls_back() {
        let chain = PromptSimilarityChain::with_embeddings(
            Arc::new(SlowEmbeddings),
            Duration::from_millis(250),
            MAX_CHARS,
        );
        let score = chain
            .score(&prompts(&["coffee"]), &prompts(&["tea"]))
            .await;
        assert!(score.degraded);
    }

    #[tokio::test]
    async fn test_long_prompts_compare_on_their_prefix() {
        let shared = "x".repeat(40);
        let a = vec![format!("{shared}{}", "a".repeat(960))];
        let b = vec![format!("{shared}{}", "b".repeat(960))];

        let full = JaroWinklerSimilarity::new(1_000).similarity(&a, &b).await.unwrap();
        let cut = JaroWinklerSimilarity::new(40).similarity(&a, &b).await.unwrap();
        assert_eq!(cut, 100.0);
        assert!(full < cut);
    }

    #[tokio::test]
    async fn test_string_similarity_is_case_insensitive() {
        let score = JaroWinklerSimilarity::new(MAX_CHARS)
            .similarity(&prompts(&["Weekend HIKES"]), &prompts(&["weekend hikes"]))
            .await
            .unwrap();
        assert_eq!(score, 100.0);
    }
}
