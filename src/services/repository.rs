use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::Problem;

/// Storage contract for problems. Order of `list_all` is insertion order.
#[async_trait]
pub trait ProblemRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Problem>>;

    /// `Ok(None)` for an unknown id; absence is not an error here.
    async fn get_by_id(&self, id: &str) -> Result<Option<Problem>>;

    /// Append a problem. Fails if the id is already taken.
    async fn insert(&self, problem: &Problem) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}

/// Vec-backed repository for the default deployment and for tests
#[derive(Clone, Default)]
pub struct InMemoryProblemRepository {
    problems: Arc<RwLock<Vec<Problem>>>,
}

impl InMemoryProblemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_problems(problems: Vec<Problem>) -> Self {
        Self {
            problems: Arc::new(RwLock::new(problems)),
        }
    }
}

#[async_trait]
impl ProblemRepository for InMemoryProblemRepository {
    async fn list_all(&self) -> Result<Vec<Problem>> {
        Ok(self.problems.read().await.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Problem>> {
        let problems = self.problems.read().await;
        Ok(problems.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, problem: &Problem) -> Result<()> {
        let mut problems = self.problems.write().await;
        if problems.iter().any(|p| p.id == problem.id) {
            return Err(anyhow::anyhow!("problem id {} already exists", problem.id));
        }
        problems.push(problem.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.problems.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::seed::seed_problems;

    #[tokio::test]
    async fn keeps_insertion_order_and_rejects_duplicate_ids() {
        let repo = InMemoryProblemRepository::new();
        let seeds = seed_problems();
        for p in &seeds {
            repo.insert(p).await.unwrap();
        }

        let ids: Vec<_> = repo.list_all().await.unwrap().into_iter().map(|p| p.id).collect();
        let expected: Vec<_> = seeds.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, expected);

        assert!(repo.insert(&seeds[0]).await.is_err());
        assert_eq!(repo.count().await.unwrap(), seeds.len());
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let repo = InMemoryProblemRepository::with_problems(seed_problems());
        assert!(repo.get_by_id("never-issued").await.unwrap().is_none());
    }
}
