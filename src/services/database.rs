use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::models::{Problem, ProblemLevel, SolutionStep};
use crate::services::repository::ProblemRepository;

/// SQLite-backed problem repository
#[derive(Clone)]
pub struct SqliteProblemRepository {
    pool: Pool<Sqlite>,
}

impl SqliteProblemRepository {
    /// Create new database connection pool
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("failed to open database {}", database_url))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        // `seq` carries insertion order; ids are opaque strings
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS problems (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                level TEXT NOT NULL DEFAULT 'high-school',
                category TEXT NOT NULL,
                theorems TEXT NOT NULL DEFAULT '[]', -- JSON array
                keywords TEXT NOT NULL DEFAULT '[]', -- JSON array
                solution_steps TEXT NOT NULL DEFAULT '[]', -- JSON array
                image_url TEXT,
                video_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProblemRepository for SqliteProblemRepository {
    async fn list_all(&self) -> Result<Vec<Problem>> {
        let rows = sqlx::query_as::<_, ProblemRow>(
            "SELECT id, title, description, level, category, theorems, keywords, solution_steps, \
             image_url, video_url, created_at, updated_at FROM problems ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Problem::try_from).collect()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Problem>> {
        let row = sqlx::query_as::<_, ProblemRow>(
            "SELECT id, title, description, level, category, theorems, keywords, solution_steps, \
             image_url, video_url, created_at, updated_at FROM problems WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Problem::try_from).transpose()
    }

    async fn insert(&self, problem: &Problem) -> Result<()> {
        let theorems_json = serde_json::to_string(&problem.theorems)?;
        let keywords_json = serde_json::to_string(&problem.keywords)?;
        let steps_json = serde_json::to_string(&problem.solution_steps)?;

        sqlx::query(
            r#"
            INSERT INTO problems (id, title, description, level, category, theorems, keywords,
                                  solution_steps, image_url, video_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&problem.id)
        .bind(&problem.title)
        .bind(&problem.description)
        .bind(problem.level.as_str())
        .bind(&problem.category)
        .bind(theorems_json)
        .bind(keywords_json)
        .bind(steps_json)
        .bind(&problem.image_url)
        .bind(&problem.video_url)
        .bind(problem.created_at)
        .bind(problem.updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert problem {}", problem.id))?;

        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM problems")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

// Helper struct for SQLx mapping
#[derive(sqlx::FromRow)]
struct ProblemRow {
    id: String,
    title: String,
    description: String,
    level: String,
    category: String,
    theorems: String,
    keywords: String,
    solution_steps: String,
    image_url: Option<String>,
    video_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProblemRow> for Problem {
    type Error = anyhow::Error;

    fn try_from(row: ProblemRow) -> Result<Self> {
        let level: ProblemLevel = row.level.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let theorems: Vec<String> = serde_json::from_str(&row.theorems)
            .with_context(|| format!("corrupt theorems for problem {}", row.id))?;
        let keywords: Vec<String> = serde_json::from_str(&row.keywords)
            .with_context(|| format!("corrupt keywords for problem {}", row.id))?;
        let solution_steps: Vec<SolutionStep> = serde_json::from_str(&row.solution_steps)
            .with_context(|| format!("corrupt solution steps for problem {}", row.id))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            level,
            category: row.category,
            theorems,
            keywords,
            solution_steps,
            created_at: row.created_at,
            updated_at: row.updated_at,
            image_url: row.image_url,
            video_url: row.video_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::seed::{seed_problems, STAR_PENTAGON_ID};

    async fn new_temp_db() -> (SqliteProblemRepository, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("solvy_test_{}.db", uuid::Uuid::new_v4()));
        // Ensure the file exists so the URL is always valid.
        let _ = std::fs::File::create(&path);
        let url = format!("sqlite:{}", path.to_str().unwrap());
        let db = SqliteProblemRepository::new(&url).await.expect("db init");
        (db, path)
    }

    #[tokio::test]
    async fn round_trips_problems_in_insertion_order() {
        let (db, path) = new_temp_db().await;
        let seeds = seed_problems();
        for p in &seeds {
            db.insert(p).await.expect("insert");
        }

        let listed = db.list_all().await.expect("list");
        assert_eq!(listed, seeds);

        let star = db.get_by_id(STAR_PENTAGON_ID).await.expect("get");
        assert_eq!(star.as_ref(), seeds.first());
        assert_eq!(db.count().await.unwrap(), 2);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn unknown_id_and_duplicate_insert() {
        let (db, path) = new_temp_db().await;
        let seeds = seed_problems();
        db.insert(&seeds[0]).await.expect("insert");

        assert!(db.get_by_id("missing").await.unwrap().is_none());
        assert!(db.insert(&seeds[0]).await.is_err());

        let _ = std::fs::remove_file(path);
    }
}
