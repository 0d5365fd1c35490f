use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::content::{SampleTopics, TopicSource};
use crate::storage::{Storage, StorageClient};
use crate::{auth, db};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub topics: Arc<dyn TopicSource>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config.database_path).await?;
        db::init_schema(&db).await?;
        auth::repo::seed_admin(&db)
            .await
            .map_err(|e| anyhow::anyhow!("seed admin: {e}"))?;

        let storage = Arc::new(Storage::new(&config.s3).await?) as Arc<dyn StorageClient>;
        let topics = Arc::new(SampleTopics) as Arc<dyn TopicSource>;

        Ok(Self {
            db,
            config,
            storage,
            topics,
        })
    }
}

#[cfg(test)]
impl AppState {
    /// State with a lazy unconnected pool and a no-op storage client, for
    /// tests that never touch the database.
    pub(crate) fn fake() -> Self {
        use axum::async_trait;
        use bytes::Bytes;

        #[derive(Clone)]
        struct FakeStorage;
        #[async_trait]
        impl StorageClient for FakeStorage {
            async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
                Ok(())
            }
            fn object_url(&self, key: &str) -> String {
                format!("https://fake.local/{}", key)
            }
        }

        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy("sqlite::memory:")
            .expect("lazy pool ok");

        let config = Arc::new(AppConfig {
            database_path: ":memory:".into(),
            auth: crate::config::AuthConfig {
                secret: "test-secret".into(),
                token_ttl_hours: 24,
            },
            cron_secret: "test-cron-secret".into(),
            s3: crate::config::S3Config {
                endpoint: "http://fake.local".into(),
                region: "us-east-1".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                bucket: "fake".into(),
                public_url: None,
            },
        });

        Self {
            db,
            config,
            storage: Arc::new(FakeStorage) as Arc<dyn StorageClient>,
            topics: Arc::new(SampleTopics) as Arc<dyn TopicSource>,
        }
    }

    /// `fake()` plus a real in-memory database with schema and seeded admin.
    pub(crate) async fn for_tests() -> Self {
        let db = db::memory_pool().await;
        auth::repo::seed_admin(&db).await.expect("seed admin");
        let mut state = Self::fake();
        state.db = db;
        state
    }
}
