/// Fallback signing secret for local development. Startup refuses to run
/// with this value when APP_ENV=production.
const DEFAULT_AUTH_SECRET: &str = "demo-secret-change-in-production";

const DEFAULT_CRON_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// When set, uploaded object URLs are built as `{public_url}/{key}`;
    /// the override is expected to already route to the bucket.
    pub public_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub auth: AuthConfig,
    pub cron_secret: String,
    pub s3: S3Config,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/app.db".into());
        let auth = AuthConfig {
            secret: std::env::var("AUTH_SECRET").unwrap_or_else(|_| DEFAULT_AUTH_SECRET.into()),
            token_ttl_hours: std::env::var("AUTH_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        let cron_secret =
            std::env::var("CRON_SECRET").unwrap_or_else(|_| DEFAULT_CRON_SECRET.into());
        let s3 = S3Config {
            endpoint: std::env::var("S3_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".into()),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            access_key: std::env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".into()),
            secret_key: std::env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".into()),
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "blog-images".into()),
            public_url: std::env::var("S3_PUBLIC_URL").ok(),
        };

        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        if production && auth.secret == DEFAULT_AUTH_SECRET {
            anyhow::bail!("AUTH_SECRET must be set when APP_ENV=production");
        }

        Ok(Self {
            database_path,
            auth,
            cron_secret,
            s3,
        })
    }
}
