pub mod tracing;

use figment::{
    providers::{Env, Format, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppCfg {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub pool_size: usize,
    pub listen_addr: String,
    pub media_dir: String,
    pub media_base_url: String,
    pub allowed_origins: Vec<String>,
    pub feed: FeedCfg,
}

/// Page sizes of the various listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedCfg {
    pub feed_limit: i64,
    pub recent_limit: i64,
    pub trending_limit: i64,
    pub popular_groups_limit: i64,
    pub sidebar_groups_limit: i64,
    pub dashboard_limit: i64,
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            feed_limit: 20,
            recent_limit: 50,
            trending_limit: 20,
            popular_groups_limit: 10,
            sidebar_groups_limit: 5,
            dashboard_limit: 10,
        }
    }
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            store: StoreKind::Postgres,
            database_url: None,
            pool_size: 10,
            listen_addr: "0.0.0.0:3000".into(),
            media_dir: "./media".into(),
            media_base_url: "/media".into(),
            allowed_origins: vec!["https://localhost:3333".into()],
            feed: FeedCfg::default(),
        }
    }
}

impl AppCfg {
    /// Defaults, then `appsettings.json`, then `APP_*` environment variables.
    /// Nested keys use a double underscore, e.g. `APP_FEED__RECENT_LIMIT`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppCfg::default()))
            .merge(Json::file("appsettings.json"))
            .merge(Env::prefixed("APP_").split("__"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let cfg: AppCfg = Self::figment().extract()?;
        if cfg.store == StoreKind::Postgres && cfg.database_url.is_none() {
            anyhow::bail!("database_url is required when store = \"postgres\"");
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "appsettings.json",
                r#"{ "store": "memory", "listen_addr": "127.0.0.1:8080" }"#,
            )?;
            jail.set_env("APP_LISTEN_ADDR", "127.0.0.1:9090");
            jail.set_env("APP_FEED__RECENT_LIMIT", "5");

            let cfg: AppCfg = AppCfg::figment().extract()?;
            assert_eq!(cfg.store, StoreKind::Memory);
            assert_eq!(cfg.listen_addr, "127.0.0.1:9090");
            assert_eq!(cfg.feed.recent_limit, 5);
            assert_eq!(cfg.feed.feed_limit, 20);
            Ok(())
        });
    }

    #[test]
    fn postgres_requires_database_url() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_STORE", "postgres");
            assert!(AppCfg::load().is_err());
            jail.set_env("APP_DATABASE_URL", "postgres://localhost/gamehub");
            assert!(AppCfg::load().is_ok());
            Ok(())
        });
    }
}
