pub mod config {
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Deserialize, Debug, Clone, PartialEq)]
    pub struct Config {
        #[serde(default = "default_redis_host")]
        pub redis_host: String,
        #[serde(default = "default_redis_port")]
        pub redis_port: u16,
        #[serde(default = "default_port")]
        pub port: u16,
        /// Upper bound for a single store round trip, in milliseconds. Must be positive.
        #[serde(default = "default_store_timeout_ms")]
        pub store_timeout_ms: u64,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            Self::from_settings(settings)
        }

        pub(crate) fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
            let config: Config = settings.try_deserialize()?;
            if config.store_timeout_ms == 0 {
                anyhow::bail!("store_timeout_ms must be greater than zero");
            }
            Ok(config)
        }

        /// Returns the connection URL of the Redis instance holding the todos.
        pub fn redis_url(&self) -> String {
            format!("redis://{}:{}/", self.redis_host, self.redis_port)
        }

        pub fn store_timeout(&self) -> Duration {
            Duration::from_millis(self.store_timeout_ms)
        }
    }

    fn default_redis_host() -> String {
        "localhost".to_string()
    }

    fn default_redis_port() -> u16 {
        6379
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_store_timeout_ms() -> u64 {
        5000
    }

}

pub mod store;
pub mod todo;
pub mod web;
