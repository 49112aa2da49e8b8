pub mod advisory;
pub mod error;
pub mod grants;
pub mod llm;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    pub const DEFAULT_PORT: u16 = 3000;
    pub const DEFAULT_GRANTS_SEARCH_URL: &str = "https://api.grants.gov/v1/api/search2";
    pub const DEFAULT_ADVISORY_ROWS: u32 = 5;
    pub const MAX_ADVISORY_ROWS: u32 = 100;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub port: u16,
        pub openai_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub grants_search_url: String,
        pub advisory_rows: u32,
        pub advisory_include_close_date: bool,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Builds settings from an arbitrary key lookup. Blank values count as unset.
        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            let port = get("PORT")
                .and_then(|s| s.trim().parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);

            let advisory_rows = get("ADVISORY_ROWS")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(DEFAULT_ADVISORY_ROWS)
                .clamp(1, MAX_ADVISORY_ROWS);

            let advisory_include_close_date = match get("ADVISORY_INCLUDE_CLOSE_DATE") {
                Some(v) => parse_bool(&v)
                    .with_context(|| format!("ADVISORY_INCLUDE_CLOSE_DATE is not a boolean: {v}"))?,
                None => true,
            };

            Ok(Self {
                port,
                openai_api_key: get("OPENAI_API_KEY"),
                sentry_dsn: get("SENTRY_DSN"),
                grants_search_url: get("GRANTS_SEARCH_URL")
                    .unwrap_or_else(|| DEFAULT_GRANTS_SEARCH_URL.to_string()),
                advisory_rows,
                advisory_include_close_date,
            })
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }
    }

    /// Reads a timeout in whole seconds; missing, unparseable or zero values use the default.
    pub fn env_timeout(key: &str, default_secs: u64) -> Duration {
        parse_timeout(std::env::var(key).ok(), default_secs)
    }

    fn parse_timeout(raw: Option<String>, default_secs: u64) -> Duration {
        let secs = raw
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(default_secs);
        Duration::from_secs(secs)
    }

    fn parse_bool(v: &str) -> Option<bool> {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

}
