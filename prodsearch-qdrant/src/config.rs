use std::fmt;
use std::time::Duration;

use crate::{QdrantProductSearch, QdrantSearchError};

pub const ENV_QDRANT_URL: &str = "QDRANT_URL";
pub const ENV_QDRANT_API_KEY: &str = "QDRANT_API_KEY";
pub const ENV_COLLECTION_NAME: &str = "COLLECTION_NAME";
pub const ENV_QDRANT_VECTOR_SIZE: &str = "QDRANT_VECTOR_SIZE";
pub const ENV_QDRANT_TIMEOUT_SECS: &str = "QDRANT_TIMEOUT_SECS";
pub const ENV_QDRANT_INTENT_URL: &str = "QDRANT_URL_2";
pub const ENV_QDRANT_INTENT_API_KEY: &str = "QDRANT_API_KEY_2";
pub const ENV_INTENT_COLLECTION_NAME: &str = "QDRANT_COLLECTION_NAME_2";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Names of the variables that locate one collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionEnv {
    pub url: &'static str,
    pub api_key: &'static str,
    pub collection: &'static str,
}

impl CollectionEnv {
    pub const PRODUCTS: Self = Self {
        url: ENV_QDRANT_URL,
        api_key: ENV_QDRANT_API_KEY,
        collection: ENV_COLLECTION_NAME,
    };

    pub const INTENTS: Self = Self {
        url: ENV_QDRANT_INTENT_URL,
        api_key: ENV_QDRANT_INTENT_API_KEY,
        collection: ENV_INTENT_COLLECTION_NAME,
    };

    fn required(&self) -> [&'static str; 3] {
        [self.url, self.api_key, self.collection]
    }
}

/// Connection settings for one collection, validated once at startup.
#[derive(Clone, PartialEq)]
pub struct QdrantConfig {
    pub base_url: String,
    pub api_key: String,
    pub collection: String,
    /// When set, query vectors of any other length are rejected locally.
    pub vector_size: Option<usize>,
    pub timeout: Duration,
}

impl fmt::Debug for QdrantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdrantConfig")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("api_key", &"<redacted>")
            .field("vector_size", &self.vector_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QdrantConfig {
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            api_key: api_key.into(),
            collection: collection.into(),
            vector_size: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `QDRANT_URL`, `QDRANT_API_KEY` and `COLLECTION_NAME` from the
    /// process environment, plus the optional `QDRANT_VECTOR_SIZE` and
    /// `QDRANT_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// [`QdrantSearchError::MissingEnvVars`] lists every required variable
    /// that is unset or blank, not just the first one.
    pub fn from_env() -> Result<Self, QdrantSearchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`QdrantConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QdrantSearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_for(CollectionEnv::PRODUCTS, lookup)
    }

    /// Reads the collection named by `env`. The optional vector size and
    /// timeout variables are shared by every collection.
    pub fn from_lookup_for<F>(env: CollectionEnv, lookup: F) -> Result<Self, QdrantSearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |name: &str| {
            let value = non_blank(name);
            if value.is_none() {
                missing.push(name.to_string());
            }
            value.unwrap_or_default()
        };

        let base_url = required(env.url);
        let api_key = required(env.api_key);
        let collection = required(env.collection);

        if !missing.is_empty() {
            tracing::error!(missing = ?missing, "qdrant configuration is incomplete");
            return Err(QdrantSearchError::MissingEnvVars(missing));
        }

        let mut config = Self::new(base_url, api_key.trim(), collection.trim());

        if let Some(value) = non_blank(ENV_QDRANT_VECTOR_SIZE) {
            config.vector_size = Some(parse_positive(ENV_QDRANT_VECTOR_SIZE, &value)?);
        }
        if let Some(value) = non_blank(ENV_QDRANT_TIMEOUT_SECS) {
            let secs = parse_positive(ENV_QDRANT_TIMEOUT_SECS, &value)?;
            config.timeout = Duration::from_secs(secs as u64);
        }

        Ok(config)
    }

    /// `Ok(None)` when none of the collection's required variables are set;
    /// a partial set is still an error.
    pub fn from_lookup_if_present<F>(
        env: CollectionEnv,
        lookup: F,
    ) -> Result<Option<Self>, QdrantSearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let unset = env
            .required()
            .iter()
            .all(|name| lookup(name).map_or(true, |value| value.trim().is_empty()));
        if unset {
            return Ok(None);
        }

        Self::from_lookup_for(env, lookup).map(Some)
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize, QdrantSearchError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|parsed| *parsed > 0)
        .ok_or_else(|| QdrantSearchError::InvalidEnvVar {
            name: name.to_string(),
            reason: format!("expected a positive integer, got '{value}'"),
        })
}

/// Hosted Qdrant only speaks HTTPS, so a bare host gets an `https://` scheme.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[derive(Default, Clone)]
pub struct QdrantSearchBuilder {
    base_url: Option<String>,
    collection: Option<String>,
    api_key: Option<String>,
    vector_size: Option<usize>,
    timeout: Option<Duration>,
}

impl fmt::Debug for QdrantSearchBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("QdrantSearchBuilder")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("api_key", &api_key)
            .finish()
    }
}

impl QdrantSearchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }

    pub fn collection(mut self, value: impl Into<String>) -> Self {
        self.collection = Some(value.into());
        self
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(value.into());
        self
    }

    pub fn vector_size(mut self, value: usize) -> Self {
        self.vector_size = Some(value);
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = Some(value);
        self
    }

    pub fn build_config(self) -> Result<QdrantConfig, QdrantSearchError> {
        let base_url = self.base_url.ok_or(QdrantSearchError::MissingBaseUrl)?;
        if base_url.trim().is_empty() {
            return Err(QdrantSearchError::EmptyBaseUrl);
        }

        let api_key = self.api_key.ok_or(QdrantSearchError::MissingApiKey)?;
        if api_key.trim().is_empty() {
            return Err(QdrantSearchError::EmptyApiKey);
        }

        let collection = self.collection.ok_or(QdrantSearchError::MissingCollection)?;
        if collection.trim().is_empty() {
            return Err(QdrantSearchError::EmptyCollection);
        }

        if self.vector_size == Some(0) {
            return Err(QdrantSearchError::InvalidRequest(
                "vector_size must be greater than 0".to_string(),
            ));
        }

        let mut config = QdrantConfig::new(base_url, api_key, collection);
        config.vector_size = self.vector_size;
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        Ok(config)
    }

    pub fn build(self) -> Result<QdrantProductSearch, QdrantSearchError> {
        QdrantProductSearch::new(self.build_config()?)
    }
}

pub(crate) fn looks_like_qdrant_cloud(base_url: &str) -> bool {
    const CLOUD_DOMAIN: &[u8] = b"cloud.qdrant.io";

    base_url
        .as_bytes()
        .windows(CLOUD_DOMAIN.len())
        .any(|window| window.eq_ignore_ascii_case(CLOUD_DOMAIN))
}
