//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge `moviedb.toml` + `moviedb.<env>.toml` + the raw
//! credential variables + `MOVIEDB_*` env vars (`__` separates nested keys).
//! Credentials are required; everything else has a default.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::connection::{connection_string, redacted_connection_string};
use crate::error::{Error, Result};
use crate::types::SearchOptions;

pub const DEFAULT_CONFIG_FILE: &str = "moviedb.toml";

/// Credential variables read verbatim from the process environment.
pub const REQUIRED_KEYS: [&str; 5] = ["USER_NAME", "PASSWORD", "CLUSTER_NAME", "APP_NAME", "HUGGING_FACE_TOKEN"];

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path` (or `moviedb.toml` in the working directory).
    ///
    /// A missing default file is fine; a missing explicit file is an error.
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let base = match path {
            Some(p) => {
                let p = expand_path(p);
                if !p.is_file() {
                    return Err(Error::Configuration(format!("config file {} not found", p.display())));
                }
                p
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let mut figment = Figment::new().merge(Toml::file(&base));
        if let Some(env_file) = env_specific_file(&base, &env_name) {
            figment = figment.merge(Toml::file(env_file));
        }
        figment = figment
            .merge(Serialized::defaults(credentials_from_env()))
            .merge(Env::prefixed("MOVIEDB_").split("__"));

        tracing::debug!(file = %base.display(), env = %env_name, "configuration sources merged");
        Ok(Self { figment })
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        Settings::from_figment(&self.figment)
    }
}

fn env_specific_file(base: &Path, env_name: &str) -> Option<PathBuf> {
    let suffix = match env_name {
        "dev" | "development" => "dev",
        "prod" | "production" => "prod",
        "test" | "testing" => "test",
        _ => return None,
    };
    let stem = base.file_stem()?.to_string_lossy();
    Some(base.with_file_name(format!("{stem}.{suffix}.toml")))
}

fn credentials_from_env() -> BTreeMap<String, String> {
    REQUIRED_KEYS
        .iter()
        .filter_map(|key| env::var(key).ok().map(|v| (key.to_ascii_lowercase(), v)))
        .collect()
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Secrets needed to reach the document store and the embedding endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
    pub cluster_name: String,
    pub app_name: String,
    pub hugging_face_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"****")
            .field("cluster_name", &self.cluster_name)
            .field("app_name", &self.app_name)
            .field("hugging_face_token", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub scheme: String,
    pub name: String,
    pub collection: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            scheme: "mongodb+srv".to_string(),
            name: "sample_mflix".to_string(),
            collection: "movies".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[default]
    #[serde(alias = "huggingface", alias = "hf")]
    HuggingFace,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub url: String,
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            url: "https://router.huggingface.co/hf-inference/models/BAAI/bge-small-en-v1.5".to_string(),
            dimensions: 384,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillSettings {
    pub source_field: String,
    pub concurrency: usize,
    pub limit: Option<u64>,
    pub show_progress: bool,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self { source_field: "plot".to_string(), concurrency: 4, limit: None, show_progress: true }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    user_name: Option<String>,
    password: Option<String>,
    cluster_name: Option<String>,
    app_name: Option<String>,
    hugging_face_token: Option<String>,
    database: DatabaseSettings,
    embedding: EmbeddingSettings,
    search: SearchOptions,
    backfill: BackfillSettings,
}

/// Validated settings; constructing one never touches the network.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub database: DatabaseSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchOptions,
    pub backfill: BackfillSettings,
}

impl Settings {
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let raw: RawSettings = figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        let credentials = Credentials {
            user_name: required(raw.user_name, "USER_NAME")?,
            password: required(raw.password, "PASSWORD")?,
            cluster_name: required(raw.cluster_name, "CLUSTER_NAME")?,
            app_name: required(raw.app_name, "APP_NAME")?,
            hugging_face_token: required(raw.hugging_face_token, "HUGGING_FACE_TOKEN")?,
        };
        let settings = Self {
            credentials,
            database: raw.database,
            embedding: raw.embedding,
            search: raw.search,
            backfill: raw.backfill,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.database.name.trim().is_empty() || self.database.collection.trim().is_empty() {
            return Err(Error::Configuration("database name and collection must be set".to_string()));
        }
        if self.embedding.dimensions == 0 {
            return Err(Error::Configuration("embedding.dimensions must be positive".to_string()));
        }
        if self.embedding.provider == EmbeddingProvider::HuggingFace && self.embedding.url.trim().is_empty() {
            return Err(Error::Configuration("embedding.url must be set".to_string()));
        }
        if self.backfill.concurrency == 0 {
            return Err(Error::Configuration("backfill.concurrency must be at least 1".to_string()));
        }
        self.search
            .validate()
            .map_err(|e| Error::Configuration(format!("search: {e}")))
    }

    pub fn connection_string(&self) -> String {
        connection_string(&self.database.scheme, &self.credentials)
    }

    pub fn redacted_connection_string(&self) -> String {
        redacted_connection_string(&self.database.scheme, &self.credentials)
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(Error::Configuration(format!("required value {key} is blank"))),
        None => Err(Error::Configuration(format!("missing required value {key}"))),
    }
}
