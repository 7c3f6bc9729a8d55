use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use drain_core::{DocumentSettings, DEFAULT_LAYOUT};
use reqwest::Url;
use serde::{Deserialize, Deserializer};

use crate::fetch::FetchSettings;

pub const CONFIG_FILENAME: &str = "_drain.yml";
pub const DEFAULT_STATUS: &str = "sent";
pub const DEFAULT_API_URL: &str = "https://api.getdrip.com/v2/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("required key `{0}` is missing or empty")]
    MissingKey(&'static str),
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Immutable run settings, loaded once from `_drain.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub account_id: String,
    pub api_key: String,
    pub directory: PathBuf,
    pub layout: String,
    pub published: bool,
    pub status: String,
    pub overwrite: bool,
    /// Always ends with `/`.
    pub api_url: Url,
    pub request_timeout: Duration,
    /// Directory the configuration was loaded from; `directory` is relative to it.
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    #[serde(default, deserialize_with = "text_or_number")]
    account_id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    api_key: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    directory: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    layout: Option<String>,
    published: Option<bool>,
    #[serde(default, deserialize_with = "text_or_number")]
    status: Option<String>,
    overwrite: Option<bool>,
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Configuration {
    /// Load `{base_dir}/_drain.yml`.
    pub fn load(base_dir: &Path) -> Result<Self, ConfigError> {
        let path = base_dir.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Err(ConfigError::Missing(path));
        }
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_yaml(&text, base_dir)
    }

    /// Parse configuration text; relative paths resolve against `base_dir`.
    pub fn from_yaml(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as a mapping.
        let document = if text.trim().is_empty() { "{}" } else { text };
        let raw: RawConfiguration =
            serde_yaml::from_str(document).map_err(|source| ConfigError::Parse {
                path: base_dir.join(CONFIG_FILENAME),
                source,
            })?;

        Ok(Self {
            account_id: required(raw.account_id, "account_id")?,
            api_key: required(raw.api_key, "api_key")?,
            directory: PathBuf::from(required(raw.directory, "directory")?),
            layout: raw.layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
            published: raw.published.unwrap_or(true),
            status: raw.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            overwrite: raw.overwrite.unwrap_or(false),
            api_url: parse_api_url(raw.api_url.as_deref().unwrap_or(DEFAULT_API_URL))?,
            request_timeout: Duration::from_secs(
                raw.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Output directory; an absolute `directory` is used as-is.
    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.directory)
    }

    pub fn document_settings(&self) -> DocumentSettings {
        DocumentSettings {
            layout: self.layout.clone(),
            published: self.published,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: self.request_timeout,
            ..FetchSettings::default()
        }
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingKey(key)),
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "api_url",
        message,
    };
    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Text settings that YAML reads as integers, such as numeric Drip account
/// ids or a `directory: 2024`, are kept as their decimal text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Unsigned(n) => n.to_string(),
            TextOrNumber::Signed(n) => n.to_string(),
        }),
    )
}
