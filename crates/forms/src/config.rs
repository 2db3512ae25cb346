//! Pipeline configuration

use std::path::PathBuf;

use form_storage::{CredentialProvider, S3ObjectStore};
use serde::{Deserialize, Serialize};

use crate::schema::OverflowMode;
use crate::{FormError, Result};

fn default_bucket() -> String {
    "forms".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("assets/templates")
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Settings for [`crate::FormPipeline`]
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Destination bucket
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// S3-compatible endpoint override
    #[serde(rename = "endpointUrl")]
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Directory holding template PDFs
    #[serde(rename = "templateDir")]
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Where documents are staged before upload
    #[serde(rename = "stagingDir")]
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Keep staged files after a successful upload
    #[serde(rename = "keepStaged")]
    #[serde(default)]
    pub keep_staged: bool,

    /// Overflow behavior applied to every table, overriding layouts
    #[serde(rename = "tableOverflow")]
    #[serde(default)]
    pub table_overflow: Option<OverflowMode>,

    /// Directory of `{formType}.json` layout overrides
    #[serde(rename = "layoutDir")]
    #[serde(default)]
    pub layout_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint_url: None,
            template_dir: default_template_dir(),
            staging_dir: default_staging_dir(),
            keep_staged: false,
            table_overflow: None,
            layout_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FormError::ConfigError(e.to_string()))
    }

    /// Read configuration from `FORMS_*` environment variables
    ///
    /// | variable | default |
    /// |---|---|
    /// | `FORMS_BUCKET` | `forms` |
    /// | `FORMS_REGION` | `us-east-1` |
    /// | `FORMS_ENDPOINT_URL` | unset |
    /// | `FORMS_TEMPLATE_DIR` | `assets/templates` |
    /// | `FORMS_STAGING_DIR` | system temp dir |
    /// | `FORMS_KEEP_STAGED` | `false` |
    /// | `FORMS_TABLE_OVERFLOW` | per layout (`overrun`) |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(bucket) = lookup("FORMS_BUCKET") {
            config.bucket = bucket;
        }
        if let Some(region) = lookup("FORMS_REGION") {
            config.region = region;
        }
        config.endpoint_url = lookup("FORMS_ENDPOINT_URL").filter(|s| !s.is_empty());
        if let Some(dir) = lookup("FORMS_TEMPLATE_DIR") {
            config.template_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FORMS_STAGING_DIR") {
            config.staging_dir = PathBuf::from(dir);
        }
        if let Some(keep) = lookup("FORMS_KEEP_STAGED") {
            config.keep_staged = parse_bool(&keep).ok_or_else(|| {
                FormError::ConfigError(format!("FORMS_KEEP_STAGED is not a boolean: {keep}"))
            })?;
        }
        if let Some(mode) = lookup("FORMS_TABLE_OVERFLOW") {
            config.table_overflow = Some(mode.parse()?);
        }

        Ok(config)
    }

    /// S3 store for the configured region and endpoint
    pub fn s3_store<C: CredentialProvider>(&self, credentials: C) -> S3ObjectStore<C> {
        let store = S3ObjectStore::new(credentials, self.region.clone());
        match &self.endpoint_url {
            Some(endpoint) => store.with_endpoint_url(endpoint.clone()),
            None => store,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
