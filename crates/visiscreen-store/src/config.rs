//! Configuration and store factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use visiscreen_core::engine::VisualFieldPolicy;
use visiscreen_core::record::DEFAULT_DEVICE;
use visiscreen_core::registry::Registry;
use visiscreen_core::traits::RecordStore;

use crate::file::FileStore;
use crate::http::HttpStore;
use crate::memory::MemoryStore;

/// Where screening records are kept.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    File {
        #[serde(default = "default_store_root")]
        root: PathBuf,
    },
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::File { root } => f.debug_struct("File").field("root", root).finish(),
            StoreConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            root: default_store_root(),
        }
    }
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./visiscreen-records")
}

fn default_timeout() -> u64 {
    30
}

/// Evaluation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Whether an abnormal visual field counts as a failed item.
    #[serde(default)]
    pub visual_field_policy: VisualFieldPolicy,
}

/// Top-level visiscreen configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisiscreenConfig {
    /// Screening device recorded when an intake names none.
    #[serde(default = "default_device")]
    pub device: String,
    /// Collection that records are stored under.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Offer the all-N/A `unspecified` job group.
    #[serde(default = "default_true")]
    pub include_catch_all: bool,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Output directory for exported summaries and forms.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}
fn default_collection() -> String {
    "vision_screenings".to_string()
}
fn default_true() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./visiscreen-exports")
}

impl Default for VisiscreenConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            collection: default_collection(),
            include_catch_all: true,
            evaluation: EvaluationConfig::default(),
            store: StoreConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl VisiscreenConfig {
    /// Registry variant selected by `include_catch_all`.
    pub fn registry(&self) -> Registry {
        Registry::with_catch_all(self.include_catch_all)
    }

    pub fn visual_field_policy(&self) -> VisualFieldPolicy {
        self.evaluation.visual_field_policy
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a store config.
fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::File { root } => StoreConfig::File {
            root: PathBuf::from(resolve_env_vars(&root.to_string_lossy())),
        },
        StoreConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => StoreConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key
                .as_ref()
                .map(|k| resolve_env_vars(k))
                .filter(|k| !k.is_empty()),
            timeout_secs: *timeout_secs,
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Apply `VISISCREEN_STORE_URL` / `VISISCREEN_API_KEY` overrides.
///
/// A store URL switches the store to HTTP; an API key alone only applies to
/// an HTTP store.
fn apply_env_overrides(config: &mut VisiscreenConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("VISISCREEN_STORE_URL") {
        match &mut config.store {
            StoreConfig::Http { base_url, .. } => *base_url = url,
            other => {
                *other = StoreConfig::Http {
                    base_url: url,
                    api_key: None,
                    timeout_secs: default_timeout(),
                }
            }
        }
    }

    if let Some(key) = lookup("VISISCREEN_API_KEY") {
        if let StoreConfig::Http { api_key, .. } = &mut config.store {
            *api_key = Some(key);
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `visiscreen.toml` in the current directory
/// 2. `~/.config/visiscreen/config.toml`
///
/// Environment variable overrides: `VISISCREEN_STORE_URL`, `VISISCREEN_API_KEY`.
pub fn load_config() -> Result<VisiscreenConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VisiscreenConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("visiscreen.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<VisiscreenConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => VisiscreenConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config.store = resolve_store_config(&config.store);

    tracing::debug!(store = ?config.store, collection = %config.collection, "loaded config");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("visiscreen"))
}

/// Create a record store from the configuration.
pub fn create_store(config: &VisiscreenConfig) -> Result<Box<dyn RecordStore>> {
    match &config.store {
        StoreConfig::File { root } => Ok(Box::new(FileStore::new(root, &config.collection))),
        StoreConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => Ok(Box::new(HttpStore::new(
            base_url,
            &config.collection,
            api_key.clone(),
            *timeout_secs,
        )?)),
        StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_VISISCREEN_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_VISISCREEN_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_VISISCREEN_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_VISISCREEN_UNSET_VAR}"), "");
        std::env::remove_var("_VISISCREEN_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = VisiscreenConfig::default();
        assert_eq!(config.device, "Titmus V2a");
        assert_eq!(config.collection, "vision_screenings");
        assert!(config.include_catch_all);
        assert_eq!(config.visual_field_policy(), VisualFieldPolicy::ReferenceOnly);
        assert!(matches!(config.store, StoreConfig::File { .. }));
        assert_eq!(config.registry().len(), 7);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
device = "Optec 5000"
collection = "clinic_a"
include_catch_all = false

[evaluation]
visual_field_policy = "fold_into_failures"

[store]
type = "http"
base_url = "https://records.example.org"
api_key = "secret"
"#;
        let config: VisiscreenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.device, "Optec 5000");
        assert_eq!(config.registry().len(), 6);
        assert_eq!(
            config.visual_field_policy(),
            VisualFieldPolicy::FoldIntoFailures
        );
        match &config.store {
            StoreConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => {
                assert_eq!(base_url, "https://records.example.org");
                assert_eq!(api_key.as_deref(), Some("secret"));
                assert_eq!(*timeout_secs, 30);
            }
            other => panic!("expected http store, got {other:?}"),
        }
    }

    #[test]
    fn debug_masks_api_key() {
        let store = StoreConfig::Http {
            base_url: "https://records.example.org".into(),
            api_key: Some("super-secret".into()),
            timeout_secs: 30,
        };
        let debug = format!("{store:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn env_overrides() {
        let mut config = VisiscreenConfig::default();
        apply_env_overrides(&mut config, |name| match name {
            "VISISCREEN_STORE_URL" => Some("http://localhost:8080".into()),
            "VISISCREEN_API_KEY" => Some("from-env".into()),
            _ => None,
        });
        assert_eq!(
            config.store,
            StoreConfig::Http {
                base_url: "http://localhost:8080".into(),
                api_key: Some("from-env".into()),
                timeout_secs: 30,
            }
        );

        // a key alone leaves a file store untouched
        let mut config = VisiscreenConfig::default();
        apply_env_overrides(&mut config, |name| {
            (name == "VISISCREEN_API_KEY").then(|| "k".to_string())
        });
        assert!(matches!(config.store, StoreConfig::File { .. }));
    }

    #[test]
    fn resolves_env_in_store_config() {
        std::env::set_var("_VISISCREEN_KEY_REF", "resolved-key");
        let store = resolve_store_config(&StoreConfig::Http {
            base_url: "https://x".into(),
            api_key: Some("${_VISISCREEN_KEY_REF}".into()),
            timeout_secs: 5,
        });
        std::env::remove_var("_VISISCREEN_KEY_REF");
        assert!(matches!(
            store,
            StoreConfig::Http { api_key: Some(ref k), .. } if k == "resolved-key"
        ));

        let empty = resolve_store_config(&StoreConfig::Http {
            base_url: "https://x".into(),
            api_key: Some("${_VISISCREEN_MISSING_KEY}".into()),
            timeout_secs: 5,
        });
        assert!(matches!(empty, StoreConfig::Http { api_key: None, .. }));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visiscreen.toml");
        std::fs::write(&path, "collection = \"site_b\"\n[store]\ntype = \"memory\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.collection, "site_b");

        let missing = dir.path().join("nope.toml");
        assert!(load_config_from(Some(&missing)).is_err());
    }

    #[tokio::test]
    async fn create_memory_store() {
        let config = VisiscreenConfig {
            store: StoreConfig::Memory,
            ..Default::default()
        };
        let store = create_store(&config).unwrap();
        assert_eq!(store.name(), "memory");
    }
}
