use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use config::{Config as HierarchicalConfig, Environment};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of shelf managed directories (config, data)
const SHELF_DIR_NAME: &str = "shelf";
const SHELF_CONFIG_DIR_VAR: &str = "SHELF_CONFIG_DIR";
const SHELF_ENV_PREFIX: &str = "SHELF_";
pub const SHELF_CONFIG_FILE: &str = "shelf.toml";

pub const DEFAULT_PAGE_SIZE: u32 = 9;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug, Deserialize, Default, Serialize)]
pub struct Config {
    /// shelf configuration options
    #[serde(default, flatten)]
    pub shelf: ShelfConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ShelfConfig {
    /// Directory where shelf stores the remembered session (default:
    /// `$XDG_DATA_HOME/shelf`)
    #[serde(default)]
    pub data_dir: PathBuf,
    /// Directory where shelf loads its configuration file from (default:
    /// `$XDG_CONFIG_HOME/shelf`)
    #[serde(default)]
    pub config_dir: PathBuf,

    /// Base URL of the catalog API
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: Option<String>,

    /// Base URL of the cover image service
    pub covers_url: Option<String>,

    /// How many books make up one page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Seconds before a catalog request is abandoned
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            config_dir: PathBuf::new(),
            catalog_url: None,
            covers_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Layer the config sources, later sources win:
    ///
    /// 1. built in defaults
    /// 2. `/etc/shelf.toml`
    /// 3. `shelf.toml` in `$XDG_CONFIG_DIRS`
    /// 4. `shelf.toml` in the config dir (`$SHELF_CONFIG_DIR` or `$XDG_CONFIG_HOME/shelf`)
    /// 5. `SHELF_*` environment variables
    fn raw_config() -> Result<HierarchicalConfig> {
        let shelf_dirs = BaseDirectories::with_prefix(SHELF_DIR_NAME);

        let data_dir = shelf_dirs
            .get_data_home()
            .context("Could not determine data directory")?;

        let config_dir: PathBuf = match env::var(SHELF_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${SHELF_CONFIG_DIR_VAR}` set: {v}");
                v.into()
            },
            Err(_) => {
                let config_dir = shelf_dirs
                    .get_config_home()
                    .context("Could not determine config directory")?;
                debug!("`${SHELF_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };

        let mut builder = HierarchicalConfig::builder()
            .set_default("data_dir", data_dir.to_string_lossy().as_ref())?
            .set_default("page_size", DEFAULT_PAGE_SIZE)?
            .set_default("request_timeout", DEFAULT_REQUEST_TIMEOUT_SECS)?
            // Config dir is added to the config for completeness;
            // the config file cannot change the config dir.
            .set_override("config_dir", config_dir.to_string_lossy().as_ref())?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(PathBuf::from("/etc").join(SHELF_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // look for files in XDG_CONFIG_DIRS locations
        for file in shelf_dirs.find_config_files(SHELF_CONFIG_FILE) {
            builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        // Add explicit config dir file last
        builder = builder.add_source(
            config::File::from(config_dir.join(SHELF_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // override via env variables
        let shelf_envs = env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(SHELF_ENV_PREFIX)
                    .map(|k| (k.to_owned(), v))
            })
            .collect::<HashMap<_, _>>();

        let builder = builder.add_source(
            Environment::default()
                .source(Some(shelf_envs))
                .try_parsing(true),
        );

        Ok(builder.build()?)
    }

    /// Creates a [Config] from the environment and config files
    pub fn parse() -> Result<Config> {
        let raw_config = Self::raw_config()?;
        let config: Config = raw_config
            .try_deserialize()
            .context("Could not parse config")?;

        if config.shelf.page_size == 0 {
            bail!("Invalid config: 'page_size' must be at least 1");
        }

        debug!(?config, "read config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Run `f` with `HOME` in a fresh tempdir and no shelf or XDG overrides
    fn with_clean_env<R>(
        extra: &[(&str, Option<&str>)],
        f: impl FnOnce(&std::path::Path) -> R,
    ) -> R {
        let home = tempfile::tempdir().unwrap();
        let home_str = home.path().to_string_lossy().to_string();

        let mut vars = vec![
            ("HOME", Some(home_str.as_str())),
            ("XDG_CONFIG_HOME", None),
            ("XDG_DATA_HOME", None),
            ("XDG_CACHE_HOME", None),
            ("XDG_CONFIG_DIRS", Some("/nonexistent")),
            (SHELF_CONFIG_DIR_VAR, None),
            ("SHELF_PAGE_SIZE", None),
            ("SHELF_CATALOG_URL", None),
            ("SHELF_COVERS_URL", None),
            ("SHELF_REQUEST_TIMEOUT", None),
            ("SHELF_DATA_DIR", None),
        ];
        vars.extend_from_slice(extra);

        temp_env::with_vars(vars, || f(home.path()))
    }

    #[test]
    fn defaults_without_config_file() {
        with_clean_env(&[], |home| {
            let config = Config::parse().unwrap();
            assert_eq!(config.shelf.page_size, DEFAULT_PAGE_SIZE);
            assert_eq!(config.shelf.request_timeout, DEFAULT_REQUEST_TIMEOUT_SECS);
            assert_eq!(config.shelf.catalog_url, None);
            assert_eq!(config.shelf.data_dir, home.join(".local/share/shelf"));
            assert_eq!(config.shelf.config_dir, home.join(".config/shelf"));
        });
    }

    #[test]
    fn set_by_env() {
        with_clean_env(
            &[
                ("SHELF_PAGE_SIZE", Some("12")),
                ("SHELF_CATALOG_URL", Some("http://localhost:8080")),
            ],
            |_| {
                let config = Config::parse().unwrap();
                assert_eq!(config.shelf.page_size, 12);
                assert_eq!(
                    config.shelf.catalog_url.as_deref(),
                    Some("http://localhost:8080")
                );
            },
        );
    }

    #[test]
    fn read_from_config_dir_and_overridden_by_env() {
        let config_dir = tempfile::tempdir().unwrap();
        fs::write(
            config_dir.path().join(SHELF_CONFIG_FILE),
            indoc! {r#"
                page_size = 4
                request_timeout = 10
                covers_url = "http://localhost:9000/b"
            "#},
        )
        .unwrap();
        let config_dir_str = config_dir.path().to_string_lossy().to_string();

        with_clean_env(
            &[
                (SHELF_CONFIG_DIR_VAR, Some(config_dir_str.as_str())),
                ("SHELF_PAGE_SIZE", Some("6")),
            ],
            |_| {
                let config = Config::parse().unwrap();
                assert_eq!(config.shelf.page_size, 6);
                assert_eq!(config.shelf.request_timeout, 10);
                assert_eq!(
                    config.shelf.covers_url.as_deref(),
                    Some("http://localhost:9000/b")
                );
                assert_eq!(config.shelf.config_dir, config_dir.path());
            },
        );
    }

    #[test]
    fn zero_page_size_is_rejected() {
        with_clean_env(&[("SHELF_PAGE_SIZE", Some("0"))], |_| {
            assert!(Config::parse().is_err());
        });
    }
}
