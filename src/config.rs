//! Settings parsed from `typedblocks.toml` files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The name of the file [`Config::discover`] looks for.
pub const CONFIG_FILE_NAME: &str = "typedblocks.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Layout of generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// The line width the pretty printer tries to stay within.
    pub width: usize,
    pub indent: isize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 80,
            indent: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    /// Whether variable blocks moved out of the scope of their declaration
    /// keep its type.
    pub unify_orphans: bool,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let file_contents = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&file_contents)?;
        Ok(config)
    }

    /// Loads `path` if given. Otherwise loads [`CONFIG_FILE_NAME`] from `dir`
    /// if it exists, falling back to the defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigLoadError> {
        let path = match path {
            Some(path) => PathBuf::from(path),
            None => {
                let candidate = dir.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    tracing::debug!(dir = %dir.display(), "no config file found, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        tracing::debug!(path = %path.display(), "loading config");
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Config, ConfigLoadError, GeneratorConfig, InferenceConfig};

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.generator.width, 80);
        assert_eq!(config.generator.indent, 2);
        assert!(!config.inference.unify_orphans);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [generator]
            width = 40

            [inference]
            unify_orphans = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                generator: GeneratorConfig {
                    width: 40,
                    indent: 2,
                },
                inference: InferenceConfig {
                    unify_orphans: true,
                },
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[generator]\ncolour = true\n").is_err());
        assert!(toml::from_str::<Config>("[output]\n").is_err());
    }

    #[test]
    fn missing_files_are_io_errors() {
        let err = Config::load("/definitely/not/a/real/typedblocks.toml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io(_)));
    }

    #[test]
    fn discovery_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("typedblocks-config-discovery-test");
        let config = Config::discover(None, &dir).unwrap();
        assert_eq!(config, Config::default());
    }
}
