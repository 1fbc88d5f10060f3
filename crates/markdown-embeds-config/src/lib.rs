use markdown_embeds_engine::{CommandTable, Flavor, RenderOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// User configuration, read from `~/.config/markdown-embeds/config.toml`.
///
/// ```toml
/// [render]
/// flavor = "html"
/// ul = "- "
///
/// [variables]
/// server = "Rustaceans"
/// home = "~/bots"
///
/// [commands]
/// signature = "-- the mod team"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderSection,
    /// Values visible to commands. `~` and `$VAR` are expanded on load.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    /// Commands that expand to fixed text.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub flavor: Flavor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ul: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        for value in config.variables.values_mut() {
            if let Some(expanded) = Self::expand(value) {
                *value = expanded;
            }
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-embeds");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expand `~` and environment variables, or `None` if a variable is unset.
    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        Self::expand(&path.to_string_lossy()).map(PathBuf::from)
    }

    fn expand(text: &str) -> Option<String> {
        shellexpand::full(text)
            .ok()
            .map(|expanded| expanded.into_owned())
    }

    /// Render options with this configuration's settings and variables.
    pub fn render_options(&self) -> RenderOptions {
        let defaults = RenderOptions::default();
        RenderOptions {
            flavor: self.render.flavor,
            ul: self.render.ul.clone(),
            ol: self.render.ol.clone(),
            max_depth: self.render.max_depth.unwrap_or(defaults.max_depth),
            variables: self
                .variables
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect(),
        }
    }

    /// A command table holding the configured text commands.
    pub fn command_table(&self) -> CommandTable {
        self.commands
            .iter()
            .fold(CommandTable::new(), |table, (name, text)| {
                table.with_text(name.clone(), text.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_embeds_engine::render;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markdown-embeds/config.toml"));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.render_options(), RenderOptions::default());
    }

    #[test]
    fn test_parse_all_sections() {
        let config: Config = toml::from_str(
            r#"
[render]
flavor = "html"
ul = "- "
ol = "(n) "
max_depth = 8

[variables]
server = "Rustaceans"

[commands]
signature = "-- the mod team"
"#,
        )
        .unwrap();

        let options = config.render_options();
        assert_eq!(options.flavor, Flavor::Html);
        assert_eq!(options.ul.as_deref(), Some("- "));
        assert_eq!(options.ol.as_deref(), Some("(n) "));
        assert_eq!(options.max_depth, 8);
        assert_eq!(options.variables["server"], Value::String("Rustaceans".into()));
        assert_eq!(config.command_table().len(), 1);
    }

    #[test]
    fn test_unknown_flavor_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[render]\nflavor = \"rtf\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_commands_and_variables_reach_rendering() {
        let mut config = Config::default();
        config
            .commands
            .insert("signature".into(), "-- the mod team".into());
        config.variables.insert("server".into(), "Rustaceans".into());

        let rendered = render(
            "Welcome to {server}\n\n{signature}",
            &config.render_options(),
            &config.command_table(),
        )
        .unwrap();
        assert_eq!(
            rendered.embeds[0].description.as_deref(),
            Some("Welcome to Rustaceans\n\n-- the mod team")
        );
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path(Path::new("~/test/path")).unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        assert_eq!(Config::expand_path(&path).unwrap(), path);
    }

    #[test]
    fn test_variables_expand_env_on_load() {
        unsafe {
            env::set_var("MARKDOWN_EMBEDS_TEST_AVATAR", "https://x/avatar.png");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "[variables]\navatar = \"$MARKDOWN_EMBEDS_TEST_AVATAR\"\nliteral = \"$MARKDOWN_EMBEDS_TEST_UNSET\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(config.variables["avatar"], "https://x/avatar.png");
        assert_eq!(config.variables["literal"], "$MARKDOWN_EMBEDS_TEST_UNSET");

        unsafe {
            env::remove_var("MARKDOWN_EMBEDS_TEST_AVATAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        assert!(Config::load_from_path(&non_existent_config).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.render.flavor = Flavor::Html;
        config.render.ul = Some("* ".into());
        config.commands.insert("sig".into(), "bye".into());

        config.save_to_path(&config_file).unwrap();
        let loaded = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded, config);
    }
}
