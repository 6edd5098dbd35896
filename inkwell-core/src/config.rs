//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "inkwell.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the inkwell.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub output_mode: OutputMode,

    /// Metadata key used to order posts
    #[serde(default = "default_sort_field")]
    pub sort_field: String,

    #[serde(default)]
    pub missing_fields: MissingFieldPolicy,

    #[serde(default)]
    pub server: ServerConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_sort_field() -> String {
    String::from("date")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig::default(),
            templates: TemplatesConfig::default(),
            output_mode: OutputMode::default(),
            sort_field: default_sort_field(),
            missing_fields: MissingFieldPolicy::default(),
            server: ServerConfig::default(),
            config_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Substituted for `{{site_title}}`; not sent to the single-page client
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub tagline: String,

    /// Network name to profile URL
    #[serde(default)]
    pub social: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_content")]
    pub content: PathBuf,

    #[serde(default = "default_templates")]
    pub templates: PathBuf,

    #[serde(default = "default_assets")]
    pub assets: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// About page, only read in single-page mode
    #[serde(default = "default_about")]
    pub about: PathBuf,
}

fn default_content() -> PathBuf {
    PathBuf::from("content")
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_assets() -> PathBuf {
    PathBuf::from("assets")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_about() -> PathBuf {
    PathBuf::from("about.md")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content(),
            templates: default_templates(),
            assets: default_assets(),
            output: default_output(),
            about: default_about(),
        }
    }
}

/// Template file names inside the templates directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_page_template")]
    pub page: String,

    #[serde(default = "default_home_template")]
    pub home: String,

    #[serde(default = "default_app_template")]
    pub app: String,
}

fn default_page_template() -> String {
    String::from("layout.html")
}

fn default_home_template() -> String {
    String::from("home.html")
}

fn default_app_template() -> String {
    String::from("app.html")
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            page: default_page_template(),
            home: default_home_template(),
            app: default_app_template(),
        }
    }
}

/// How posts are laid out in the output directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One HTML file per post plus a home page
    #[default]
    Pages,
    /// Every post embedded as JSON into a single index.html
    SinglePage,
}

/// What to do when a template needs a header field a post does not have
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Fail the build, naming the post and the field
    #[default]
    Error,
    /// Substitute an empty string
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port used when serving a finished build in production mode
    #[serde(default = "default_preview_port")]
    pub preview_port: u16,
}

fn default_port() -> u16 {
    3000
}

fn default_preview_port() -> u16 {
    4173
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            preview_port: default_preview_port(),
        }
    }
}

/// Subset of the configuration that is embedded into the single-page payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfig {
    pub tagline: String,
    pub social: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults rooted next to it.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::debug!("No config at {:?}, using defaults", path);
        Ok(Self {
            config_path: Some(path.to_path_buf()),
            ..Self::default()
        })
    }

    /// Defaults with every path resolved under `root`. Mostly for tests.
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        Self {
            config_path: Some(root.as_ref().join(CONFIG_FILE_NAME)),
            ..Self::default()
        }
    }

    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.templates)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.assets)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    pub fn about_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.about)
    }

    /// Full path of a template file name from the templates directory
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.templates_dir().join(name)
    }

    /// Directories whose changes should trigger a rebuild
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        vec![self.content_dir(), self.templates_dir(), self.assets_dir()]
    }

    /// The fields that are safe to ship to the browser
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            tagline: self.site.tagline.clone(),
            social: self.site.social.clone(),
        }
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config: Config = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.paths.content, PathBuf::from("content"));
        assert_eq!(config.paths.output, PathBuf::from("dist"));
        assert_eq!(config.templates.page, "layout.html");
        assert_eq!(config.output_mode, OutputMode::Pages);
        assert_eq!(config.missing_fields, MissingFieldPolicy::Error);
        assert_eq!(config.sort_field, "date");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.preview_port, 4173);
    }

    #[test]
    fn test_paths_resolve_next_to_config_file() {
        let tmp = tempdir().unwrap();
        let config_path = tmp.path().join("inkwell.yml");
        fs::write(
            &config_path,
            r#"
site:
  title: "Blog"
  tagline: "Words"
  social:
    github: "https://github.com/me"
paths:
  content: posts
  output: /srv/www
output_mode: single_page
missing_fields: empty
"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.content_dir(), tmp.path().join("posts"));
        assert_eq!(config.templates_dir(), tmp.path().join("templates"));
        assert_eq!(config.output_dir(), PathBuf::from("/srv/www"));
        assert_eq!(config.output_mode, OutputMode::SinglePage);
        assert_eq!(config.missing_fields, MissingFieldPolicy::Empty);
        assert_eq!(
            config.template_path("layout.html"),
            tmp.path().join("templates").join("layout.html")
        );
    }

    #[test]
    fn test_client_config_omits_private_fields() {
        let mut config = Config::rooted_at("/tmp/site");
        config.site.title = "Private title".into();
        config.site.tagline = "Public tagline".into();
        config
            .site
            .social
            .insert("mastodon".into(), "https://example.social/@me".into());

        let json = serde_json::to_value(config.client_config()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "tagline": "Public tagline",
                "social": { "mastodon": "https://example.social/@me" }
            })
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let tmp = tempdir().unwrap();
        let config = Config::load_or_default(tmp.path().join("inkwell.yml")).unwrap();
        assert_eq!(config.content_dir(), tmp.path().join("content"));
        assert_eq!(config.sort_field, "date");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let tmp = tempdir().unwrap();
        let config_path = tmp.path().join("inkwell.yml");
        fs::write(&config_path, "output_mode: [unclosed").unwrap();
        assert!(matches!(
            Config::from_file(&config_path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
