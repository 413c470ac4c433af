use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file structure for pipetrend.
///
/// Allows users to save common report settings and reuse them across runs.
/// Configuration files are loaded from the current directory or specified path.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// GitLab connection settings
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Comparison period settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// GitLab personal access token
    pub token: Option<String>,

    /// GitLab instance base URL
    #[serde(default = "default_gitlab_base_url")]
    pub base_url: String,

    /// GitLab project path (e.g., 'group/project') or numeric project ID
    pub project: Option<String>,

    /// Maximum number of pipelines to fetch per period
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Disable variable caching
    #[serde(default)]
    pub no_cache: bool,

    /// Clear variable cache before running
    #[serde(default)]
    pub clear_cache: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    /// Year reported on (defaults to the current year)
    pub current_year: Option<i32>,

    /// Baseline year (defaults to the year before the current one)
    pub previous_year: Option<i32>,

    /// Also report groups that only exist in the baseline year
    #[serde(default)]
    pub include_retired: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Csv,
    Html,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_gitlab_base_url(),
            project: None,
            limit: default_limit(),
            no_cache: false,
            clear_cache: false,
        }
    }
}

fn default_gitlab_base_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_limit() -> usize {
    1000
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipetrend.toml
    /// 3. ./pipetrend.json
    /// 4. ./pipetrend.yaml
    /// 5. ./pipetrend.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "pipetrend.toml",
            "pipetrend.json",
            "pipetrend.yaml",
            "pipetrend.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        // No config file found, return defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gitlab.base_url, "https://gitlab.com");
        assert_eq!(config.gitlab.limit, 1000);
        assert_eq!(config.report.current_year, None);
        assert!(!config.report.include_retired);
        assert_eq!(config.output.format, OutputFormat::Summary);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[gitlab]
token = "glpat-test-token"
base-url = "https://gitlab.example.com"
project = "group/project"
limit = 100

[report]
current-year = 2022
previous-year = 2021
include-retired = true

[output]
format = "csv"
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.token, Some("glpat-test-token".to_string()));
        assert_eq!(config.gitlab.base_url, "https://gitlab.example.com");
        assert_eq!(config.gitlab.limit, 100);
        assert_eq!(config.report.current_year, Some(2022));
        assert_eq!(config.report.previous_year, Some(2021));
        assert!(config.report.include_retired);
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "gitlab": {
    "token": "glpat-json-token",
    "base-url": "https://gitlab.json.com"
  },
  "output": {
    "format": "html"
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.token, Some("glpat-json-token".to_string()));
        assert_eq!(config.gitlab.base_url, "https://gitlab.json.com");
        assert_eq!(config.output.format, OutputFormat::Html);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        let yaml_content = r"
gitlab:
  project: group/project
report:
  current-year: 2023
";
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.project, Some("group/project".to_string()));
        assert_eq!(config.report.current_year, Some(2023));
    }

    #[test]
    fn test_load_explicit_missing_path_is_an_error() {
        let result = Config::load(Some(Path::new("nonexistent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("pipetrend.toml");

        let mut config = Config::default();
        config.gitlab.project = Some("group/project".to_string());
        config.report.current_year = Some(2022);
        config.save(&path).unwrap();

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded.gitlab.project, Some("group/project".to_string()));
        assert_eq!(reloaded.report.current_year, Some(2022));
    }
}
