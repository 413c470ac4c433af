use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::error::{PipetrendError, Result};

use super::types::GitLabVariable;

/// Variable cache for GitLab pipelines.
///
/// Finished pipelines are immutable, so their variables never change; caching
/// them avoids one API call per pipeline on repeat runs. Uses per-project
/// cache files in platform-specific cache directories:
/// - Linux: `~/.cache/pipetrend/gitlab/{project-slug}.json`
/// - macOS: `~/Library/Caches/pipetrend/gitlab/{project-slug}.json`
///
/// Cache is loaded into memory at startup and immutable - new cache is
/// derived from final fetched data.
pub struct VariableCache {
    cache_file: PathBuf,
    variables: HashMap<u64, Vec<GitLabVariable>>,
    enabled: bool,
}

impl VariableCache {
    /// Creates a new variable cache instance.
    ///
    /// Loads existing cache from disk if available. All cache data is kept in
    /// memory for fast lookups.
    ///
    /// # Errors
    ///
    /// Returns error if the cache directory cannot be determined or created.
    pub fn new(project: &str, enabled: bool) -> Result<Self> {
        if !enabled {
            debug!("Variable cache disabled");
            return Ok(Self {
                cache_file: PathBuf::new(),
                variables: HashMap::new(),
                enabled: false,
            });
        }

        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| PipetrendError::Cache("No cache directory found".into()))?
            .join("pipetrend")
            .join("gitlab");

        fs::create_dir_all(&cache_dir)?;

        let cache_file = cache_dir.join(Self::cache_filename(project));

        let variables = if cache_file.exists() {
            fs::read_to_string(&cache_file)
                .ok()
                .and_then(|content| serde_json::from_str(&content).ok())
                .inspect(|_| debug!("Loaded cache from: {}", cache_file.display()))
                .unwrap_or_else(|| {
                    warn!("Failed to load cache, starting with empty cache");
                    HashMap::new()
                })
        } else {
            HashMap::new()
        };

        info!("Variable cache enabled at: {}", cache_file.display());

        Ok(Self {
            cache_file,
            variables,
            enabled: true,
        })
    }

    /// Attempts to retrieve cached variables for a pipeline.
    ///
    /// Returns `None` if caching is disabled or no entry exists.
    pub fn get(&self, pipeline_id: u64) -> Option<Vec<GitLabVariable>> {
        if !self.enabled {
            return None;
        }

        self.variables.get(&pipeline_id).map(|cached| {
            debug!("Cache hit for pipeline {pipeline_id}");
            cached.clone()
        })
    }

    /// Derives cache from resolved variables and saves to disk.
    ///
    /// The caller only passes variables of finished pipelines, which are safe
    /// to reuse indefinitely.
    pub fn save(&self, variables: &HashMap<u64, Vec<GitLabVariable>>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let content = serde_json::to_string(variables)?;
        fs::write(&self.cache_file, content)?;

        debug!(
            "Saved variables of {} pipelines to cache: {}",
            variables.len(),
            self.cache_file.display()
        );

        Ok(())
    }

    /// Clears cached data for a specific project.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be removed.
    pub fn clear_project_cache(project: &str) -> Result<()> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| PipetrendError::Cache("No cache directory found".into()))?
            .join("pipetrend")
            .join("gitlab");

        let cache_file = cache_dir.join(Self::cache_filename(project));

        if cache_file.exists() {
            fs::remove_file(&cache_file)?;
            info!("Cache cleared: {}", cache_file.display());
        } else {
            info!("No cache file found for project: {project}");
        }

        Ok(())
    }

    fn cache_filename(project: &str) -> String {
        project.replace('/', "-") + ".json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn variables(pairs: &[(&str, &str)]) -> Vec<GitLabVariable> {
        pairs
            .iter()
            .map(|(key, value)| GitLabVariable {
                key: (*key).to_string(),
                value: (*value).to_string(),
            })
            .collect()
    }

    // Helper to create a cache rooted in a temporary directory
    fn cache_with_dir(dir: &std::path::Path, project: &str) -> VariableCache {
        let cache_dir = dir.join("pipetrend").join("gitlab");
        fs::create_dir_all(&cache_dir).unwrap();

        let cache_file = cache_dir.join(VariableCache::cache_filename(project));

        let cached = if cache_file.exists() {
            fs::read_to_string(&cache_file)
                .ok()
                .and_then(|content| serde_json::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            HashMap::new()
        };

        VariableCache {
            cache_file,
            variables: cached,
            enabled: true,
        }
    }

    #[test]
    fn disabled_cache_stores_and_returns_nothing() {
        let cache = VariableCache::new("group/project", false).unwrap();
        assert!(!cache.enabled);
        assert!(cache.get(1).is_none());

        let mut resolved = HashMap::new();
        resolved.insert(1, variables(&[("STAGE", "deploy")]));
        assert!(cache.save(&resolved).is_ok());
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_with_dir(temp_dir.path(), "group/project");

        let mut resolved = HashMap::new();
        resolved.insert(
            7,
            variables(&[("STAGE", "deploy"), ("ENVIRONMENT", "prod")]),
        );
        resolved.insert(8, variables(&[]));
        cache.save(&resolved).unwrap();

        let reloaded = cache_with_dir(temp_dir.path(), "group/project");

        let cached = reloaded.get(7).unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].key, "STAGE");
        assert_eq!(cached[0].value, "deploy");

        // Pipelines without variables are cached too - absence of an entry
        // means "never fetched", not "no variables".
        assert_eq!(reloaded.get(8).unwrap(), variables(&[]));
        assert!(reloaded.get(999).is_none());
    }

    #[test]
    fn per_project_cache_files_are_independent() {
        let temp_dir = TempDir::new().unwrap();

        let cache1 = cache_with_dir(temp_dir.path(), "group/project1");
        let mut resolved1 = HashMap::new();
        resolved1.insert(1, variables(&[("STAGE", "build")]));
        cache1.save(&resolved1).unwrap();

        let cache2 = cache_with_dir(temp_dir.path(), "group/project2");
        let mut resolved2 = HashMap::new();
        resolved2.insert(2, variables(&[("STAGE", "test")]));
        cache2.save(&resolved2).unwrap();

        let cache_dir = temp_dir.path().join("pipetrend").join("gitlab");
        assert!(cache_dir.join("group-project1.json").exists());
        assert!(cache_dir.join("group-project2.json").exists());

        let reloaded1 = cache_with_dir(temp_dir.path(), "group/project1");
        assert!(reloaded1.get(1).is_some());
        assert!(reloaded1.get(2).is_none());
    }
}
