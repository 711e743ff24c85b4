//! Task-based model and sampling selection
//!
//! Each text-generation task (category suggestion, report narrative) gets its
//! own model, timeout and sampling parameters.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/penny/config/models.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

/// Task types for model routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Description -> type/category suggestion
    Classification,
    /// Monthly report prose
    Narrative,
}

impl TaskType {
    /// Get the config key for this task type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Narrative => "narrative",
        }
    }

    pub fn all() -> &'static [TaskType] {
        &[Self::Classification, Self::Narrative]
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "classification" => Ok(Self::Classification),
            "narrative" => Ok(Self::Narrative),
            _ => Err(format!("Unknown task type: {}", s)),
        }
    }
}

/// Configuration for a specific task type
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// Model override; `None` uses the backend's default model
    pub model: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    pub temperature: f32,
    /// Output token cap, if any
    pub max_tokens: Option<u32>,
}

impl TaskConfig {
    /// Model to request, given the backend's default
    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default_model)
    }
}

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub default_model: Option<String>,
    pub default_timeout: Duration,
    pub default_temperature: f32,
    pub tasks: HashMap<TaskType, TaskConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let mut tasks = HashMap::new();
        tasks.insert(
            TaskType::Classification,
            TaskConfig {
                model: None,
                timeout: Duration::from_secs(60),
                temperature: 0.1,
                max_tokens: None,
            },
        );
        tasks.insert(
            TaskType::Narrative,
            TaskConfig {
                model: None,
                timeout: Duration::from_secs(60),
                temperature: 0.3,
                max_tokens: Some(200),
            },
        );
        Self {
            default_model: None,
            default_timeout: Duration::from_secs(60),
            default_temperature: 0.2,
            tasks,
        }
    }
}

/// Model router for task-based model selection
#[derive(Debug, Clone)]
pub struct ModelRouter {
    config: RouterConfig,
    config_path: Option<PathBuf>,
}

impl ModelRouter {
    /// Create a new model router (override file, then embedded defaults)
    pub fn new() -> Result<Self> {
        let config_path = default_config_path();
        let config = load_config(config_path.as_deref())?;
        Ok(Self {
            config,
            config_path,
        })
    }

    /// Create with a custom config path
    pub fn with_config_path(path: PathBuf) -> Result<Self> {
        let config = load_config(Some(&path))?;
        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    /// Create with an explicit configuration (for testing)
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Get the full task configuration
    pub fn config_for_task(&self, task: TaskType) -> TaskConfig {
        self.config
            .tasks
            .get(&task)
            .cloned()
            .unwrap_or_else(|| TaskConfig {
                model: self.config.default_model.clone(),
                timeout: self.config.default_timeout,
                temperature: self.config.default_temperature,
                max_tokens: None,
            })
    }

    /// Get the config path (if using file-based config)
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid model config, using built-in defaults");
            Self::with_config(RouterConfig::default())
        })
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("penny").join("config").join("models.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<RouterConfig> {
    let content = match override_path {
        Some(path) if path.exists() => fs::read_to_string(path)
            .map_err(|e| Error::InvalidData(format!("Failed to read config: {}", e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    models: Option<HashMap<String, RawTaskConfig>>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawTaskConfig {
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<RouterConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::InvalidData(format!("Invalid config TOML: {}", e)))?;

    let mut config = RouterConfig::default();

    if let Some(defaults) = raw.defaults {
        if defaults.model.is_some() {
            config.default_model = defaults.model;
        }
        if let Some(timeout) = defaults.timeout_secs {
            config.default_timeout = Duration::from_secs(timeout);
        }
        if let Some(temperature) = defaults.temperature {
            config.default_temperature = temperature;
        }
    }

    if let Some(models) = raw.models {
        for (task_name, task_config) in models {
            let Ok(task) = task_name.parse::<TaskType>() else {
                continue; // Skip unknown task types
            };
            let base = config.tasks.get(&task).cloned();

            config.tasks.insert(
                task,
                TaskConfig {
                    model: task_config
                        .model
                        .or_else(|| config.default_model.clone()),
                    timeout: task_config
                        .timeout_secs
                        .map(Duration::from_secs)
                        .unwrap_or(config.default_timeout),
                    temperature: task_config
                        .temperature
                        .or(base.as_ref().map(|b| b.temperature))
                        .unwrap_or(config.default_temperature),
                    max_tokens: task_config
                        .max_tokens
                        .or(base.and_then(|b| b.max_tokens)),
                },
            );
        }
    }

    Ok(config)
}
