//! Prompt library for the text-generation backends
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/penny/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model_router::TaskType;

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const SUGGEST_CATEGORY: &str = include_str!("../../../prompts/suggest_category.md");
    pub const MONTHLY_REPORT: &str = include_str!("../../../prompts/monthly_report.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    SuggestCategory,
    MonthlyReport,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuggestCategory => "suggest_category",
            Self::MonthlyReport => "monthly_report",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::SuggestCategory, Self::MonthlyReport]
    }

    /// Task whose sampling settings this prompt is written for
    pub fn task_type(&self) -> TaskType {
        match self {
            Self::SuggestCategory => TaskType::Classification,
            Self::MonthlyReport => TaskType::Narrative,
        }
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::SuggestCategory => defaults::SUGGEST_CATEGORY,
            Self::MonthlyReport => defaults::MONTHLY_REPORT,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    /// Task key in `models.toml`
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt content (system + user sections)
    pub content: String,
}

/// Prompt text ready to send: optional system instructions plus the user turn
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the user section (or the whole body when it has none)
    ///
    /// Conditional blocks `{{#if var}}...{{/if}}` are resolved before
    /// variables are substituted, so values can never open a block.
    pub fn render_user(&self, vars: &HashMap<&str, String>) -> String {
        let template = self.user_section().unwrap_or(&self.content);
        substitute(&resolve_conditionals(template, vars), vars)
    }

    /// Render both sections; a blank system section is dropped
    pub fn render(&self, vars: &HashMap<&str, String>) -> RenderedPrompt {
        let system = self
            .system_section()
            .filter(|s| !s.is_empty())
            .map(|s| substitute(&resolve_conditionals(s, vars), vars));
        RenderedPrompt {
            system,
            user: self.render_user(vars),
        }
    }
}

/// Prompt library for loading and caching prompts
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("prompt {}", id.as_str())))
    }

    /// Load and render a prompt in one step
    pub fn render(&mut self, id: PromptId, vars: &HashMap<&str, String>) -> Result<RenderedPrompt> {
        Ok(self.get(id)?.render(vars))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                if metadata.task_type == id.task_type().as_str() {
                    debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
                    return Ok(Prompt {
                        metadata,
                        content: body,
                    });
                }
                warn!(
                    prompt = id.as_str(),
                    task_type = %metadata.task_type,
                    expected = id.task_type().as_str(),
                    "Ignoring prompt override written for another task"
                );
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
        })
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("penny").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

/// Single-pass `{{var}}` replacement; inserted values are never rescanned
/// and unknown placeholders are left as they are
fn substitute(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            break;
        };
        result.push_str(&rest[..open]);
        match vars.get(after[..close].trim()) {
            Some(value) => result.push_str(value),
            None => result.push_str(&rest[open..open + close + 4]),
        }
        rest = &after[close + 2..];
    }

    result.push_str(rest);
    result
}

/// Keep `{{#if var}}` blocks whose variable is non-empty, drop the rest
fn resolve_conditionals(content: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(if_start) = rest.find("{{#if ") {
        let after_tag = &rest[if_start + 6..];
        let Some(var_end) = after_tag.find("}}") else {
            break;
        };
        let body_and_tail = &after_tag[var_end + 2..];
        let Some(endif) = body_and_tail.find("{{/if}}") else {
            break;
        };

        let var_name = after_tag[..var_end].trim();
        result.push_str(&rest[..if_start]);
        if vars.get(var_name).is_some_and(|v| !v.is_empty()) {
            result.push_str(&body_and_tail[..endif]);
        }
        rest = &body_and_tail[endif + 7..];
    }

    result.push_str(rest);
    result
}
