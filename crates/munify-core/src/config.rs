use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ErrorCode;
use crate::model::{AssigneeId, ItemKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub messages: MessageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Prefix of draggable ids produced by the rendering layer.
    #[serde(default)]
    pub item_kind: ItemKind,
    #[serde(default)]
    pub include_weekends: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            item_kind: ItemKind::Reclamo,
            include_weekends: false,
        }
    }
}

/// Texts of the three user-visible move outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    #[serde(default = "default_moved")]
    pub moved: String,
    #[serde(default = "default_move_failed")]
    pub move_failed: String,
    #[serde(default = "default_unassign_hint")]
    pub unassign_hint: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            moved: default_moved(),
            move_failed: default_move_failed(),
            unassign_hint: default_unassign_hint(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// `compact` or `json`.
    #[serde(default)]
    pub log_format: Option<String>,
    /// Only show these assignees; empty means everyone.
    #[serde(default)]
    pub assignee_filter: Vec<AssigneeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_log_format: String,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            user: UserConfig::default(),
            resolved_log_format: "compact".to_string(),
        }
    }
}

impl EffectiveConfig {
    /// Assignee filter for week fetches, `None` when unfiltered.
    #[must_use]
    pub fn assignee_filter(&self) -> Option<Vec<AssigneeId>> {
        if self.user.assignee_filter.is_empty() {
            None
        } else {
            Some(self.user.assignee_filter.clone())
        }
    }
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".munify/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| {
            format!(
                "{}: Failed to parse {}",
                ErrorCode::ConfigParseError,
                path.display()
            )
        })
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("munify/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| {
            format!(
                "{}: Failed to parse {}",
                ErrorCode::ConfigParseError,
                path.display()
            )
        })
}

pub fn resolve_config(project_root: &Path) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = std::env::var("MUNIFY_LOG_FORMAT").ok();
    let resolved_log_format = resolve_log_format(user.log_format.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_log_format,
    })
}

/// Environment wins over the user file; anything unrecognised is `compact`.
fn resolve_log_format(user_format: Option<&str>, env_format: Option<&str>) -> String {
    fn normalize(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some("json"),
            "compact" | "text" => Some("compact"),
            _ => None,
        }
    }

    env_format
        .and_then(normalize)
        .or_else(|| user_format.and_then(normalize))
        .unwrap_or("compact")
        .to_string()
}

fn default_moved() -> String {
    "Work item scheduled".to_string()
}

fn default_move_failed() -> String {
    "Could not save the assignment; the move was undone".to_string()
}

fn default_unassign_hint() -> String {
    "Use the item's detail view to unassign it".to_string()
}
