use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Sections at or beyond this nesting level are compiled, but their
/// contents are not traversed.
pub const DEFAULT_DEPTH_CEILING: u8 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default = "default_depth_ceiling")]
    pub depth_ceiling: u8,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            depth_ceiling: default_depth_ceiling(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Default issuer identity stamped on compiled records.
    #[serde(default)]
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".pharos/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    load_project_config_file(&path)
}

/// Load a project config from an explicit path.
pub fn load_project_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pharos/config.toml"))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(path) = user_config_path() else {
        return Ok(UserConfig::default());
    };
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective configuration for a run.
///
/// `config_override` replaces the project config lookup entirely.
pub fn resolve_config(
    project_root: &Path,
    config_override: Option<&Path>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = match config_override {
        Some(path) => load_project_config_file(path)?,
        None => load_project_config(project_root)?,
    };
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format)?;

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(raw) = env_format {
        return normalize_output_mode(&raw)
            .map(str::to_string)
            .with_context(|| format!("Invalid FORMAT value '{raw}': expected pretty, text or json"));
    }

    if let Some(raw) = user_output {
        return normalize_output_mode(&raw)
            .map(str::to_string)
            .with_context(|| format!("Invalid output setting '{raw}' in user config"));
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_depth_ceiling() -> u8 {
    DEFAULT_DEPTH_CEILING
}
