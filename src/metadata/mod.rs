//! Project metadata from `pyproject.toml`.
//!
//! The file is optional. Fields come from two tables:
//!
//! - `[project]`: `name`, `description`, `license`, `authors`, `urls`
//! - `[tool.pyship]`: `name`, `entry`, `output-name`, `always-bundle`,
//!   `maintainer`, `section`, `depends`
//!
//! Precedence is command line, then `[tool.pyship]`, then `[project]`, then
//! the defaults below.

use crate::bundler::PackageSettings;
use crate::config::sanitize_package_name;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Manifest file name at the project root.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Description used when the project has none.
pub const DEFAULT_DESCRIPTION: &str = "Standalone application";

/// Maintainer used when the project names none.
pub const DEFAULT_MAINTAINER: &str = "Unknown <unknown@localhost>";

/// License used when the project declares none.
pub const DEFAULT_LICENSE: &str = "custom";

/// Settings from `[tool.pyship]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolSettings {
    /// Package name override.
    pub name: Option<String>,
    /// Entry script.
    pub entry: Option<String>,
    /// Produced binary name.
    pub output_name: Option<String>,
    /// Always-bundle data roots.
    pub always_bundle: Option<Vec<String>>,
    /// Package maintainer.
    pub maintainer: Option<String>,
    /// Debian section.
    pub section: Option<String>,
    /// Debian dependencies.
    pub depends: Vec<String>,
}

/// Everything read from `pyproject.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Manifest the values came from, if one exists.
    pub source: Option<PathBuf>,
    /// `[project] name`.
    pub name: Option<String>,
    /// `[project] description`.
    pub description: Option<String>,
    /// `[project] license`, string or `{ text = ... }`.
    pub license: Option<String>,
    /// First `[project] authors` entry as `name <email>`.
    pub author: Option<String>,
    /// `[project.urls] Homepage`.
    pub homepage: Option<String>,
    /// `[tool.pyship]`.
    pub tool: ToolSettings,
}

impl ProjectMetadata {
    /// Loads `<root>/pyproject.toml`; a missing file yields empty metadata.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(PYPROJECT_FILE);
        let manifest = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No {} in {}", PYPROJECT_FILE, root.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Manifest {
                    path,
                    reason: e.to_string(),
                });
            }
        };
        Self::parse(&manifest, &path)
    }

    /// Parses manifest text; `path` is only used in errors.
    pub fn parse(manifest: &str, path: &Path) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Manifest {
            path: path.to_path_buf(),
            reason,
        };

        let toml_value: toml::Value =
            toml::from_str(manifest).map_err(|e| invalid(format!("failed to parse: {e}")))?;

        let project = toml_value.get("project");
        let tool = toml_value.get("tool").and_then(|t| t.get("pyship"));

        let license = match project.and_then(|p| p.get("license")) {
            None => None,
            Some(toml::Value::String(s)) => Some(s.clone()),
            Some(table) => match table.get("text").and_then(|t| t.as_str()) {
                Some(text) => Some(text.to_string()),
                None => {
                    return Err(invalid(
                        "project.license must be a string or a table with `text`".to_string(),
                    ));
                }
            },
        };

        let author = project
            .and_then(|p| p.get("authors"))
            .and_then(|a| a.as_array())
            .and_then(|authors| authors.first())
            .and_then(format_author);

        let homepage = project
            .and_then(|p| p.get("urls"))
            .and_then(|urls| urls.get("Homepage").or_else(|| urls.get("homepage")))
            .and_then(|v| v.as_str())
            .map(String::from);

        let tool = ToolSettings {
            name: string_field(tool, "name", "tool.pyship").map_err(&invalid)?,
            entry: string_field(tool, "entry", "tool.pyship").map_err(&invalid)?,
            output_name: string_field(tool, "output-name", "tool.pyship").map_err(&invalid)?,
            always_bundle: string_list(tool, "always-bundle").map_err(&invalid)?,
            maintainer: string_field(tool, "maintainer", "tool.pyship").map_err(&invalid)?,
            section: string_field(tool, "section", "tool.pyship").map_err(&invalid)?,
            depends: string_list(tool, "depends")
                .map_err(&invalid)?
                .unwrap_or_default(),
        };

        Ok(Self {
            source: Some(path.to_path_buf()),
            name: string_field(project, "name", "project").map_err(&invalid)?,
            description: string_field(project, "description", "project").map_err(&invalid)?,
            license,
            author,
            homepage,
            tool,
        })
    }

    /// Package name: `[tool.pyship]`, `[project]`, then the directory name,
    /// made safe for package file names.
    pub fn package_name(&self, root: &Path) -> String {
        let raw = self
            .tool
            .name
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| {
                std::path::absolute(root)
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            })
            .unwrap_or_else(|| "app".to_string());
        sanitize_package_name(&raw)
    }

    /// Resolves package metadata for `version`.
    pub fn package_settings(&self, root: &Path, version: &str) -> PackageSettings {
        PackageSettings {
            product_name: self.package_name(root),
            version: version.to_string(),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            maintainer: self
                .tool
                .maintainer
                .clone()
                .or_else(|| self.author.clone())
                .unwrap_or_else(|| DEFAULT_MAINTAINER.to_string()),
            license: self
                .license
                .clone()
                .unwrap_or_else(|| DEFAULT_LICENSE.to_string()),
            homepage: self.homepage.clone(),
            section: self.tool.section.clone(),
            depends: self.tool.depends.clone(),
        }
    }
}

fn format_author(author: &toml::Value) -> Option<String> {
    let name = author.get("name").and_then(|v| v.as_str());
    let email = author.get("email").and_then(|v| v.as_str());
    match (name, email) {
        (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
        (Some(name), None) => Some(name.to_string()),
        (None, Some(email)) => Some(format!("{email} <{email}>")),
        (None, None) => None,
    }
}

fn string_field(
    table: Option<&toml::Value>,
    key: &str,
    table_name: &str,
) -> Result<Option<String>, String> {
    match table.and_then(|t| t.get(key)) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("{table_name}.{key} must be a string")),
    }
}

fn string_list(table: Option<&toml::Value>, key: &str) -> Result<Option<Vec<String>>, String> {
    let Some(value) = table.and_then(|t| t.get(key)) else {
        return Ok(None);
    };
    let not_list = || format!("tool.pyship.{key} must be a list of strings");
    value
        .as_array()
        .ok_or_else(not_list)?
        .iter()
        .map(|item| item.as_str().map(String::from).ok_or_else(not_list))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
