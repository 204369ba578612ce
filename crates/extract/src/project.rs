use crate::consts::{PERSPECTIVE_MODULE, VISION_MODULE};
use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A project's `project.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectDefinition {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Name of the project this one inherits from.
    pub parent: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub inheritable: bool,
}
impl Default for ProjectDefinition {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            parent: None,
            enabled: true,
            inheritable: false,
        }
    }
}
impl ProjectDefinition {
    #[instrument(level = "debug", skip(bytes), fields(size = bytes.as_ref().len()))]
    pub fn parse(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let mut definition: Self =
            serde_json::from_slice(bytes.as_ref()).map_err(|e| ErrorKind::MalformedProject(e.to_string()))?;
        // The designer writes empty strings rather than omitting the keys.
        for field in [&mut definition.title, &mut definition.description, &mut definition.parent] {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
        Ok(definition)
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Visualization module a project carries resources for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Perspective,
    Vision,
}
impl ProjectKind {
    /// Identify the kind from the name of a module directory inside a project.
    pub fn from_module_dir(name: &str) -> Option<Self> {
        match name {
            PERSPECTIVE_MODULE => Some(Self::Perspective),
            VISION_MODULE => Some(Self::Vision),
            _ => None,
        }
    }

    pub fn module_dir(&self) -> &'static str {
        match self {
            Self::Perspective => PERSPECTIVE_MODULE,
            Self::Vision => VISION_MODULE,
        }
    }
}
