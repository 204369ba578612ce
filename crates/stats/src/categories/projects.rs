use crate::calculator::{Calculator, Category};
use crate::error::{ErrorKind, Result};
use ember_extract::{ProjectDefinition, ProjectKind};
use ember_source::Bundle;
use exn::ResultExt;
use serde::Serialize;
use std::collections::BTreeSet;

const PROJECT_FILE: &str = "project.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    /// Directory name, which is what the gateway identifies the project by.
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub enabled: bool,
    pub inheritable: bool,
    /// Visualization modules the project carries resources for.
    pub kinds: BTreeSet<ProjectKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStatistics {
    pub project_count: usize,
    pub perspective_projects: usize,
    pub vision_projects: usize,
    pub projects: Vec<ProjectSummary>,
}
impl FromIterator<ProjectSummary> for ProjectStatistics {
    fn from_iter<I: IntoIterator<Item = ProjectSummary>>(iter: I) -> Self {
        let projects: Vec<ProjectSummary> = iter.into_iter().collect();
        let count = |kind| projects.iter().filter(|p| p.kinds.contains(&kind)).count();
        Self {
            project_count: projects.len(),
            perspective_projects: count(ProjectKind::Perspective),
            vision_projects: count(ProjectKind::Vision),
            projects,
        }
    }
}

/// Every directory under `projects/` is a project. A project without a
/// `project.json` gets the gateway's defaults (enabled, no parent).
pub struct Projects;

impl Calculator for Projects {
    const CATEGORY: Category = Category::Projects;
    type Output = ProjectStatistics;

    async fn calculate(&self, bundle: &Bundle) -> Result<Option<ProjectStatistics>> {
        let Some(projects) = bundle.projects().await.map_err(ErrorKind::bundle)? else {
            return Ok(None);
        };
        let mut summaries = Vec::new();
        for entry in projects.entries().await.map_err(ErrorKind::bundle)? {
            if !entry.is_dir {
                continue;
            }
            let definition = match projects.read(format!("{}/{PROJECT_FILE}", entry.name)).await {
                Ok(Some(bytes)) => {
                    ProjectDefinition::parse(bytes).or_raise(|| ErrorKind::MalformedProject(entry.name.clone()))?
                }
                Ok(None) => ProjectDefinition::default(),
                Err(err) => return Err(ErrorKind::bundle(err)),
            };
            let kinds: BTreeSet<ProjectKind> = projects
                .list(&entry.name)
                .await
                .map_err(ErrorKind::bundle)?
                .into_iter()
                .filter(|child| child.is_dir)
                .filter_map(|child| ProjectKind::from_module_dir(&child.name))
                .collect();
            tracing::trace!(project = %entry.name, ?kinds, "Found project");
            summaries.push(ProjectSummary {
                name: entry.name,
                title: definition.title,
                description: definition.description,
                parent: definition.parent,
                enabled: definition.enabled,
                inheritable: definition.inheritable,
                kinds,
            });
        }
        Ok(Some(summaries.into_iter().collect()))
    }
}
