use crate::error::{ErrorKind, Result};
use ember_source::consts::{CONFIG_DB, CONFIG_DIR, PROJECTS_DIR};
use ember_source::{Bundle, SourceOptions, looks_like_bundle};
use ember_stats::Report;
use exn::ResultExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::instrument;

const ARCHIVE_EXTENSION: &str = "gwbk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub path: PathBuf,
    pub looks_like_bundle: bool,
    pub has_projects: bool,
    pub has_config: bool,
    pub has_idb: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub path: PathBuf,
    /// `directory`, the lowercased file extension, or `unknown` for anything
    /// that is neither a file nor a directory.
    #[serde(rename = "type")]
    pub kind: String,
    pub is_config: bool,
}

fn require_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        exn::bail!(ErrorKind::MissingPath(path.to_path_buf()));
    }
    Ok(())
}

#[instrument(skip(options))]
pub async fn stats(path: &Path, options: &SourceOptions) -> Result<Report> {
    require_exists(path)?;
    let bundle = Bundle::open(path, options)
        .await
        .or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
    let report = ember_stats::analyze(&bundle).await;
    for (category, error) in report.failures() {
        tracing::warn!(%category, error, "Statistics incomplete");
    }
    if let Err(err) = bundle.close().await {
        tracing::warn!(error = ?err, "Failed to release bundle");
    }
    Ok(report)
}

#[instrument]
pub fn inspect(path: &Path) -> Result<Inspection> {
    require_exists(path)?;
    if !path.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(path.to_path_buf()));
    }
    let inspection = Inspection {
        path: path.to_path_buf(),
        looks_like_bundle: looks_like_bundle(path),
        has_projects: path.join(PROJECTS_DIR).exists(),
        has_config: path.join(CONFIG_DIR).exists(),
        has_idb: path.join(CONFIG_DB).exists(),
    };
    if !inspection.looks_like_bundle {
        tracing::warn!(path = %path.display(), "Path does not look like a gateway configuration directory");
    }
    Ok(inspection)
}

#[instrument]
pub fn analyze(path: &Path) -> Result<Analysis> {
    require_exists(path)?;
    let (kind, is_config) = if path.is_dir() {
        ("directory".to_string(), looks_like_bundle(path))
    } else if path.is_file() {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let is_config = extension == ARCHIVE_EXTENSION;
        (extension, is_config)
    } else {
        ("unknown".to_string(), false)
    };
    Ok(Analysis {
        path: path.to_path_buf(),
        kind,
        is_config,
    })
}

pub fn print(value: &impl Serialize, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    println!("{}", json.or_raise(|| ErrorKind::Output)?);
    Ok(())
}
