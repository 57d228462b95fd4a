//! Posts the current result set to a conversion endpoint and saves the bytes.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::backend::Backend;
use crate::dispatch::{self, DispatchError};
use crate::session::{Session, Workflow};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Excel,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "excel" | "xlsx" => Some(Self::Excel),
            _ => None,
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Json => "/download/json",
            Self::Excel => "/download/excel",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Json => "patent_results.json",
            Self::Excel => "patent_results.xlsx",
        }
    }

    fn failure(self) -> &'static str {
        match self {
            Self::Json => "Failed to download JSON",
            Self::Excel => "Failed to convert to Excel",
        }
    }
}

/// Where an export lands: `out` if given, else the format's file name in `dir`.
pub fn target_path(format: ExportFormat, out: Option<&Path>, dir: &Path) -> PathBuf {
    match out {
        Some(path) => path.to_path_buf(),
        None => dir.join(format.file_name()),
    }
}

/// Exports the visible result set. Statistics views are not exportable.
pub async fn download(
    session: &mut Session,
    backend: &dyn Backend,
    format: ExportFormat,
    out: Option<&Path>,
    dir: &Path,
) -> Result<PathBuf, DispatchError> {
    session.clear_error();
    let results = match session.exportable_results() {
        Some(results) => results.clone(),
        None => {
            return Err(dispatch::surface(
                session,
                DispatchError::validation("No results to download"),
            ))
        }
    };

    let ticket = session.begin(Workflow::Export);
    let response = backend.download(format, &results).await;
    if !session.is_current(ticket) {
        return Err(DispatchError::Superseded {
            workflow: Workflow::Export,
        });
    }
    let bytes = response
        .map_err(|e| dispatch::surface(session, DispatchError::backend(format.failure(), e)))?;

    let path = target_path(format, out, dir);
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        dispatch::surface(
            session,
            DispatchError::Io {
                path: path.display().to_string(),
                source: e,
            },
        )
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "results exported");
    Ok(path)
}
