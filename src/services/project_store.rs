use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::domain::inputs::ForecastInputs;
use crate::domain::project::{ProjectSummary, StoredProject};

#[derive(Error, Debug)]
pub enum ProjectStoreError {
    #[error("failed to create store directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to list store directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },
    #[error("failed to read project file {path}: {source}")]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("failed to write project file {path}: {source}")]
    WriteFile { path: PathBuf, source: io::Error },
    #[error("failed to parse project file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize project {name}: {source}")]
    Serialize {
        name: String,
        source: serde_json::Error,
    },
    #[error("project {0} not found")]
    NotFound(u64),
}

/// File-backed store of saved projects: one pretty-printed JSON record per
/// project under the data directory, named by zero-padded numeric id.
pub struct ProjectStore {
    dir: PathBuf,
}

impl ProjectStore {
    /// Opens the store, creating the data directory if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, ProjectStoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| ProjectStoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Saves a new project under the next free id and returns the full
    /// record.
    pub fn create(
        &self,
        name: &str,
        start_date: Option<NaiveDate>,
        inputs: ForecastInputs,
    ) -> Result<StoredProject, ProjectStoreError> {
        let id = self.next_id()?;
        let now = Utc::now();
        let project = StoredProject {
            id,
            name: name.to_string(),
            start_date,
            inputs,
            created_at: now,
            updated_at: now,
        };

        let contents = serde_json::to_string_pretty(&project).map_err(|source| {
            ProjectStoreError::Serialize {
                name: name.to_string(),
                source,
            }
        })?;
        let path = self.record_path(id);
        std::fs::write(&path, contents).map_err(|source| ProjectStoreError::WriteFile {
            path: path.clone(),
            source,
        })?;
        log::info!("saved project {name:?} with id {id}");
        Ok(project)
    }

    /// Lists summaries of all saved projects, newest first.
    pub fn list(&self) -> Result<Vec<ProjectSummary>, ProjectStoreError> {
        let mut summaries: Vec<ProjectSummary> = self
            .load_all()?
            .iter()
            .map(StoredProject::summary)
            .collect();
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(summaries)
    }

    /// Fetches one project with its full nested assumptions.
    pub fn fetch(&self, id: u64) -> Result<StoredProject, ProjectStoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(ProjectStoreError::NotFound(id));
        }
        load_record(&path)
    }

    fn record_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id:06}.json"))
    }

    fn next_id(&self) -> Result<u64, ProjectStoreError> {
        let highest = self
            .load_all()?
            .iter()
            .map(|project| project.id)
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }

    fn load_all(&self) -> Result<Vec<StoredProject>, ProjectStoreError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| {
            ProjectStoreError::ReadDir {
                path: self.dir.clone(),
                source,
            }
        })?;

        let mut projects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ProjectStoreError::ReadDir {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            projects.push(load_record(&path)?);
        }
        Ok(projects)
    }
}

fn load_record(path: &Path) -> Result<StoredProject, ProjectStoreError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        ProjectStoreError::ReadFile {
            path: path.to_path_buf(),
            source,
        }
    })?;
    serde_json::from_str(&contents).map_err(|source| ProjectStoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
