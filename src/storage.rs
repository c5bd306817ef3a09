use crate::constants::UNGROUPED_PROJECT;
use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::models::{null_as_default, Config, Request};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The persisted document: saved requests, tree config and contexts
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "Data", default, deserialize_with = "null_as_default")]
    pub data: Vec<Request>,
    #[serde(rename = "Config", default, deserialize_with = "null_as_default")]
    pub config: Config,
    #[serde(rename = "Context", default, deserialize_with = "null_as_default")]
    pub context: Context,
}

/// Requests grouped by project name, projects sorted ascending
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectGroups {
    pub projects: Vec<String>,
    pub requests: BTreeMap<String, Vec<Request>>,
}

impl ProjectGroups {
    /// Projects with their requests, in display order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Request])> {
        self.projects.iter().map(move |p| {
            let requests = self.requests.get(p).map(Vec::as_slice).unwrap_or(&[]);
            (p.as_str(), requests)
        })
    }
}

impl Document {
    /// Replace the request with the same (method, url), or add it as the newest entry
    pub fn upsert(&mut self, request: Request) {
        self.data.retain(|r| !r.same_identity(&request));
        self.data.push(request);
    }

    /// Drop the request with the same (method, url); absent requests are ignored
    pub fn remove(&mut self, request: &Request) {
        self.data.retain(|r| !r.same_identity(request));
    }

    pub fn find(&self, method: &str, url: &str) -> StoreResult<&Request> {
        self.data
            .iter()
            .find(|r| r.matches(method, url))
            .ok_or_else(|| StoreError::NotFound {
                method: method.to_string(),
                url: url.to_string(),
            })
    }

    /// Partition by project. Ungrouped requests land in `"."`; newest first in each bucket.
    pub fn grouped_by_project(&self) -> ProjectGroups {
        let mut requests: BTreeMap<String, Vec<Request>> = BTreeMap::new();
        for request in self.data.iter().rev() {
            let project = if request.project_name.is_empty() {
                UNGROUPED_PROJECT
            } else {
                request.project_name.as_str()
            };
            requests
                .entry(project.to_string())
                .or_default()
                .push(request.clone());
        }

        ProjectGroups {
            projects: requests.keys().cloned().collect(),
            requests,
        }
    }
}

/// JSON file backend for the [`Document`].
///
/// Every mutation goes through [`Storage::update`], which reloads the file first so a
/// write only carries the change at hand (last loader wins; no version stamps).
#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Storage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. Missing or malformed files yield an empty document.
    pub fn load(&self) -> Document {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no data file yet, starting empty");
                return Document::default();
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to read data file");
                return Document::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to decode data file, starting empty");
                Document::default()
            }
        }
    }

    pub fn save(&self, document: &Document) -> StoreResult<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), requests = document.data.len(), "document saved");
        Ok(())
    }

    /// Reload, apply `mutate`, save, and return the merged document
    pub fn update<F>(&self, mutate: F) -> StoreResult<Document>
    where
        F: FnOnce(&mut Document),
    {
        let mut document = self.load();
        mutate(&mut document);
        self.save(&document)?;
        Ok(document)
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}
