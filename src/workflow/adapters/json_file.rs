//! JSON file workflow source backed by a capability directory handle.

use crate::workflow::{
    domain::{WorkflowDefinition, WorkflowDocument, WorkflowError},
    ports::WorkflowSource,
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tracing::debug;

/// Location of the workflow document relative to the project root.
pub const DEFAULT_WORKFLOW_PATH: &str = ".atelier/workflow.json";

/// Reads the workflow from a JSON document inside a project directory.
///
/// A missing file, or a document without a `status_flow` section, yields the
/// built-in workflow.
#[derive(Debug)]
pub struct JsonFileWorkflowSource {
    root: Dir,
    path: Utf8PathBuf,
}

impl JsonFileWorkflowSource {
    /// Creates a source reading [`DEFAULT_WORKFLOW_PATH`] below `root`.
    #[must_use]
    pub fn new(root: Dir) -> Self {
        Self {
            root,
            path: Utf8PathBuf::from(DEFAULT_WORKFLOW_PATH),
        }
    }

    /// Opens `project_root` with ambient authority and reads the workflow
    /// from [`DEFAULT_WORKFLOW_PATH`] below it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Load`] when the directory cannot be opened.
    pub fn open_ambient(project_root: &Utf8Path) -> Result<Self, WorkflowError> {
        let root = Dir::open_ambient_dir(project_root, ambient_authority()).map_err(|err| {
            WorkflowError::Load {
                path: project_root.to_string(),
                reason: err.to_string(),
            }
        })?;
        Ok(Self::new(root))
    }

    /// Overrides the document path relative to the root directory.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Returns the document path relative to the root directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn load_error(&self, reason: &dyn std::fmt::Display) -> WorkflowError {
        WorkflowError::Load {
            path: self.path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl WorkflowSource for JsonFileWorkflowSource {
    fn load(&self) -> Result<WorkflowDefinition, WorkflowError> {
        let contents = match self.root.read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path, "workflow document missing, using built-in workflow");
                return Ok(WorkflowDefinition::builtin());
            }
            Err(err) => return Err(self.load_error(&err)),
        };

        let document: WorkflowDocument =
            serde_json::from_str(&contents).map_err(|err| self.load_error(&err))?;
        if document.is_empty() {
            debug!(path = %self.path, "workflow document has no status_flow, using built-in workflow");
            return Ok(WorkflowDefinition::builtin());
        }

        let definition = WorkflowDefinition::from_document(document)?;
        debug!(
            path = %self.path,
            statuses = definition.statuses().count(),
            "loaded workflow document"
        );
        Ok(definition)
    }
}
