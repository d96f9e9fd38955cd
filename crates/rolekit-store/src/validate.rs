//! Batch schema validation
//!
//! Every definition file under `role/` and `tool/` is parsed and checked
//! against the JSON Schema of its category. Files are validated
//! independently: a failure is recorded for that file and the run goes on.

use crate::{Category, DefinitionStore};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const ROLE_SCHEMA_FILE: &str = "role_schema.json";
pub const TOOL_SCHEMA_FILE: &str = "tool_schema.json";

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Could not read schema {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {category} schema: {message}")]
    Compile { category: Category, message: String },
}

/// Compiled schemas for both categories
pub struct SchemaSet {
    role: JSONSchema,
    tool: JSONSchema,
}

impl SchemaSet {
    /// Load `role_schema.json` and `tool_schema.json` from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ValidateError> {
        let dir = dir.as_ref();
        let role = read_schema(&dir.join(ROLE_SCHEMA_FILE))?;
        let tool = read_schema(&dir.join(TOOL_SCHEMA_FILE))?;
        Self::from_values(&role, &tool)
    }

    pub fn from_values(role: &Value, tool: &Value) -> Result<Self, ValidateError> {
        Ok(SchemaSet {
            role: compile(Category::Agent, role)?,
            tool: compile(Category::Tool, tool)?,
        })
    }

    fn schema(&self, category: Category) -> &JSONSchema {
        match category {
            Category::Agent => &self.role,
            Category::Tool => &self.tool,
        }
    }

    /// Validate one instance, returning every violation message
    pub fn check(&self, category: Category, instance: &Value) -> Result<(), Vec<String>> {
        match self.schema(category).validate(instance) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect()),
        }
    }
}

impl fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSet").finish_non_exhaustive()
    }
}

fn read_schema(path: &Path) -> Result<Value, ValidateError> {
    let content = std::fs::read_to_string(path).map_err(|source| ValidateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ValidateError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn compile(category: Category, schema: &Value) -> Result<JSONSchema, ValidateError> {
    JSONSchema::compile(schema).map_err(|e| ValidateError::Compile {
        category,
        message: e.to_string(),
    })
}

/// Result of validating one file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub category: Category,
    /// Path relative to the store root
    pub path: PathBuf,
    /// Empty when the file passed
    pub errors: Vec<String>,
}

impl FileOutcome {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a validation run, in the order files were checked
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub outcomes: Vec<FileOutcome>,
}

impl ValidationReport {
    /// Number of files that failed
    pub fn error_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }

    /// Process exit status for the run
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    pub fn for_category(&self, category: Category) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(move |o| o.category == category)
    }
}

impl DefinitionStore {
    /// Validate every definition file of both categories
    pub fn validate_all(&self, schemas: &SchemaSet) -> ValidationReport {
        let mut report = ValidationReport::default();
        for category in Category::ALL {
            self.validate_category(category, schemas, &mut report);
        }

        info!(
            "Validated {} files: {} passed, {} failed",
            report.outcomes.len(),
            report.passed_count(),
            report.error_count()
        );
        report
    }

    fn validate_category(
        &self,
        category: Category,
        schemas: &SchemaSet,
        report: &mut ValidationReport,
    ) {
        let category_root = self.category_root(category);
        let files = match self.definition_files(category) {
            Ok(files) => files,
            Err(e) => {
                report.outcomes.push(FileOutcome {
                    category,
                    path: self.relative(&category_root),
                    errors: vec![e.to_string()],
                });
                return;
            }
        };

        for path in files {
            let errors = match self.validate_file(category, &path, schemas) {
                Ok(()) => Vec::new(),
                Err(errors) => errors,
            };
            debug!("{:?}: {} errors", path, errors.len());
            report.outcomes.push(FileOutcome {
                category,
                path: self.relative(&path),
                errors,
            });
        }
    }

    fn validate_file(
        &self,
        category: Category,
        path: &Path,
        schemas: &SchemaSet,
    ) -> Result<(), Vec<String>> {
        let definition = self
            .load_path(category, path)
            .map_err(|e| vec![e.to_string()])?;
        schemas.check(category, &definition.document.to_json())
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.root())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
