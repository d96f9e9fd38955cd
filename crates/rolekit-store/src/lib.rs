//! Definition Store
//!
//! Resolves short logical names to agent and tool definition files inside a
//! sandbox root and parses them. The expected layout is:
//! - role/<name>/role.yaml (agents)
//! - tool/**/<name>.yaml (tools, possibly nested)
//!
//! Names are checked before any filesystem access, and every resolved path
//! must stay inside the canonical root.

pub mod fs;
pub mod validate;

use fs::{FileSystem, OsFileSystem};
use rolekit_core::{DocumentParser, Mapping, ParseError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub use validate::{FileOutcome, SchemaSet, ValidateError, ValidationReport};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid {category} name '{name}': names must be simple identifiers without path separators")]
    InvalidName { category: Category, name: String },

    #[error("Access to '{}' resolves to '{}', outside of the sandbox root", path.display(), resolved.display())]
    SandboxViolation { path: PathBuf, resolved: PathBuf },

    #[error("{category} definition for '{name}' was not found")]
    NotFound { category: Category, name: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Kind of definition being looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Agent,
    Tool,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Agent, Category::Tool];

    /// Directory below the root holding this category
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Agent => "role",
            Category::Tool => "tool",
        }
    }

    fn direct_candidate(self, category_root: &Path, name: &str) -> PathBuf {
        match self {
            Category::Agent => category_root.join(name).join("role.yaml"),
            Category::Tool => category_root.join(format!("{}.yaml", name)),
        }
    }

    /// Whether a missing direct match falls back to a recursive search
    fn searchable(self) -> bool {
        matches!(self, Category::Tool)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Agent => write!(f, "agent"),
            Category::Tool => write!(f, "tool"),
        }
    }
}

/// A loaded definition file
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    pub category: Category,
    pub name: String,
    /// Resolved path inside the sandbox root
    pub path: PathBuf,
    pub document: Mapping,
}

/// Check that a logical name is a simple identifier
pub fn validate_name(category: Category, name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0')
    {
        return Err(LoadError::InvalidName {
            category,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Definition store confined to a sandbox root
pub struct DefinitionStore {
    root: PathBuf,
    parser: Arc<dyn DocumentParser>,
    fs: Arc<dyn FileSystem>,
}

impl DefinitionStore {
    /// Open a store on the real filesystem
    pub fn open(root: impl AsRef<Path>, parser: Arc<dyn DocumentParser>) -> Result<Self> {
        Self::with_fs(root, parser, Arc::new(OsFileSystem))
    }

    /// Open a store over a custom filesystem
    pub fn with_fs(
        root: impl AsRef<Path>,
        parser: Arc<dyn DocumentParser>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let root = root.as_ref();
        let root = fs.canonicalize(root).map_err(|source| LoadError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        if !fs.is_dir(&root) {
            return Err(LoadError::Io {
                path: root,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "sandbox root is not a directory",
                ),
            });
        }

        debug!(
            "Opened definition store at {:?} ({} parser)",
            root,
            parser.kind()
        );
        Ok(DefinitionStore { root, parser, fs })
    }

    /// Canonical sandbox root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn parser(&self) -> &dyn DocumentParser {
        self.parser.as_ref()
    }

    pub fn category_root(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Load `role/<name>/role.yaml`
    pub fn load_agent(&self, name: &str) -> Result<Definition> {
        self.resolve_and_load(Category::Agent, name)
    }

    /// Load a tool by its short name
    pub fn load_tool(&self, name: &str) -> Result<Definition> {
        self.resolve_and_load(Category::Tool, name)
    }

    /// Resolve a logical name to a single file and parse it
    ///
    /// The direct candidate is tried first; tools then fall back to the
    /// first `<name>.yaml` found below `tool/`.
    pub fn resolve_and_load(&self, category: Category, name: &str) -> Result<Definition> {
        validate_name(category, name)?;

        let category_root = self.category_root(category);
        let direct = category.direct_candidate(&category_root, name);
        debug!("Resolving {} '{}' at {:?}", category, name, direct);

        if let Some(resolved) = self.confine(&direct)? {
            if self.fs.is_file(&resolved) {
                return self.load_resolved(category, name, resolved);
            }
        }

        if category.searchable() {
            if let Some(search_root) = self.confine(&category_root)? {
                let pattern = format!("{}.yaml", glob::Pattern::escape(name));
                let candidates =
                    self.fs
                        .find(&search_root, &pattern)
                        .map_err(|source| LoadError::Io {
                            path: search_root.clone(),
                            source,
                        })?;

                for candidate in candidates {
                    debug!("Trying search match {:?}", candidate);
                    if let Some(resolved) = self.confine(&candidate)? {
                        if self.fs.is_file(&resolved) {
                            return self.load_resolved(category, name, resolved);
                        }
                    }
                }
            }
        }

        Err(LoadError::NotFound {
            category,
            name: name.to_string(),
        })
    }

    /// Parse a definition file given by path
    pub fn load_path(&self, category: Category, path: &Path) -> Result<Definition> {
        let resolved = self.confine(path)?.ok_or_else(|| LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        })?;
        let name = resolved
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.load_resolved(category, &name, resolved)
    }

    /// Names of agents with a `role.yaml`, sorted
    pub fn list_agents(&self) -> Result<Vec<String>> {
        let role_root = self.category_root(Category::Agent);
        if !self.fs.is_dir(&role_root) {
            return Ok(Vec::new());
        }

        let entries = self.fs.read_dir(&role_root).map_err(|source| LoadError::Io {
            path: role_root.clone(),
            source,
        })?;

        let mut agents = Vec::new();
        for entry in entries {
            if self.fs.is_dir(&entry) && self.fs.is_file(&entry.join("role.yaml")) {
                if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
                    agents.push(name.to_string());
                }
            }
        }
        agents.sort();
        Ok(agents)
    }

    /// Distinct stems of every `tool/**/*.yaml`, sorted
    pub fn list_tools(&self) -> Result<Vec<String>> {
        let tools: BTreeSet<String> = self
            .definition_files(Category::Tool)?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()))
            .map(str::to_string)
            .collect();
        Ok(tools.into_iter().collect())
    }

    /// Every `*.yaml` file below a category directory, sorted
    pub fn definition_files(&self, category: Category) -> Result<Vec<PathBuf>> {
        let category_root = self.category_root(category);
        if !self.fs.is_dir(&category_root) {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = self
            .fs
            .find(&category_root, "*.yaml")
            .map_err(|source| LoadError::Io {
                path: category_root.clone(),
                source,
            })?
            .into_iter()
            .filter(|p| self.fs.is_file(p))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Canonicalize a path and require it to stay inside the root
    ///
    /// Returns `None` when the path does not exist.
    fn confine(&self, path: &Path) -> Result<Option<PathBuf>> {
        match self.fs.canonicalize(path) {
            Ok(resolved) if resolved.starts_with(&self.root) => Ok(Some(resolved)),
            Ok(resolved) => {
                warn!(
                    "Refusing {:?}: resolves to {:?} outside {:?}",
                    path, resolved, self.root
                );
                Err(LoadError::SandboxViolation {
                    path: path.to_path_buf(),
                    resolved,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn load_resolved(&self, category: Category, name: &str, path: PathBuf) -> Result<Definition> {
        let text = self
            .fs
            .read_to_string(&path)
            .map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;

        let document = self
            .parser
            .parse(&text)
            .map_err(|source| LoadError::Parse {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded {} '{}' from {:?}", category, name, path);
        Ok(Definition {
            category,
            name: name.to_string(),
            path,
            document,
        })
    }
}

impl fmt::Debug for DefinitionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionStore")
            .field("root", &self.root)
            .field("parser", &self.parser.kind())
            .finish()
    }
}
