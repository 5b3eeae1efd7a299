//! Prototype loading.
//!
//! Prototypes are declarative templates read once at startup, one JSON
//! object per file:
//!
//! ```json
//! {
//!   "Type": "EntityPrototype",
//!   "Id": "crate",
//!   "Name": "Wooden Crate",
//!   "Components": [
//!     { "Type": "Transform", "position": [0, 0], "size": [16, 16] }
//!   ]
//! }
//! ```
//!
//! The top-level `"Type"` picks a registered [`PrototypeShape`]; each
//! component's `"Type"` picks a registered component kind. A file that fails
//! to load is logged and skipped, the rest of the directory still loads.

use std::any::{Any, TypeId};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use engine_component::ErasedComponent;
use engine_inject::{Dependency, Injectable, Slot};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::config::RuntimeConfig;
use crate::error::{PrototypeError, WorldError};
use crate::lock;
use crate::types::{PrototypeShape, TypeRegistry};

/// Name given to entities whose prototype declares none.
pub const DEFAULT_ENTITY_NAME: &str = "Unnamed Entity";

/// Template for building an entity.
#[derive(Debug)]
pub struct EntityPrototype {
    pub id: String,
    pub name: Option<String>,
    /// Component templates in declaration order.
    pub components: Vec<Box<dyn ErasedComponent>>,
}

impl EntityPrototype {
    /// The declared name, or [`DEFAULT_ENTITY_NAME`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_ENTITY_NAME)
    }
}

impl PrototypeShape for EntityPrototype {
    fn shape_name() -> &'static str {
        "EntityPrototype"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn decode(value: Value, types: &TypeRegistry) -> Result<Self, PrototypeError> {
        let Value::Object(mut object) = value else {
            return Err(PrototypeError::NotAnObject);
        };

        let id = take_string(&mut object, "Id")?.ok_or(PrototypeError::MissingField { field: "Id" })?;
        let name = take_string(&mut object, "Name")?;
        let components = match object.remove("Components") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| decode_component(item, types))
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(PrototypeError::InvalidField {
                    field: "Components",
                    expected: "an array",
                });
            }
        };

        Ok(Self {
            id,
            name,
            components,
        })
    }
}

/// Decode one `{ "Type": "<Kind>", ...fields }` component payload.
fn decode_component(value: Value, types: &TypeRegistry) -> Result<Box<dyn ErasedComponent>, PrototypeError> {
    let Value::Object(mut object) = value else {
        return Err(PrototypeError::InvalidField {
            field: "Components",
            expected: "an array of objects",
        });
    };
    let kind_name = take_string(&mut object, "Type")?.ok_or(PrototypeError::MissingField { field: "Type" })?;
    let kind = types.kinds().get_kind_by_name(&kind_name)?;
    Ok(types.kinds().meta(kind)?.decode(Value::Object(object))?)
}

fn take_string(object: &mut Map<String, Value>, field: &'static str) -> Result<Option<String>, PrototypeError> {
    match object.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(PrototypeError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

/// One file that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: PrototypeError,
}

/// Outcome of a prototype load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Prototypes loaded successfully.
    pub loaded: usize,
    /// Files skipped, in walk order.
    pub failures: Vec<LoadFailure>,
}

struct PrototypeEntry {
    id: String,
    shape: &'static str,
    type_id: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

/// Loads prototype files and serves them by id.
#[derive(Default)]
pub struct PrototypeRegistry {
    types: Dependency<TypeRegistry>,
    config: Dependency<RuntimeConfig>,
    prototypes: RwLock<Vec<PrototypeEntry>>,
}

impl Injectable for PrototypeRegistry {
    fn dependencies(&self) -> Vec<&dyn Slot> {
        vec![&self.types, &self.config]
    }
}

impl PrototypeRegistry {
    /// Load every prototype file under the configured root.
    ///
    /// # Errors
    ///
    /// Only fails if the registry's dependencies are not injected; per-file
    /// problems are collected in the returned report.
    pub fn load_prototypes(&self) -> Result<LoadReport, WorldError> {
        let config = self.config.get()?;
        self.load_dir(&config.prototype_dir, &config.prototype_extension, config.verbose)
    }

    /// Load every file with `extension` under `root`, recursively.
    ///
    /// Files are visited in path order. A prototype whose id is already
    /// loaded for its shape is rejected.
    ///
    /// # Errors
    ///
    /// Only fails if the registry's dependencies are not injected.
    pub fn load_dir(&self, root: &Path, extension: &str, verbose: bool) -> Result<LoadReport, WorldError> {
        let types = self.types.get()?;
        let started = Instant::now();
        let mut report = LoadReport::default();

        let mut files = Vec::new();
        collect_files(root, extension, &mut files, &mut report.failures);
        files.sort();

        for path in files {
            match self.load_file(&path, &types) {
                Ok((shape, id)) => {
                    report.loaded += 1;
                    if verbose {
                        info!(file = %path.display(), shape, id = %id, "loaded prototype");
                    } else {
                        debug!(file = %path.display(), shape, id = %id, "loaded prototype");
                    }
                }
                Err(error) => {
                    error!(file = %path.display(), %error, "failed to load prototype");
                    report.failures.push(LoadFailure { path, error });
                }
            }
        }

        info!(
            root = %root.display(),
            loaded = report.loaded,
            failed = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prototypes loaded"
        );
        Ok(report)
    }

    fn load_file(&self, path: &Path, types: &TypeRegistry) -> Result<(&'static str, String), PrototypeError> {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;

        let shape_name = value
            .get("Type")
            .ok_or(PrototypeError::MissingField { field: "Type" })?
            .as_str()
            .ok_or(PrototypeError::InvalidField {
                field: "Type",
                expected: "a string",
            })?;
        let shape = *types
            .shape(shape_name)
            .ok_or_else(|| PrototypeError::UnknownShape {
                name: shape_name.to_string(),
            })?;

        types.enums().check_tokens(&value)?;
        let decoded = shape.decode(value, types)?;

        let mut prototypes = lock::write(&self.prototypes);
        if prototypes
            .iter()
            .any(|entry| entry.type_id == shape.type_id && entry.id == decoded.id)
        {
            return Err(PrototypeError::DuplicateId {
                shape: shape.name,
                id: decoded.id,
            });
        }
        prototypes.push(PrototypeEntry {
            id: decoded.id.clone(),
            shape: shape.name,
            type_id: shape.type_id,
            value: decoded.value,
        });
        Ok((shape.name, decoded.id))
    }

    /// Fetch a loaded prototype by id and shape.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PrototypeNotFound`] if no prototype of shape `P`
    /// has that id.
    pub fn get_prototype<P: PrototypeShape>(&self, id: &str) -> Result<Arc<P>, WorldError> {
        lock::read(&self.prototypes)
            .iter()
            .filter(|entry| entry.type_id == TypeId::of::<P>() && entry.id == id)
            .find_map(|entry| Arc::clone(&entry.value).downcast::<P>().ok())
            .ok_or_else(|| WorldError::PrototypeNotFound {
                id: id.to_string(),
                shape: P::shape_name(),
            })
    }

    /// Ids of every loaded prototype with their shape names, in load order.
    #[must_use]
    pub fn ids(&self) -> Vec<(&'static str, String)> {
        lock::read(&self.prototypes)
            .iter()
            .map(|entry| (entry.shape, entry.id.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock::read(&self.prototypes).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walk `dir` recursively, collecting files with `extension`. Unreadable
/// directories are recorded as failures.
fn collect_files(dir: &Path, extension: &str, files: &mut Vec<PathBuf>, failures: &mut Vec<LoadFailure>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            error!(dir = %dir.display(), error = %source, "cannot read prototype directory");
            failures.push(LoadFailure {
                path: dir.to_path_buf(),
                error: source.into(),
            });
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, extension, files, failures);
        } else if path.extension().is_some_and(|e| e == extension) {
            files.push(path);
        }
    }
}
