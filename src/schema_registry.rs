//! Compiled JSON Schema registry
//!
//! Maps a document type tag (`POA`, `VOR`, ...) to a compiled validator.
//! Schemas are read and compiled once at startup; the registry is immutable
//! afterwards and shared by reference between the feeder, every worker and
//! the revalidation pass.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ValidationError};

/// Replacement of a single value inside a schema before compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaPatch {
    /// JSON pointer (RFC 6901) to the value being replaced
    pub pointer: String,
    /// New value
    pub value: Value,
}

/// Where to find the schema for one type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    /// Type tag the schema applies to
    pub label: String,
    /// Schema file, relative to the schema root
    pub path: PathBuf,
    /// Patches applied to the schema source before compiling
    #[serde(default)]
    pub patches: Vec<SchemaPatch>,
}

impl SchemaSpec {
    /// The api-raml article schemas.
    ///
    /// The VOR book ISBN pattern uses regex syntax that cannot be compiled,
    /// so it is loosened to accept any non-empty string.
    pub fn defaults() -> Vec<SchemaSpec> {
        vec![
            SchemaSpec {
                label: "POA".to_string(),
                path: PathBuf::from("dist/model/article-poa.v3.json"),
                patches: Vec::new(),
            },
            SchemaSpec {
                label: "VOR".to_string(),
                path: PathBuf::from("dist/model/article-vor.v7.json"),
                patches: vec![SchemaPatch {
                    pointer: "/allOf/2/properties/references/items/definitions/book/properties/isbn/pattern"
                        .to_string(),
                    value: Value::String("^.+$".to_string()),
                }],
            },
        ]
    }
}

/// An immutable, compiled validator for one type tag.
pub struct CompiledSchema {
    label: String,
    validator: Validator,
}

impl CompiledSchema {
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A single schema violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer to the violating value in the document
    pub instance_path: String,
    /// JSON pointer to the schema keyword that rejected it
    pub schema_path: String,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Structured error detail for one failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolations {
    schema: String,
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Label of the schema that rejected the document
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Long form including the schema location of every violation.
    pub fn detailed(&self) -> String {
        let mut out = format!(
            "{} violation(s) against schema '{}':",
            self.violations.len(),
            self.schema
        );
        for v in &self.violations {
            out.push_str(&format!("\n{v}\n    at schema {}", v.schema_path));
        }
        out
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Outcome of one `validate` call.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// `None` when the document conforms
    pub violations: Option<ValidationViolations>,
    /// Time spent inside the validator
    pub elapsed: Duration,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_none()
    }
}

/// Registry of compiled schemas keyed by type tag.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, CompiledSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Read, patch and compile every schema in `specs` relative to `schema_root`.
    pub async fn load(schema_root: &Path, specs: &[SchemaSpec]) -> Result<Self> {
        if !tokio::fs::try_exists(schema_root).await? {
            return Err(ValidationError::PathNotFound {
                path: schema_root.to_path_buf(),
            });
        }

        let mut registry = Self::new();
        for spec in specs {
            let path = schema_root.join(&spec.path);
            let bytes =
                tokio::fs::read(&path)
                    .await
                    .map_err(|source| ValidationError::SchemaRead {
                        label: spec.label.clone(),
                        path: path.clone(),
                        source,
                    })?;

            let schema = Self::compile_with_patches(&spec.label, &bytes, &spec.patches)?;
            tracing::debug!(label = %spec.label, path = %path.display(), "compiled schema");
            registry.insert(schema);
        }
        Ok(registry)
    }

    /// Compile raw schema bytes under `label`.
    pub fn compile(label: &str, schema_bytes: &[u8]) -> Result<CompiledSchema> {
        Self::compile_with_patches(label, schema_bytes, &[])
    }

    /// Compile raw schema bytes after applying `patches`.
    pub fn compile_with_patches(
        label: &str,
        schema_bytes: &[u8],
        patches: &[SchemaPatch],
    ) -> Result<CompiledSchema> {
        let mut schema: Value =
            serde_json::from_slice(schema_bytes).map_err(|e| ValidationError::SchemaCompile {
                label: label.to_string(),
                details: format!("invalid JSON: {e}"),
            })?;

        for patch in patches {
            let target =
                schema
                    .pointer_mut(&patch.pointer)
                    .ok_or_else(|| ValidationError::SchemaPatch {
                        label: label.to_string(),
                        pointer: patch.pointer.clone(),
                    })?;
            *target = patch.value.clone();
        }

        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft4);
        let validator = opts
            .build(&schema)
            .map_err(|e| ValidationError::SchemaCompile {
                label: label.to_string(),
                details: e.to_string(),
            })?;

        Ok(CompiledSchema {
            label: label.to_string(),
            validator,
        })
    }

    /// Add a compiled schema, replacing any previous one with the same label.
    pub fn insert(&mut self, schema: CompiledSchema) {
        self.schemas.insert(schema.label.clone(), schema);
    }

    /// Compile and add in one step.
    pub fn register(&mut self, label: &str, schema_bytes: &[u8]) -> Result<()> {
        let schema = Self::compile(label, schema_bytes)?;
        self.insert(schema);
        Ok(())
    }

    pub fn get(&self, type_tag: &str) -> Option<&CompiledSchema> {
        self.schemas.get(type_tag)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered type tags, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        labels.sort();
        labels
    }

    /// Validate `value` against `schema`, timing only the validator itself.
    pub fn validate(&self, schema: &CompiledSchema, value: &Value) -> ValidationOutcome {
        let start = Instant::now();
        let violations: Vec<Violation> = schema
            .validator
            .iter_errors(value)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        let elapsed = start.elapsed();

        let violations = if violations.is_empty() {
            None
        } else {
            Some(ValidationViolations {
                schema: schema.label.clone(),
                violations,
            })
        };

        ValidationOutcome {
            violations,
            elapsed,
        }
    }
}
