//! Article-json document loading
//!
//! An article-json file carries `journal`, `snippet` and `article` sections.
//! Only the `article` section is validated; its `status` field (`poa`/`vor`)
//! selects the schema.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Result, ValidationError};

/// Section of the file that is validated
pub const CONTENT_FIELD: &str = "article";

/// Field inside the content section naming the document type
pub const TYPE_FIELD: &str = "status";

/// One decoded document, consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Schema selector, e.g. `POA` or `VOR`
    pub type_tag: String,
    /// File the document was read from
    pub source: PathBuf,
    /// The decoded `article` section
    pub payload: Value,
}

impl Document {
    /// Read and decode the document at `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_slice(path, &bytes)
    }

    /// Decode a document from raw bytes.
    pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self> {
        let mut root: Value =
            serde_json::from_slice(bytes).map_err(|source| ValidationError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let type_tag = root
            .get(CONTENT_FIELD)
            .and_then(|content| content.get(TYPE_FIELD))
            .and_then(Value::as_str)
            .map(str::to_uppercase)
            .ok_or_else(|| ValidationError::MalformedDocument {
                path: path.to_path_buf(),
                field: format!("{CONTENT_FIELD}.{TYPE_FIELD}"),
            })?;

        // the rest of the file is dropped here
        let payload = root
            .get_mut(CONTENT_FIELD)
            .map(Value::take)
            .ok_or_else(|| ValidationError::MalformedDocument {
                path: path.to_path_buf(),
                field: CONTENT_FIELD.to_string(),
            })?;

        Ok(Self {
            type_tag,
            source: path.to_path_buf(),
            payload,
        })
    }
}
