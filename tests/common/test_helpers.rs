use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use validate_article_json::JobConfig;

/// Relative locations of the schemas inside an api-raml checkout
pub const POA_SCHEMA: &str = "dist/model/article-poa.v3.json";
pub const VOR_SCHEMA: &str = "dist/model/article-vor.v7.json";

pub fn poa_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "type": "object",
        "required": ["status", "title"],
        "properties": {
            "status": { "enum": ["poa"] },
            "title": { "type": "string" }
        }
    })
}

/// Mirrors the shape of the real VOR schema closely enough for the ISBN
/// patch pointer to resolve.
pub fn vor_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "allOf": [
            { "type": "object", "required": ["status", "title"] },
            { "properties": { "title": { "type": "string" } } },
            {
                "properties": {
                    "references": {
                        "type": "array",
                        "items": {
                            "definitions": {
                                "book": {
                                    "properties": {
                                        "isbn": { "type": "string", "pattern": "^97[89][0-9]{10}$" }
                                    }
                                }
                            },
                            "type": "object",
                            "properties": {
                                "isbn": {
                                    "$ref": "#/allOf/2/properties/references/items/definitions/book/properties/isbn"
                                }
                            }
                        }
                    }
                }
            }
        ]
    })
}

/// A temporary api-raml root containing the POA and VOR schemas.
pub fn create_schema_root() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let model = temp_dir.path().join("dist/model");
    std::fs::create_dir_all(&model).unwrap();
    std::fs::write(temp_dir.path().join(POA_SCHEMA), poa_schema().to_string()).unwrap();
    std::fs::write(temp_dir.path().join(VOR_SCHEMA), vor_schema().to_string()).unwrap();
    temp_dir
}

/// Write one article-json document. Invalid documents are missing their title.
pub fn write_article(dir: &Path, name: &str, status: &str, valid: bool) -> PathBuf {
    let article = if valid {
        json!({"article": {"status": status, "title": format!("Article {name}")}})
    } else {
        json!({"article": {"status": status}})
    };
    let path = dir.join(name);
    std::fs::write(&path, article.to_string()).unwrap();
    path
}

/// Write a corpus of `(name, status, valid)` documents into a fresh directory.
pub fn create_corpus(articles: &[(&str, &str, bool)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (name, status, valid) in articles {
        write_article(temp_dir.path(), name, status, *valid);
    }
    temp_dir
}

/// Five documents, `b` and `d` invalid.
pub fn five_with_two_failures() -> TempDir {
    create_corpus(&[
        ("a.json", "poa", true),
        ("b.json", "vor", false),
        ("c.json", "vor", true),
        ("d.json", "poa", false),
        ("e.json", "vor", true),
    ])
}

/// A job over `input` with status lines switched off.
pub fn job(schema_root: &Path, input: &Path) -> JobConfig {
    let mut config = JobConfig::new(schema_root, input);
    config.print_status = false;
    config
}

pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}
