//! Field definitions and the field registry
//!
//! A field is one independently queryable facet of a subject (title, creator,
//! material, ...), declared in a YAML file together with a namespace-prefix
//! table and an optional `display` list:
//!
//! ```yaml
//! namespaces:
//!   crm: "http://www.cidoc-crm.org/cidoc-crm/"
//! fields:
//!   - id: title
//!     label: Title
//!     datatype: literal
//!     queries:
//!       - select: |
//!           SELECT ?value WHERE { $subject crm:P102_has_title ?value . }
//! display:
//!   - title
//! ```
//!
//! Each field carries several query variants; only the `select` variant is
//! consumed here. When a `display` list is present, only the listed field ids
//! are retained, in list order. Loading is all-or-nothing: a malformed file
//! never yields a partially populated registry. The registry is immutable once
//! built and is shared behind an `Arc`; reloading means building a new
//! registry and swapping the reference.

use crate::error::{Result, SparqlError};
use crate::template::{self, NamespaceTable};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Datatype tag of a field's values
///
/// URI-valued fields trigger label resolution for rows that do not already
/// carry their own `label` binding. Every other datatype uses the raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDatatype {
    /// Plain literal value
    Literal,
    /// URI reference (`xsd:anyURI`)
    Uri,
    /// Date value
    Date,
    /// Numeric value
    Number,
    /// Any other tag, treated as a plain literal
    Other(String),
}

impl FieldDatatype {
    /// Map a datatype tag from a field-definition file
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "xsd:anyURI" | "anyURI" | "uri" => FieldDatatype::Uri,
            "literal" | "string" => FieldDatatype::Literal,
            "date" => FieldDatatype::Date,
            "number" | "integer" => FieldDatatype::Number,
            other => FieldDatatype::Other(other.to_string()),
        }
    }

    /// Whether values of this datatype are URI references
    pub fn is_uri(&self) -> bool {
        matches!(self, FieldDatatype::Uri)
    }
}

impl fmt::Display for FieldDatatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDatatype::Literal => write!(f, "literal"),
            FieldDatatype::Uri => write!(f, "uri"),
            FieldDatatype::Date => write!(f, "date"),
            FieldDatatype::Number => write!(f, "number"),
            FieldDatatype::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// A single field definition
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Unique field id, referenced by the display list
    pub id: String,
    /// Display label shown alongside resolved values
    pub label: String,
    /// Datatype tag controlling label resolution
    pub datatype: FieldDatatype,
    /// Query template with a subject placeholder
    pub query: String,
}

/// Raw file shape as written on disk
#[derive(Debug, Deserialize)]
struct FieldDefinitionsFile {
    #[serde(default)]
    namespaces: NamespaceTable,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    display: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    id: String,
    label: String,
    datatype: String,
    #[serde(default)]
    queries: Vec<QueryVariant>,
}

/// One query variant entry; variants other than `select` are ignored
#[derive(Debug, Deserialize)]
struct QueryVariant {
    #[serde(default)]
    select: Option<String>,
}

/// Registry holding the loaded field definitions and namespace table
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
    namespaces: NamespaceTable,
}

impl FieldRegistry {
    /// Build a registry from YAML source
    ///
    /// # Returns
    /// * `Ok(registry)` - all fields loaded, display filter applied
    /// * `Err(SparqlError::ConfigError)` - malformed YAML, a field without a
    ///   `select` query variant, a duplicate field id, or a display id that
    ///   does not exist among the defined fields
    pub fn from_yaml(source: &str) -> Result<Self> {
        let file: FieldDefinitionsFile = serde_yaml::from_str(source)
            .map_err(|e| SparqlError::ConfigError(format!("malformed field definitions: {}", e)))?;
        Self::from_parts(file)
    }

    /// Load a registry from a YAML file on disk
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading field definitions from {}", path.display());

        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            SparqlError::ConfigError(format!(
                "cannot read field definitions {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&source)
    }

    fn from_parts(file: FieldDefinitionsFile) -> Result<Self> {
        let mut fields: Vec<FieldDefinition> = Vec::with_capacity(file.fields.len());

        for raw in file.fields {
            if fields.iter().any(|f| f.id == raw.id) {
                return Err(SparqlError::ConfigError(format!(
                    "duplicate field id '{}'",
                    raw.id
                )));
            }

            let query = raw
                .queries
                .iter()
                .find_map(|variant| variant.select.clone())
                .ok_or_else(|| {
                    SparqlError::ConfigError(format!(
                        "field '{}' has no select query variant",
                        raw.id
                    ))
                })?;

            if !template::has_subject_placeholder(&query) {
                warn!("Field '{}' query contains no subject placeholder", raw.id);
            }

            fields.push(FieldDefinition {
                id: raw.id,
                label: raw.label,
                datatype: FieldDatatype::from_tag(&raw.datatype),
                query,
            });
        }

        if let Some(display) = file.display {
            let mut ordered = Vec::with_capacity(display.len());
            for id in &display {
                let field = fields.iter().find(|f| f.id == *id).ok_or_else(|| {
                    SparqlError::ConfigError(format!(
                        "display list references unknown field id '{}'",
                        id
                    ))
                })?;
                ordered.push(field.clone());
            }
            fields = ordered;
        }

        debug!("Loaded {} field definitions", fields.len());

        Ok(Self {
            fields,
            namespaces: file.namespaces,
        })
    }

    /// Fields in effective order (display order when a display list was given)
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// The namespace-prefix table
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Look up a field by id
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Number of effective fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the registry holds no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_FIELDS: &str = r#"
namespaces:
  crm: "http://www.cidoc-crm.org/cidoc-crm/"
  rdfs: "http://www.w3.org/2000/01/rdf-schema#"
fields:
  - id: a
    label: Alpha
    datatype: literal
    queries:
      - select: "SELECT ?value WHERE { $subject crm:P1 ?value . }"
  - id: b
    label: Beta
    datatype: xsd:anyURI
    queries:
      - select: "SELECT ?value WHERE { $subject crm:P2 ?value . }"
  - id: c
    label: Gamma
    datatype: date
    queries:
      - select: "SELECT ?value WHERE { ?subject crm:P3 ?value . }"
"#;

    #[test]
    fn test_load_preserves_source_order() {
        let registry = FieldRegistry::from_yaml(THREE_FIELDS).unwrap();
        let ids: Vec<&str> = registry.fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.namespaces().len(), 2);
    }

    #[test]
    fn test_datatype_mapping() {
        let registry = FieldRegistry::from_yaml(THREE_FIELDS).unwrap();
        assert_eq!(registry.field("a").unwrap().datatype, FieldDatatype::Literal);
        assert_eq!(registry.field("b").unwrap().datatype, FieldDatatype::Uri);
        assert!(registry.field("b").unwrap().datatype.is_uri());
        assert_eq!(registry.field("c").unwrap().datatype, FieldDatatype::Date);
    }

    #[test]
    fn test_unknown_datatype_tag_is_not_uri() {
        let datatype = FieldDatatype::from_tag("geo:wktLiteral");
        assert_eq!(datatype, FieldDatatype::Other("geo:wktLiteral".to_string()));
        assert!(!datatype.is_uri());
        assert_eq!(datatype.to_string(), "geo:wktLiteral");
    }

    #[test]
    fn test_display_list_filters_and_reorders() {
        let source = format!("{}\ndisplay:\n  - c\n  - a\n", THREE_FIELDS);
        let registry = FieldRegistry::from_yaml(&source).unwrap();
        let ids: Vec<&str> = registry.fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert!(registry.field("b").is_none());
    }

    #[test]
    fn test_unknown_display_id_fails() {
        let source = format!("{}\ndisplay:\n  - a\n  - nope\n", THREE_FIELDS);
        let err = FieldRegistry::from_yaml(&source).unwrap_err();
        assert!(matches!(err, SparqlError::ConfigError(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_duplicate_field_id_fails() {
        let source = r#"
fields:
  - id: a
    label: First
    datatype: literal
    queries:
      - select: "SELECT ?value WHERE { $subject ?p ?value . }"
  - id: a
    label: Second
    datatype: literal
    queries:
      - select: "SELECT ?value WHERE { $subject ?q ?value . }"
"#;
        let err = FieldRegistry::from_yaml(source).unwrap_err();
        assert!(matches!(err, SparqlError::ConfigError(_)));
    }

    #[test]
    fn test_field_without_select_variant_fails() {
        let source = r#"
fields:
  - id: a
    label: Alpha
    datatype: literal
    queries:
      - json: "{}"
"#;
        let err = FieldRegistry::from_yaml(source).unwrap_err();
        assert!(matches!(err, SparqlError::ConfigError(_)));
        assert!(err.to_string().contains("select"));
    }

    #[test]
    fn test_select_found_among_other_variants() {
        let source = r#"
fields:
  - id: a
    label: Alpha
    datatype: literal
    queries:
      - json: "{}"
      - select: "SELECT ?value WHERE { $subject ?p ?value . }"
"#;
        let registry = FieldRegistry::from_yaml(source).unwrap();
        assert!(registry.field("a").unwrap().query.starts_with("SELECT"));
    }

    #[test]
    fn test_malformed_yaml_fails() {
        let err = FieldRegistry::from_yaml("fields: [:::").unwrap_err();
        assert!(matches!(err, SparqlError::ConfigError(_)));
    }

    #[test]
    fn test_empty_source_gives_empty_registry() {
        let registry = FieldRegistry::from_yaml("{}").unwrap();
        assert!(registry.is_empty());
        assert!(registry.namespaces().is_empty());
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.yml");
        tokio::fs::write(&path, THREE_FIELDS).await.unwrap();

        let registry = FieldRegistry::from_file(&path).await.unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_from_missing_file_fails() {
        let err = FieldRegistry::from_file("/nonexistent/fields.yml")
            .await
            .unwrap_err();
        assert!(matches!(err, SparqlError::ConfigError(_)));
    }
}
