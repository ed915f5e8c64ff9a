//! Field-driven metadata resolution
//!
//! The resolver runs every registered field's query against a subject and
//! assembles a display-ready metadata list. URI-valued results are resolved to
//! human-readable labels through a dedicated label query; within one
//! `resolve_metadata` call each distinct URI is resolved at most once via a
//! request-scoped memo map. Broader caching of whole results belongs to the
//! persistent cache, which has its own expiration policy.
//!
//! Besides field metadata the resolver covers the remaining per-subject
//! lookups of a presentation document: label, images, thumbnails, rights and
//! required statement.

use crate::connection::{QueryExecutor, ResultRow};
use crate::error::{Result, SparqlError};
use crate::fields::FieldRegistry;
use crate::template;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Language tag used when a value carries no language information
pub const NO_LANGUAGE: &str = "none";

/// Localized string map: language tag -> ordered values
pub type LanguageMap = BTreeMap<String, Vec<String>>;

/// Default label query: prioritized alternatives coalesced to the first present
pub const DEFAULT_LABEL_QUERY: &str = "\
PREFIX crm: <http://www.cidoc-crm.org/cidoc-crm/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
SELECT ?label WHERE {
    {
        $subject skos:prefLabel ?l1 .
    } UNION {
        $subject rdfs:label ?l2 .
    } UNION {
        $subject crm:P190_has_symbolic_content ?l3 .
    } UNION {
        $subject crm:P90_has_value ?l4 .
    }
    BIND(COALESCE(?l1, ?l2, ?l3, ?l4) AS ?label)
} LIMIT 1
";

/// Default image query following the Linked Art digital-object path
pub const DEFAULT_IMAGE_QUERY: &str = "\
PREFIX aat: <http://vocab.getty.edu/aat/>
PREFIX crm: <http://www.cidoc-crm.org/cidoc-crm/>
PREFIX la: <https://linked.art/ns/terms/>
SELECT ?image ?width ?height WHERE {
    $subject crm:P138i_has_representation?/la:digitally_shown_by ?imageObject .
    ?imageObject la:digitally_available_via/la:access_point ?image ;
        crm:P43_has_dimension ?dimWidth ;
        crm:P43_has_dimension ?dimHeight .
    ?dimWidth crm:P2_has_type aat:300055647 ;
        crm:P90_has_value ?width .
    ?dimHeight crm:P2_has_type aat:300055644 ;
        crm:P90_has_value ?height .
}
";

/// One resolved metadata entry, label and value as localized string maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub label: LanguageMap,
    pub value: LanguageMap,
}

impl MetadataEntry {
    /// Build an entry with both parts under the no-language bucket
    pub fn no_language(label: impl Into<String>, value: impl Into<String>) -> Self {
        let mut label_map = LanguageMap::new();
        label_map.insert(NO_LANGUAGE.to_string(), vec![label.into()]);
        let mut value_map = LanguageMap::new();
        value_map.insert(NO_LANGUAGE.to_string(), vec![value.into()]);
        Self {
            label: label_map,
            value: value_map,
        }
    }
}

/// A resolved image with its service URI and pixel dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub image: String,
    pub width: u32,
    pub height: u32,
    /// Per-image metadata, populated only when the caller asks for it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
}

/// A resolved thumbnail; dimensions are optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailDescriptor {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Metadata resolver over a query executor and a field registry
///
/// The registry is read-only and shared; the executor is any implementation
/// of [`QueryExecutor`].
pub struct MetadataResolver {
    executor: Arc<dyn QueryExecutor>,
    registry: Arc<FieldRegistry>,
    label_query: String,
    image_query: String,
    thumbnail_query: Option<String>,
}

impl MetadataResolver {
    /// Create a resolver with the default label and image query templates
    pub fn new(executor: Arc<dyn QueryExecutor>, registry: Arc<FieldRegistry>) -> Self {
        Self {
            executor,
            registry,
            label_query: DEFAULT_LABEL_QUERY.to_string(),
            image_query: DEFAULT_IMAGE_QUERY.to_string(),
            thumbnail_query: None,
        }
    }

    /// Override the label query template
    ///
    /// Provide a SELECT query with a subject placeholder and a `?label`
    /// variable.
    pub fn with_label_query(mut self, template: impl Into<String>) -> Self {
        self.label_query = template.into();
        self
    }

    /// Override the image query template
    ///
    /// Provide a SELECT query with a subject placeholder and `?image`,
    /// `?width` and `?height` variables.
    pub fn with_image_query(mut self, template: impl Into<String>) -> Self {
        self.image_query = template.into();
        self
    }

    /// Set a thumbnail query template; without one, no thumbnails are resolved
    pub fn with_thumbnail_query(mut self, template: impl Into<String>) -> Self {
        self.thumbnail_query = Some(template.into());
        self
    }

    /// The field registry this resolver reads from
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Resolve the human-readable label of a subject
    ///
    /// # Returns
    /// * `Ok(label)` - first row's `label` binding
    /// * `Err(SparqlError::NotFound)` - the label query returned no usable row
    pub async fn resolve_label(&self, subject: &str) -> Result<String> {
        let query = template::substitute_subject(&self.label_query, subject);
        let rows = self.executor.execute(&query).await?;

        let row = rows.first().ok_or_else(|| {
            SparqlError::NotFound(format!("no label found for subject '{}'", subject))
        })?;

        let label = row.label().ok_or_else(|| {
            SparqlError::NotFound(format!(
                "label query returned no 'label' binding for subject '{}'",
                subject
            ))
        })?;

        Ok(label.to_string())
    }

    /// Resolve all registered fields for a subject into metadata entries
    ///
    /// Fields are processed in registry order. A field whose query yields no
    /// rows contributes nothing. Rows of URI-valued fields without their own
    /// `label` binding are resolved through [`resolve_label`], memoized per
    /// call so a URI repeated across rows or fields triggers exactly one label
    /// query. Multiple rows of one field are joined with `", "` in row order.
    /// Any query failure aborts the whole call; no partial list is returned.
    ///
    /// [`resolve_label`]: MetadataResolver::resolve_label
    pub async fn resolve_metadata(&self, subject: &str) -> Result<Vec<MetadataEntry>> {
        let prefixes = template::prefix_block(self.registry.namespaces());
        let mut entries = Vec::new();
        let mut label_memo: HashMap<String, String> = HashMap::new();

        for field in self.registry.fields() {
            let mut query = prefixes.clone();
            query.push_str(&template::substitute_subject(&field.query, subject));

            let rows = self.executor.execute(&query).await?;
            debug!("Field '{}' returned {} rows", field.id, rows.len());

            if rows.is_empty() {
                continue;
            }

            let mut value_labels = Vec::with_capacity(rows.len());
            for row in &rows {
                let value = row.value().ok_or_else(|| {
                    SparqlError::QueryError(format!(
                        "field '{}' returned a row without a 'value' binding",
                        field.id
                    ))
                })?;

                let display = if field.datatype.is_uri() && row.label().is_none() {
                    match label_memo.get(value) {
                        Some(cached) => cached.clone(),
                        None => {
                            let label = self.resolve_label(value).await?;
                            label_memo.insert(value.to_string(), label.clone());
                            label
                        }
                    }
                } else {
                    value.to_string()
                };
                value_labels.push(display);
            }

            entries.push(MetadataEntry::no_language(
                field.label.clone(),
                value_labels.join(", "),
            ));
        }

        Ok(entries)
    }

    /// Resolve the images of a subject
    ///
    /// Each row must bind `image`, `width` and `height`; missing bindings or
    /// non-integer dimensions fail the call with `QueryError`.
    pub async fn resolve_images(&self, subject: &str) -> Result<Vec<ImageDescriptor>> {
        let query = template::substitute_subject(&self.image_query, subject);
        let rows = self.executor.execute(&query).await?;

        let mut images = Vec::with_capacity(rows.len());
        for row in &rows {
            let image = row.get("image").ok_or_else(|| {
                SparqlError::QueryError(format!(
                    "image query returned a row without an 'image' binding for '{}'",
                    subject
                ))
            })?;

            images.push(ImageDescriptor {
                image: image.to_string(),
                width: required_dimension(row, "width")?,
                height: required_dimension(row, "height")?,
                metadata: Vec::new(),
            });
        }

        debug!("Resolved {} images for subject '{}'", images.len(), subject);
        Ok(images)
    }

    /// Resolve the thumbnails of a subject
    ///
    /// Returns an empty list when no thumbnail query template is configured.
    pub async fn resolve_thumbnails(&self, subject: &str) -> Result<Vec<ThumbnailDescriptor>> {
        let Some(thumbnail_query) = &self.thumbnail_query else {
            return Ok(Vec::new());
        };

        let query = template::substitute_subject(thumbnail_query, subject);
        let rows = self.executor.execute(&query).await?;

        let mut thumbnails = Vec::with_capacity(rows.len());
        for row in &rows {
            let image = row.get("image").ok_or_else(|| {
                SparqlError::QueryError(format!(
                    "thumbnail query returned a row without an 'image' binding for '{}'",
                    subject
                ))
            })?;

            thumbnails.push(ThumbnailDescriptor {
                image: image.to_string(),
                width: optional_dimension(row, "width")?,
                height: optional_dimension(row, "height")?,
            });
        }

        Ok(thumbnails)
    }

    /// Resolve the rights statement of a subject using a caller-supplied template
    ///
    /// Absence is not an error: zero rows yield `Ok(None)`.
    pub async fn resolve_rights(&self, subject: &str, rights_template: &str) -> Result<Option<String>> {
        let query = template::substitute_subject(rights_template, subject);
        let rows = self.executor.execute(&query).await?;

        match rows.first() {
            None => Ok(None),
            Some(row) => {
                let value = row.value().ok_or_else(|| {
                    SparqlError::QueryError(format!(
                        "rights query returned a row without a 'value' binding for '{}'",
                        subject
                    ))
                })?;
                Ok(Some(value.to_string()))
            }
        }
    }

    /// Resolve the required statement of a subject using a caller-supplied template
    ///
    /// Takes the first row's `label` and `value` bindings. Zero rows, or a row
    /// missing either binding, yield `Ok(None)`.
    pub async fn resolve_required_statement(
        &self,
        subject: &str,
        statement_template: &str,
    ) -> Result<Option<MetadataEntry>> {
        let query = template::substitute_subject(statement_template, subject);
        let rows = self.executor.execute(&query).await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        match (row.label(), row.value()) {
            (Some(label), Some(value)) => Ok(Some(MetadataEntry::no_language(label, value))),
            _ => {
                warn!(
                    "Required statement row for '{}' is missing a 'label' or 'value' binding",
                    subject
                );
                Ok(None)
            }
        }
    }
}

fn required_dimension(row: &ResultRow, var: &str) -> Result<u32> {
    let raw = row.get(var).ok_or_else(|| {
        SparqlError::QueryError(format!("image row is missing a '{}' binding", var))
    })?;
    raw.parse::<u32>().map_err(|_| {
        SparqlError::QueryError(format!("image '{}' value '{}' is not an integer", var, raw))
    })
}

fn optional_dimension(row: &ResultRow, var: &str) -> Result<Option<u32>> {
    match row.get(var) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| {
                SparqlError::QueryError(format!(
                    "thumbnail '{}' value '{}' is not an integer",
                    var, raw
                ))
            }),
    }
}
