//! Manifest service orchestration
//!
//! Ties the SPARQL resolver, the disk cache and the IIIF builder together:
//! a manifest request becomes a subject URI, a cache lookup and, on a miss,
//! a full document-data resolution pass followed by manifest assembly.

use std::sync::Arc;

use cicerone_sparql::{
    CacheConfig, CacheKeyBuilder, DiskCache, FieldRegistry, ImageDescriptor, MetadataEntry,
    MetadataResolver, ProbeResult, QueryExecutor, SparqlClient, SparqlError, ThumbnailDescriptor,
};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::manifest::ManifestBuilder;

/// Every resolved facet of a document, gathered ahead of manifest assembly
#[derive(Debug, Clone)]
pub struct DocumentData {
    pub label: String,
    pub metadata: Vec<MetadataEntry>,
    pub images: Vec<ImageDescriptor>,
    pub thumbnails: Vec<ThumbnailDescriptor>,
    pub rights: Option<String>,
    pub required_statement: Option<MetadataEntry>,
}

/// The manifest service
///
/// Holds the executor, the configured resolver and the disk cache. Cheap to
/// share behind an `Arc`; all methods take `&self`.
pub struct ManifestService {
    executor: Arc<dyn QueryExecutor>,
    resolver: MetadataResolver,
    cache: Arc<DiskCache>,
    config: ServiceConfig,
}

impl ManifestService {
    /// Connect to a SPARQL endpoint and assemble the full service
    ///
    /// # Arguments
    /// * `endpoint` - SPARQL endpoint URL, probed during connection
    /// * `config` - loaded service configuration
    pub async fn new(endpoint: &str, config: ServiceConfig) -> Result<Self> {
        let client = SparqlClient::connect(endpoint).await?;
        Self::from_parts(Arc::new(client), config).await
    }

    /// Assemble the service around an existing executor
    ///
    /// Loads the field registry, opens the cache directory and configures the
    /// resolver with any query overrides from the configuration.
    pub async fn from_parts(
        executor: Arc<dyn QueryExecutor>,
        config: ServiceConfig,
    ) -> Result<Self> {
        let registry = Arc::new(FieldRegistry::from_file(&config.field_definitions_file).await?);
        info!("Loaded {} field definitions", registry.fields().len());

        let cache = Arc::new(DiskCache::new(CacheConfig::new(
            &config.cache.directory,
            &config.cache.expiration,
        )?)?);

        let mut resolver = MetadataResolver::new(executor.clone(), registry);
        if let Some(label) = &config.queries.label {
            resolver = resolver.with_label_query(label);
        }
        if let Some(images) = &config.queries.images {
            resolver = resolver.with_image_query(images);
        }
        if let Some(thumbnails) = &config.queries.thumbnails {
            resolver = resolver.with_thumbnail_query(thumbnails);
        }

        Ok(Self {
            executor,
            resolver,
            cache,
            config,
        })
    }

    fn subject_uri(&self, item_type: &str, id: &str) -> String {
        format!("{}{}/{}", self.config.namespaces.entities, item_type, id)
    }

    fn manifest_uri(&self, item_type: &str, id: &str) -> String {
        format!("{}{}/{}", self.config.namespaces.manifests, item_type, id)
    }

    /// Probe the underlying endpoint
    pub async fn probe(&self) -> ProbeResult {
        self.executor.probe().await
    }

    /// Resolve every document facet for a subject
    ///
    /// Resolution order: label (fatal if absent), metadata, images with
    /// optional per-image metadata, thumbnails, rights, required statement.
    /// The rights facets only run when their query templates are configured.
    pub async fn document_data(&self, subject: &str) -> cicerone_sparql::Result<DocumentData> {
        let label = self.resolver.resolve_label(subject).await?;
        let metadata = self.resolver.resolve_metadata(subject).await?;

        let mut images = self.resolver.resolve_images(subject).await?;
        if self.config.options.image_metadata {
            for image in &mut images {
                let image_metadata = self.resolver.resolve_metadata(&image.image).await?;
                image.metadata = image_metadata;
            }
        }

        let thumbnails = self.resolver.resolve_thumbnails(subject).await?;

        let rights = match &self.config.rights.license_query {
            Some(template) => self.resolver.resolve_rights(subject, template).await?,
            None => None,
        };
        let required_statement = match &self.config.rights.required_statement_query {
            Some(template) => {
                self.resolver
                    .resolve_required_statement(subject, template)
                    .await?
            }
            None => None,
        };

        debug!(
            "Resolved document data for '{}': {} metadata entries, {} images",
            subject,
            metadata.len(),
            images.len()
        );

        Ok(DocumentData {
            label,
            metadata,
            images,
            thumbnails,
            rights,
            required_statement,
        })
    }

    /// Produce the manifest for an item, serving from the cache when possible
    ///
    /// The manifest is memoized under `manifest(item_type=..., id=...)`; within
    /// the configured expiration the stored document is served without
    /// touching the endpoint.
    ///
    /// # Returns
    /// * `Ok(value)` - the manifest as a JSON document
    /// * `Err(ServiceError)` - resolution or storage failure
    pub async fn manifest(&self, item_type: &str, id: &str) -> Result<serde_json::Value> {
        let key = CacheKeyBuilder::new("manifest")
            .arg("item_type", item_type)
            .arg("id", id)
            .build();
        let subject = self.subject_uri(item_type, id);
        let manifest_id = self.manifest_uri(item_type, id);

        debug!("Manifest request for {}", subject);

        let value = self
            .cache
            .get_or_compute(&key, || async {
                let DocumentData {
                    label,
                    metadata,
                    images,
                    thumbnails,
                    rights,
                    required_statement,
                } = self.document_data(&subject).await?;

                let manifest = ManifestBuilder::new(&manifest_id, label)
                    .metadata(metadata)
                    .images(images)
                    .thumbnails(thumbnails)
                    .rights(rights)
                    .required_statement(required_statement)
                    .build();

                serde_json::to_value(&manifest)
                    .map_err(|e| SparqlError::SerializationError(e.to_string()))
            })
            .await?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CacheSettings, NamespaceSettings, OptionSettings, QuerySettings, RightsSettings,
    };
    use async_trait::async_trait;
    use cicerone_sparql::ResultRow;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const FIELDS: &str = r#"
namespaces:
  crm: "http://www.cidoc-crm.org/cidoc-crm/"
fields:
  - id: material
    label: Material
    datatype: literal
    queries:
      - select: "SELECT ?value WHERE { $subject crm:P45 ?value . }"
"#;

    /// Routes queries to canned rows by substring, first match wins
    struct MockExecutor {
        rules: Vec<(String, Vec<ResultRow>)>,
        executed: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        fn new() -> Self {
            Self {
                rules: Vec::new(),
                executed: Mutex::new(Vec::new()),
            }
        }

        fn on(mut self, pattern: &str, rows: Vec<ResultRow>) -> Self {
            self.rules.push((pattern.to_string(), rows));
            self
        }

        fn query_count(&self) -> usize {
            self.executed.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl QueryExecutor for MockExecutor {
        async fn execute(&self, query: &str) -> cicerone_sparql::Result<Vec<ResultRow>> {
            self.executed.lock().unwrap().push(query.to_string());
            for (pattern, rows) in &self.rules {
                if query.contains(pattern) {
                    return Ok(rows.clone());
                }
            }
            Ok(Vec::new())
        }
    }

    fn service_config(dir: &TempDir) -> ServiceConfig {
        let fields_path = dir.path().join("fields.yml");
        std::fs::write(&fields_path, FIELDS).unwrap();
        ServiceConfig {
            field_definitions_file: fields_path,
            cache: CacheSettings {
                expiration: "1h".to_string(),
                directory: dir.path().join("cache"),
            },
            namespaces: NamespaceSettings {
                entities: "https://example.org/entity/".to_string(),
                manifests: "https://example.org/manifest/".to_string(),
            },
            queries: QuerySettings::default(),
            rights: RightsSettings::default(),
            options: OptionSettings::default(),
        }
    }

    fn label_row(label: &str) -> ResultRow {
        ResultRow::new().bind("label", label)
    }

    fn value_row(value: &str) -> ResultRow {
        ResultRow::new().bind("value", value)
    }

    fn image_row(image: &str, width: &str, height: &str) -> ResultRow {
        ResultRow::new()
            .bind("image", image)
            .bind("width", width)
            .bind("height", height)
    }

    #[tokio::test]
    async fn test_manifest_builds_from_resolved_data() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(
            MockExecutor::new()
                .on("skos:prefLabel", vec![label_row("Mona Lisa")])
                .on("la:access_point", vec![image_row("https://iiif.example.org/img/1", "2000", "1500")])
                .on("crm:P45", vec![value_row("oil paint")]),
        );

        let service = ManifestService::from_parts(mock.clone(), service_config(&dir))
            .await
            .unwrap();
        let manifest = service.manifest("object", "1").await.unwrap();

        assert_eq!(manifest["id"], "https://example.org/manifest/object/1");
        assert_eq!(manifest["type"], "Manifest");
        assert_eq!(manifest["label"]["none"][0], "Mona Lisa");
        assert_eq!(manifest["metadata"][0]["label"]["none"][0], "Material");
        assert_eq!(manifest["metadata"][0]["value"]["none"][0], "oil paint");
        assert_eq!(
            manifest["items"][0]["id"],
            "https://example.org/manifest/object/1/image/0/canvas"
        );
    }

    #[tokio::test]
    async fn test_manifest_served_from_cache_on_second_call() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(
            MockExecutor::new()
                .on("skos:prefLabel", vec![label_row("Mona Lisa")])
                .on("crm:P45", vec![value_row("oil paint")]),
        );

        let service = ManifestService::from_parts(mock.clone(), service_config(&dir))
            .await
            .unwrap();

        let first = service.manifest("object", "1").await.unwrap();
        let queries_after_first = mock.query_count();
        assert!(queries_after_first > 0);

        let second = service.manifest("object", "1").await.unwrap();
        assert_eq!(mock.query_count(), queries_after_first);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_document_data_aggregates_all_facets() {
        let dir = TempDir::new().unwrap();
        let mut config = service_config(&dir);
        config.rights.license_query =
            Some("SELECT ?value WHERE { $subject crm:P104 ?value . }".to_string());
        config.rights.required_statement_query =
            Some("SELECT ?label ?value WHERE { $subject crm:P105 ?value . }".to_string());

        let mock = Arc::new(
            MockExecutor::new()
                .on("skos:prefLabel", vec![label_row("Mona Lisa")])
                .on("la:access_point", vec![image_row("https://iiif.example.org/img/1", "2000", "1500")])
                .on("crm:P45", vec![value_row("oil paint")])
                .on("crm:P104", vec![value_row("https://creativecommons.org/licenses/by/4.0/")])
                .on(
                    "crm:P105",
                    vec![ResultRow::new()
                        .bind("label", "Attribution")
                        .bind("value", "Provided by the Example Museum")],
                ),
        );

        let service = ManifestService::from_parts(mock.clone(), config)
            .await
            .unwrap();
        let data = service
            .document_data("https://example.org/entity/object/1")
            .await
            .unwrap();

        assert_eq!(data.label, "Mona Lisa");
        assert_eq!(data.metadata.len(), 1);
        assert_eq!(data.images.len(), 1);
        assert_eq!(data.images[0].width, 2000);
        assert!(data.thumbnails.is_empty());
        assert_eq!(
            data.rights.as_deref(),
            Some("https://creativecommons.org/licenses/by/4.0/")
        );
        let statement = data.required_statement.unwrap();
        assert_eq!(statement.label["none"][0], "Attribution");
    }

    #[tokio::test]
    async fn test_image_metadata_option_populates_canvas_metadata() {
        let dir = TempDir::new().unwrap();
        let mut config = service_config(&dir);
        config.options.image_metadata = true;

        let mock = Arc::new(
            MockExecutor::new()
                .on("skos:prefLabel", vec![label_row("Mona Lisa")])
                .on("la:access_point", vec![image_row("urn:img:1", "100", "100")])
                .on("<urn:img:1> crm:P45", vec![value_row("scan of recto")])
                .on("crm:P45", vec![value_row("oil paint")]),
        );

        let service = ManifestService::from_parts(mock.clone(), config)
            .await
            .unwrap();
        let manifest = service.manifest("object", "1").await.unwrap();

        let canvas = &manifest["items"][0];
        assert_eq!(canvas["metadata"][0]["label"]["none"][0], "Material");
        assert_eq!(canvas["metadata"][0]["value"]["none"][0], "scan of recto");
        assert_eq!(manifest["metadata"][0]["value"]["none"][0], "oil paint");
    }
}
