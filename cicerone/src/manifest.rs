//! IIIF Presentation 3 manifest assembly
//!
//! Typed document model for the slice of the Presentation API this service
//! produces, plus a builder turning resolved document data into a manifest.
//! Canvas, page and annotation ids are derived from the manifest id
//! (`{manifest_id}/image/{i}/canvas` and so on, zero-indexed).

use cicerone_sparql::{
    ImageDescriptor, LanguageMap, MetadataEntry, ThumbnailDescriptor, NO_LANGUAGE,
};
use serde::Serialize;

/// JSON-LD context of the IIIF Presentation API, version 3
pub const IIIF_CONTEXT: &str = "http://iiif.io/api/presentation/3/context.json";

const IMAGE_SERVICE_TYPE: &str = "ImageService3";
const IMAGE_SERVICE_PROFILE: &str = "level2";

/// A IIIF Presentation 3 manifest
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub label: LanguageMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
    #[serde(rename = "requiredStatement", skip_serializing_if = "Option::is_none")]
    pub required_statement: Option<MetadataEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<ImageResource>,
    pub items: Vec<Canvas>,
}

/// One canvas per image, holding a single painting annotation
#[derive(Debug, Clone, Serialize)]
pub struct Canvas {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    pub items: Vec<AnnotationPage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationPage {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub items: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub motivation: String,
    pub body: ImageResource,
    pub target: String,
}

/// An image resource with its IIIF Image API service reference
///
/// Used both as annotation body (dimensions always known) and as thumbnail
/// entry (dimensions optional).
#[derive(Debug, Clone, Serialize)]
pub struct ImageResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub service: Vec<ImageService>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageService {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub profile: String,
}

/// Assembles a manifest from resolved document parts
///
/// # Example
/// ```
/// use cicerone::manifest::ManifestBuilder;
///
/// let manifest = ManifestBuilder::new("https://example.org/manifest/object/1", "Mona Lisa")
///     .build();
/// assert_eq!(manifest.id, "https://example.org/manifest/object/1");
/// assert_eq!(manifest.resource_type, "Manifest");
/// ```
pub struct ManifestBuilder {
    id: String,
    label: String,
    metadata: Vec<MetadataEntry>,
    images: Vec<ImageDescriptor>,
    thumbnails: Vec<ThumbnailDescriptor>,
    rights: Option<String>,
    required_statement: Option<MetadataEntry>,
}

impl ManifestBuilder {
    /// Start a manifest with its id and human-readable label
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            metadata: Vec::new(),
            images: Vec::new(),
            thumbnails: Vec::new(),
            rights: None,
            required_statement: None,
        }
    }

    pub fn metadata(mut self, metadata: Vec<MetadataEntry>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Images become canvases, one per image, in list order
    pub fn images(mut self, images: Vec<ImageDescriptor>) -> Self {
        self.images = images;
        self
    }

    pub fn thumbnails(mut self, thumbnails: Vec<ThumbnailDescriptor>) -> Self {
        self.thumbnails = thumbnails;
        self
    }

    pub fn rights(mut self, rights: Option<String>) -> Self {
        self.rights = rights;
        self
    }

    pub fn required_statement(mut self, statement: Option<MetadataEntry>) -> Self {
        self.required_statement = statement;
        self
    }

    pub fn build(self) -> Manifest {
        let Self {
            id,
            label,
            metadata,
            images,
            thumbnails,
            rights,
            required_statement,
        } = self;

        let mut label_map = LanguageMap::new();
        label_map.insert(NO_LANGUAGE.to_string(), vec![label]);

        let items = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| canvas_for(&id, index, image))
            .collect();
        let thumbnail = thumbnails.into_iter().map(thumbnail_resource).collect();

        Manifest {
            context: IIIF_CONTEXT.to_string(),
            id,
            resource_type: "Manifest".to_string(),
            label: label_map,
            metadata,
            rights,
            required_statement,
            thumbnail,
            items,
        }
    }
}

fn canvas_for(manifest_id: &str, index: usize, image: ImageDescriptor) -> Canvas {
    let canvas_id = format!("{}/image/{}/canvas", manifest_id, index);
    let page_id = format!("{}/page", canvas_id);
    let annotation_id = format!("{}/annotation", canvas_id);

    let body = ImageResource {
        id: format!("{}/full/max/0/default.jpg", image.image),
        resource_type: "Image".to_string(),
        format: "image/jpeg".to_string(),
        width: Some(image.width),
        height: Some(image.height),
        service: vec![image_service(&image.image)],
    };

    Canvas {
        id: canvas_id.clone(),
        resource_type: "Canvas".to_string(),
        width: image.width,
        height: image.height,
        metadata: image.metadata,
        items: vec![AnnotationPage {
            id: page_id,
            resource_type: "AnnotationPage".to_string(),
            items: vec![Annotation {
                id: annotation_id,
                resource_type: "Annotation".to_string(),
                motivation: "painting".to_string(),
                body,
                target: canvas_id,
            }],
        }],
    }
}

fn thumbnail_resource(thumbnail: ThumbnailDescriptor) -> ImageResource {
    ImageResource {
        id: format!("{}/full/max/0/default.jpg", thumbnail.image),
        resource_type: "Image".to_string(),
        format: "image/jpeg".to_string(),
        width: thumbnail.width,
        height: thumbnail.height,
        service: vec![image_service(&thumbnail.image)],
    }
}

fn image_service(id: &str) -> ImageService {
    ImageService {
        id: id.to_string(),
        resource_type: IMAGE_SERVICE_TYPE.to_string(),
        profile: IMAGE_SERVICE_PROFILE.to_string(),
    }
}
