//! COCO-like export: one image, one category, one bbox annotation per object.
//! http://cocodataset.org/#format-data

use std::path::Path;

use serde::{Serialize, Serializer};

use crate::error::ExportError;
use crate::surface::AnnotationObject;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "annotations.json";
pub const DEFAULT_IMAGE_FILE_NAME: &str = "canvas.png";

const IMAGE_ID: u32 = 1;
const CATEGORY_ID: u32 = 1;
const CATEGORY_NAME: &str = "annotation";
const SUPERCATEGORY: &str = "shape";

/// A number written the way a JSON producer in a browser would: integral
/// values carry no fractional part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JsNumber(pub f64);

// 2^53, the largest range where every integer is exactly representable
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Serialize for JsNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
            serializer.serialize_i64(v as i64)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CocoImage {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CocoAnnotation {
    pub id: usize,
    pub image_id: u32,
    pub category_id: u32,
    pub segmentation: Vec<Vec<JsNumber>>,
    pub area: JsNumber,
    pub bbox: [JsNumber; 4], // [x, y, width, height]
    pub iscrowd: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportDocument {
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

/// A finished export, ready to be offered to the user for saving.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ExportFile {
    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, &self.contents).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn encode(
    objects: &[AnnotationObject],
    surface_width: u32,
    surface_height: u32,
) -> ExportDocument {
    encode_with_file_name(objects, surface_width, surface_height, DEFAULT_IMAGE_FILE_NAME)
}

pub fn encode_with_file_name(
    objects: &[AnnotationObject],
    surface_width: u32,
    surface_height: u32,
    file_name: &str,
) -> ExportDocument {
    let annotations = objects
        .iter()
        .enumerate()
        .map(|(index, obj)| CocoAnnotation {
            id: index + 1,
            image_id: IMAGE_ID,
            category_id: CATEGORY_ID,
            // no polygon geometry is captured, only bounding boxes
            segmentation: Vec::new(),
            area: JsNumber(obj.width * obj.height),
            bbox: [
                JsNumber(obj.left),
                JsNumber(obj.top),
                JsNumber(obj.width),
                JsNumber(obj.height),
            ],
            iscrowd: 0,
        })
        .collect();

    ExportDocument {
        images: vec![CocoImage {
            id: IMAGE_ID,
            width: surface_width,
            height: surface_height,
            file_name: file_name.to_string(),
        }],
        annotations,
        categories: vec![CocoCategory {
            id: CATEGORY_ID,
            name: CATEGORY_NAME.to_string(),
            supercategory: SUPERCATEGORY.to_string(),
        }],
    }
}

impl ExportDocument {
    /// Compact UTF-8 JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec(self)?)
    }
}
