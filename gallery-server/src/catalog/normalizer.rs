//! Raw record -> canonical [`Painting`]
//!
//! Every optional field resolves to a documented default; only a record with
//! no id is rejected (`Validation`), and batch normalization skips such
//! records instead of failing the whole batch.

use chrono::{DateTime, NaiveDateTime, Utc};
use gallery_common::{Error, Result};
use std::collections::BTreeSet;
use tracing::warn;

use super::painting::Painting;
use crate::imaging::{ImageOptions, ImageUrlBuilder, DISPLAY_WIDTH};
use crate::source::{RawFlag, RawRecord};

/// Title prefix for paintings with a label number
pub const LABEL_TITLE_PREFIX: &str = "Nummer";

/// Title for paintings with neither label number nor caption
pub const UNTITLED: &str = "Ongetiteld";

/// Legacy tag carrying a caption
pub const TITLE_TAG_PREFIX: &str = "title:";

/// Legacy tag carrying a category
pub const CATEGORY_TAG_PREFIX: &str = "category:";

/// Structured data found in reserved-prefix tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedTags {
    pub title: Option<String>,
    pub category: Option<String>,
}

/// True for `title:` / `category:` tags
pub fn is_reserved_tag(tag: &str) -> bool {
    tag.starts_with(TITLE_TAG_PREFIX) || tag.starts_with(CATEGORY_TAG_PREFIX)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Label number first, then caption, then the placeholder
pub fn resolve_title(label_number: Option<&str>, caption: Option<&str>) -> String {
    if let Some(label) = non_blank(label_number) {
        return format!("{} {}", LABEL_TITLE_PREFIX, label);
    }
    if let Some(caption) = non_blank(caption) {
        return caption.to_string();
    }
    UNTITLED.to_string()
}

/// Category from a slash-delimited path.
///
/// Under `root_prefix` the first segment after the prefix is the category;
/// otherwise the last segment. Missing path -> empty string.
pub fn resolve_category(path: Option<&str>, root_prefix: &str) -> String {
    let Some(path) = path else {
        return String::new();
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let root: Vec<&str> = root_prefix.split('/').filter(|s| !s.is_empty()).collect();

    if !root.is_empty() && segments.len() >= root.len() && segments[..root.len()] == root[..] {
        return segments
            .get(root.len())
            .map(|s| s.to_string())
            .unwrap_or_default();
    }

    segments.last().map(|s| s.to_string()).unwrap_or_default()
}

/// Split raw tags into reserved-prefix data and the exposed regular tags
pub fn partition_tags(tags: &[String]) -> (ReservedTags, BTreeSet<String>) {
    let mut reserved = ReservedTags::default();
    let mut regular = BTreeSet::new();

    for tag in tags {
        if let Some(title) = tag.strip_prefix(TITLE_TAG_PREFIX) {
            if reserved.title.is_none() && !title.trim().is_empty() {
                reserved.title = Some(title.to_string());
            }
        } else if let Some(category) = tag.strip_prefix(CATEGORY_TAG_PREFIX) {
            if reserved.category.is_none() && !category.trim().is_empty() {
                reserved.category = Some(category.to_string());
            }
        } else if !tag.trim().is_empty() {
            regular.insert(tag.clone());
        }
    }

    (reserved, regular)
}

/// Absent -> published; otherwise the flag's own value
pub fn resolve_published(raw: Option<&RawFlag>) -> bool {
    raw.map(RawFlag::as_bool).unwrap_or(true)
}

/// RFC 3339, or SQLite's `YYYY-MM-DD HH:MM:SS` (UTC)
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn dimension(raw: Option<i64>) -> Option<u32> {
    raw.and_then(|v| u32::try_from(v).ok())
}

/// Source format, falling back to the asset path's extension
fn resolve_format(format: Option<&str>, asset_path: Option<&str>) -> String {
    if let Some(format) = non_blank(format) {
        return format.to_ascii_lowercase();
    }
    asset_path
        .and_then(|p| p.rsplit('/').next())
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Maps raw records to paintings for one catalog configuration
#[derive(Debug, Clone)]
pub struct Normalizer {
    root_folder: String,
    images: ImageUrlBuilder,
}

impl Normalizer {
    pub fn new(root_folder: impl Into<String>, images: ImageUrlBuilder) -> Self {
        Self {
            root_folder: root_folder.into(),
            images,
        }
    }

    pub fn images(&self) -> &ImageUrlBuilder {
        &self.images
    }

    /// Normalize one record; `Validation` if it has no id
    pub fn normalize(&self, raw: RawRecord) -> Result<Painting> {
        let id = match non_blank(raw.id.as_deref()) {
            Some(id) => id.to_string(),
            None => {
                return Err(Error::Validation(
                    "raw painting record has no id".to_string(),
                ))
            }
        };

        let (reserved, tags) = partition_tags(&raw.tags);

        let caption = non_blank(raw.caption.as_deref()).or(reserved.title.as_deref());
        let title = resolve_title(raw.label_number.as_deref(), caption);

        let category = match non_blank(raw.category.as_deref()).or(reserved.category.as_deref()) {
            Some(explicit) => explicit.to_string(),
            None => resolve_category(raw.folder.as_deref(), &self.root_folder),
        };

        let asset_path = raw.asset_path.as_deref().unwrap_or_default();

        Ok(Painting {
            title,
            category,
            tags,
            image_url: self
                .images
                .build(asset_path, &ImageOptions::with_width(DISPLAY_WIDTH)),
            original_image_url: self.images.build(asset_path, &ImageOptions::original()),
            width: dimension(raw.width),
            height: dimension(raw.height),
            format: resolve_format(raw.format.as_deref(), raw.asset_path.as_deref()),
            created: parse_timestamp(raw.created.as_deref()),
            label_number: raw.label_number.filter(|l| !l.trim().is_empty()),
            verified: raw.verified.as_ref().map(RawFlag::as_bool).unwrap_or(false),
            published: resolve_published(raw.published.as_ref()),
            id,
        })
    }

    /// Normalize a batch, dropping (and logging) records that cannot be identified
    pub fn normalize_all(&self, raws: Vec<RawRecord>) -> Vec<Painting> {
        raws.into_iter()
            .filter_map(|raw| match self.normalize(raw) {
                Ok(painting) => Some(painting),
                Err(e) => {
                    warn!(error = %e, "Skipping painting record");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImageBackend;

    fn normalizer() -> Normalizer {
        Normalizer::new(
            "Root",
            ImageUrlBuilder::new(ImageBackend::Cloudinary {
                cloud_name: "demo".to_string(),
            }),
        )
    }

    fn raw(id: &str) -> RawRecord {
        RawRecord {
            id: Some(id.to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_scenario_label_null_published_folder() {
        let record = RawRecord {
            label_number: Some("42".into()),
            published: None,
            folder: Some("Root/Landscapes/p1.jpg".into()),
            ..raw("p1")
        };
        let painting = normalizer().normalize(record).unwrap();

        assert_eq!(painting.id, "p1");
        assert_eq!(painting.title, "Nummer 42");
        assert!(painting.published);
        assert_eq!(painting.category, "Landscapes");
    }

    #[test]
    fn test_title_fallback_chain() {
        assert_eq!(resolve_title(Some("7"), Some("Zonsondergang")), "Nummer 7");
        assert_eq!(resolve_title(Some(""), Some("Zonsondergang")), "Zonsondergang");
        assert_eq!(resolve_title(None, Some("Zonsondergang")), "Zonsondergang");
        assert_eq!(resolve_title(None, None), "Ongetiteld");
        assert_eq!(resolve_title(Some("  "), Some("")), "Ongetiteld");
    }

    #[test]
    fn test_legacy_title_tag_is_caption_fallback() {
        let record = RawRecord {
            tags: vec!["title:Avondlicht".into(), "olieverf".into()],
            ..raw("p1")
        };
        let painting = normalizer().normalize(record).unwrap();
        assert_eq!(painting.title, "Avondlicht");
        assert_eq!(painting.tags.iter().collect::<Vec<_>>(), vec!["olieverf"]);

        // A real caption wins over the tag
        let record = RawRecord {
            caption: Some("Ochtend".into()),
            tags: vec!["title:Avondlicht".into()],
            ..raw("p2")
        };
        assert_eq!(normalizer().normalize(record).unwrap().title, "Ochtend");
    }

    #[test]
    fn test_category_resolution() {
        assert_eq!(resolve_category(Some("Root/Landscapes/p1.jpg"), "Root"), "Landscapes");
        assert_eq!(resolve_category(Some("Root/Landscapes"), "Root"), "Landscapes");
        assert_eq!(resolve_category(Some("Other/Portraits"), "Root"), "Portraits");
        assert_eq!(resolve_category(Some("Rooted/Portraits"), "Root"), "Portraits");
        assert_eq!(resolve_category(Some("Root"), "Root"), "");
        assert_eq!(resolve_category(Some(""), "Root"), "");
        assert_eq!(resolve_category(Some("///"), "Root"), "");
        assert_eq!(resolve_category(None, "Root"), "");
        assert_eq!(
            resolve_category(Some("Tom van As Kunst/ATELIER WERK/x.jpg"), "Tom van As Kunst"),
            "ATELIER WERK"
        );
    }

    #[test]
    fn test_explicit_category_beats_tag_and_folder() {
        let record = RawRecord {
            category: Some("Portretten".into()),
            tags: vec!["category:Stillevens".into()],
            folder: Some("Root/Landscapes".into()),
            ..raw("p1")
        };
        assert_eq!(normalizer().normalize(record).unwrap().category, "Portretten");

        let record = RawRecord {
            tags: vec!["category:Stillevens".into()],
            folder: Some("Root/Landscapes".into()),
            ..raw("p2")
        };
        assert_eq!(normalizer().normalize(record).unwrap().category, "Stillevens");
    }

    #[test]
    fn test_published_resolution() {
        assert!(resolve_published(None));
        assert!(resolve_published(Some(&RawFlag::Bool(true))));
        assert!(!resolve_published(Some(&RawFlag::Bool(false))));
        assert!(resolve_published(Some(&RawFlag::Text("true".into()))));
        assert!(!resolve_published(Some(&RawFlag::Text("false".into()))));
        assert!(!resolve_published(Some(&RawFlag::Text("yes".into()))));
    }

    #[test]
    fn test_missing_id_rejected_but_batch_survives() {
        let records = vec![raw("p1"), RawRecord::default(), raw("  "), raw("p2")];
        assert!(matches!(
            normalizer().normalize(RawRecord::default()),
            Err(Error::Validation(_))
        ));

        let paintings = normalizer().normalize_all(records);
        let ids: Vec<_> = paintings.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_defaults_for_bare_record() {
        let painting = normalizer().normalize(raw("p1")).unwrap();
        assert_eq!(painting.title, UNTITLED);
        assert_eq!(painting.category, "");
        assert!(painting.tags.is_empty());
        assert!(painting.published);
        assert!(!painting.verified);
        assert_eq!(painting.image_url, "");
        assert_eq!(painting.label_number, None);
        assert_eq!(painting.created, None);
    }

    #[test]
    fn test_urls_timestamps_and_format() {
        let record = RawRecord {
            asset_path: Some("Root/Landscapes/p1.JPG".into()),
            created: Some("2024-01-01 10:00:00".into()),
            width: Some(-5),
            height: Some(900),
            verified: Some(RawFlag::Text("true".into())),
            ..raw("p1")
        };
        let painting = normalizer().normalize(record).unwrap();

        assert_eq!(
            painting.image_url,
            "https://res.cloudinary.com/demo/image/upload/w_1200,c_limit,f_webp,q_auto/Root/Landscapes/p1.JPG"
        );
        assert_eq!(
            painting.original_image_url,
            "https://res.cloudinary.com/demo/image/upload/q_auto/Root/Landscapes/p1.JPG"
        );
        assert_eq!(painting.format, "jpg");
        assert_eq!(painting.width, None);
        assert_eq!(painting.height, Some(900));
        assert!(painting.verified);
        assert_eq!(
            painting.created.unwrap().to_rfc3339(),
            "2024-01-01T10:00:00+00:00"
        );

        let rfc = RawRecord {
            created: Some("2024-03-01T12:00:00Z".into()),
            ..raw("p2")
        };
        assert!(normalizer().normalize(rfc).unwrap().created.is_some());
    }
}
