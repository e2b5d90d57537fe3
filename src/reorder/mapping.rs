//! Persisted record of which group each index thumbnail stands for.
//!
//! The blob lives in the document's key-value store under [`MAPPING_KEY`].
//! Loading never fails: anything unreadable degrades to "no mapping" so the
//! reorder pipeline falls back to geometric detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    core::{
        errors::AppResult,
        run_log::RunLog,
        types::{IndexSlide, VisualOrderEntry},
    },
    host::PropertyStore,
};

pub const MAPPING_KEY: &str = "BOOGIE_THUMBNAIL_MAPPING";
pub const MAPPING_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailRecord {
    pub image_object_id: String,
    #[serde(default)]
    pub position: usize,
    pub group_index: usize,
    #[serde(default)]
    pub group_slides: Vec<usize>,
    #[serde(default)]
    pub original_order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_position: Option<usize>,
    #[serde(default)]
    pub drive_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_position: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSlideMapping {
    pub slide_id: String,
    #[serde(default)]
    pub slide_number: usize,
    #[serde(default)]
    pub thumbnails: Vec<ThumbnailRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailMapping {
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reorder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_thumbnails: usize,
    #[serde(default)]
    pub total_groups: usize,
    #[serde(default)]
    pub slides: Vec<IndexSlideMapping>,
}

/// A thumbnail observed at a settled visual position after a reorder.
#[derive(Debug, Clone, Copy)]
pub struct PlacedThumbnail<'a> {
    pub entry: &'a VisualOrderEntry,
    /// 1-based position in the realized order.
    pub visual_position: usize,
}

impl ThumbnailMapping {
    pub fn new(total_groups: usize, slides: Vec<IndexSlideMapping>) -> Self {
        let total_thumbnails = slides.iter().map(|slide| slide.thumbnails.len()).sum();
        Self {
            version: MAPPING_VERSION,
            created: Utc::now(),
            last_reorder: None,
            total_thumbnails,
            total_groups,
            slides,
        }
    }

    pub fn slide(&self, slide_id: &str) -> Option<&IndexSlideMapping> {
        self.slides.iter().find(|slide| slide.slide_id == slide_id)
    }

    pub fn slide_ids(&self) -> impl Iterator<Item = &str> {
        self.slides.iter().map(|slide| slide.slide_id.as_str())
    }

    pub fn records(&self) -> impl Iterator<Item = &ThumbnailRecord> {
        self.slides.iter().flat_map(|slide| slide.thumbnails.iter())
    }

    pub fn find_by_element_id(&self, image_object_id: &str) -> Option<&ThumbnailRecord> {
        self.records()
            .find(|record| record.image_object_id == image_object_id)
    }

    pub fn find_by_content_id(&self, content_id: &str) -> Option<&ThumbnailRecord> {
        self.records()
            .find(|record| record.drive_id.as_deref() == Some(content_id))
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Replaces the recorded thumbnails with what the index slides show after
    /// a reorder: the thumbnail at visual position `v` now stands for the
    /// `v`-th group in storage order.
    pub fn rewrite_after_reorder(
        &mut self,
        index_slides: &[IndexSlide],
        placed: &[PlacedThumbnail<'_>],
        total_groups: usize,
        reordered_at: DateTime<Utc>,
    ) {
        let index_count = index_slides.len();
        self.slides = index_slides
            .iter()
            .enumerate()
            .map(|(slot, index_slide)| IndexSlideMapping {
                slide_id: index_slide.slide_id.clone(),
                slide_number: index_slide.position + 1,
                thumbnails: placed
                    .iter()
                    .filter(|placed| placed.entry.index_slide == slot)
                    .map(|placed| {
                        let slot_in_order = placed.visual_position.saturating_sub(1);
                        let base = index_count + 3 * slot_in_order;
                        ThumbnailRecord {
                            image_object_id: placed.entry.image_object_id.clone(),
                            position: placed.entry.cell,
                            group_index: slot_in_order,
                            group_slides: vec![base, base + 1, base + 2],
                            original_order: placed.visual_position,
                            slide_position: Some(base),
                            drive_id: placed.entry.identity.content_id.clone(),
                            visual_position: Some(placed.visual_position),
                        }
                    })
                    .collect(),
            })
            .collect();
        self.version = MAPPING_VERSION;
        self.total_thumbnails = self.slides.iter().map(|slide| slide.thumbnails.len()).sum();
        self.total_groups = total_groups;
        self.last_reorder = Some(reordered_at);
    }
}

fn schema_version(value: &Value) -> Option<u32> {
    match value.get("version") {
        None | Some(Value::Null) => Some(1),
        Some(Value::Number(number)) => number.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(text)) => text
            .split('.')
            .next()
            .and_then(|major| major.trim().parse::<u32>().ok()),
        _ => None,
    }
}

/// Parses a stored blob, migrating legacy layouts forward.
pub fn parse_mapping(raw: &str, log: &mut RunLog) -> Option<ThumbnailMapping> {
    let mut value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(err) => {
            log.warn(format!("Stored mapping is not valid JSON, ignoring it: {err}"));
            return None;
        }
    };

    let version = match schema_version(&value) {
        Some(version) => version,
        None => {
            log.warn("Stored mapping has an unreadable version, ignoring it");
            return None;
        }
    };
    if version > MAPPING_VERSION {
        log.warn(format!(
            "Stored mapping version {version} is newer than supported version {MAPPING_VERSION}, ignoring it"
        ));
        return None;
    }
    if version < MAPPING_VERSION {
        log.info(format!("Migrating stored mapping from version {version} to {MAPPING_VERSION}"));
    }
    if let Some(object) = value.as_object_mut() {
        object.insert("version".to_string(), Value::from(MAPPING_VERSION));
    }

    let mut mapping = match serde_json::from_value::<ThumbnailMapping>(value) {
        Ok(mapping) => mapping,
        Err(err) => {
            log.warn(format!("Stored mapping does not match the schema, ignoring it: {err}"));
            return None;
        }
    };

    if mapping.slides.is_empty() {
        log.warn("Stored mapping lists no index slides, ignoring it");
        return None;
    }

    for record in mapping.slides.iter_mut().flat_map(|slide| slide.thumbnails.iter_mut()) {
        if record.original_order == 0 {
            record.original_order = record.group_index + 1;
        }
    }
    if mapping.total_thumbnails == 0 {
        mapping.total_thumbnails = mapping.records().count();
    }
    Some(mapping)
}

pub async fn load_mapping<S: PropertyStore>(store: &S, log: &mut RunLog) -> Option<ThumbnailMapping> {
    match store.get_property(MAPPING_KEY).await {
        Ok(Some(raw)) => parse_mapping(&raw, log),
        Ok(None) => None,
        Err(err) => {
            log.warn(format!("Could not read the stored mapping: {err}"));
            None
        }
    }
}

pub async fn save_mapping<S: PropertyStore>(store: &S, mapping: &ThumbnailMapping) -> AppResult<()> {
    store.set_property(MAPPING_KEY, &mapping.to_json()?).await
}

#[cfg(test)]
mod tests {
    use super::{parse_mapping, MAPPING_VERSION};
    use crate::core::run_log::RunLog;

    #[test]
    fn legacy_string_version_is_migrated() {
        let raw = r#"{
            "version": "1.0",
            "created": "2024-03-01T10:00:00.000Z",
            "totalThumbnails": 1,
            "totalGroups": 1,
            "slides": [{
                "slideId": "idx",
                "slideNumber": 1,
                "thumbnails": [{
                    "imageObjectId": "img",
                    "position": 0,
                    "groupIndex": 0,
                    "groupSlides": [1, 2, 3],
                    "originalOrder": 1,
                    "slidePosition": 1,
                    "driveId": null
                }]
            }]
        }"#;
        let mut log = RunLog::new();
        let mapping = parse_mapping(raw, &mut log).expect("legacy mapping loads");
        assert_eq!(mapping.version, MAPPING_VERSION);
        assert_eq!(mapping.slides[0].thumbnails[0].visual_position, None);
        assert!(log.contains("Migrating"));
    }

    #[test]
    fn newer_version_degrades_to_none() {
        let mut log = RunLog::new();
        assert!(parse_mapping(r#"{"version": 9, "slides": []}"#, &mut log).is_none());
        assert!(parse_mapping("not json", &mut log).is_none());
    }
}
