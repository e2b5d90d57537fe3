use uuid::Uuid;

use crate::{
    core::{
        config::EngineConfig,
        errors::{AppError, AppResult},
        run_log::RunLog,
        types::{ContentGroup, GenerateIndexResponse, Rect},
    },
    host::{HostRequest, PropertyStore, SlideHost},
    reorder::{
        geometry::{cell_rect, GRID_CELLS},
        groups::detect_groups,
        identity::group_title,
        mapping::{save_mapping, IndexSlideMapping, ThumbnailMapping, ThumbnailRecord},
        retry::{submit_with_retry, RetryPolicy},
    },
};

const PRIMARY_URL_MARKER: &str = "uc?export=view";
const FALLBACK_URL_MARKER: &str = "thumbnail?sz=w800";
const UNUSABLE_HOST: &str = "lh3.google.com";

#[derive(Debug, Clone, Default)]
pub struct IndexSummary {
    pub index_slides_created: usize,
    pub thumbnails_inserted: usize,
    pub thumbnails_failed: usize,
    pub groups_mapped: usize,
}

/// Thumbnail planned for one group before anything is inserted.
#[derive(Debug, Clone)]
struct PlannedThumbnail {
    group_index: usize,
    url: String,
    content_id: Option<String>,
}

pub fn content_url(content_id: &str) -> String {
    format!("https://drive.google.com/{PRIMARY_URL_MARKER}&id={content_id}")
}

/// Variant of a primary retrieval URL served through the thumbnail endpoint.
pub fn fallback_url(url: &str) -> Option<String> {
    url.contains(PRIMARY_URL_MARKER)
        .then(|| url.replace(PRIMARY_URL_MARKER, FALLBACK_URL_MARKER))
}

fn thumbnail_url(group: &ContentGroup) -> Option<(String, Option<String>)> {
    let anchor = group.anchor.as_ref()?;
    if let Some(content_id) = anchor.content_id.as_deref() {
        return Some((content_url(content_id), Some(content_id.to_string())));
    }
    anchor
        .source_url
        .as_deref()
        .filter(|url| !url.contains(UNUSABLE_HOST))
        .map(|url| (url.to_string(), None))
}

fn label_rect() -> Rect {
    Rect::new(58.0, 372.0, 200.0, 24.0)
}

/// Builds index slides for every content group and records which thumbnail
/// stands for which group.
pub async fn generate_index<H, S>(host: &mut H, store: &S, config: &EngineConfig) -> GenerateIndexResponse
where
    H: SlideHost,
    S: PropertyStore,
{
    let mut log = RunLog::new();
    log.info(format!("Generating index for document {}", host.document_id()));

    match run_generate_index(host, store, config, &mut log).await {
        Ok(summary) => GenerateIndexResponse {
            success: true,
            log: log.render(),
            index_slides_created: summary.index_slides_created,
            thumbnails_inserted: summary.thumbnails_inserted,
            thumbnails_failed: summary.thumbnails_failed,
            groups_mapped: summary.groups_mapped,
            error_code: None,
        },
        Err(err) => {
            log.error(format!("Index generation aborted: {err}"));
            GenerateIndexResponse {
                success: false,
                log: log.render(),
                index_slides_created: 0,
                thumbnails_inserted: 0,
                thumbnails_failed: 0,
                groups_mapped: 0,
                error_code: Some(err.code().to_string()),
            }
        }
    }
}

pub async fn run_generate_index<H, S>(
    host: &mut H,
    store: &S,
    config: &EngineConfig,
    log: &mut RunLog,
) -> AppResult<IndexSummary>
where
    H: SlideHost,
    S: PropertyStore,
{
    let slides = host.slides().await?;
    let groups = detect_groups(&slides, 0, config.anchor_threshold(), log);
    if groups.is_empty() {
        return Err(AppError::DetectionFailed("no content groups in the deck".to_string()));
    }
    log.info(format!("Content groups: {}", groups.len()));

    let mut summary = IndexSummary::default();
    let mut planned = vec![];
    for (group_index, group) in groups.iter().enumerate() {
        match thumbnail_url(group) {
            Some((url, content_id)) => planned.push(PlannedThumbnail {
                group_index,
                url,
                content_id,
            }),
            None => {
                summary.thumbnails_failed += 1;
                log.warn(format!(
                    "Group {} (slides {}) has no usable image source, skipping its thumbnail",
                    group.sequential_order,
                    group.display_range()
                ));
            }
        }
    }

    if planned.is_empty() {
        return Err(AppError::DetectionFailed(
            "no content group has a usable image source".to_string(),
        ));
    }

    let slide_count = planned.len().div_ceil(GRID_CELLS);
    log.info(format!(
        "Layout: {} thumbnails on {slide_count} index slides",
        planned.len()
    ));
    let policy = RetryPolicy::from(config);
    let mut slide_mappings = vec![];

    for (slide_number, chunk) in planned.chunks(GRID_CELLS).enumerate() {
        let slide_id = format!("index_{}", Uuid::new_v4().simple());
        let label_id = format!("index_label_{}", Uuid::new_v4().simple());
        let created = submit_with_retry(
            host,
            |_, _| {
                vec![
                    HostRequest::CreateSlide {
                        object_id: slide_id.clone(),
                        layout_id: config.index_layout_id.clone(),
                        insertion_index: slide_number,
                    },
                    HostRequest::CreateTextBox {
                        object_id: label_id.clone(),
                        page_object_id: slide_id.clone(),
                        text: format!("Index {}", slide_number + 1),
                        rect: label_rect(),
                    },
                ]
            },
            policy,
            &format!("create index slide {}", slide_number + 1),
            log,
        )
        .await;
        if let Err(err) = created {
            summary.thumbnails_failed += chunk.len();
            log.error(format!("Index slide {} could not be created: {err}", slide_number + 1));
            continue;
        }
        summary.index_slides_created += 1;
        log.info(format!("Index slide {} created", slide_number + 1));

        let mut records = vec![];
        for (cell, thumbnail) in chunk.iter().enumerate() {
            let image_id = format!("thumb_{}", Uuid::new_v4().simple());
            let inserted = submit_with_retry(
                host,
                |_, previous| {
                    let url = match previous {
                        Some(AppError::ImageRetrieval(_)) => {
                            fallback_url(&thumbnail.url).unwrap_or_else(|| thumbnail.url.clone())
                        }
                        _ => thumbnail.url.clone(),
                    };
                    vec![HostRequest::CreateImage {
                        object_id: image_id.clone(),
                        page_object_id: slide_id.clone(),
                        url,
                        rect: cell_rect(cell),
                    }]
                },
                policy,
                &format!("insert thumbnail for group {}", thumbnail.group_index + 1),
                log,
            )
            .await;
            if let Err(err) = inserted {
                summary.thumbnails_failed += 1;
                log.error(format!(
                    "Thumbnail for group {} failed: {err}",
                    thumbnail.group_index + 1
                ));
                continue;
            }

            let original_order = thumbnail.group_index + 1;
            if let Err(err) = host.set_image_title(&image_id, &group_title(original_order)).await {
                log.warn(format!("Could not tag thumbnail {image_id}: {err}"));
            }
            summary.thumbnails_inserted += 1;
            records.push((cell, thumbnail, image_id));
        }

        slide_mappings.push((slide_number, slide_id, records));
    }

    let created = summary.index_slides_created;
    let slides = slide_mappings
        .into_iter()
        .map(|(slide_number, slide_id, records)| IndexSlideMapping {
            slide_id,
            slide_number: slide_number + 1,
            thumbnails: records
                .into_iter()
                .map(|(cell, thumbnail, image_id)| {
                    let group = &groups[thumbnail.group_index];
                    let shifted = group.slides.map(|position| position + created);
                    ThumbnailRecord {
                        image_object_id: image_id,
                        position: cell,
                        group_index: thumbnail.group_index,
                        group_slides: shifted.to_vec(),
                        original_order: thumbnail.group_index + 1,
                        slide_position: Some(shifted[0]),
                        drive_id: thumbnail.content_id.clone(),
                        visual_position: None,
                    }
                })
                .collect(),
        })
        .collect::<Vec<_>>();
    let mapping = ThumbnailMapping::new(groups.len(), slides);
    summary.groups_mapped = mapping.total_thumbnails;

    if mapping.slides.is_empty() {
        return Err(AppError::Host("no index slide could be created".to_string()));
    }
    save_mapping(store, &mapping).await?;
    log.info(format!(
        "Mapping stored: {} thumbnails for {} groups",
        mapping.total_thumbnails, mapping.total_groups
    ));
    Ok(summary)
}
