use std::sync::OnceLock;

use regex_lite::Regex;

use crate::{
    core::{
        config::EngineConfig,
        run_log::RunLog,
        types::{GridAnalysis, IndexSlide, PageElement, Slide, VisualOrderEntry},
    },
    reorder::{
        geometry::{is_regular_grid, nearest_grid_cell, reading_order, GRID_CELLS},
        groups::has_anchor_image,
        identity::{resolve_identity, ResolveContext},
        mapping::ThumbnailMapping,
    },
};

/// Largest side a thumbnail may have on a partially filled index slide.
const MAX_THUMBNAIL_SIDE: f64 = 350.0;
const MIN_PARTIAL_THUMBNAILS: usize = 2;

fn index_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(\d+)\b").expect("valid index number pattern"))
}

/// First standalone integer found in the slide's text boxes, 0 when none.
pub fn extract_index_number(slide: &Slide) -> i64 {
    slide
        .text_boxes()
        .filter_map(|element| element.text.as_deref())
        .find_map(|text| {
            index_number_pattern()
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
        })
        .unwrap_or(0)
}

/// `Some(grid)` for a full 3x3 grid, `Some(None)` for a partially filled
/// index slide whose thumbnails all sit on canonical cells.
fn classify(slide: &Slide, config: &EngineConfig) -> Option<Option<GridAnalysis>> {
    if has_anchor_image(slide, config.anchor_threshold()) {
        return None;
    }
    let rects = slide.images().map(|image| image.rect).collect::<Vec<_>>();

    if rects.len() == GRID_CELLS {
        let grid = is_regular_grid(&rects, config.grid_spacing_tolerance).ok()?;
        return grid.is_grid.then_some(Some(grid));
    }

    let partial = rects.len() >= MIN_PARTIAL_THUMBNAILS
        && rects.len() < GRID_CELLS
        && rects.iter().all(|rect| {
            rect.width <= MAX_THUMBNAIL_SIDE
                && rect.height <= MAX_THUMBNAIL_SIDE
                && nearest_grid_cell(rect, config.grid_match_tolerance).is_some()
        });
    partial.then_some(None)
}

/// Finds index slides geometrically and orders them by their index number.
pub fn detect_index_slides(slides: &[Slide], config: &EngineConfig, log: &mut RunLog) -> Vec<IndexSlide> {
    let mut found = slides
        .iter()
        .enumerate()
        .filter_map(|(position, slide)| {
            classify(slide, config).map(|grid| IndexSlide {
                slide_id: slide.object_id.clone(),
                position,
                index_num: extract_index_number(slide),
                grid,
            })
        })
        .collect::<Vec<_>>();
    found.sort_by_key(|index_slide| index_slide.index_num);

    for index_slide in &found {
        match &index_slide.grid {
            Some(grid) => log.debug(format!(
                "Index slide at {} (index {}): grid rows {:.1} apart, columns {:.1} apart",
                index_slide.position + 1,
                index_slide.index_num,
                grid.row_spacing,
                grid.col_spacing
            )),
            None => log.debug(format!(
                "Index slide at {} (index {}): partially filled",
                index_slide.position + 1,
                index_slide.index_num
            )),
        }
    }
    found
}

/// Index slides recorded in the mapping that still exist, in mapping order.
pub fn discover_from_mapping(
    slides: &[Slide],
    mapping: &ThumbnailMapping,
    config: &EngineConfig,
    log: &mut RunLog,
) -> Vec<IndexSlide> {
    let mut found = vec![];
    for slide_id in mapping.slide_ids() {
        let Some(position) = slides.iter().position(|slide| slide.object_id == slide_id) else {
            log.warn(format!("Recorded index slide {slide_id} is no longer in the deck"));
            continue;
        };
        let slide = &slides[position];
        let rects = slide.images().map(|image| image.rect).collect::<Vec<_>>();
        let grid = is_regular_grid(&rects, config.grid_spacing_tolerance).ok();
        found.push(IndexSlide {
            slide_id: slide.object_id.clone(),
            position,
            index_num: extract_index_number(slide),
            grid,
        });
    }
    found
}

/// Thumbnails of every index slide in reading order, each with its resolved
/// identity. Unresolved entries are kept and marked as such.
pub fn extract_visual_order(
    slides: &[Slide],
    index_slides: &[IndexSlide],
    mapping: Option<&ThumbnailMapping>,
    config: &EngineConfig,
    log: &mut RunLog,
) -> Vec<VisualOrderEntry> {
    let tolerance = if mapping.is_some() {
        config.mapped_reading_tolerance
    } else {
        config.detected_reading_tolerance
    };

    let mut entries = vec![];
    for (slot, index_slide) in index_slides.iter().enumerate() {
        let Some(slide) = slides.get(index_slide.position) else {
            log.warn(format!("Index slide {} vanished from the deck", index_slide.slide_id));
            continue;
        };
        let images = slide.images().collect::<Vec<&PageElement>>();
        let rects = images.iter().map(|image| image.rect).collect::<Vec<_>>();
        let order = reading_order(&rects, tolerance);
        log.debug(format!(
            "Index slide {}: {} thumbnails in reading order",
            index_slide.position + 1,
            images.len()
        ));

        for (ordinal, image_index) in order.into_iter().enumerate() {
            let image = images[image_index];
            let ctx = ResolveContext {
                mapping,
                index_slide_id: &index_slide.slide_id,
                ordinal,
                grid_match_tolerance: config.grid_match_tolerance,
            };
            let identity = resolve_identity(image, &ctx);
            match identity.group_index {
                Some(group_index) => log.debug(format!(
                    "  thumbnail {} -> group {} ({})",
                    ordinal + 1,
                    group_index + 1,
                    identity.method.as_str()
                )),
                None => log.debug(format!("  thumbnail {} unresolved", ordinal + 1)),
            }
            entries.push(VisualOrderEntry {
                index_slide: slot,
                cell: nearest_grid_cell(&image.rect, config.grid_match_tolerance).unwrap_or(ordinal),
                image_object_id: image.object_id.clone(),
                rect: image.rect,
                title: image.title.clone(),
                identity,
            });
        }
    }
    entries
}
