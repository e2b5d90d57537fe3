mod common;

use deckorder_lib::{
    core::types::{IdentityMethod, PageElement, Rect},
    reorder::{
        geometry::cell_rect,
        identity::{group_title, parse_group_title, resolve_identity, ResolveContext},
        mapping::{IndexSlideMapping, ThumbnailMapping, ThumbnailRecord},
    },
};

fn record(image: &str, cell: usize, group_index: usize, drive_id: Option<String>) -> ThumbnailRecord {
    ThumbnailRecord {
        image_object_id: image.to_string(),
        position: cell,
        group_index,
        group_slides: vec![1 + 3 * group_index, 2 + 3 * group_index, 3 + 3 * group_index],
        original_order: group_index + 1,
        slide_position: Some(1 + 3 * group_index),
        drive_id,
        visual_position: None,
    }
}

fn mapping() -> ThumbnailMapping {
    ThumbnailMapping::new(
        4,
        vec![IndexSlideMapping {
            slide_id: "idx".to_string(),
            slide_number: 1,
            thumbnails: vec![
                record("t0", 0, 3, None),
                record("t1", 4, 1, Some(common::content_id("B"))),
            ],
        }],
    )
}

fn context<'a>(mapping: &'a ThumbnailMapping, slide_id: &'a str, ordinal: usize) -> ResolveContext<'a> {
    ResolveContext {
        mapping: Some(mapping),
        index_slide_id: slide_id,
        ordinal,
        grid_match_tolerance: 60.0,
    }
}

#[test]
fn title_tag_wins_over_every_recorded_fact() {
    let mapping = mapping();
    let element = PageElement::image("t0", cell_rect(4))
        .with_title(group_title(2))
        .with_source_url(common::file_url(&common::content_id("B")));

    let identity = resolve_identity(&element, &context(&mapping, "idx", 0));

    assert_eq!(identity, resolve_identity(&element, &context(&mapping, "idx", 0)));
    assert_eq!(identity.method, IdentityMethod::TitleTag);
    assert_eq!(identity.group_index, Some(1));
    assert_eq!(identity.content_id, Some(common::content_id("B")));
}

#[test]
fn recorded_element_id_comes_before_content_id() {
    let mapping = mapping();
    let element = PageElement::image("t0", Rect::new(900.0, 900.0, 10.0, 10.0))
        .with_source_url(common::file_url(&common::content_id("B")));

    let identity = resolve_identity(&element, &context(&mapping, "elsewhere", 5));

    assert_eq!(identity.method, IdentityMethod::RecordedElementId);
    assert_eq!(identity.group_index, Some(3));
}

#[test]
fn content_id_is_matched_against_the_whole_mapping() {
    let mapping = mapping();
    let element = PageElement::image("replaced", Rect::new(900.0, 900.0, 10.0, 10.0))
        .with_source_url(format!(
            "https://drive.google.com/uc?export=view&id={}",
            common::content_id("B")
        ));

    let identity = resolve_identity(&element, &context(&mapping, "elsewhere", 5));

    assert_eq!(identity.method, IdentityMethod::ContentId);
    assert_eq!(identity.group_index, Some(1));
}

#[test]
fn grid_cell_then_ordinal_are_last_resorts() {
    let mapping = mapping();

    let in_cell = PageElement::image("pasted", Rect::new(280.0, 140.0, 202.0, 106.0));
    let identity = resolve_identity(&in_cell, &context(&mapping, "idx", 7));
    assert_eq!(identity.method, IdentityMethod::GridPosition);
    assert_eq!(identity.group_index, Some(1));

    let off_grid = PageElement::image("dragged", Rect::new(900.0, 900.0, 10.0, 10.0));
    let identity = resolve_identity(&off_grid, &context(&mapping, "idx", 0));
    assert_eq!(identity.method, IdentityMethod::Sequential);
    assert_eq!(identity.group_index, Some(3));

    let identity = resolve_identity(&off_grid, &context(&mapping, "idx", 2));
    assert_eq!(identity.method, IdentityMethod::Unresolved);
}

#[test]
fn without_a_mapping_only_titles_resolve() {
    let untitled = PageElement::image("x", cell_rect(0))
        .with_source_url(common::file_url(&common::content_id("Q")));
    let identity = resolve_identity(&untitled, &ResolveContext::unmapped("idx", 0));
    assert!(!identity.is_resolved());
    assert_eq!(identity.content_id, Some(common::content_id("Q")));

    let titled = untitled.with_title("BOOGIE_GROUP_3 (moved)");
    let identity = resolve_identity(&titled, &ResolveContext::unmapped("idx", 0));
    assert_eq!(identity.group_index, Some(2));
}

#[test]
fn group_titles_round_trip_through_the_parser() {
    for position in [1, 9, 42] {
        assert_eq!(parse_group_title(&group_title(position)), Some(position - 1));
    }
}
