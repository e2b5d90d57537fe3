use std::sync::OnceLock;

use regex_lite::Regex;

use crate::{
    core::types::{Identity, IdentityMethod, PageElement},
    reorder::{geometry::nearest_grid_cell, mapping::ThumbnailMapping},
};

pub const GROUP_TITLE_PREFIX: &str = "BOOGIE_GROUP_";

fn content_id_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"/d/([a-zA-Z0-9_-]{25,})").expect("valid content id pattern"),
            Regex::new(r"[?&]id=([a-zA-Z0-9_-]{25,})").expect("valid content id pattern"),
        ]
    })
}

fn group_title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^BOOGIE_GROUP_(\d+)").expect("valid group title pattern"))
}

/// Long file token embedded in a retrieval URL, either as a `/d/<id>` path
/// segment or an `id=<id>` query parameter.
pub fn content_id_from_url(url: &str) -> Option<String> {
    content_id_patterns().iter().find_map(|pattern| {
        pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Decodes a `BOOGIE_GROUP_<n>` title into a 0-based group index.
pub fn parse_group_title(title: &str) -> Option<usize> {
    let caps = group_title_pattern().captures(title.trim())?;
    let number = caps.get(1)?.as_str().parse::<usize>().ok()?;
    number.checked_sub(1)
}

/// Title carried by the thumbnail shown at 1-based `visual_position`.
pub fn group_title(visual_position: usize) -> String {
    format!("{GROUP_TITLE_PREFIX}{visual_position}")
}

/// What the resolver knows about the element beyond the element itself.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub mapping: Option<&'a ThumbnailMapping>,
    pub index_slide_id: &'a str,
    /// Ordinal of the element among its siblings in reading order.
    pub ordinal: usize,
    pub grid_match_tolerance: f64,
}

impl<'a> ResolveContext<'a> {
    pub fn unmapped(index_slide_id: &'a str, ordinal: usize) -> Self {
        Self {
            mapping: None,
            index_slide_id,
            ordinal,
            grid_match_tolerance: 60.0,
        }
    }
}

type Strategy = fn(&PageElement, &ResolveContext<'_>) -> Option<usize>;

const STRATEGIES: [(IdentityMethod, Strategy); 5] = [
    (IdentityMethod::TitleTag, by_title_tag),
    (IdentityMethod::RecordedElementId, by_recorded_element_id),
    (IdentityMethod::ContentId, by_content_id),
    (IdentityMethod::GridPosition, by_grid_position),
    (IdentityMethod::Sequential, by_sequence),
];

/// Runs the strategies in priority order; the first one that yields a group
/// decides. The content identifier is reported whether or not it decided.
pub fn resolve_identity(element: &PageElement, ctx: &ResolveContext<'_>) -> Identity {
    let content_id = element.content_id();
    STRATEGIES
        .iter()
        .find_map(|(method, strategy)| {
            strategy(element, ctx).map(|group_index| Identity {
                method: *method,
                group_index: Some(group_index),
                content_id: content_id.clone(),
            })
        })
        .unwrap_or_else(|| Identity::unresolved(content_id))
}

fn by_title_tag(element: &PageElement, _ctx: &ResolveContext<'_>) -> Option<usize> {
    element.title.as_deref().and_then(parse_group_title)
}

fn by_recorded_element_id(element: &PageElement, ctx: &ResolveContext<'_>) -> Option<usize> {
    ctx.mapping?
        .find_by_element_id(&element.object_id)
        .map(|record| record.group_index)
}

fn by_content_id(element: &PageElement, ctx: &ResolveContext<'_>) -> Option<usize> {
    let mapping = ctx.mapping?;
    let content_id = element.content_id()?;
    mapping
        .find_by_content_id(&content_id)
        .map(|record| record.group_index)
}

fn by_grid_position(element: &PageElement, ctx: &ResolveContext<'_>) -> Option<usize> {
    let slide = ctx.mapping?.slide(ctx.index_slide_id)?;
    let cell = nearest_grid_cell(&element.rect, ctx.grid_match_tolerance)?;
    slide
        .thumbnails
        .iter()
        .find(|record| record.position == cell)
        .map(|record| record.group_index)
}

fn by_sequence(_element: &PageElement, ctx: &ResolveContext<'_>) -> Option<usize> {
    let slide = ctx.mapping?.slide(ctx.index_slide_id)?;
    slide
        .thumbnails
        .get(ctx.ordinal)
        .map(|record| record.group_index)
}
