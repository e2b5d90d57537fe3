use serde::{Deserialize, Serialize};

use crate::reorder::identity::content_id_from_url;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width > 0.0 && self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }

    /// Distance from this rectangle's top-left corner to a point.
    pub fn corner_distance(&self, x: f64, y: f64) -> f64 {
        ((self.left - x).powi(2) + (self.top - y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Image,
    TextBox,
    Shape,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub object_id: String,
    pub kind: ElementKind,
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PageElement {
    pub fn image(object_id: impl Into<String>, rect: Rect) -> Self {
        Self {
            object_id: object_id.into(),
            kind: ElementKind::Image,
            rect,
            title: None,
            source_url: None,
            text: None,
        }
    }

    pub fn text_box(object_id: impl Into<String>, rect: Rect, text: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            kind: ElementKind::TextBox,
            rect,
            title: None,
            source_url: None,
            text: Some(text.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn is_image(&self) -> bool {
        self.kind == ElementKind::Image
    }

    pub fn content_id(&self) -> Option<String> {
        self.source_url.as_deref().and_then(content_id_from_url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub object_id: String,
    #[serde(default)]
    pub elements: Vec<PageElement>,
}

impl Slide {
    pub fn new(object_id: impl Into<String>, elements: Vec<PageElement>) -> Self {
        Self {
            object_id: object_id.into(),
            elements,
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &PageElement> {
        self.elements.iter().filter(|element| element.is_image())
    }

    pub fn text_boxes(&self) -> impl Iterator<Item = &PageElement> {
        self.elements
            .iter()
            .filter(|element| element.kind == ElementKind::TextBox)
    }
}

pub fn position_of(slides: &[Slide], slide_id: &str) -> Option<usize> {
    slides.iter().position(|slide| slide.object_id == slide_id)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnchorImage {
    pub object_id: String,
    pub rect: Rect,
    pub source_url: Option<String>,
    pub content_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentGroup {
    pub sequential_order: usize,
    pub anchor_slide_index: usize,
    pub slides: [usize; 3],
    pub slide_ids: [String; 3],
    pub anchor: Option<AnchorImage>,
}

impl ContentGroup {
    pub fn anchor_content_id(&self) -> Option<&str> {
        self.anchor
            .as_ref()
            .and_then(|anchor| anchor.content_id.as_deref())
    }

    pub fn anchor_aspect_ratio(&self) -> Option<f64> {
        self.anchor.as_ref().and_then(|anchor| anchor.rect.aspect_ratio())
    }

    pub fn display_range(&self) -> String {
        format!("{}-{}", self.slides[0] + 1, self.slides[2] + 1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridAnalysis {
    pub is_grid: bool,
    pub row_spacing: f64,
    pub col_spacing: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSlide {
    pub slide_id: String,
    pub position: usize,
    pub index_num: i64,
    pub grid: Option<GridAnalysis>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMethod {
    TitleTag,
    RecordedElementId,
    ContentId,
    GridPosition,
    Sequential,
    Unresolved,
}

impl IdentityMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TitleTag => "title_tag",
            Self::RecordedElementId => "recorded_element_id",
            Self::ContentId => "content_id",
            Self::GridPosition => "grid_position",
            Self::Sequential => "sequential",
            Self::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub method: IdentityMethod,
    pub group_index: Option<usize>,
    pub content_id: Option<String>,
}

impl Identity {
    pub fn unresolved(content_id: Option<String>) -> Self {
        Self {
            method: IdentityMethod::Unresolved,
            group_index: None,
            content_id,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.group_index.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisualOrderEntry {
    pub index_slide: usize,
    pub cell: usize,
    pub image_object_id: String,
    pub rect: Rect,
    pub title: Option<String>,
    pub identity: Identity,
}

impl VisualOrderEntry {
    pub fn group_index(&self) -> Option<usize> {
        self.identity.group_index
    }

    pub fn content_id(&self) -> Option<&str> {
        self.identity.content_id.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    Title,
    ContentId,
    Sequential,
    Visual,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::ContentId => "content_id",
            Self::Sequential => "sequential",
            Self::Visual => "visual",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Perfect,
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIndexResponse {
    pub success: bool,
    pub log: String,
    pub index_slides_created: usize,
    pub thumbnails_inserted: usize,
    pub thumbnails_failed: usize,
    pub groups_mapped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResponse {
    pub success: bool,
    pub log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves_made: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<CorrelationMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_operations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}
