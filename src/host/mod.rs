//! Contract with the document-editing host.
//!
//! The engine only ever reads a fresh snapshot of the slide sequence and
//! issues identifier-keyed mutations; it never keeps a handle to a live slide
//! across a move.

use serde::{Deserialize, Serialize};

use crate::core::{errors::AppResult, types::Rect, types::Slide};

pub mod memory;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum HostRequest {
    #[serde(rename_all = "camelCase")]
    CreateSlide {
        object_id: String,
        layout_id: Option<String>,
        insertion_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    CreateImage {
        object_id: String,
        page_object_id: String,
        url: String,
        rect: Rect,
    },
    #[serde(rename_all = "camelCase")]
    CreateTextBox {
        object_id: String,
        page_object_id: String,
        text: String,
        rect: Rect,
    },
}

impl HostRequest {
    pub fn object_id(&self) -> &str {
        match self {
            Self::CreateSlide { object_id, .. }
            | Self::CreateImage { object_id, .. }
            | Self::CreateTextBox { object_id, .. } => object_id,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait SlideHost {
    fn document_id(&self) -> &str;

    /// Ordered slides of the active document, read fresh on every call.
    async fn slides(&self) -> AppResult<Vec<Slide>>;

    /// Moves a slide to an absolute index of the resulting sequence.
    async fn move_slide(&mut self, slide_id: &str, index: usize) -> AppResult<()>;

    async fn set_image_title(&mut self, element_id: &str, title: &str) -> AppResult<()>;

    async fn batch_update(&mut self, requests: Vec<HostRequest>) -> AppResult<()>;
}

#[allow(async_fn_in_trait)]
pub trait PropertyStore {
    async fn get_property(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_property(&self, key: &str, value: &str) -> AppResult<()>;
}
