use std::{
    collections::HashSet,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{position_of, ElementKind, PageElement, Slide},
    },
    host::{HostRequest, SlideHost},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeckSnapshot {
    pub document_id: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone)]
pub struct InMemoryDeck {
    snapshot: DeckSnapshot,
    failing_moves: HashSet<String>,
    rejected_url_fragments: Vec<String>,
    transient_batch_failures: usize,
    rate_limited_batches: usize,
    moves: Vec<(String, usize)>,
    batches: Vec<Vec<HostRequest>>,
}

impl InMemoryDeck {
    pub fn new(document_id: impl Into<String>, slides: Vec<Slide>) -> Self {
        Self::from_snapshot(DeckSnapshot {
            document_id: document_id.into(),
            slides,
        })
    }

    pub fn from_snapshot(snapshot: DeckSnapshot) -> Self {
        Self {
            snapshot,
            failing_moves: HashSet::new(),
            rejected_url_fragments: vec![],
            transient_batch_failures: 0,
            rate_limited_batches: 0,
            moves: vec![],
            batches: vec![],
        }
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: DeckSnapshot = serde_json::from_str(&raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let raw = serde_json::to_string_pretty(&self.snapshot)
            .map_err(|err| AppError::Internal(err.to_string()))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn snapshot(&self) -> &DeckSnapshot {
        &self.snapshot
    }

    pub fn slide_ids(&self) -> Vec<String> {
        self.snapshot
            .slides
            .iter()
            .map(|slide| slide.object_id.clone())
            .collect()
    }

    pub fn element(&self, element_id: &str) -> Option<&PageElement> {
        self.snapshot
            .slides
            .iter()
            .flat_map(|slide| slide.elements.iter())
            .find(|element| element.object_id == element_id)
    }

    /// Every `move_slide` call that reached the deck, in order.
    pub fn moves(&self) -> &[(String, usize)] {
        &self.moves
    }

    pub fn batches(&self) -> &[Vec<HostRequest>] {
        &self.batches
    }

    pub fn fail_moves_of(&mut self, slide_id: impl Into<String>) {
        self.failing_moves.insert(slide_id.into());
    }

    pub fn reject_image_urls_containing(&mut self, fragment: impl Into<String>) {
        self.rejected_url_fragments.push(fragment.into());
    }

    pub fn fail_next_batches(&mut self, count: usize) {
        self.transient_batch_failures = count;
    }

    pub fn rate_limit_next_batches(&mut self, count: usize) {
        self.rate_limited_batches = count;
    }

    pub fn remove_slide(&mut self, slide_id: &str) -> Option<Slide> {
        let position = position_of(&self.snapshot.slides, slide_id)?;
        Some(self.snapshot.slides.remove(position))
    }

    fn apply(&self, slides: &mut Vec<Slide>, request: &HostRequest) -> AppResult<()> {
        let taken = slides
            .iter()
            .any(|slide| slide.object_id == request.object_id())
            || slides
                .iter()
                .flat_map(|slide| slide.elements.iter())
                .any(|element| element.object_id == request.object_id());
        if taken {
            return Err(AppError::Host(format!(
                "object id {} already exists",
                request.object_id()
            )));
        }

        match request {
            HostRequest::CreateSlide {
                object_id,
                insertion_index,
                ..
            } => {
                let index = (*insertion_index).min(slides.len());
                slides.insert(index, Slide::new(object_id.clone(), vec![]));
            }
            HostRequest::CreateImage {
                object_id,
                page_object_id,
                url,
                rect,
            } => {
                if self
                    .rejected_url_fragments
                    .iter()
                    .any(|fragment| url.contains(fragment.as_str()))
                {
                    return Err(AppError::ImageRetrieval(format!(
                        "there was a problem retrieving the image {url}"
                    )));
                }
                let page = slides
                    .iter_mut()
                    .find(|slide| &slide.object_id == page_object_id)
                    .ok_or_else(|| AppError::NotFound(format!("page {page_object_id}")))?;
                page.elements
                    .push(PageElement::image(object_id.clone(), *rect).with_source_url(url.clone()));
            }
            HostRequest::CreateTextBox {
                object_id,
                page_object_id,
                text,
                rect,
            } => {
                let page = slides
                    .iter_mut()
                    .find(|slide| &slide.object_id == page_object_id)
                    .ok_or_else(|| AppError::NotFound(format!("page {page_object_id}")))?;
                page.elements
                    .push(PageElement::text_box(object_id.clone(), *rect, text.clone()));
            }
        }
        Ok(())
    }
}

impl SlideHost for InMemoryDeck {
    fn document_id(&self) -> &str {
        &self.snapshot.document_id
    }

    async fn slides(&self) -> AppResult<Vec<Slide>> {
        Ok(self.snapshot.slides.clone())
    }

    async fn move_slide(&mut self, slide_id: &str, index: usize) -> AppResult<()> {
        if self.failing_moves.contains(slide_id) {
            return Err(AppError::Host(format!("move rejected for slide {slide_id}")));
        }
        let slides = &mut self.snapshot.slides;
        if index >= slides.len() {
            return Err(AppError::InvalidInput(format!(
                "target index {index} outside deck of {} slides",
                slides.len()
            )));
        }
        let current = position_of(slides, slide_id)
            .ok_or_else(|| AppError::NotFound(format!("slide {slide_id}")))?;
        let slide = slides.remove(current);
        slides.insert(index, slide);
        self.moves.push((slide_id.to_string(), index));
        Ok(())
    }

    async fn set_image_title(&mut self, element_id: &str, title: &str) -> AppResult<()> {
        let element = self
            .snapshot
            .slides
            .iter_mut()
            .flat_map(|slide| slide.elements.iter_mut())
            .find(|element| element.object_id == element_id)
            .ok_or_else(|| AppError::NotFound(format!("element {element_id}")))?;
        if element.kind != ElementKind::Image {
            return Err(AppError::InvalidInput(format!(
                "element {element_id} is not an image"
            )));
        }
        element.title = Some(title.to_string());
        Ok(())
    }

    async fn batch_update(&mut self, requests: Vec<HostRequest>) -> AppResult<()> {
        if self.rate_limited_batches > 0 {
            self.rate_limited_batches -= 1;
            return Err(AppError::HostRateLimited);
        }
        if self.transient_batch_failures > 0 {
            self.transient_batch_failures -= 1;
            return Err(AppError::HostUnavailable("backend error".to_string()));
        }

        let mut slides = self.snapshot.slides.clone();
        for request in &requests {
            self.apply(&mut slides, request)?;
        }
        self.snapshot.slides = slides;
        self.batches.push(requests);
        Ok(())
    }
}
