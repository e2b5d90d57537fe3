use crate::core::{
    run_log::RunLog,
    types::{AnchorImage, ContentGroup, PageElement, Slide},
};

pub const GROUP_SIZE: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct AnchorThreshold {
    pub min_width: f64,
    pub min_height: f64,
}

impl Default for AnchorThreshold {
    fn default() -> Self {
        Self {
            min_width: 400.0,
            min_height: 200.0,
        }
    }
}

pub fn has_anchor_image(slide: &Slide, threshold: AnchorThreshold) -> bool {
    slide.images().any(|image| {
        image.rect.width >= threshold.min_width && image.rect.height >= threshold.min_height
    })
}

/// Largest-area image on the slide; the first one wins a tie.
pub fn extract_anchor(slide: &Slide) -> Option<AnchorImage> {
    let mut largest: Option<&PageElement> = None;
    for image in slide.images() {
        if largest.map_or(true, |current| image.rect.area() > current.rect.area()) {
            largest = Some(image);
        }
    }
    largest.map(|image| AnchorImage {
        object_id: image.object_id.clone(),
        rect: image.rect,
        source_url: image.source_url.clone(),
        content_id: image.content_id(),
    })
}

/// Segments `slides[start_index..]` into non-overlapping 3-slide groups, each
/// opened by a slide carrying an anchor-sized image.
pub fn detect_groups(
    slides: &[Slide],
    start_index: usize,
    threshold: AnchorThreshold,
    log: &mut RunLog,
) -> Vec<ContentGroup> {
    let mut groups = vec![];
    let mut index = start_index;
    log.debug(format!("Scanning for content groups from slide {}", start_index + 1));

    while index + GROUP_SIZE <= slides.len() {
        let slide = &slides[index];
        if !has_anchor_image(slide, threshold) {
            index += 1;
            continue;
        }

        let group = ContentGroup {
            sequential_order: groups.len() + 1,
            anchor_slide_index: index,
            slides: [index, index + 1, index + 2],
            slide_ids: [
                slides[index].object_id.clone(),
                slides[index + 1].object_id.clone(),
                slides[index + 2].object_id.clone(),
            ],
            anchor: extract_anchor(slide),
        };
        log.debug(format!(
            "Group {} at slides {}{}",
            group.sequential_order,
            group.display_range(),
            group
                .anchor_content_id()
                .map(|id| format!(" (content id {})", id.chars().take(8).collect::<String>()))
                .unwrap_or_default()
        ));
        groups.push(group);
        index += GROUP_SIZE;
    }

    let tail = slides.len().saturating_sub(index);
    if tail > 0 && slides[index..].iter().any(|slide| has_anchor_image(slide, threshold)) {
        log.debug(format!(
            "Anchor within the last {tail} slides ignored: not enough trailing slides for a group"
        ));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::extract_anchor;
    use crate::core::types::{PageElement, Rect, Slide};

    #[test]
    fn anchor_is_largest_image() {
        let slide = Slide::new(
            "s",
            vec![
                PageElement::image("small", Rect::new(0.0, 0.0, 100.0, 100.0)),
                PageElement::text_box("t", Rect::new(0.0, 0.0, 900.0, 900.0), "caption"),
                PageElement::image("big", Rect::new(0.0, 0.0, 640.0, 360.0)),
            ],
        );
        let anchor = extract_anchor(&slide).expect("anchor");
        assert_eq!(anchor.object_id, "big");
    }
}
