#![allow(dead_code)]

use deckorder_lib::{
    core::types::{PageElement, Rect, Slide},
    reorder::geometry::cell_rect,
};

/// 28-character file token that the content-id patterns accept.
pub fn content_id(label: &str) -> String {
    format!("{label:_<28}")
}

pub fn file_url(content_id: &str) -> String {
    format!("https://drive.google.com/file/d/{content_id}/view")
}

/// Three slides opened by a 640x360 anchor whose source carries
/// `content_id(label)`. Ids are `<label>1`, `<label>2`, `<label>3`.
pub fn group_slides(label: &str) -> Vec<Slide> {
    vec![
        Slide::new(
            format!("{label}1"),
            vec![
                PageElement::image(format!("{label}_anchor"), Rect::new(40.0, 20.0, 640.0, 360.0))
                    .with_source_url(file_url(&content_id(label))),
            ],
        ),
        Slide::new(
            format!("{label}2"),
            vec![PageElement::image(
                format!("{label}_detail"),
                Rect::new(40.0, 40.0, 300.0, 200.0),
            )],
        ),
        Slide::new(
            format!("{label}3"),
            vec![PageElement::text_box(
                format!("{label}_notes"),
                Rect::new(40.0, 40.0, 500.0, 300.0),
                "notes",
            )],
        ),
    ]
}

/// Index slide with one thumbnail per canonical cell. `titles[cell]` tags the
/// thumbnail in that cell; cells without a title still get an untitled image.
pub fn index_slide(slide_id: &str, number: usize, titles: &[Option<&str>], cells: usize) -> Slide {
    let mut elements = (0..cells)
        .map(|cell| {
            let image = PageElement::image(format!("{slide_id}_thumb{cell}"), cell_rect(cell));
            match titles.get(cell).copied().flatten() {
                Some(title) => image.with_title(title),
                None => image,
            }
        })
        .collect::<Vec<_>>();
    elements.push(PageElement::text_box(
        format!("{slide_id}_label"),
        Rect::new(58.0, 372.0, 200.0, 24.0),
        format!("Index {number}"),
    ));
    Slide::new(slide_id, elements)
}

/// Slides for the given group labels, back to back.
pub fn groups(labels: &[&str]) -> Vec<Slide> {
    labels.iter().flat_map(|label| group_slides(label)).collect()
}

/// Ids of each group's slides, concatenated in the given label order.
pub fn expected_ids(labels: &[&str]) -> Vec<String> {
    labels
        .iter()
        .flat_map(|label| (1..=3).map(move |n| format!("{label}{n}")))
        .collect()
}
