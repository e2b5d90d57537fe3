use deckorder_lib::{
    core::{errors::AppError, types::Rect},
    reorder::geometry::{cell_rect, is_regular_grid, reading_order, GRID_CELLS},
};

fn canonical_grid() -> Vec<Rect> {
    (0..GRID_CELLS).map(cell_rect).collect()
}

#[test]
fn canonical_layout_is_a_grid() {
    let grid = is_regular_grid(&canonical_grid(), 20.0).expect("nine rectangles");
    assert!(grid.is_grid);
    assert!((grid.row_spacing - 120.5).abs() < 1e-9);
    assert!((grid.col_spacing - 216.0).abs() < 1e-9);
}

#[test]
fn shuffled_input_gives_the_same_analysis() {
    let mut rects = canonical_grid();
    rects.reverse();
    rects.swap(1, 6);
    let grid = is_regular_grid(&rects, 20.0).expect("nine rectangles");
    assert!(grid.is_grid);
    assert!((grid.row_spacing - 120.5).abs() < 1e-9);
}

#[test]
fn uneven_row_gap_breaks_the_grid() {
    let rects = canonical_grid()
        .into_iter()
        .enumerate()
        .map(|(cell, rect)| {
            if cell >= 6 {
                Rect { top: rect.top + 25.0, ..rect }
            } else {
                rect
            }
        })
        .collect::<Vec<_>>();
    let grid = is_regular_grid(&rects, 20.0).expect("nine rectangles");
    assert!(!grid.is_grid);
}

#[test]
fn one_far_off_thumbnail_breaks_the_grid() {
    let mut rects = canonical_grid();
    assert!(is_regular_grid(&rects, 20.0).expect("nine rectangles").is_grid);
    rects[8].top += 70.0;
    assert!(!is_regular_grid(&rects, 20.0).expect("nine rectangles").is_grid);
}

#[test]
fn grid_analysis_needs_exactly_nine() {
    let rects = canonical_grid();
    let err = is_regular_grid(&rects[..8], 20.0).expect_err("eight rectangles");
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(err.code(), "INVALID_INPUT");
}

#[test]
fn reading_order_is_row_major_on_the_canonical_grid() {
    let mut rects = canonical_grid();
    rects.reverse();
    let order = reading_order(&rects, 50.0);
    assert_eq!(order, vec![8, 7, 6, 5, 4, 3, 2, 1, 0]);
}

#[test]
fn nudged_thumbnails_stay_in_their_row() {
    let rects = [
        Rect::new(274.0, 10.0, 202.0, 106.0),
        Rect::new(58.0, 30.0, 202.0, 106.0),
        Rect::new(58.0, 140.0, 202.0, 106.0),
    ];
    assert_eq!(reading_order(&rects, 50.0), vec![1, 0, 2]);
}
