use crate::core::{
    errors::{AppError, AppResult},
    types::{GridAnalysis, Rect},
};

pub const GRID_SIDE: usize = 3;
pub const GRID_CELLS: usize = GRID_SIDE * GRID_SIDE;

pub const CELL_LEFTS: [f64; GRID_SIDE] = [58.0, 274.0, 490.0];
pub const CELL_TOPS: [f64; GRID_SIDE] = [15.0, 135.0, 256.0];
pub const THUMBNAIL_WIDTH: f64 = 202.0;
pub const THUMBNAIL_HEIGHT: f64 = 106.0;

/// Top-left corner of canonical cell `cell` (row-major, 0..9).
pub fn cell_origin(cell: usize) -> (f64, f64) {
    let cell = cell % GRID_CELLS;
    (CELL_LEFTS[cell % GRID_SIDE], CELL_TOPS[cell / GRID_SIDE])
}

pub fn cell_rect(cell: usize) -> Rect {
    let (left, top) = cell_origin(cell);
    Rect::new(left, top, THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)
}

/// Canonical cell whose origin lies strictly within `tolerance` of the
/// rectangle's top-left corner, preferring the closest one.
pub fn nearest_grid_cell(rect: &Rect, tolerance: f64) -> Option<usize> {
    (0..GRID_CELLS)
        .map(|cell| {
            let (x, y) = cell_origin(cell);
            (cell, rect.corner_distance(x, y))
        })
        .filter(|(_, distance)| *distance < tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(cell, _)| cell)
}

/// Classifies nine rectangles as a 3x3 grid when the two row gaps and the two
/// column gaps each agree within `tolerance`.
pub fn is_regular_grid(rects: &[Rect], tolerance: f64) -> AppResult<GridAnalysis> {
    if rects.len() != GRID_CELLS {
        return Err(AppError::InvalidInput(format!(
            "grid analysis needs exactly {GRID_CELLS} rectangles, got {}",
            rects.len()
        )));
    }

    let mut sorted = rects.to_vec();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));
    let mut rows = sorted
        .chunks(GRID_SIDE)
        .map(|row| row.to_vec())
        .collect::<Vec<_>>();
    for row in &mut rows {
        row.sort_by(|a, b| a.left.total_cmp(&b.left));
    }

    let row_tops = rows
        .iter()
        .map(|row| row.iter().map(|rect| rect.top).sum::<f64>() / GRID_SIDE as f64)
        .collect::<Vec<_>>();
    let col_lefts = (0..GRID_SIDE)
        .map(|col| rows.iter().map(|row| row[col].left).sum::<f64>() / GRID_SIDE as f64)
        .collect::<Vec<_>>();

    let row_gaps = [row_tops[1] - row_tops[0], row_tops[2] - row_tops[1]];
    let col_gaps = [col_lefts[1] - col_lefts[0], col_lefts[2] - col_lefts[1]];

    let is_grid = (row_gaps[1] - row_gaps[0]).abs() < tolerance
        && (col_gaps[1] - col_gaps[0]).abs() < tolerance;

    Ok(GridAnalysis {
        is_grid,
        row_spacing: (row_gaps[0] + row_gaps[1]) / 2.0,
        col_spacing: (col_gaps[0] + col_gaps[1]) / 2.0,
    })
}

/// Indices of `rects` in reading order: top-to-bottom bands, left-to-right
/// within a band. A band collects every rectangle whose top lies within
/// `tolerance` of the band's first top.
pub fn reading_order(rects: &[Rect], tolerance: f64) -> Vec<usize> {
    let mut by_top = (0..rects.len()).collect::<Vec<_>>();
    by_top.sort_by(|&a, &b| {
        rects[a]
            .top
            .total_cmp(&rects[b].top)
            .then(rects[a].left.total_cmp(&rects[b].left))
    });

    let mut bands: Vec<Vec<usize>> = vec![];
    let mut band_top = f64::NEG_INFINITY;
    for index in by_top {
        let top = rects[index].top;
        match bands.last_mut() {
            Some(band) if top - band_top < tolerance => band.push(index),
            _ => {
                band_top = top;
                bands.push(vec![index]);
            }
        }
    }

    bands
        .into_iter()
        .flat_map(|mut band| {
            band.sort_by(|&a, &b| {
                rects[a]
                    .left
                    .total_cmp(&rects[b].left)
                    .then(rects[a].top.total_cmp(&rects[b].top))
            });
            band
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{cell_origin, nearest_grid_cell, reading_order};
    use crate::core::types::Rect;

    #[test]
    fn cells_are_row_major() {
        assert_eq!(cell_origin(0), (58.0, 15.0));
        assert_eq!(cell_origin(5), (490.0, 135.0));
        assert_eq!(cell_origin(7), (274.0, 256.0));
    }

    #[test]
    fn nearest_cell_rejects_distant_rectangles() {
        assert_eq!(nearest_grid_cell(&Rect::new(60.0, 140.0, 10.0, 10.0), 60.0), Some(3));
        assert_eq!(nearest_grid_cell(&Rect::new(166.0, 75.0, 10.0, 10.0), 60.0), None);
    }

    #[test]
    fn slightly_misaligned_row_still_reads_left_to_right() {
        let rects = [
            Rect::new(300.0, 12.0, 10.0, 10.0),
            Rect::new(50.0, 40.0, 10.0, 10.0),
            Rect::new(60.0, 200.0, 10.0, 10.0),
        ];
        assert_eq!(reading_order(&rects, 50.0), vec![1, 0, 2]);
    }
}
