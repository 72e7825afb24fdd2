use std::collections::{HashMap, HashSet};

use eframe::egui::{Pos2, pos2};

use super::scene::NODE_RADIUS;

const MAX_GRID_GROWTH: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Pos2 {
        pos2(self.width * 0.5, self.height * 0.5)
    }

    fn aspect(&self) -> f32 {
        if self.height > 0.0 && self.width > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

pub trait LayoutStrategy {
    fn place(&self, ids: &[String], canvas: CanvasSize) -> HashMap<String, Pos2>;

    fn cells(&self, count: usize, canvas: CanvasSize) -> Vec<Pos2>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    pub padding: f32,
}

impl LayoutStrategy for GridLayout {
    fn place(&self, ids: &[String], canvas: CanvasSize) -> HashMap<String, Pos2> {
        compute_initial_layout(ids, canvas.width, canvas.height, self.padding)
    }

    fn cells(&self, count: usize, canvas: CanvasSize) -> Vec<Pos2> {
        grid_cells(count, canvas.width, canvas.height, self.padding)
    }
}

pub fn grid_shape(n: usize, aspect: f32) -> (usize, usize) {
    if n == 0 {
        return (1, 1);
    }

    let cols = ((n as f32 * aspect).sqrt().ceil() as usize).clamp(1, n);
    let rows = n.div_ceil(cols).max(1);
    (cols, rows)
}

pub fn compute_initial_layout(
    ids: &[String],
    canvas_width: f32,
    canvas_height: f32,
    padding: f32,
) -> HashMap<String, Pos2> {
    ids.iter()
        .cloned()
        .zip(grid_cells(ids.len(), canvas_width, canvas_height, padding))
        .collect()
}

pub fn grid_cells(
    count: usize,
    canvas_width: f32,
    canvas_height: f32,
    padding: f32,
) -> Vec<Pos2> {
    if count == 0 {
        return Vec::new();
    }

    let canvas = CanvasSize::new(canvas_width.max(0.0), canvas_height.max(0.0));
    let (cols, rows) = grid_shape(count, canvas.aspect());

    let pad_x = padding.clamp(0.0, canvas.width * 0.5);
    let pad_y = padding.clamp(0.0, canvas.height * 0.5);
    let mut interior_w = canvas.width - pad_x * 2.0;
    let mut interior_h = canvas.height - pad_y * 2.0;
    if interior_w <= 0.0 {
        interior_w = canvas.width.max(1.0);
    }
    if interior_h <= 0.0 {
        interior_h = canvas.height.max(1.0);
    }
    let origin_x = (canvas.width - interior_w) * 0.5;
    let origin_y = (canvas.height - interior_h) * 0.5;

    let cell_w = interior_w / cols as f32;
    let cell_h = interior_h / rows as f32;

    (0..count)
        .map(|index| {
            let col = index % cols;
            let row = index / cols;
            pos2(
                origin_x + (col as f32 + 0.5) * cell_w,
                origin_y + (row as f32 + 0.5) * cell_h,
            )
        })
        .collect()
}

fn free_cells(cells: Vec<Pos2>, used: &[Pos2], min_gap: f32) -> Vec<Pos2> {
    cells
        .into_iter()
        .filter(|cell| used.iter().all(|taken| taken.distance(*cell) > min_gap))
        .collect()
}

/// Places ids that have neither a layout entry nor an override on grid cells
/// clear of every position already in use, and forgets layout entries for
/// ids no longer present. Returns how many ids were newly placed.
pub fn extend_layout(
    strategy: &dyn LayoutStrategy,
    layout: &mut HashMap<String, Pos2>,
    ids: &[String],
    canvas: CanvasSize,
    overrides: &HashMap<String, Pos2>,
) -> usize {
    let present = ids.iter().map(String::as_str).collect::<HashSet<_>>();
    layout.retain(|id, _| present.contains(id.as_str()));

    let unplaced = ids
        .iter()
        .filter(|id| !layout.contains_key(*id) && !overrides.contains_key(*id))
        .collect::<Vec<_>>();
    if unplaced.is_empty() {
        return 0;
    }
    if layout.is_empty() && unplaced.len() == ids.len() {
        let fresh = strategy.place(ids, canvas);
        let placed = fresh.len();
        layout.extend(fresh);
        return placed;
    }

    let used = layout
        .values()
        .copied()
        .chain(
            overrides
                .iter()
                .filter(|(id, _)| present.contains(id.as_str()))
                .map(|(_, position)| *position),
        )
        .collect::<Vec<_>>();

    let mut count = ids.len();
    let mut free = free_cells(strategy.cells(count, canvas), &used, NODE_RADIUS);
    for _ in 0..MAX_GRID_GROWTH {
        if free.len() >= unplaced.len() {
            break;
        }
        count *= 2;
        free = free_cells(strategy.cells(count, canvas), &used, NODE_RADIUS);
    }
    if free.len() < unplaced.len() {
        free = free_cells(strategy.cells(count, canvas), &used, 0.0);
    }

    let mut placed = 0;
    for (id, position) in unplaced.into_iter().zip(free) {
        layout.insert(id.clone(), position);
        placed += 1;
    }
    placed
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("entity-{index}")).collect()
    }

    fn grid() -> GridLayout {
        GridLayout { padding: 40.0 }
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        assert!(compute_initial_layout(&[], 600.0, 400.0, 40.0).is_empty());
        assert!(compute_initial_layout(&[], 0.0, 0.0, 40.0).is_empty());
    }

    #[test]
    fn single_entity_sits_in_the_centre() {
        let layout = compute_initial_layout(&ids(1), 600.0, 400.0, 40.0);
        assert_eq!(layout.get("entity-0"), Some(&pos2(300.0, 200.0)));
    }

    #[test]
    fn grid_follows_canvas_aspect() {
        assert_eq!(grid_shape(6, 1.5), (3, 2));
        assert_eq!(grid_shape(1, 1.5), (1, 1));
        assert_eq!(grid_shape(10, 1.5), (4, 3));
        assert_eq!(grid_shape(3, 100.0), (3, 1));
    }

    #[test]
    fn cells_are_filled_row_major() {
        let layout = compute_initial_layout(&ids(6), 600.0, 400.0, 0.0);
        assert_eq!(layout["entity-0"], pos2(100.0, 100.0));
        assert_eq!(layout["entity-2"], pos2(500.0, 100.0));
        assert_eq!(layout["entity-3"], pos2(100.0, 300.0));
    }

    #[test]
    fn oversized_padding_does_not_collapse_the_grid() {
        let layout = compute_initial_layout(&ids(4), 600.0, 400.0, 10_000.0);
        let distinct = layout
            .values()
            .map(|p| (p.x.to_bits(), p.y.to_bits()))
            .collect::<HashSet<_>>();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn extend_only_places_new_ids() {
        let strategy = grid();
        let canvas = CanvasSize::new(600.0, 400.0);
        let mut layout = HashMap::new();
        let first = ids(2);
        assert_eq!(
            extend_layout(&strategy, &mut layout, &first, canvas, &HashMap::new()),
            2
        );
        let before = layout.clone();

        let second = ids(5);
        assert_eq!(
            extend_layout(&strategy, &mut layout, &second, canvas, &HashMap::new()),
            3
        );
        assert_eq!(layout["entity-0"], before["entity-0"]);
        assert_eq!(layout["entity-1"], before["entity-1"]);
        assert_eq!(layout.len(), 5);
    }

    #[test]
    fn extend_skips_overridden_ids_and_drops_removed_ones() {
        let strategy = grid();
        let canvas = CanvasSize::new(600.0, 400.0);
        let mut layout = HashMap::from([("gone".to_owned(), pos2(1.0, 1.0))]);
        let overrides = HashMap::from([("entity-1".to_owned(), pos2(120.0, 80.0))]);

        let placed = extend_layout(&strategy, &mut layout, &ids(2), canvas, &overrides);
        assert_eq!(placed, 1);
        assert!(layout.contains_key("entity-0"));
        assert!(!layout.contains_key("entity-1"));
        assert!(!layout.contains_key("gone"));
    }

    #[test]
    fn new_ids_avoid_cells_already_in_use() {
        let strategy = grid();
        let canvas = CanvasSize::new(600.0, 400.0);
        let mut layout = HashMap::new();
        let first = ["a".to_owned()];
        extend_layout(&strategy, &mut layout, &first, canvas, &HashMap::new());
        assert_eq!(layout["a"], pos2(300.0, 200.0));

        let reordered = ["b", "z", "a"].map(str::to_owned);
        assert_eq!(
            extend_layout(&strategy, &mut layout, &reordered, canvas, &HashMap::new()),
            2
        );
        assert_eq!(layout["a"], pos2(300.0, 200.0));
        assert!(layout["b"].distance(layout["a"]) > NODE_RADIUS);
        assert!(layout["z"].distance(layout["a"]) > NODE_RADIUS);
        assert_ne!(layout["b"], layout["z"]);
    }

    #[test]
    fn new_ids_avoid_dragged_positions() {
        let strategy = grid();
        let canvas = CanvasSize::new(600.0, 400.0);
        let mut layout = HashMap::new();
        let overrides = HashMap::from([("pinned".to_owned(), pos2(172.0, 203.0))]);
        let ids = ["pinned", "fresh"].map(str::to_owned);

        extend_layout(&strategy, &mut layout, &ids, canvas, &overrides);
        assert!(layout["fresh"].distance(overrides["pinned"]) > NODE_RADIUS);
    }

    proptest! {
        #[test]
        fn layout_is_deterministic(count in 0usize..300, width in 1.0f32..2000.0, height in 1.0f32..2000.0) {
            let ids = ids(count);
            let first = compute_initial_layout(&ids, width, height, 40.0);
            let second = compute_initial_layout(&ids, width, height, 40.0);
            prop_assert_eq!(first.len(), count);
            for (id, position) in &first {
                prop_assert_eq!(position.x.to_bits(), second[id].x.to_bits());
                prop_assert_eq!(position.y.to_bits(), second[id].y.to_bits());
            }
        }

        #[test]
        fn no_two_positions_coincide(count in 0usize..400) {
            let layout = compute_initial_layout(&ids(count), 600.0, 400.0, 40.0);
            let distinct = layout
                .values()
                .map(|p| (p.x.to_bits(), p.y.to_bits()))
                .collect::<HashSet<_>>();
            prop_assert_eq!(distinct.len(), count);
        }

        #[test]
        fn reordered_refresh_never_stacks_nodes(first in 0usize..40, extra in 1usize..40) {
            let strategy = grid();
            let canvas = CanvasSize::new(600.0, 400.0);
            let mut layout = HashMap::new();
            extend_layout(&strategy, &mut layout, &ids(first), canvas, &HashMap::new());

            let mut all = ids(first + extra);
            all.reverse();
            extend_layout(&strategy, &mut layout, &all, canvas, &HashMap::new());
            let distinct = layout
                .values()
                .map(|p| (p.x.to_bits(), p.y.to_bits()))
                .collect::<HashSet<_>>();
            prop_assert_eq!(layout.len(), first + extra);
            prop_assert_eq!(distinct.len(), first + extra);
        }

        #[test]
        fn positions_stay_inside_the_padded_canvas(count in 1usize..300) {
            let layout = compute_initial_layout(&ids(count), 600.0, 400.0, 40.0);
            for position in layout.values() {
                prop_assert!(position.x > 40.0 && position.x < 560.0);
                prop_assert!(position.y > 40.0 && position.y < 360.0);
            }
        }
    }
}
