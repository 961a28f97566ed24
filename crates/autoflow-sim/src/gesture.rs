use autoflow_core::{Board, CancelReason, Container, ContainerId, GridLayout, LayoutQuery, Point};
use serde::{Deserialize, Serialize};

use crate::SimulationConfig;
use crate::rng::DeterministicRng;

/// How a simulated gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ending", rename_all = "snake_case")]
pub enum GestureEnding {
    /// Release at the last path point.
    Drop,
    /// Release left of every column.
    OutsideDrop { at: Point },
    Cancel { reason: CancelReason },
}

/// Fully planned pointer gesture, generated before it is replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GesturePlan {
    pub pointer_id: u32,
    pub start: Point,
    pub path: Vec<Point>,
    pub ending: GestureEnding,
    /// Second pointer-down injected mid-drag from another pointer.
    pub stray_down: Option<Point>,
    /// Move from a pointer that does not own the session.
    pub foreign_move: Option<Point>,
    /// Column removed by an external edit just before release.
    pub stale_container: Option<ContainerId>,
    /// Whether the removed column also unmounts from the layout.
    pub stale_unmount: bool,
}

impl GesturePlan {
    /// Where the pointer is released, if it is released at all.
    #[must_use]
    pub fn release_point(&self) -> Option<Point> {
        match self.ending {
            GestureEnding::Drop => Some(self.path.last().copied().unwrap_or(self.start)),
            GestureEnding::OutsideDrop { at } => Some(at),
            GestureEnding::Cancel { .. } => None,
        }
    }
}

const CANCEL_REASONS: [CancelReason; 3] = [
    CancelReason::EscapeKey,
    CancelReason::LeftTrackedArea,
    CancelReason::Unmounted,
];

/// Plan one gesture against the current board.
#[must_use]
pub fn plan_gesture(
    rng: &mut DeterministicRng,
    board: &Board,
    grid: &GridLayout,
    config: &SimulationConfig,
    pointer_id: u32,
) -> GesturePlan {
    let start = pick_start(rng, board, grid, config);

    let tallest = board.containers.iter().map(Container::len).max().unwrap_or(0);
    let min_x = grid.config().origin_x - 40.0;
    let max_x = grid.column_left(board.len()) + 40.0;
    let min_y = grid.config().origin_y;
    let max_y = grid.card_top(tallest + 2);

    let steps = 1 + rng.index(config.max_moves.max(1));
    let path: Vec<Point> = (0..steps)
        .map(|_| Point::new(rng.range_f64(min_x, max_x), rng.range_f64(min_y, max_y)))
        .collect();

    let ending = if rng.hit_rate_percent(config.cancel_percent) {
        GestureEnding::Cancel {
            reason: CANCEL_REASONS[rng.index(CANCEL_REASONS.len())],
        }
    } else if rng.hit_rate_percent(config.outside_drop_percent) {
        GestureEnding::OutsideDrop {
            at: Point::new(min_x - 100.0, rng.range_f64(min_y, max_y)),
        }
    } else {
        GestureEnding::Drop
    };

    let stray_down = rng
        .hit_rate_percent(config.stray_pointer_percent)
        .then(|| pick_start(rng, board, grid, config));
    let foreign_move = rng
        .hit_rate_percent(config.stray_pointer_percent)
        .then(|| Point::new(rng.range_f64(min_x, max_x), rng.range_f64(min_y, max_y)));

    let mut plan = GesturePlan {
        pointer_id,
        start,
        path,
        ending,
        stray_down,
        foreign_move,
        stale_container: None,
        stale_unmount: false,
    };

    if board.len() > 1 && rng.hit_rate_percent(config.stale_percent) {
        let layout = grid.layout(board);
        let release = plan.release_point().unwrap_or(start);
        plan.stale_container = layout
            .droppable_regions()
            .iter()
            .find(|region| region.bounds.contains_x(release.x))
            .map(|region| region.container.clone());
        plan.stale_unmount = rng.hit_rate_percent(50);
    }

    plan
}

/// Centre of a random card, or of a random header for column drags.
fn pick_start(
    rng: &mut DeterministicRng,
    board: &Board,
    grid: &GridLayout,
    config: &SimulationConfig,
) -> Point {
    let column_drag = board.item_count() == 0 || rng.hit_rate_percent(config.column_drag_percent);
    if column_drag {
        return grid.header_center(rng.index(board.len()));
    }
    let mut n = rng.index(board.item_count());
    for (col, container) in board.containers.iter().enumerate() {
        if n < container.len() {
            return grid.card_center(col, n);
        }
        n -= container.len();
    }
    grid.header_center(0)
}
