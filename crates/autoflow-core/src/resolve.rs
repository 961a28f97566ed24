//! Drop-target resolution: pointer coordinate → `(container, insert index)`.
//!
//! Pure functions over a [`LayoutQuery`] and the current [`Board`]. Regions
//! or cards that the board no longer knows about are skipped for the pass,
//! and every returned index is clamped into `[0, len]` of the board's
//! current sequence.

use serde::{Deserialize, Serialize};

use crate::layout::{DroppableRegion, LayoutQuery, Point};
use crate::model::{Board, ContainerId};
use crate::session::DragSubject;

/// Candidate insertion point under the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    /// Insert a card into `container` before the card currently at `index`.
    Item { container: ContainerId, index: usize },
    /// Insert a column before the column currently at `index`.
    Container { index: usize },
}

impl DropTarget {
    /// Whether dropping `subject` here would leave it where it already is.
    ///
    /// Indices are pre-removal, so both the origin index and the slot right
    /// after it mean "same place".
    #[must_use]
    pub fn is_noop_for(&self, subject: &DragSubject) -> bool {
        match (self, subject) {
            (
                Self::Item { container, index },
                DragSubject::Item {
                    container: origin,
                    index: origin_index,
                    ..
                },
            ) => container == origin && is_same_slot(*origin_index, *index),
            (Self::Container { index }, DragSubject::Container { index: origin, .. }) => {
                is_same_slot(*origin, *index)
            }
            _ => false,
        }
    }
}

/// Result of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub target: Option<DropTarget>,
    /// Whether the rendering layer should draw the insertion placeholder.
    pub show_placeholder: bool,
}

impl Resolution {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            target: None,
            show_placeholder: false,
        }
    }
}

/// `true` when inserting at `target` (pre-removal) keeps an element at `origin`.
#[must_use]
pub const fn is_same_slot(origin: usize, target: usize) -> bool {
    target == origin || target == origin.saturating_add(1)
}

/// Resolve the target for whatever `subject` is being dragged.
#[must_use]
pub fn resolve<L: LayoutQuery + ?Sized>(
    layout: &L,
    board: &Board,
    subject: &DragSubject,
    pointer: Point,
    suppress_noop_placeholder: bool,
) -> Resolution {
    let target = match subject {
        DragSubject::Item { .. } => resolve_item_target(layout, board, pointer),
        DragSubject::Container { .. } => resolve_container_target(layout, board, pointer),
    };
    let show_placeholder = target
        .as_ref()
        .is_some_and(|t| !(suppress_noop_placeholder && t.is_noop_for(subject)));
    tracing::trace!(
        x = pointer.x,
        y = pointer.y,
        ?target,
        show_placeholder,
        "resolved drop target"
    );
    Resolution {
        target,
        show_placeholder,
    }
}

/// Resolve where a dragged card would land.
///
/// Picks the live column whose horizontal span contains `pointer.x`, then
/// walks its live cards top-to-bottom and stops at the first card whose
/// vertical midpoint lies below `pointer.y`. Falls back to appending.
#[must_use]
pub fn resolve_item_target<L: LayoutQuery + ?Sized>(
    layout: &L,
    board: &Board,
    pointer: Point,
) -> Option<DropTarget> {
    let (region, container) = layout
        .droppable_regions()
        .iter()
        .filter(|region| region.bounds.contains_x(pointer.x))
        .find_map(|region| board.container(&region.container).map(|c| (region, c)))?;

    let mut cards: Vec<_> = region
        .items
        .iter()
        .filter_map(|card| container.position_of(&card.item).map(|index| (card, index)))
        .collect();
    cards.sort_by(|(a, _), (b, _)| a.bounds.top.total_cmp(&b.bounds.top));

    let len = container.len();
    let index = cards
        .iter()
        .find(|(card, _)| card.bounds.mid_y() > pointer.y)
        .map_or(len, |(_, index)| *index);

    Some(DropTarget::Item {
        container: container.id.clone(),
        index: index.min(len),
    })
}

/// Resolve where a dragged column would land.
///
/// Same midpoint walk as cards, turned sideways: the first live column whose
/// horizontal midpoint lies right of `pointer.x` gives the index, otherwise
/// the column goes last. No live columns, or a pointer left of the first live
/// column or right of the last, means no target.
#[must_use]
pub fn resolve_container_target<L: LayoutQuery + ?Sized>(
    layout: &L,
    board: &Board,
    pointer: Point,
) -> Option<DropTarget> {
    let mut columns: Vec<(&DroppableRegion, usize)> = layout
        .droppable_regions()
        .iter()
        .filter_map(|region| {
            board
                .container_index(&region.container)
                .map(|index| (region, index))
        })
        .collect();
    if columns.is_empty() {
        return None;
    }
    columns.sort_by(|(a, _), (b, _)| a.bounds.left.total_cmp(&b.bounds.left));

    let left = columns
        .iter()
        .map(|(region, _)| region.bounds.left)
        .fold(f64::INFINITY, f64::min);
    let right = columns
        .iter()
        .map(|(region, _)| region.bounds.right())
        .fold(f64::NEG_INFINITY, f64::max);
    if pointer.x < left || pointer.x > right {
        return None;
    }

    let len = board.len();
    let index = columns
        .iter()
        .find(|(region, _)| region.bounds.mid_x() > pointer.x)
        .map_or(len, |(_, index)| *index);

    Some(DropTarget::Container {
        index: index.min(len),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GridLayout, LayoutSnapshot};
    use crate::model::{Container, Item, ItemId};

    fn board() -> Board {
        Board::new([
            Container::new("a", "A").with_items((1..=4).map(|i| Item::new(i.to_string(), ""))),
            Container::new("b", "B").with_items([Item::new("5", ""), Item::new("6", "")]),
            Container::new("c", "C"),
        ])
    }

    fn item_target(container: &str, index: usize) -> Option<DropTarget> {
        Some(DropTarget::Item {
            container: ContainerId::from(container),
            index,
        })
    }

    #[test]
    fn pointer_above_card_midpoint_targets_that_card() {
        let grid = GridLayout::default();
        let board = board();
        let layout = grid.layout(&board);
        let mut p = grid.card_center(1, 1);
        p.y -= 1.0;
        assert_eq!(resolve_item_target(&layout, &board, p), item_target("b", 1));
    }

    #[test]
    fn pointer_below_card_midpoint_targets_next_slot() {
        let grid = GridLayout::default();
        let board = board();
        let layout = grid.layout(&board);
        let mut p = grid.card_center(0, 2);
        p.y += 1.0;
        assert_eq!(resolve_item_target(&layout, &board, p), item_target("a", 3));
    }

    #[test]
    fn pointer_below_all_cards_appends() {
        let grid = GridLayout::default();
        let board = Board::new([
            Container::new("a", "A").with_items([Item::new("1", ""), Item::new("2", "")]),
        ]);
        let layout = grid.layout(&board);
        let p = grid.card_center(0, 2);
        assert_eq!(resolve_item_target(&layout, &board, p), item_target("a", 2));
    }

    #[test]
    fn empty_column_resolves_to_index_zero() {
        let grid = GridLayout::default();
        let board = board();
        let layout = grid.layout(&board);
        assert_eq!(
            resolve_item_target(&layout, &board, grid.card_center(2, 0)),
            item_target("c", 0)
        );
    }

    #[test]
    fn pointer_outside_every_column_has_no_target() {
        let grid = GridLayout::default();
        let board = board();
        let layout = grid.layout(&board);
        let gap_x = grid.column_left(1) - 1.0;
        assert_eq!(resolve_item_target(&layout, &board, Point::new(gap_x, 100.0)), None);
        assert_eq!(resolve_item_target(&layout, &board, Point::new(-10.0, 100.0)), None);
    }

    #[test]
    fn stale_column_is_skipped() {
        let grid = GridLayout::default();
        let full = board();
        let layout = grid.layout(&full);
        let mut board = full;
        board.containers.remove(1);
        assert_eq!(resolve_item_target(&layout, &board, grid.card_center(1, 0)), None);
    }

    #[test]
    fn stale_card_is_skipped_and_index_clamped() {
        let grid = GridLayout::default();
        let full = board();
        let layout = grid.layout(&full);
        let mut board = full;
        // Card "4" vanished from the board but is still in the layout.
        board.containers[0].items.pop();
        let mut p = grid.card_center(0, 3);
        p.y -= 1.0;
        assert_eq!(resolve_item_target(&layout, &board, p), item_target("a", 3));
    }

    #[test]
    fn layout_missing_cards_clamps_to_board_length() {
        let board = board();
        let mut layout = GridLayout::default().layout(&board);
        layout.regions[0].items.clear();
        let target = resolve_item_target(&layout, &board, Point::new(10.0, 10_000.0));
        assert_eq!(target, item_target("a", 4));
    }

    #[test]
    fn column_target_uses_horizontal_midpoints() {
        let grid = GridLayout::default();
        let board = board();
        let layout = grid.layout(&board);
        let left_of_b_mid = Point::new(grid.column_left(1) + 10.0, 10.0);
        assert_eq!(
            resolve_container_target(&layout, &board, left_of_b_mid),
            Some(DropTarget::Container { index: 1 })
        );
        let right_half_of_c = Point::new(grid.column_left(2) + 200.0, 10.0);
        assert_eq!(
            resolve_container_target(&layout, &board, right_half_of_c),
            Some(DropTarget::Container { index: 3 })
        );
        let in_gap = Point::new(grid.column_left(1) - 8.0, 10.0);
        assert_eq!(
            resolve_container_target(&layout, &board, in_gap),
            Some(DropTarget::Container { index: 1 })
        );
    }

    #[test]
    fn column_target_outside_board_span_is_none() {
        let grid = GridLayout::default();
        let board = board();
        let layout = grid.layout(&board);
        assert_eq!(
            resolve_container_target(&layout, &board, Point::new(-100.0, 10.0)),
            None
        );
        assert_eq!(
            resolve_container_target(&layout, &board, Point::new(grid.column_left(5), 10.0)),
            None
        );
    }

    #[test]
    fn column_target_without_live_columns_is_none() {
        let board = board();
        assert_eq!(
            resolve_container_target(&LayoutSnapshot::default(), &board, Point::new(0.0, 0.0)),
            None
        );
    }

    #[test]
    fn placeholder_suppressed_for_same_slot() {
        let grid = GridLayout::default();
        let board = board();
        let layout = grid.layout(&board);
        let subject = DragSubject::Item {
            id: ItemId::from("2"),
            container: ContainerId::from("a"),
            index: 1,
        };

        let mut on_self = grid.card_center(0, 1);
        on_self.y -= 1.0;
        let res = resolve(&layout, &board, &subject, on_self, true);
        assert_eq!(res.target, item_target("a", 1));
        assert!(!res.show_placeholder);

        let mut just_after = grid.card_center(0, 1);
        just_after.y += 1.0;
        let res = resolve(&layout, &board, &subject, just_after, true);
        assert_eq!(res.target, item_target("a", 2));
        assert!(!res.show_placeholder);

        let res = resolve(&layout, &board, &subject, just_after, false);
        assert!(res.show_placeholder);

        let res = resolve(&layout, &board, &subject, grid.card_center(1, 0), true);
        assert!(res.show_placeholder);
    }

    #[test]
    fn same_slot_window() {
        assert!(is_same_slot(1, 1));
        assert!(is_same_slot(1, 2));
        assert!(!is_same_slot(1, 0));
        assert!(!is_same_slot(1, 3));
    }
}
