//! Reorder committer: apply a resolved drop to the board.
//!
//! The committer never mutates its input. It clones the board, removes the
//! dragged element, compensates the insert index for the removal when
//! source and target share a sequence, inserts, and hands back the new
//! value. Stale sources or targets produce [`CommitOutcome::Unchanged`]
//! rather than an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Board, ContainerId, ItemId, ItemPosition};
use crate::resolve::{DropTarget, is_same_slot};
use crate::session::{DragSubject, NoopReason};

/// What a successful commit moved, with final (post-insert) positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveRecord {
    Item {
        id: ItemId,
        from: ItemPosition,
        to: ItemPosition,
    },
    Container {
        id: ContainerId,
        from: usize,
        to: usize,
    },
}

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Moved { board: Board, record: MoveRecord },
    Unchanged(NoopReason),
}

impl CommitOutcome {
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    /// The board after the commit: the new one if something moved, else `original`.
    #[must_use]
    pub fn into_board(self, original: &Board) -> Board {
        match self {
            Self::Moved { board, .. } => board,
            Self::Unchanged(_) => original.clone(),
        }
    }
}

/// Final index of an element moved from `from` to pre-removal slot `to`
/// within the same sequence.
#[must_use]
pub const fn adjusted_index(from: usize, to: usize) -> usize {
    if to > from { to - 1 } else { to }
}

/// Move `seq[from]` to pre-removal slot `to` within the same sequence.
///
/// Returns the element's final index, or `None` when `from` is out of range.
/// `to` is clamped to the sequence length.
pub fn reorder_within<T>(seq: &mut Vec<T>, from: usize, to: usize) -> Option<usize> {
    if from >= seq.len() {
        return None;
    }
    let element = seq.remove(from);
    let index = adjusted_index(from, to).min(seq.len());
    seq.insert(index, element);
    Some(index)
}

/// Move `source[from]` into `target` at `to` (clamped).
///
/// Returns the element's final index, or `None` when `from` is out of range.
pub fn transfer<T>(
    source: &mut Vec<T>,
    from: usize,
    target: &mut Vec<T>,
    to: usize,
) -> Option<usize> {
    if from >= source.len() {
        return None;
    }
    let element = source.remove(from);
    let index = to.min(target.len());
    target.insert(index, element);
    Some(index)
}

/// Apply `target` to the board for `subject`.
#[must_use]
pub fn commit(board: &Board, subject: &DragSubject, target: &DropTarget) -> CommitOutcome {
    match (subject, target) {
        (
            DragSubject::Item {
                id,
                container,
                index,
            },
            DropTarget::Item {
                container: target_container,
                index: target_index,
            },
        ) => commit_item_move(
            board,
            id,
            &ItemPosition {
                container: container.clone(),
                index: *index,
            },
            target_container,
            *target_index,
        ),
        (DragSubject::Container { id, index }, DropTarget::Container { index: target_index }) => {
            commit_container_move(board, id, *index, *target_index)
        }
        _ => CommitOutcome::Unchanged(NoopReason::TargetKindMismatch),
    }
}

/// Move a card to `target_index` (pre-removal) of `target_container`.
#[must_use]
pub fn commit_item_move(
    board: &Board,
    item: &ItemId,
    origin: &ItemPosition,
    target_container: &ContainerId,
    target_index: usize,
) -> CommitOutcome {
    let Some(source) = locate_source_item(board, item, origin) else {
        debug!(%item, "commit skipped: dragged item is gone");
        return CommitOutcome::Unchanged(NoopReason::StaleSource);
    };
    let Some(target_col) = board.container_index(target_container) else {
        debug!(%item, container = %target_container, "commit skipped: target container is gone");
        return CommitOutcome::Unchanged(NoopReason::StaleTarget);
    };
    let Some(source_col) = board.container_index(&source.container) else {
        return CommitOutcome::Unchanged(NoopReason::StaleSource);
    };

    let len = board.containers[target_col].len();
    let target_index = clamp_index(target_index, len, "item");
    let same_container = source_col == target_col;

    if same_container && is_same_slot(source.index, target_index) {
        return CommitOutcome::Unchanged(NoopReason::SamePosition);
    }

    let mut next = board.clone();
    let final_index = if same_container {
        reorder_within(&mut next.containers[source_col].items, source.index, target_index)
    } else {
        let (source_items, target_items) = two_mut(&mut next.containers, source_col, target_col);
        transfer(&mut source_items.items, source.index, &mut target_items.items, target_index)
    };
    let Some(final_index) = final_index else {
        return CommitOutcome::Unchanged(NoopReason::StaleSource);
    };

    let record = MoveRecord::Item {
        id: item.clone(),
        from: source,
        to: ItemPosition {
            container: target_container.clone(),
            index: final_index,
        },
    };
    debug!(?record, "committed item move");
    CommitOutcome::Moved {
        board: next,
        record,
    }
}

/// Move a column to `target_index` (pre-removal) of the board.
#[must_use]
pub fn commit_container_move(
    board: &Board,
    container: &ContainerId,
    origin_index: usize,
    target_index: usize,
) -> CommitOutcome {
    let source_index = match board.containers.get(origin_index) {
        Some(c) if &c.id == container => origin_index,
        _ => match board.container_index(container) {
            Some(index) => {
                debug!(%container, origin_index, index, "column moved since drag start");
                index
            }
            None => {
                debug!(%container, "commit skipped: dragged column is gone");
                return CommitOutcome::Unchanged(NoopReason::StaleSource);
            }
        },
    };

    let target_index = clamp_index(target_index, board.len(), "container");
    if is_same_slot(source_index, target_index) {
        return CommitOutcome::Unchanged(NoopReason::SamePosition);
    }

    let mut next = board.clone();
    let Some(final_index) = reorder_within(&mut next.containers, source_index, target_index) else {
        return CommitOutcome::Unchanged(NoopReason::StaleSource);
    };

    let record = MoveRecord::Container {
        id: container.clone(),
        from: source_index,
        to: final_index,
    };
    debug!(?record, "committed column move");
    CommitOutcome::Moved {
        board: next,
        record,
    }
}

/// Prefer the recorded origin; fall back to searching by id if the board
/// changed underneath the drag.
fn locate_source_item(board: &Board, item: &ItemId, origin: &ItemPosition) -> Option<ItemPosition> {
    let at_origin = board
        .container(&origin.container)
        .and_then(|c| c.items.get(origin.index))
        .is_some_and(|candidate| &candidate.id == item);
    if at_origin {
        return Some(origin.clone());
    }
    let found = board.locate_item(item)?;
    debug!(%item, ?origin, ?found, "item moved since drag start");
    Some(found)
}

fn clamp_index(index: usize, len: usize, what: &str) -> usize {
    if index > len {
        warn!(index, len, what, "insert index out of range; clamping");
        len
    } else {
        index
    }
}

/// Two distinct mutable elements of one slice.
fn two_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (head, tail) = slice.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = slice.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Item};

    /// `("a", "1 2 3")` builds column `a` holding cards 1, 2, 3.
    fn board(columns: &[(&str, &str)]) -> Board {
        Board::new(columns.iter().map(|(id, items)| {
            Container::new(*id, id.to_uppercase()).with_items(
                items
                    .split_whitespace()
                    .map(|i| Item::new(i, format!("Card {i}"))),
            )
        }))
    }

    fn ids<'a>(board: &'a Board, container: &str) -> Vec<&'a str> {
        board
            .item_ids(&ContainerId::from(container))
            .expect("container exists")
    }

    fn pos(container: &str, index: usize) -> ItemPosition {
        ItemPosition {
            container: ContainerId::from(container),
            index,
        }
    }

    fn moved(outcome: CommitOutcome) -> (Board, MoveRecord) {
        match outcome {
            CommitOutcome::Moved { board, record } => (board, record),
            CommitOutcome::Unchanged(reason) => panic!("expected a move, got {reason:?}"),
        }
    }

    #[test]
    fn move_down_within_same_container_compensates_for_removal() {
        let before = board(&[("a", "1 2 3 4")]);
        let (after, record) = moved(commit_item_move(
            &before,
            &ItemId::from("2"),
            &pos("a", 1),
            &ContainerId::from("a"),
            3,
        ));
        assert_eq!(ids(&after, "a"), ["1", "3", "2", "4"]);
        assert_eq!(
            record,
            MoveRecord::Item {
                id: ItemId::from("2"),
                from: pos("a", 1),
                to: pos("a", 2),
            }
        );
        // Input untouched.
        assert_eq!(ids(&before, "a"), ["1", "2", "3", "4"]);
    }

    #[test]
    fn move_up_within_same_container() {
        let before = board(&[("a", "1 2 3 4")]);
        let (after, _) = moved(commit_item_move(
            &before,
            &ItemId::from("4"),
            &pos("a", 3),
            &ContainerId::from("a"),
            0,
        ));
        assert_eq!(ids(&after, "a"), ["4", "1", "2", "3"]);
    }

    #[test]
    fn move_across_containers() {
        let before = board(&[("a", "1 2 3"), ("b", "4 5")]);
        let (after, _) = moved(commit_item_move(
            &before,
            &ItemId::from("2"),
            &pos("a", 1),
            &ContainerId::from("b"),
            0,
        ));
        assert_eq!(ids(&after, "a"), ["1", "3"]);
        assert_eq!(ids(&after, "b"), ["2", "4", "5"]);
    }

    #[test]
    fn move_right_to_left_across_containers() {
        let before = board(&[("a", "1"), ("b", "4 5")]);
        let (after, _) = moved(commit_item_move(
            &before,
            &ItemId::from("5"),
            &pos("b", 1),
            &ContainerId::from("a"),
            1,
        ));
        assert_eq!(ids(&after, "a"), ["1", "5"]);
        assert_eq!(ids(&after, "b"), ["4"]);
    }

    #[test]
    fn append_at_end_of_other_container() {
        let before = board(&[("a", "1 2"), ("b", "9")]);
        let (after, _) = moved(commit_item_move(
            &before,
            &ItemId::from("9"),
            &pos("b", 0),
            &ContainerId::from("a"),
            2,
        ));
        assert_eq!(ids(&after, "a"), ["1", "2", "9"]);
        assert!(ids(&after, "b").is_empty());
    }

    #[test]
    fn same_slot_is_unchanged() {
        let before = board(&[("a", "1 2 3")]);
        for target in [1, 2] {
            let outcome = commit_item_move(
                &before,
                &ItemId::from("2"),
                &pos("a", 1),
                &ContainerId::from("a"),
                target,
            );
            assert_eq!(outcome, CommitOutcome::Unchanged(NoopReason::SamePosition));
            assert_eq!(outcome.into_board(&before), before);
        }
    }

    #[test]
    fn missing_target_container_is_stale() {
        let before = board(&[("a", "1")]);
        let outcome = commit_item_move(
            &before,
            &ItemId::from("1"),
            &pos("a", 0),
            &ContainerId::from("gone"),
            0,
        );
        assert_eq!(outcome, CommitOutcome::Unchanged(NoopReason::StaleTarget));
    }

    #[test]
    fn missing_item_is_stale_source() {
        let before = board(&[("a", "1")]);
        let outcome = commit_item_move(
            &before,
            &ItemId::from("7"),
            &pos("a", 0),
            &ContainerId::from("a"),
            0,
        );
        assert_eq!(outcome, CommitOutcome::Unchanged(NoopReason::StaleSource));
    }

    #[test]
    fn shifted_origin_is_found_by_id() {
        let before = board(&[("a", "0 1 2"), ("b", "")]);
        // Recorded origin says index 0, but "1" now lives at index 1.
        let (after, record) = moved(commit_item_move(
            &before,
            &ItemId::from("1"),
            &pos("a", 0),
            &ContainerId::from("b"),
            0,
        ));
        assert_eq!(ids(&after, "a"), ["0", "2"]);
        assert_eq!(ids(&after, "b"), ["1"]);
        assert!(matches!(record, MoveRecord::Item { from, .. } if from == pos("a", 1)));
    }

    #[test]
    fn out_of_range_index_is_clamped() {
        let before = board(&[("a", "1 2"), ("b", "3")]);
        let (after, record) = moved(commit_item_move(
            &before,
            &ItemId::from("3"),
            &pos("b", 0),
            &ContainerId::from("a"),
            99,
        ));
        assert_eq!(ids(&after, "a"), ["1", "2", "3"]);
        assert!(matches!(record, MoveRecord::Item { to, .. } if to == pos("a", 2)));
    }

    #[test]
    fn column_reorder_uses_same_adjustment() {
        let before = board(&[("a", ""), ("b", ""), ("c", ""), ("d", "")]);
        let (after, record) = moved(commit_container_move(&before, &ContainerId::from("a"), 0, 3));
        let order: Vec<_> = after.containers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a", "d"]);
        assert_eq!(
            record,
            MoveRecord::Container {
                id: ContainerId::from("a"),
                from: 0,
                to: 2,
            }
        );
    }

    #[test]
    fn column_reorder_to_end_and_noop() {
        let before = board(&[("a", "1"), ("b", "2"), ("c", "")]);
        let (after, _) = moved(commit_container_move(&before, &ContainerId::from("a"), 0, 3));
        let order: Vec<_> = after.containers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(ids(&after, "a"), ["1"]);

        assert_eq!(
            commit_container_move(&before, &ContainerId::from("b"), 1, 2),
            CommitOutcome::Unchanged(NoopReason::SamePosition)
        );
        assert_eq!(
            commit_container_move(&before, &ContainerId::from("zz"), 0, 2),
            CommitOutcome::Unchanged(NoopReason::StaleSource)
        );
    }

    #[test]
    fn kind_mismatch_is_unchanged() {
        let before = board(&[("a", "1")]);
        let subject = DragSubject::Container {
            id: ContainerId::from("a"),
            index: 0,
        };
        let target = DropTarget::Item {
            container: ContainerId::from("a"),
            index: 0,
        };
        assert_eq!(
            commit(&before, &subject, &target),
            CommitOutcome::Unchanged(NoopReason::TargetKindMismatch)
        );
    }

    #[test]
    fn generic_helpers_reject_bad_source_index() {
        let mut v = vec![1, 2, 3];
        assert_eq!(reorder_within(&mut v, 3, 0), None);
        assert_eq!(v, [1, 2, 3]);
        let mut w: Vec<i32> = Vec::new();
        assert_eq!(transfer(&mut v, 5, &mut w, 0), None);
        assert_eq!(transfer(&mut v, 0, &mut w, 10), Some(0));
        assert_eq!(v, [2, 3]);
        assert_eq!(w, [1]);
    }
}
