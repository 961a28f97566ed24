use std::collections::BTreeMap;

use autoflow_core::{
    Board, Container, DragEffect, DragSubject, DropTarget, ItemId, MoveRecord, NoopReason,
};

use crate::GestureRecord;

// ── Core result types ─────────────────────────────────────────────────────────

/// Oracle result for an invariant check.
///
/// Returned by each checker and by [`GestureOracle::check_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    #[must_use]
    fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    #[must_use]
    fn fail(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: false,
            violations,
        }
    }

    #[must_use]
    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        if violations.is_empty() {
            Self::pass()
        } else {
            Self::fail(violations)
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

// ── Invariant violation diagnostics ──────────────────────────────────────────

/// Column ids with their card ids, in board order.
pub type BoardShape = Vec<(String, Vec<String>)>;

/// Diagnostic information for a single failed invariant check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A gesture added, lost, or duplicated cards.
    MultisetChanged {
        gesture: usize,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    /// A gesture added or lost columns.
    ColumnSetChanged {
        gesture: usize,
        before: Vec<String>,
        after: Vec<String>,
    },

    /// A resolved or committed index fell outside its sequence.
    IndexOutOfBounds {
        gesture: usize,
        container: Option<String>,
        index: usize,
        len: usize,
    },

    /// A pointer-down during an active drag was not rejected, or it changed
    /// the dragged subject.
    SecondSessionStarted { gesture: usize, effect: String },

    /// The controller was still dragging after the gesture ended.
    SessionLeaked { gesture: usize },

    /// A cancelled gesture changed the board or notified listeners.
    CancelMutated { gesture: usize, commits: u64 },

    /// The committed board differs from the independent reference model.
    ReferenceMismatch {
        gesture: usize,
        expected: BoardShape,
        actual: BoardShape,
    },

    /// Listener notifications disagree with what the board shows.
    CommitCountMismatch {
        gesture: usize,
        commits: u64,
        committed: bool,
        changed: bool,
    },

    /// Whole-run card multiset drifted between start and end.
    GlobalMultiset { missing: Vec<String>, extra: Vec<String> },
}

// ── Reference model ───────────────────────────────────────────────────────────

/// Apply a drop the slow way: remember which element sits at the target
/// index, take the dragged element out, and put it back in front of that
/// anchor (or at the end when there is none).
///
/// Shares no code with the engine's committer, so agreement between the two
/// is meaningful.
#[must_use]
pub fn reference_apply(board: &Board, subject: &DragSubject, target: &DropTarget) -> Board {
    let mut next = board.clone();
    match (subject, target) {
        (DragSubject::Item { id, .. }, DropTarget::Item { container, index }) => {
            let Some(target_column) = board.container(container) else {
                return next;
            };
            let anchor = target_column.items.get(*index).map(|item| item.id.clone());
            if anchor.as_ref() == Some(id) {
                return next;
            }
            let Some(origin) = board.locate_item(id) else {
                return next;
            };
            let Some(source) = next.containers.iter_mut().find(|c| c.id == origin.container) else {
                return next;
            };
            let moved = source.items.remove(origin.index);
            let Some(dest) = next.containers.iter_mut().find(|c| &c.id == container) else {
                return board.clone();
            };
            let at = anchor
                .and_then(|a| dest.position_of(&a))
                .unwrap_or(dest.items.len());
            dest.items.insert(at, moved);
        }
        (DragSubject::Container { id, .. }, DropTarget::Container { index }) => {
            let anchor = board.containers.get(*index).map(|c| c.id.clone());
            if anchor.as_ref() == Some(id) {
                return next;
            }
            let Some(from) = board.container_index(id) else {
                return next;
            };
            let moved = next.containers.remove(from);
            let at = anchor
                .and_then(|a| next.container_index(&a))
                .unwrap_or(next.containers.len());
            next.containers.insert(at, moved);
        }
        _ => {}
    }
    next
}

#[must_use]
pub fn board_shape(board: &Board) -> BoardShape {
    board
        .containers
        .iter()
        .map(|c| {
            (
                c.id.to_string(),
                c.items.iter().map(|item| item.id.to_string()).collect(),
            )
        })
        .collect()
}

fn multiset_diff(
    before: &BTreeMap<ItemId, usize>,
    after: &BTreeMap<ItemId, usize>,
) -> (Vec<String>, Vec<String>) {
    let mut missing = Vec::new();
    let mut extra = Vec::new();
    for (id, &count) in before {
        let now = after.get(id).copied().unwrap_or(0);
        for _ in now..count {
            missing.push(id.to_string());
        }
    }
    for (id, &count) in after {
        let then = before.get(id).copied().unwrap_or(0);
        for _ in then..count {
            extra.push(id.to_string());
        }
    }
    (missing, extra)
}

fn column_ids(board: &Board) -> Vec<String> {
    let mut ids: Vec<String> = board.containers.iter().map(|c| c.id.to_string()).collect();
    ids.sort();
    ids
}

// ── Oracle ────────────────────────────────────────────────────────────────────

/// Oracle for the reorder invariants, checked per simulated gesture.
///
/// # Invariants checked
///
/// 1. **Multiset invariance** (`check_multiset`): cards and columns are
///    only ever moved.
/// 2. **Index bounds** (`check_bounds`): resolved indices lie in `[0, len]`,
///    committed ones in `[0, len)`.
/// 3. **Single session** (`check_single_session`): a second pointer-down is
///    rejected and never replaces the subject.
/// 4. **Cancellation purity** (`check_cancel_purity`).
/// 5. **Reference agreement** (`check_reference`): the engine's board equals
///    [`reference_apply`] on the same inputs.
/// 6. **Commit accounting** (`check_commit_count`).
pub struct GestureOracle;

impl GestureOracle {
    #[must_use]
    pub fn check_multiset(record: &GestureRecord) -> OracleResult {
        let mut violations = Vec::new();
        let (missing, extra) =
            multiset_diff(&record.before_up.item_multiset(), &record.after.item_multiset());
        if !missing.is_empty() || !extra.is_empty() {
            violations.push(InvariantViolation::MultisetChanged {
                gesture: record.index,
                missing,
                extra,
            });
        }
        let before = column_ids(&record.before_up);
        let after = column_ids(&record.after);
        if before != after {
            violations.push(InvariantViolation::ColumnSetChanged {
                gesture: record.index,
                before,
                after,
            });
        }
        OracleResult::from_violations(violations)
    }

    #[must_use]
    pub fn check_bounds(record: &GestureRecord) -> OracleResult {
        let mut violations = Vec::new();
        match &record.up_target {
            Some(DropTarget::Item { container, index }) => {
                let len = record.before_up.container(container).map_or(0, Container::len);
                if *index > len {
                    violations.push(InvariantViolation::IndexOutOfBounds {
                        gesture: record.index,
                        container: Some(container.to_string()),
                        index: *index,
                        len,
                    });
                }
            }
            Some(DropTarget::Container { index }) => {
                let len = record.before_up.len();
                if *index > len {
                    violations.push(InvariantViolation::IndexOutOfBounds {
                        gesture: record.index,
                        container: None,
                        index: *index,
                        len,
                    });
                }
            }
            None => {}
        }
        if let DragEffect::Committed { record: moved } = &record.ending_effect {
            let (container, index, len) = match moved {
                MoveRecord::Item { to, .. } => (
                    Some(to.container.to_string()),
                    to.index,
                    record.after.container(&to.container).map_or(0, Container::len),
                ),
                MoveRecord::Container { to, .. } => (None, *to, record.after.len()),
            };
            if index >= len {
                violations.push(InvariantViolation::IndexOutOfBounds {
                    gesture: record.index,
                    container,
                    index,
                    len,
                });
            }
        }
        OracleResult::from_violations(violations)
    }

    #[must_use]
    pub fn check_single_session(record: &GestureRecord) -> OracleResult {
        let mut violations = Vec::new();
        if let Some(probe) = &record.stray
            && probe.subject_before.is_some()
        {
            let rejected = probe.effect
                == DragEffect::Noop {
                    reason: NoopReason::SessionAlreadyActive,
                };
            if !rejected || probe.subject_after != probe.subject_before {
                violations.push(InvariantViolation::SecondSessionStarted {
                    gesture: record.index,
                    effect: format!("{:?}", probe.effect),
                });
            }
        }
        if record.dragging_after {
            violations.push(InvariantViolation::SessionLeaked {
                gesture: record.index,
            });
        }
        OracleResult::from_violations(violations)
    }

    #[must_use]
    pub fn check_cancel_purity(record: &GestureRecord) -> OracleResult {
        if record.released {
            return OracleResult::pass();
        }
        if record.after != record.before_up || record.commits_delta != 0 {
            return OracleResult::fail(vec![InvariantViolation::CancelMutated {
                gesture: record.index,
                commits: record.commits_delta,
            }]);
        }
        OracleResult::pass()
    }

    #[must_use]
    pub fn check_reference(record: &GestureRecord) -> OracleResult {
        let expected = match (&record.subject, &record.up_target) {
            (Some(subject), Some(target)) if record.released => {
                reference_apply(&record.before_up, subject, target)
            }
            _ => record.before_up.clone(),
        };
        if expected == record.after {
            OracleResult::pass()
        } else {
            OracleResult::fail(vec![InvariantViolation::ReferenceMismatch {
                gesture: record.index,
                expected: board_shape(&expected),
                actual: board_shape(&record.after),
            }])
        }
    }

    #[must_use]
    pub fn check_commit_count(record: &GestureRecord) -> OracleResult {
        let committed = matches!(record.ending_effect, DragEffect::Committed { .. });
        let changed = record.after != record.before_up;
        if record.commits_delta != u64::from(committed) || committed != changed {
            return OracleResult::fail(vec![InvariantViolation::CommitCountMismatch {
                gesture: record.index,
                commits: record.commits_delta,
                committed,
                changed,
            }]);
        }
        OracleResult::pass()
    }

    /// Compare the card multiset at the start and end of a whole run.
    #[must_use]
    pub fn check_global(initial: &Board, last: &Board) -> OracleResult {
        let (missing, extra) = multiset_diff(&initial.item_multiset(), &last.item_multiset());
        if missing.is_empty() && extra.is_empty() {
            OracleResult::pass()
        } else {
            OracleResult::fail(vec![InvariantViolation::GlobalMultiset { missing, extra }])
        }
    }

    /// Run every per-gesture check plus the global one.
    #[must_use]
    pub fn check_all(records: &[GestureRecord], initial: &Board, last: &Board) -> OracleResult {
        records
            .iter()
            .fold(OracleResult::pass(), |acc, record| {
                acc.merge(Self::check_multiset(record))
                    .merge(Self::check_bounds(record))
                    .merge(Self::check_single_session(record))
                    .merge(Self::check_cancel_purity(record))
                    .merge(Self::check_reference(record))
                    .merge(Self::check_commit_count(record))
            })
            .merge(Self::check_global(initial, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GestureRecord;
    use crate::gesture::{GestureEnding, GesturePlan};
    use autoflow_core::{CancelReason, Container, ContainerId, Item, Point};

    fn board(columns: &[(&str, &str)]) -> Board {
        Board::new(columns.iter().map(|(id, items)| {
            Container::new(*id, id.to_uppercase())
                .with_items(items.split_whitespace().map(|i| Item::new(i, "")))
        }))
    }

    fn item(id: &str, container: &str, index: usize) -> DragSubject {
        DragSubject::Item {
            id: ItemId::from(id),
            container: ContainerId::from(container),
            index,
        }
    }

    fn record(before: Board, after: Board) -> GestureRecord {
        GestureRecord {
            index: 0,
            plan: GesturePlan {
                pointer_id: 1,
                start: Point::default(),
                path: Vec::new(),
                ending: GestureEnding::Drop,
                stray_down: None,
                foreign_move: None,
                stale_container: None,
                stale_unmount: false,
            },
            subject: None,
            stray: None,
            before_up: before,
            up_target: None,
            released: true,
            ending_effect: DragEffect::Dropped {
                reason: NoopReason::NoTarget,
            },
            after,
            commits_delta: 0,
            dragging_after: false,
        }
    }

    #[test]
    fn reference_moves_within_column() {
        let b = board(&[("a", "1 2 3 4")]);
        let next = reference_apply(
            &b,
            &item("2", "a", 1),
            &DropTarget::Item {
                container: ContainerId::from("a"),
                index: 3,
            },
        );
        assert_eq!(next.item_ids(&ContainerId::from("a")), Some(vec!["1", "3", "2", "4"]));
    }

    #[test]
    fn reference_moves_across_columns_and_appends() {
        let b = board(&[("a", "1 2 3"), ("b", "4 5")]);
        let across = reference_apply(
            &b,
            &item("2", "a", 1),
            &DropTarget::Item {
                container: ContainerId::from("b"),
                index: 0,
            },
        );
        assert_eq!(across.item_ids(&ContainerId::from("a")), Some(vec!["1", "3"]));
        assert_eq!(across.item_ids(&ContainerId::from("b")), Some(vec!["2", "4", "5"]));

        let append = reference_apply(
            &b,
            &item("1", "a", 0),
            &DropTarget::Item {
                container: ContainerId::from("b"),
                index: 2,
            },
        );
        assert_eq!(append.item_ids(&ContainerId::from("b")), Some(vec!["4", "5", "1"]));
    }

    #[test]
    fn reference_moves_columns() {
        let b = board(&[("a", ""), ("b", ""), ("c", "")]);
        let next = reference_apply(
            &b,
            &DragSubject::Container {
                id: ContainerId::from("a"),
                index: 0,
            },
            &DropTarget::Container { index: 3 },
        );
        let order: Vec<_> = next.containers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    #[test]
    fn lost_card_is_reported() {
        let r = record(board(&[("a", "1 2")]), board(&[("a", "1")]));
        let result = GestureOracle::check_multiset(&r);
        assert!(!result.passed);
        assert!(matches!(
            &result.violations[0],
            InvariantViolation::MultisetChanged { missing, .. } if missing == &["2".to_string()]
        ));
    }

    #[test]
    fn cancel_that_mutates_is_reported() {
        let mut r = record(board(&[("a", "1 2")]), board(&[("a", "2 1")]));
        r.released = false;
        r.plan.ending = GestureEnding::Cancel {
            reason: CancelReason::EscapeKey,
        };
        assert!(!GestureOracle::check_cancel_purity(&r).passed);
    }

    #[test]
    fn unrejected_second_pointer_is_reported() {
        let mut r = record(board(&[("a", "1")]), board(&[("a", "1")]));
        r.stray = Some(crate::StrayProbe {
            effect: DragEffect::Noop {
                reason: NoopReason::NothingUnderPointer,
            },
            subject_before: Some(item("1", "a", 0)),
            subject_after: Some(item("1", "a", 0)),
        });
        assert!(!GestureOracle::check_single_session(&r).passed);
    }

    #[test]
    fn silent_board_change_breaks_commit_accounting() {
        let r = record(board(&[("a", "1 2")]), board(&[("a", "2 1")]));
        assert!(!GestureOracle::check_commit_count(&r).passed);
        assert!(GestureOracle::check_multiset(&r).passed);
    }

    #[test]
    fn merge_accumulates_failures() {
        let a = OracleResult::fail(vec![InvariantViolation::SessionLeaked { gesture: 1 }]);
        let b = OracleResult::fail(vec![InvariantViolation::SessionLeaked { gesture: 2 }]);
        let merged = OracleResult::pass().merge(a).merge(b);
        assert!(!merged.passed);
        assert_eq!(merged.violations.len(), 2);
    }
}
