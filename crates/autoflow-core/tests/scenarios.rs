//! End-to-end drag scenarios driven through the controller and a grid layout.

use autoflow_core::config::DragConfig;
use autoflow_core::{
    Board, Container, ContainerId, DragController, DragEffect, DragPhase, GridLayout, Item,
    MoveRecord, NoopReason, Point,
};
use std::cell::RefCell;
use std::rc::Rc;

fn column(id: &str, items: &[&str]) -> Container {
    Container::new(id, id.to_uppercase()).with_items(items.iter().map(|i| Item::new(*i, "")))
}

fn ids(board: &Board, container: &str) -> Vec<String> {
    board
        .item_ids(&ContainerId::from(container))
        .expect("container exists")
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Point just above the vertical midpoint of card `index` in `col`.
fn above(grid: &GridLayout, col: usize, index: usize) -> Point {
    let mut p = grid.card_center(col, index);
    p.y -= 1.0;
    p
}

#[test]
fn same_container_move_down_lands_before_resolved_card() {
    // A = [1,2,3,4]; drag 2 to resolved index 3 -> [1,3,2,4].
    let board = Board::new([column("a", &["1", "2", "3", "4"])]);
    let grid = GridLayout::default();
    let layout = grid.layout(&board);
    let mut ctl = DragController::new(board, DragConfig::default());

    ctl.pointer_down_at(1, grid.card_center(0, 1), &layout);
    let up = ctl.pointer_up(1, above(&grid, 0, 3), &layout);

    assert!(up.is_commit(), "expected commit, got {up:?}");
    assert_eq!(ids(ctl.board(), "a"), ["1", "3", "2", "4"]);
}

#[test]
fn cross_container_move_inserts_at_head() {
    // A = [1,2,3], B = [4,5]; drag 2 to B index 0 -> A = [1,3], B = [2,4,5].
    let board = Board::new([column("a", &["1", "2", "3"]), column("b", &["4", "5"])]);
    let grid = GridLayout::default();
    let layout = grid.layout(&board);
    let mut ctl = DragController::new(board, DragConfig::default());

    ctl.pointer_down_at(1, grid.card_center(0, 1), &layout);
    ctl.pointer_move(1, above(&grid, 1, 0), &layout);
    ctl.pointer_up(1, above(&grid, 1, 0), &layout);

    assert_eq!(ids(ctl.board(), "a"), ["1", "3"]);
    assert_eq!(ids(ctl.board(), "b"), ["2", "4", "5"]);
}

#[test]
fn pointer_below_all_items_appends() {
    // A = [1,2]; dropping below every card resolves to index 2.
    let board = Board::new([column("a", &["1", "2"]), column("b", &["9"])]);
    let grid = GridLayout::default();
    let layout = grid.layout(&board);
    let mut ctl = DragController::new(board, DragConfig::default());

    ctl.pointer_down_at(1, grid.card_center(1, 0), &layout);
    let mv = ctl.pointer_move(1, grid.card_center(0, 4), &layout);
    let DragEffect::Updated { resolution, .. } = &mv.effect else {
        panic!("expected an update, got {mv:?}");
    };
    assert_eq!(
        resolution.target,
        Some(autoflow_core::DropTarget::Item {
            container: ContainerId::from("a"),
            index: 2,
        })
    );
    ctl.pointer_up(1, grid.card_center(0, 4), &layout);
    assert_eq!(ids(ctl.board(), "a"), ["1", "2", "9"]);
}

#[test]
fn listener_sees_previous_and_next_boards() {
    let board = Board::new([column("a", &["1", "2"]), column("b", &[])]);
    let grid = GridLayout::default();
    let layout = grid.layout(&board);
    let mut ctl = DragController::new(board.clone(), DragConfig::default());

    let seen: Rc<RefCell<Vec<(Board, Board)>>> = Rc::default();
    let sink = Rc::clone(&seen);
    ctl.subscribe(move |prev: &Board, next: &Board, _: &MoveRecord| {
        sink.borrow_mut().push((prev.clone(), next.clone()));
    });

    ctl.pointer_down_at(1, grid.card_center(0, 0), &layout);
    ctl.pointer_up(1, grid.card_center(1, 0), &layout);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, board);
    assert_eq!(&seen[0].1, ctl.board());
    assert_eq!(ids(&seen[0].1, "b"), ["1"]);
}

#[test]
fn rollback_by_replacing_board_after_commit() {
    let board = Board::new([column("a", &["1", "2"])]);
    let grid = GridLayout::default();
    let layout = grid.layout(&board);
    let mut ctl = DragController::new(board.clone(), DragConfig::default());

    ctl.pointer_down_at(1, grid.card_center(0, 0), &layout);
    ctl.pointer_up(1, grid.card_center(0, 3), &layout);
    assert_eq!(ids(ctl.board(), "a"), ["2", "1"]);

    let committed = ctl.replace_board(board.clone());
    assert_eq!(ids(&committed, "a"), ["2", "1"]);
    assert_eq!(ctl.board(), &board);
}

#[test]
fn one_session_per_gesture_cycle() {
    let board = Board::new([column("a", &["1", "2", "3"])]);
    let grid = GridLayout::default();
    let mut ctl = DragController::new(board, DragConfig::default());

    for _ in 0..3 {
        // Geometry follows the board after every commit.
        let layout = grid.layout(ctl.board());
        let down = ctl.pointer_down_at(1, grid.card_center(0, 0), &layout);
        assert_eq!(down.from, DragPhase::Idle);
        let again = ctl.pointer_down_at(2, grid.card_center(0, 1), &layout);
        assert_eq!(
            again.effect,
            DragEffect::Noop {
                reason: NoopReason::SessionAlreadyActive
            }
        );
        let up = ctl.pointer_up(1, grid.card_center(0, 5), &layout);
        assert!(up.is_commit());
        assert_eq!(up.to, DragPhase::Idle);
    }
    // Card at the top was sent to the bottom three times.
    assert_eq!(ids(ctl.board(), "a"), ["1", "2", "3"]);
}
