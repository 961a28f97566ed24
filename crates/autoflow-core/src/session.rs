//! Drag session controller.
//!
//! ```text
//! Idle --pointer-down--> Dragging --pointer-up--> (Committing) --> Idle
//!                           |
//!                           +------cancel------> (Cancelled) --> Idle
//! ```
//!
//! `Committing` and `Cancelled` are pass-through phases: they show up in the
//! `via` field of the [`DragTransition`] for the call that passed through
//! them, but the controller only ever rests in `Idle` or `Dragging`.
//!
//! The controller owns the authoritative [`Board`]. It is mutated in exactly
//! one place, the commit on pointer-up, by swapping in the new value built
//! by the committer. [`CommitListener`]s are told about each swap.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::commit::{CommitOutcome, MoveRecord, commit};
use crate::config::DragConfig;
use crate::layout::{LayoutQuery, Point};
use crate::model::{Board, ContainerId, ItemId};
use crate::pointer::PointerTracker;
use crate::resolve::{DropTarget, Resolution, resolve};

/// The entity picked up by a drag, with where it was picked up from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragSubject {
    Item {
        id: ItemId,
        container: ContainerId,
        index: usize,
    },
    Container {
        id: ContainerId,
        index: usize,
    },
}

impl DragSubject {
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Container { .. })
    }
}

/// Why a gesture was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    EscapeKey,
    LeftTrackedArea,
    Unmounted,
    Host,
}

/// Why an input or drop produced no change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    IdleWithoutActiveDrag,
    SessionAlreadyActive,
    PointerMismatch,
    NothingUnderPointer,
    ContainerReorderDisabled,
    NoTarget,
    SamePosition,
    StaleSource,
    StaleTarget,
    TargetKindMismatch,
}

/// Phase names used in transition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
    Committing,
    Cancelled,
}

/// Ephemeral state of one in-progress gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    pub pointer_id: u32,
    pub subject: DragSubject,
    pub tracker: PointerTracker,
    /// Latest resolution; drives the insertion indicator.
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Dragging(_) => DragPhase::Dragging,
        }
    }
}

/// Pointer and keyboard input fed to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragInput {
    PointerDown {
        pointer_id: u32,
        position: Point,
        subject: DragSubject,
    },
    PointerMove {
        pointer_id: u32,
        position: Point,
    },
    PointerUp {
        pointer_id: u32,
        position: Point,
    },
    Cancel {
        reason: CancelReason,
    },
}

/// Side effect of one controller step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        subject: DragSubject,
        pointer_id: u32,
        origin: Point,
        resolution: Resolution,
    },
    Updated {
        pointer: Point,
        resolution: Resolution,
        /// `false` when the move was under the jitter threshold and the
        /// previous resolution was kept.
        resolved: bool,
    },
    Committed {
        record: MoveRecord,
    },
    Dropped {
        reason: NoopReason,
    },
    Cancelled {
        reason: CancelReason,
    },
    Noop {
        reason: NoopReason,
    },
}

/// One state-machine step with its diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTransition {
    pub sequence: u64,
    pub from: DragPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<DragPhase>,
    pub to: DragPhase,
    pub effect: DragEffect,
}

impl DragTransition {
    #[must_use]
    pub const fn is_commit(&self) -> bool {
        matches!(self.effect, DragEffect::Committed { .. })
    }
}

/// Read-only view of the session for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub active: bool,
    pub subject: Option<DragSubject>,
    pub pointer: Option<Point>,
    /// Pointer offset from the gesture origin, for the floating preview.
    pub offset: Option<(f64, f64)>,
    pub target: Option<DropTarget>,
    pub show_placeholder: bool,
}

/// Receives every committed board swap.
///
/// This is the persistence hook: the engine does no I/O itself.
pub trait CommitListener {
    fn on_commit(&mut self, previous: &Board, next: &Board, record: &MoveRecord);
}

impl<F> CommitListener for F
where
    F: FnMut(&Board, &Board, &MoveRecord),
{
    fn on_commit(&mut self, previous: &Board, next: &Board, record: &MoveRecord) {
        self(previous, next, record);
    }
}

/// Orchestrates pointer tracking, resolution, and commit for one board.
pub struct DragController {
    board: Board,
    state: DragState,
    config: DragConfig,
    sequence: u64,
    listeners: Vec<Box<dyn CommitListener>>,
}

impl fmt::Debug for DragController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragController")
            .field("board", &self.board)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("sequence", &self.sequence)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DragController {
    #[must_use]
    pub fn new(board: Board, config: DragConfig) -> Self {
        Self {
            board,
            state: DragState::Idle,
            config,
            sequence: 0,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn into_board(self) -> Board {
        self.board
    }

    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &DragConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Register a commit listener.
    pub fn subscribe(&mut self, listener: impl CommitListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the board from outside the engine (external edit, reload, or
    /// rollback after a failed save). An active session keeps running; its
    /// drop is resolved and committed against the new board.
    pub fn replace_board(&mut self, board: Board) -> Board {
        std::mem::replace(&mut self.board, board)
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        match &self.state {
            DragState::Idle => SessionView {
                active: false,
                subject: None,
                pointer: None,
                offset: None,
                target: None,
                show_placeholder: false,
            },
            DragState::Dragging(session) => SessionView {
                active: true,
                subject: Some(session.subject.clone()),
                pointer: session.tracker.position(),
                offset: session.tracker.offset(),
                target: session.resolution.target.clone(),
                show_placeholder: session.resolution.show_placeholder,
            },
        }
    }

    /// Feed one input event.
    pub fn apply<L: LayoutQuery + ?Sized>(
        &mut self,
        input: DragInput,
        layout: &L,
    ) -> DragTransition {
        match input {
            DragInput::PointerDown {
                pointer_id,
                position,
                subject,
            } => self.pointer_down(pointer_id, position, subject, layout),
            DragInput::PointerMove {
                pointer_id,
                position,
            } => self.pointer_move(pointer_id, position, layout),
            DragInput::PointerUp {
                pointer_id,
                position,
            } => self.pointer_up(pointer_id, position, layout),
            DragInput::Cancel { reason } => self.cancel(reason),
        }
    }

    /// Pointer-down where the host only knows coordinates; the subject is
    /// found by hit-testing `layout`.
    pub fn pointer_down_at<L: LayoutQuery + ?Sized>(
        &mut self,
        pointer_id: u32,
        position: Point,
        layout: &L,
    ) -> DragTransition {
        if self.is_dragging() {
            return self.noop(NoopReason::SessionAlreadyActive);
        }
        match layout.hit_test(&self.board, position) {
            Some(subject) => self.pointer_down(pointer_id, position, subject, layout),
            None => self.noop(NoopReason::NothingUnderPointer),
        }
    }

    /// Start a session on `subject`. Ignored while another session is active.
    pub fn pointer_down<L: LayoutQuery + ?Sized>(
        &mut self,
        pointer_id: u32,
        position: Point,
        subject: DragSubject,
        layout: &L,
    ) -> DragTransition {
        if self.is_dragging() {
            debug!(pointer_id, "pointer-down ignored: drag already in progress");
            return self.noop(NoopReason::SessionAlreadyActive);
        }
        if subject.is_container() && !self.config.allow_container_reorder {
            return self.noop(NoopReason::ContainerReorderDisabled);
        }
        let exists = match &subject {
            DragSubject::Item { id, .. } => self.board.locate_item(id).is_some(),
            DragSubject::Container { id, .. } => self.board.container(id).is_some(),
        };
        if !exists {
            return self.noop(NoopReason::StaleSource);
        }

        let sequence = self.next_sequence();
        let mut tracker = PointerTracker::new();
        tracker.begin(position);
        let resolution = resolve(
            layout,
            &self.board,
            &subject,
            position,
            self.config.suppress_noop_placeholder,
        );
        debug!(?subject, pointer_id, x = position.x, y = position.y, "drag started");

        self.state = DragState::Dragging(DragSession {
            pointer_id,
            subject: subject.clone(),
            tracker,
            resolution: resolution.clone(),
        });
        DragTransition {
            sequence,
            from: DragPhase::Idle,
            via: None,
            to: DragPhase::Dragging,
            effect: DragEffect::Started {
                subject,
                pointer_id,
                origin: position,
                resolution,
            },
        }
    }

    /// Track a pointer sample and re-resolve the drop target.
    pub fn pointer_move<L: LayoutQuery + ?Sized>(
        &mut self,
        pointer_id: u32,
        position: Point,
        layout: &L,
    ) -> DragTransition {
        let min_distance = self.config.min_move_distance;
        let suppress = self.config.suppress_noop_placeholder;
        let DragState::Dragging(session) = &mut self.state else {
            return self.noop(NoopReason::IdleWithoutActiveDrag);
        };
        if session.pointer_id != pointer_id {
            return self.noop(NoopReason::PointerMismatch);
        }

        session.tracker.update(position);
        let resolved = session.tracker.needs_resolution(min_distance);
        if resolved {
            session.resolution = resolve(layout, &self.board, &session.subject, position, suppress);
            session.tracker.mark_resolved();
        }
        let resolution = session.resolution.clone();

        let sequence = self.next_sequence();
        DragTransition {
            sequence,
            from: DragPhase::Dragging,
            via: None,
            to: DragPhase::Dragging,
            effect: DragEffect::Updated {
                pointer: position,
                resolution,
                resolved,
            },
        }
    }

    /// Finish the gesture: resolve at the release point and commit.
    pub fn pointer_up<L: LayoutQuery + ?Sized>(
        &mut self,
        pointer_id: u32,
        position: Point,
        layout: &L,
    ) -> DragTransition {
        match &self.state {
            DragState::Idle => return self.noop(NoopReason::IdleWithoutActiveDrag),
            DragState::Dragging(session) if session.pointer_id != pointer_id => {
                return self.noop(NoopReason::PointerMismatch);
            }
            DragState::Dragging(_) => {}
        }
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return self.noop(NoopReason::IdleWithoutActiveDrag);
        };

        let resolution = resolve(
            layout,
            &self.board,
            &session.subject,
            position,
            self.config.suppress_noop_placeholder,
        );
        let effect = match resolution.target {
            None => {
                debug!(subject = ?session.subject, "dropped outside every container");
                DragEffect::Dropped {
                    reason: NoopReason::NoTarget,
                }
            }
            Some(target) => match commit(&self.board, &session.subject, &target) {
                CommitOutcome::Moved { board, record } => {
                    let previous = std::mem::replace(&mut self.board, board);
                    for listener in &mut self.listeners {
                        listener.on_commit(&previous, &self.board, &record);
                    }
                    DragEffect::Committed { record }
                }
                CommitOutcome::Unchanged(reason) => {
                    debug!(?reason, ?target, "drop left the board unchanged");
                    DragEffect::Dropped { reason }
                }
            },
        };

        let sequence = self.next_sequence();
        DragTransition {
            sequence,
            from: DragPhase::Dragging,
            via: Some(DragPhase::Committing),
            to: DragPhase::Idle,
            effect,
        }
    }

    /// Abandon the active gesture without touching the board. Idempotent.
    pub fn cancel(&mut self, reason: CancelReason) -> DragTransition {
        if !self.is_dragging() {
            return self.noop(NoopReason::IdleWithoutActiveDrag);
        }
        self.state = DragState::Idle;
        debug!(?reason, "drag cancelled");
        let sequence = self.next_sequence();
        DragTransition {
            sequence,
            from: DragPhase::Dragging,
            via: Some(DragPhase::Cancelled),
            to: DragPhase::Idle,
            effect: DragEffect::Cancelled { reason },
        }
    }

    fn noop(&mut self, reason: NoopReason) -> DragTransition {
        let phase = self.state.phase();
        let sequence = self.next_sequence();
        DragTransition {
            sequence,
            from: phase,
            via: None,
            to: phase,
            effect: DragEffect::Noop { reason },
        }
    }

    const fn next_sequence(&mut self) -> u64 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }
}
