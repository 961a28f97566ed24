//! autoflow-sim library.
//!
//! Deterministic gesture simulation for the drag reorder engine. A seed
//! fixes the starting board and every gesture played against it; the
//! [`oracle`] then checks each gesture against the reorder invariants and
//! an independent reference model.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod campaign;
pub mod gesture;
pub mod oracle;
pub mod rng;

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Result, bail};
use autoflow_core::config::{DragConfig, EngineConfig, LayoutConfig};
use autoflow_core::resolve::resolve;
use autoflow_core::{
    Board, Container, DragController, DragEffect, DragSubject, DragTransition, DropTarget,
    GridLayout, Item, MoveRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::gesture::{GestureEnding, GesturePlan, plan_gesture};
use crate::rng::DeterministicRng;

/// Pointer ids used for injected stray input sit this far above the owner's.
const STRAY_POINTER_OFFSET: u32 = 10_000;

/// Parameters for one simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Number of columns on the generated board.
    pub containers: usize,
    /// Number of cards, spread randomly across columns.
    pub items: usize,
    /// Number of gestures played against the board.
    pub gestures: usize,
    /// Upper bound on pointer-move samples per gesture.
    pub max_moves: usize,
    /// Chance a gesture grabs a column header instead of a card (percent, 0–100).
    pub column_drag_percent: u8,
    /// Chance a gesture ends in a cancel instead of a release (percent, 0–100).
    pub cancel_percent: u8,
    /// Chance a release lands outside every column (percent, 0–100).
    pub outside_drop_percent: u8,
    /// Chance of a stray pointer-down and, separately, a foreign pointer move (percent, 0–100).
    pub stray_pointer_percent: u8,
    /// Chance the column under the release is removed mid-drag (percent, 0–100).
    pub stale_percent: u8,
    pub drag: DragConfig,
    pub layout: LayoutConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            containers: 4,
            items: 12,
            gestures: 32,
            max_moves: 6,
            column_drag_percent: 15,
            cancel_percent: 15,
            outside_drop_percent: 10,
            stray_pointer_percent: 20,
            stale_percent: 10,
            drag: DragConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.containers == 0 {
            bail!("containers must be > 0");
        }
        if self.gestures == 0 {
            bail!("gestures must be > 0");
        }
        if self.max_moves == 0 {
            bail!("max_moves must be > 0");
        }
        let percents = [
            ("column_drag_percent", self.column_drag_percent),
            ("cancel_percent", self.cancel_percent),
            ("outside_drop_percent", self.outside_drop_percent),
            ("stray_pointer_percent", self.stray_pointer_percent),
            ("stale_percent", self.stale_percent),
        ];
        for (key, value) in percents {
            if value > 100 {
                bail!("{key} must be <= 100");
            }
        }
        EngineConfig {
            drag: self.drag,
            layout: self.layout,
        }
        .validate()
    }
}

/// One controller transition, tagged with the gesture that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub gesture: usize,
    pub transition: DragTransition,
}

/// Outcome of a pointer-down injected while a drag was live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrayProbe {
    pub effect: DragEffect,
    pub subject_before: Option<DragSubject>,
    pub subject_after: Option<DragSubject>,
}

/// Everything the oracle needs to judge one gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureRecord {
    pub index: usize,
    pub plan: GesturePlan,
    /// Subject of the session, `None` if the pointer-down did not start one.
    pub subject: Option<DragSubject>,
    pub stray: Option<StrayProbe>,
    /// Board right before the release or cancel, after any external edit.
    pub before_up: Board,
    /// Target at the release point, resolved against `before_up`.
    pub up_target: Option<DropTarget>,
    /// `false` when the gesture was cancelled.
    pub released: bool,
    pub ending_effect: DragEffect,
    pub after: Board,
    /// Listener notifications observed during the gesture.
    pub commits_delta: u64,
    pub dragging_after: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub trace: Vec<TraceEvent>,
    pub gestures: Vec<GestureRecord>,
    pub initial_board: Board,
    pub final_board: Board,
    pub commits: u64,
    /// Whether the run hit a mid-drag external edit or moved a column.
    pub interesting_state_reached: bool,
}

impl SimulationResult {
    /// Moves committed during the run, in order.
    #[must_use]
    pub fn moves(&self) -> Vec<&MoveRecord> {
        self.trace
            .iter()
            .filter_map(|event| match &event.transition.effect {
                DragEffect::Committed { record } => Some(record),
                _ => None,
            })
            .collect()
    }

    /// FNV-1a over the serialized trace; equal runs give equal fingerprints.
    #[must_use]
    pub fn trace_fingerprint(&self) -> u64 {
        let bytes = serde_json::to_vec(&self.trace).unwrap_or_default();
        bytes.iter().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

/// Plays seeded gestures against a [`DragController`].
#[derive(Debug)]
pub struct Simulator {
    config: SimulationConfig,
    rng: DeterministicRng,
    grid: GridLayout,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: DeterministicRng::new(config.seed),
            grid: GridLayout::new(config.layout),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run every gesture and collect the trace.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated board is malformed.
    pub fn run(&mut self) -> Result<SimulationResult> {
        let initial_board = self.generate_board();
        initial_board.validate()?;

        let commits = Rc::new(Cell::new(0_u64));
        let counter = Rc::clone(&commits);
        let mut controller = DragController::new(initial_board.clone(), self.config.drag);
        controller.subscribe(move |_: &Board, _: &Board, _: &MoveRecord| {
            counter.set(counter.get() + 1);
        });

        let mut trace = Vec::new();
        let mut gestures = Vec::with_capacity(self.config.gestures);
        let mut interesting_state_reached = false;

        for index in 0..self.config.gestures {
            let pointer_id = u32::try_from(index % 1_000).unwrap_or(0) + 1;
            let board = controller.board().clone();
            let plan = plan_gesture(&mut self.rng, &board, &self.grid, &self.config, pointer_id);
            let record = self.play(&mut controller, &commits, index, plan, &mut trace);

            if record.subject.is_some() && record.plan.stale_container.is_some() {
                interesting_state_reached = true;
            }
            if matches!(
                record.ending_effect,
                DragEffect::Committed {
                    record: MoveRecord::Container { .. }
                }
            ) {
                interesting_state_reached = true;
            }
            gestures.push(record);
        }

        let final_board = controller.into_board();
        info!(
            seed = self.config.seed,
            gestures = gestures.len(),
            commits = commits.get(),
            "simulation finished"
        );

        Ok(SimulationResult {
            seed: self.config.seed,
            trace,
            gestures,
            initial_board,
            final_board,
            commits: commits.get(),
            interesting_state_reached,
        })
    }

    fn play(
        &self,
        controller: &mut DragController,
        commits: &Rc<Cell<u64>>,
        index: usize,
        plan: GesturePlan,
        trace: &mut Vec<TraceEvent>,
    ) -> GestureRecord {
        let mut push = |transition: DragTransition| {
            trace.push(TraceEvent {
                gesture: index,
                transition,
            });
        };
        let commits_before = commits.get();
        let mut layout = self.grid.layout(controller.board());

        push(controller.pointer_down_at(plan.pointer_id, plan.start, &layout));
        let subject = controller.view().subject;

        for &point in &plan.path {
            push(controller.pointer_move(plan.pointer_id, point, &layout));
        }

        // Only probe while a session is live; otherwise the stray would own it.
        let stray = plan.stray_down.filter(|_| subject.is_some()).map(|point| {
            let subject_before = controller.view().subject;
            let transition =
                controller.pointer_down_at(plan.pointer_id + STRAY_POINTER_OFFSET, point, &layout);
            let probe = StrayProbe {
                effect: transition.effect.clone(),
                subject_before,
                subject_after: controller.view().subject,
            };
            push(transition);
            probe
        });
        if let Some(point) = plan.foreign_move {
            push(controller.pointer_move(plan.pointer_id + STRAY_POINTER_OFFSET, point, &layout));
        }

        let removed = match (&plan.stale_container, &subject) {
            (Some(id), Some(_)) => {
                let mut edited = controller.board().clone();
                let removed = edited
                    .container_index(id)
                    .map(|at| (at, edited.containers.remove(at)));
                controller.replace_board(edited);
                if plan.stale_unmount {
                    layout.remove_container(id);
                }
                debug!(
                    gesture = index,
                    container = %id,
                    unmount = plan.stale_unmount,
                    "external edit mid-drag"
                );
                removed
            }
            _ => None,
        };

        let before_up = controller.board().clone();
        let (up_target, released, ending) = match plan.ending {
            GestureEnding::Cancel { reason } => (None, false, controller.cancel(reason)),
            GestureEnding::Drop | GestureEnding::OutsideDrop { .. } => {
                let release = plan.release_point().unwrap_or(plan.start);
                let up_target = subject.as_ref().and_then(|s| {
                    resolve(
                        &layout,
                        &before_up,
                        s,
                        release,
                        self.config.drag.suppress_noop_placeholder,
                    )
                    .target
                });
                (up_target, true, controller.pointer_up(plan.pointer_id, release, &layout))
            }
        };
        let ending_effect = ending.effect.clone();
        push(ending);

        let after = controller.board().clone();
        let dragging_after = controller.is_dragging();
        let commits_delta = commits.get() - commits_before;

        if let Some((at, container)) = removed {
            let mut restored = controller.board().clone();
            let at = at.min(restored.len());
            restored.containers.insert(at, container);
            controller.replace_board(restored);
        }

        GestureRecord {
            index,
            plan,
            subject,
            stray,
            before_up,
            up_target,
            released,
            ending_effect,
            after,
            commits_delta,
            dragging_after,
        }
    }

    fn generate_board(&mut self) -> Board {
        let mut containers: Vec<Container> = (0..self.config.containers)
            .map(|c| Container::new(format!("c{c}"), format!("Column {c}")))
            .collect();
        for i in 0..self.config.items {
            let column = self.rng.index(containers.len());
            if let Some(container) = containers.get_mut(column) {
                container
                    .items
                    .push(Item::new(format!("i{i}"), format!("Card {i}")));
            }
        }
        Board::new(containers)
    }
}
