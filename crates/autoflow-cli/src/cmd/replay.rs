//! `af replay`: drive a recorded gesture script through the drag controller.
//!
//! A script is a JSON array of pointer events. Positions may be given as raw
//! coordinates or anchored to the board (a card, a column header, or an
//! insertion slot); anchors are resolved against the grid layout of the
//! board as it stands when the event is fed in.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context as _;
use autoflow_core::config::EngineConfig;
use autoflow_core::error::BoardError;
use autoflow_core::{
    Board, CancelReason, ContainerId, DragController, DragEffect, DragPhase, DragTransition,
    GridLayout, ItemId, MoveRecord, Point,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cmd::move_cmd::{describe, reason_label};
use crate::cmd::show::BoardView;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Board JSON file.
    pub board: PathBuf,

    /// Gesture script (JSON array of pointer events).
    pub script: PathBuf,

    /// Persist every commit back to the board file.
    #[arg(long)]
    pub write: bool,
}

/// Where a scripted event happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Anchor {
    Point { x: f64, y: f64 },
    /// Centre of a card.
    Card { card: String },
    /// Centre of a column header.
    Header { header: String },
    /// Upper half of the card currently at `index`, i.e. "insert before it".
    /// `index == len` lands in the empty space below the last card.
    Slot { container: String, index: usize },
}

impl Anchor {
    fn resolve(&self, grid: &GridLayout, board: &Board) -> Result<Point, BoardError> {
        match self {
            Self::Point { x, y } => Ok(Point::new(*x, *y)),
            Self::Card { card } => {
                let id = ItemId::from(card.as_str());
                let pos = board
                    .locate_item(&id)
                    .ok_or_else(|| BoardError::ItemNotFound(id.clone()))?;
                let column = column_index(board, &pos.container)?;
                Ok(grid.card_center(column, pos.index))
            }
            Self::Header { header } => {
                let column = column_index(board, &ContainerId::from(header.as_str()))?;
                Ok(grid.header_center(column))
            }
            Self::Slot { container, index } => {
                let column = column_index(board, &ContainerId::from(container.as_str()))?;
                let cfg = grid.config();
                Ok(Point::new(
                    grid.column_left(column) + cfg.column_width / 2.0,
                    grid.card_top(*index) + cfg.card_height / 2.0 - 1.0,
                ))
            }
        }
    }
}

fn column_index(board: &Board, id: &ContainerId) -> Result<usize, BoardError> {
    board
        .container_index(id)
        .ok_or_else(|| BoardError::ContainerNotFound(id.clone()))
}

const fn default_pointer_id() -> u32 {
    1
}

const fn default_cancel_reason() -> CancelReason {
    CancelReason::EscapeKey
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptStep {
    PointerDown {
        #[serde(default = "default_pointer_id")]
        pointer_id: u32,
        at: Anchor,
    },
    PointerMove {
        #[serde(default = "default_pointer_id")]
        pointer_id: u32,
        at: Anchor,
    },
    PointerUp {
        #[serde(default = "default_pointer_id")]
        pointer_id: u32,
        at: Anchor,
    },
    Cancel {
        #[serde(default = "default_cancel_reason")]
        reason: CancelReason,
    },
}

impl ScriptStep {
    const fn anchor(&self) -> Option<&Anchor> {
        match self {
            Self::PointerDown { at, .. }
            | Self::PointerMove { at, .. }
            | Self::PointerUp { at, .. } => Some(at),
            Self::Cancel { .. } => None,
        }
    }
}

/// Parse a gesture script.
///
/// # Errors
///
/// Returns an error when the file cannot be read or is not a valid script.
pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptStep>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read gesture script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse gesture script {}", path.display()))
}

/// Result of a replay as returned in JSON output.
#[derive(Debug, Serialize)]
pub struct ReplayOutput {
    pub transitions: Vec<DragTransition>,
    pub commits: usize,
    pub written: bool,
    pub board: BoardView,
    #[serde(skip)]
    quiet: bool,
}

fn effect_label(effect: &DragEffect) -> String {
    match effect {
        DragEffect::Started { .. } => "started".to_string(),
        DragEffect::Updated { resolved, .. } => {
            if *resolved {
                "updated".to_string()
            } else {
                "updated(jitter)".to_string()
            }
        }
        DragEffect::Committed { record } => format!("committed({})", describe(record)),
        DragEffect::Dropped { reason } => format!("dropped({})", reason_label(*reason)),
        DragEffect::Cancelled { reason } => format!("cancelled({})", cancel_label(*reason)),
        DragEffect::Noop { reason } => format!("noop({})", reason_label(*reason)),
    }
}

const fn cancel_label(reason: CancelReason) -> &'static str {
    match reason {
        CancelReason::EscapeKey => "escape_key",
        CancelReason::LeftTrackedArea => "left_tracked_area",
        CancelReason::Unmounted => "unmounted",
        CancelReason::Host => "host",
    }
}

const fn phase_name(phase: DragPhase) -> &'static str {
    match phase {
        DragPhase::Idle => "idle",
        DragPhase::Dragging => "dragging",
        DragPhase::Committing => "committing",
        DragPhase::Cancelled => "cancelled",
    }
}

fn phase_label(transition: &DragTransition) -> String {
    let from = phase_name(transition.from);
    let to = phase_name(transition.to);
    transition.via.map_or_else(
        || format!("{from}>{to}"),
        |via| format!("{from}>{}>{to}", phase_name(via)),
    )
}

impl ReplayOutput {
    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for t in &self.transitions {
            writeln!(
                w,
                "transition seq={} from={} to={} effect={}",
                t.sequence,
                phase_name(t.from),
                phase_name(t.to),
                effect_label(&t.effect)
            )?;
        }
        writeln!(w, "commits={} written={}", self.commits, self.written)?;
        if !self.quiet {
            self.board.write_text(w)?;
        }
        Ok(())
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("Replay ({} events)", self.transitions.len()))?;
        for t in &self.transitions {
            writeln!(
                w,
                "  {:>3}  {:<28} {}",
                t.sequence,
                phase_label(t),
                effect_label(&t.effect)
            )?;
        }
        writeln!(w)?;
        pretty_kv(w, "Commits", self.commits.to_string())?;
        if self.written {
            pretty_kv(w, "Saved", "board file updated")?;
        }
        if !self.quiet {
            writeln!(w)?;
            self.board.write_pretty(w)?;
        }
        Ok(())
    }
}

type SaveFailure = Rc<RefCell<Option<(Board, BoardError)>>>;

pub fn run_replay(
    args: &ReplayArgs,
    engine: &EngineConfig,
    output: OutputMode,
    quiet: bool,
) -> anyhow::Result<()> {
    let board = super::load_board(&args.board, output)?;
    let script = load_script(&args.script)?;
    let grid = GridLayout::new(engine.layout);
    let mut controller = DragController::new(board, engine.drag);

    let failure: SaveFailure = Rc::new(RefCell::new(None));
    if args.write {
        let path = args.board.clone();
        let slot = Rc::clone(&failure);
        controller.subscribe(move |previous: &Board, next: &Board, record: &MoveRecord| {
            if let Err(err) = next.save_json(&path) {
                *slot.borrow_mut() = Some((previous.clone(), err));
            } else {
                info!(path = %path.display(), record = %describe(record), "board saved");
            }
        });
    }

    let mut transitions = Vec::with_capacity(script.len());
    for step in script {
        let layout = grid.layout(controller.board());
        let point = step
            .anchor()
            .map(|anchor| anchor.resolve(&grid, controller.board()))
            .transpose()
            .map_err(|err| super::fail_board(output, err))?
            .unwrap_or_default();
        let transition = match step {
            ScriptStep::PointerDown { pointer_id, .. } => {
                controller.pointer_down_at(pointer_id, point, &layout)
            }
            ScriptStep::PointerMove { pointer_id, .. } => {
                controller.pointer_move(pointer_id, point, &layout)
            }
            ScriptStep::PointerUp { pointer_id, .. } => {
                controller.pointer_up(pointer_id, point, &layout)
            }
            ScriptStep::Cancel { reason } => controller.cancel(reason),
        };

        let failed = failure.borrow_mut().take();
        if let Some((previous, err)) = failed {
            warn!(%err, "persisting commit failed; rolling back");
            controller.replace_board(previous);
            return Err(super::fail_board(output, err));
        }
        transitions.push(transition);
    }

    let commits = transitions.iter().filter(|t| t.is_commit()).count();
    let out = ReplayOutput {
        written: args.write && commits > 0,
        commits,
        transitions,
        board: BoardView::from_board(controller.board()),
        quiet,
    };
    render_mode(
        output,
        &out,
        ReplayOutput::write_text,
        ReplayOutput::write_pretty,
    )
}
