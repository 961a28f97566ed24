//! `af move` / `af move-column`: apply a reorder directly, without a gesture.

use crate::cmd::show::BoardView;
use crate::output::{OutputMode, pretty_kv, render_mode};
use autoflow_core::commit::{commit_container_move, commit_item_move};
use autoflow_core::error::{BoardError, ErrorCode};
use autoflow_core::{Board, CommitOutcome, ContainerId, ItemId, MoveRecord, NoopReason};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Board JSON file.
    pub board: PathBuf,

    /// Card ID to move.
    #[arg(long)]
    pub item: String,

    /// Destination column ID.
    #[arg(long)]
    pub to: String,

    /// Insert before the card currently at this index (default: append).
    #[arg(long)]
    pub index: Option<usize>,

    /// Write the result back to the board file.
    #[arg(long)]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct MoveColumnArgs {
    /// Board JSON file.
    pub board: PathBuf,

    /// Column ID to move.
    #[arg(long)]
    pub container: String,

    /// Insert before the column currently at this index.
    #[arg(long)]
    pub index: usize,

    /// Write the result back to the board file.
    #[arg(long)]
    pub write: bool,
}

/// Result of a direct move as returned in JSON output.
#[derive(Debug, Serialize)]
pub struct MoveOutput {
    pub moved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<MoveRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NoopReason>,
    pub written: bool,
    pub board: BoardView,
    #[serde(skip)]
    quiet: bool,
}

impl MoveOutput {
    fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        match (&self.record, self.reason) {
            (Some(record), _) => {
                writeln!(w, "moved {} written={}", describe(record), self.written)?;
            }
            (None, Some(reason)) => {
                writeln!(w, "unchanged reason={}", reason_label(reason))?;
            }
            (None, None) => writeln!(w, "unchanged")?,
        }
        if !self.quiet {
            self.board.write_text(w)?;
        }
        Ok(())
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        match (&self.record, self.reason) {
            (Some(record), _) => pretty_kv(w, "Moved", describe(record))?,
            (None, reason) => pretty_kv(w, "Unchanged", reason.map_or("no-op", reason_label))?,
        }
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

/// One-line `id: from -> to` summary of a move.
pub fn describe(record: &MoveRecord) -> String {
    match record {
        MoveRecord::Item { id, from, to } => format!(
            "{id}: {}[{}] -> {}[{}]",
            from.container, from.index, to.container, to.index
        ),
        MoveRecord::Container { id, from, to } => format!("{id}: column {from} -> {to}"),
    }
}

/// Stable snake_case label, matching the JSON encoding.
pub const fn reason_label(reason: NoopReason) -> &'static str {
    match reason {
        NoopReason::IdleWithoutActiveDrag => "idle_without_active_drag",
        NoopReason::SessionAlreadyActive => "session_already_active",
        NoopReason::PointerMismatch => "pointer_mismatch",
        NoopReason::NothingUnderPointer => "nothing_under_pointer",
        NoopReason::ContainerReorderDisabled => "container_reorder_disabled",
        NoopReason::NoTarget => "no_target",
        NoopReason::SamePosition => "same_position",
        NoopReason::StaleSource => "stale_source",
        NoopReason::StaleTarget => "stale_target",
        NoopReason::TargetKindMismatch => "target_kind_mismatch",
    }
}

fn finish(
    outcome: CommitOutcome,
    original: &Board,
    path: &Path,
    write: bool,
    output: OutputMode,
    quiet: bool,
) -> anyhow::Result<()> {
    let (board, record, reason) = match outcome {
        CommitOutcome::Moved { board, record } => (board, Some(record), None),
        CommitOutcome::Unchanged(reason) => (original.clone(), None, Some(reason)),
    };
    let written = write && record.is_some();
    if written {
        super::save_board(&board, path, output)?;
        tracing::info!(path = %path.display(), "board saved");
    }
    let out = MoveOutput {
        moved: record.is_some(),
        record,
        reason,
        written,
        board: BoardView::from_board(&board),
        quiet,
    };
    render_mode(output, &out, MoveOutput::write_text, MoveOutput::write_pretty)
}

pub fn run_move(args: &MoveArgs, output: OutputMode, quiet: bool) -> anyhow::Result<()> {
    let board = super::load_board(&args.board, output)?;
    let item = ItemId::from(args.item.as_str());
    let to = ContainerId::from(args.to.as_str());

    let Some(origin) = board.locate_item(&item) else {
        return Err(super::fail_board(output, BoardError::ItemNotFound(item)));
    };
    let Some(target) = board.container(&to) else {
        return Err(super::fail_board(output, BoardError::ContainerNotFound(to)));
    };
    let len = target.len();
    let index = args.index.unwrap_or(len);
    if index > len {
        return Err(super::fail_code(
            output,
            ErrorCode::IndexOutOfRange,
            format!("index {index} is past the end of `{to}` (len {len})"),
        ));
    }

    let outcome = commit_item_move(&board, &item, &origin, &to, index);
    finish(outcome, &board, &args.board, args.write, output, quiet)
}

pub fn run_move_column(
    args: &MoveColumnArgs,
    output: OutputMode,
    quiet: bool,
) -> anyhow::Result<()> {
    let board = super::load_board(&args.board, output)?;
    let id = ContainerId::from(args.container.as_str());

    let Some(origin) = board.container_index(&id) else {
        return Err(super::fail_board(output, BoardError::ContainerNotFound(id)));
    };
    if args.index > board.len() {
        return Err(super::fail_code(
            output,
            ErrorCode::IndexOutOfRange,
            format!(
                "index {} is past the last column (len {})",
                args.index,
                board.len()
            ),
        ));
    }

    let outcome = commit_container_move(&board, &id, origin, args.index);
    finish(outcome, &board, &args.board, args.write, output, quiet)
}
