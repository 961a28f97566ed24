//! `af show`: print a board with per-column WIP status.

use crate::output::{OutputMode, pretty_section, render_mode};
use autoflow_core::{Board, WipStatus};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Board JSON file.
    pub board: PathBuf,
}

/// Board summary as returned in JSON output.
#[derive(Debug, Serialize)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
    pub item_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ColumnView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
    pub wip_status: WipStatus,
    pub items: Vec<CardView>,
}

#[derive(Debug, Serialize)]
pub struct CardView {
    pub id: String,
    pub title: String,
}

impl BoardView {
    pub fn from_board(board: &Board) -> Self {
        let columns = board
            .containers
            .iter()
            .map(|c| ColumnView {
                id: c.id.to_string(),
                title: c.title.clone(),
                wip_limit: c.wip_limit,
                wip_status: c.wip_status(),
                items: c
                    .items
                    .iter()
                    .map(|item| CardView {
                        id: item.id.to_string(),
                        title: item.title.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            columns,
            item_count: board.item_count(),
        }
    }

    pub fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for column in &self.columns {
            writeln!(
                w,
                "column id={} items={} wip={} title={:?}",
                column.id,
                column.items.len(),
                column.wip_status,
                column.title
            )?;
            for (index, card) in column.items.iter().enumerate() {
                writeln!(
                    w,
                    "item column={} index={index} id={} title={:?}",
                    column.id, card.id, card.title
                )?;
            }
        }
        Ok(())
    }

    pub fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(
            w,
            &format!(
                "Board ({} columns, {} cards)",
                self.columns.len(),
                self.item_count
            ),
        )?;
        for column in &self.columns {
            let limit = column
                .wip_limit
                .map_or_else(String::new, |limit| format!(" [{}/{limit}]", column.items.len()));
            let warn = if column.wip_status.is_warning() {
                "  (over WIP limit)"
            } else {
                ""
            };
            writeln!(w, "{}  {}{limit}{warn}", column.id, column.title)?;
            if column.items.is_empty() {
                writeln!(w, "    (empty)")?;
            }
            for (index, card) in column.items.iter().enumerate() {
                writeln!(w, "  {index:>3}  {:<12} {}", card.id, card.title)?;
            }
        }
        Ok(())
    }
}

pub fn run_show(args: &ShowArgs, output: OutputMode) -> anyhow::Result<()> {
    let board = super::load_board(&args.board, output)?;
    let view = BoardView::from_board(&board);
    render_mode(output, &view, BoardView::write_text, BoardView::write_pretty)
}
