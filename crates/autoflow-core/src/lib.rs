//! autoflow-core library.
//!
//! Drag reorder engine for the AutoFlow board: pointer tracking, drop-target
//! resolution, reorder commit, and the session state machine that ties them
//! together.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at library seams, `anyhow::Result` for config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod commit;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod pointer;
pub mod resolve;
pub mod session;

pub use commit::{CommitOutcome, MoveRecord};
pub use layout::{GridLayout, LayoutQuery, LayoutSnapshot, Point, Rect};
pub use model::{Board, Container, ContainerId, Item, ItemId, ItemPosition, WipStatus};
pub use resolve::{DropTarget, Resolution};
pub use session::{
    CancelReason, CommitListener, DragController, DragEffect, DragInput, DragPhase, DragSubject,
    DragTransition, NoopReason, SessionView,
};
