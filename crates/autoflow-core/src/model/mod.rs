//! Board data model: items, containers (columns), and the board itself.

mod board;
mod container;
mod item;

pub use board::{Board, ItemPosition};
pub use container::{Container, ContainerId, WipStatus};
pub use item::{Item, ItemId};
