use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::container::{Container, ContainerId};
use super::item::ItemId;
use crate::error::BoardError;

/// Where an item currently sits on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemPosition {
    pub container: ContainerId,
    pub index: usize,
}

/// The full ordered collection of columns.
///
/// Boards are treated as values: the committer always builds a new `Board`
/// and the controller swaps it in whole, so observers can compare the old
/// and new values directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl Board {
    #[must_use]
    pub fn new(containers: impl IntoIterator<Item = Container>) -> Self {
        Self {
            containers: containers.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    #[must_use]
    pub fn container(&self, id: &ContainerId) -> Option<&Container> {
        self.containers.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn container_index(&self, id: &ContainerId) -> Option<usize> {
        self.containers.iter().position(|c| &c.id == id)
    }

    /// Find an item anywhere on the board.
    #[must_use]
    pub fn locate_item(&self, item: &ItemId) -> Option<ItemPosition> {
        self.containers.iter().find_map(|container| {
            container.position_of(item).map(|index| ItemPosition {
                container: container.id.clone(),
                index,
            })
        })
    }

    /// Total number of items across every container.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.containers.iter().map(Container::len).sum()
    }

    /// Multiset of item ids across the board.
    #[must_use]
    pub fn item_multiset(&self) -> BTreeMap<ItemId, usize> {
        let mut counts = BTreeMap::new();
        for item in self.containers.iter().flat_map(|c| c.items.iter()) {
            *counts.entry(item.id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Item ids of one container, in order. Handy for assertions and output.
    #[must_use]
    pub fn item_ids(&self, container: &ContainerId) -> Option<Vec<&str>> {
        self.container(container)
            .map(|c| c.items.iter().map(|item| item.id.as_str()).collect())
    }

    /// Check that container ids and item ids are unique.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate found.
    pub fn validate(&self) -> Result<(), BoardError> {
        let mut containers = HashSet::new();
        let mut items = HashSet::new();
        for container in &self.containers {
            if !containers.insert(&container.id) {
                return Err(BoardError::DuplicateContainer(container.id.clone()));
            }
            for item in &container.items {
                if !items.insert(&item.id) {
                    return Err(BoardError::DuplicateItem(item.id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a board from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or ids are duplicated.
    pub fn from_json_str(raw: &str) -> Result<Self, BoardError> {
        let board: Self = serde_json::from_str(raw).map_err(BoardError::InvalidJson)?;
        board.validate()?;
        Ok(board)
    }

    /// Load and validate a board from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed, or when ids
    /// are duplicated.
    pub fn load_json(path: &Path) -> Result<Self, BoardError> {
        let content = std::fs::read_to_string(path).map_err(|source| BoardError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let board: Self = serde_json::from_str(&content).map_err(|source| BoardError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        board.validate()?;
        tracing::debug!(
            path = %path.display(),
            containers = board.len(),
            items = board.item_count(),
            "loaded board"
        );
        Ok(board)
    }

    /// Write the board as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save_json(&self, path: &Path) -> Result<(), BoardError> {
        let write_err = |source| BoardError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|err| write_err(std::io::Error::other(err)))?;
        json.push('\n');
        std::fs::write(path, json).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;

    fn sample() -> Board {
        Board::new([
            Container::new("todo", "To do")
                .with_items([Item::new("1", "One"), Item::new("2", "Two")]),
            Container::new("done", "Done").with_items([Item::new("3", "Three")]),
        ])
    }

    #[test]
    fn locate_item_reports_container_and_index() {
        let board = sample();
        let pos = board.locate_item(&ItemId::from("3")).expect("item 3 exists");
        assert_eq!(pos.container.as_str(), "done");
        assert_eq!(pos.index, 0);
        assert!(board.locate_item(&ItemId::from("9")).is_none());
    }

    #[test]
    fn validate_rejects_duplicate_items_across_containers() {
        let mut board = sample();
        board.containers[1].items.push(Item::new("1", "Dup"));
        let err = board.validate().expect_err("duplicate must fail");
        assert!(matches!(err, BoardError::DuplicateItem(id) if id.as_str() == "1"));
    }

    #[test]
    fn validate_rejects_duplicate_containers() {
        let mut board = sample();
        board.containers.push(Container::new("todo", "Again"));
        assert!(matches!(
            board.validate(),
            Err(BoardError::DuplicateContainer(_))
        ));
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("board.json");
        let board = sample();
        board.save_json(&path).expect("save");
        let loaded = Board::load_json(&path).expect("load");
        assert_eq!(loaded, board);
    }

    #[test]
    fn load_json_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Board::load_json(&dir.path().join("nope.json")).expect_err("missing");
        assert!(matches!(err, BoardError::Read { .. }));
    }

    #[test]
    fn multiset_counts_every_item() {
        let board = sample();
        let counts = board.item_multiset();
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|n| *n == 1));
        assert_eq!(board.item_count(), 3);
    }
}
