use serde::{Deserialize, Serialize};
use std::fmt;

use super::item::{Item, ItemId};

/// Stable identifier of a column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ContainerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Advisory work-in-progress status of a container.
///
/// Only the rendering layer reads this. A drop that pushes a column over its
/// limit is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipStatus {
    Unlimited,
    Under,
    AtLimit,
    Over,
}

impl WipStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unlimited => "unlimited",
            Self::Under => "under",
            Self::AtLimit => "at_limit",
            Self::Over => "over",
        }
    }

    /// Whether the rendering layer should draw a warning.
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::Over)
    }
}

impl fmt::Display for WipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column: an ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
}

impl Container {
    #[must_use]
    pub fn new(id: impl Into<ContainerId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Vec::new(),
            wip_limit: None,
        }
    }

    #[must_use]
    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items);
        self
    }

    #[must_use]
    pub const fn with_wip_limit(mut self, limit: usize) -> Self {
        self.wip_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of `item` within this container, if present.
    #[must_use]
    pub fn position_of(&self, item: &ItemId) -> Option<usize> {
        self.items.iter().position(|candidate| &candidate.id == item)
    }

    /// Evaluate the advisory WIP limit against the current item count.
    #[must_use]
    pub fn wip_status(&self) -> WipStatus {
        match self.wip_limit {
            None => WipStatus::Unlimited,
            Some(limit) => match self.items.len().cmp(&limit) {
                std::cmp::Ordering::Less => WipStatus::Under,
                std::cmp::Ordering::Equal => WipStatus::AtLimit,
                std::cmp::Ordering::Greater => WipStatus::Over,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(n: usize) -> Container {
        Container::new("doing", "Doing")
            .with_items((0..n).map(|i| Item::new(format!("c{i}"), format!("Card {i}"))))
    }

    #[test]
    fn wip_status_without_limit_is_unlimited() {
        assert_eq!(column(12).wip_status(), WipStatus::Unlimited);
    }

    #[test]
    fn wip_status_tracks_limit() {
        assert_eq!(column(1).with_wip_limit(2).wip_status(), WipStatus::Under);
        assert_eq!(column(2).with_wip_limit(2).wip_status(), WipStatus::AtLimit);
        let over = column(3).with_wip_limit(2).wip_status();
        assert_eq!(over, WipStatus::Over);
        assert!(over.is_warning());
    }

    #[test]
    fn position_of_finds_items() {
        let c = column(3);
        assert_eq!(c.position_of(&ItemId::from("c2")), Some(2));
        assert_eq!(c.position_of(&ItemId::from("missing")), None);
    }
}
