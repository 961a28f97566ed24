//! Geometry of droppable regions.
//!
//! The resolver never looks at a UI tree directly. Hosts describe what is on
//! screen through [`LayoutQuery`]: one [`DroppableRegion`] per visible
//! column, each with its header box and the boxes of its visible cards.
//! Browser hosts fill a [`LayoutSnapshot`] from bounding rectangles; headless
//! hosts (the CLI and the simulator) use [`GridLayout`].

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::model::{Board, Container, ContainerId, ItemId};
use crate::session::DragSubject;

/// Screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned bounding box. `left`/`top` inclusive, `right`/`bottom` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn mid_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    #[must_use]
    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    #[must_use]
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.left && x < self.right()
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.contains_x(point.x) && point.y >= self.top && point.y < self.bottom()
    }
}

/// A visible card inside a droppable column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRegion {
    pub item: ItemId,
    pub bounds: Rect,
}

/// A visible column that accepts drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppableRegion {
    pub container: ContainerId,
    /// Whole column, header included.
    pub bounds: Rect,
    /// Drag handle used to reorder columns.
    pub header: Rect,
    pub items: Vec<ItemRegion>,
}

/// Source of droppable-region geometry for one resolution pass.
pub trait LayoutQuery {
    /// Every droppable region currently visible, in any order.
    fn droppable_regions(&self) -> &[DroppableRegion];

    /// Map a pointer-down position to the draggable under it.
    ///
    /// Cards win over headers. Regions whose container or card is missing
    /// from `board` are skipped, so a stale layout never yields a subject the
    /// board cannot resolve.
    fn hit_test(&self, board: &Board, point: Point) -> Option<DragSubject> {
        for region in self.droppable_regions() {
            let Some(container) = board.container(&region.container) else {
                continue;
            };
            for card in &region.items {
                if card.bounds.contains(point)
                    && let Some(index) = container.position_of(&card.item)
                {
                    return Some(DragSubject::Item {
                        id: card.item.clone(),
                        container: region.container.clone(),
                        index,
                    });
                }
            }
            if region.header.contains(point)
                && let Some(index) = board.container_index(&region.container)
            {
                return Some(DragSubject::Container {
                    id: region.container.clone(),
                    index,
                });
            }
        }
        None
    }
}

/// Owned list of regions captured for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub regions: Vec<DroppableRegion>,
}

impl LayoutSnapshot {
    #[must_use]
    pub const fn new(regions: Vec<DroppableRegion>) -> Self {
        Self { regions }
    }

    /// Drop a column from the snapshot, as when its element unmounts mid-drag.
    pub fn remove_container(&mut self, id: &ContainerId) {
        self.regions.retain(|region| &region.container != id);
    }
}

impl LayoutQuery for LayoutSnapshot {
    fn droppable_regions(&self) -> &[DroppableRegion] {
        &self.regions
    }
}

/// Fixed-size grid layout: columns side by side, cards stacked top-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    config: LayoutConfig,
}

impl GridLayout {
    #[must_use]
    pub const fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Left edge of column `index`.
    #[must_use]
    pub fn column_left(&self, index: usize) -> f64 {
        self.config.origin_x + slot(index) * (self.config.column_width + self.config.column_gap)
    }

    /// Top edge of card `index` within any column.
    #[must_use]
    pub fn card_top(&self, index: usize) -> f64 {
        self.config.origin_y
            + self.config.header_height
            + self.config.card_gap
            + slot(index) * (self.config.card_height + self.config.card_gap)
    }

    /// Centre of card `index` in column `column`.
    #[must_use]
    pub fn card_center(&self, column: usize, index: usize) -> Point {
        Point::new(
            self.column_left(column) + self.config.column_width / 2.0,
            self.card_top(index) + self.config.card_height / 2.0,
        )
    }

    /// Centre of the header of column `column`.
    #[must_use]
    pub fn header_center(&self, column: usize) -> Point {
        Point::new(
            self.column_left(column) + self.config.column_width / 2.0,
            self.config.origin_y + self.config.header_height / 2.0,
        )
    }

    /// Lay every column of `board` out on the grid.
    ///
    /// All columns share the height of the tallest one plus one empty card
    /// slot, so there is always room below the last card to append.
    #[must_use]
    pub fn layout(&self, board: &Board) -> LayoutSnapshot {
        let cfg = &self.config;
        let tallest = board.containers.iter().map(Container::len).max().unwrap_or(0);
        let height = self.card_top(tallest + 1) - cfg.origin_y;

        let regions = board
            .containers
            .iter()
            .enumerate()
            .map(|(column, container)| {
                let left = self.column_left(column);
                let items = container
                    .items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| ItemRegion {
                        item: item.id.clone(),
                        bounds: Rect::new(
                            left,
                            self.card_top(index),
                            cfg.column_width,
                            cfg.card_height,
                        ),
                    })
                    .collect();
                DroppableRegion {
                    container: container.id.clone(),
                    bounds: Rect::new(left, cfg.origin_y, cfg.column_width, height),
                    header: Rect::new(left, cfg.origin_y, cfg.column_width, cfg.header_height),
                    items,
                }
            })
            .collect();

        LayoutSnapshot::new(regions)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

#[allow(clippy::cast_precision_loss)]
fn slot(index: usize) -> f64 {
    index as f64
}
