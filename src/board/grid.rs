//! Board layout over the canonical value tiers

use itertools::Itertools;
use serde::Serialize;

use super::GameDocument;
use crate::constants::board::VALUE_TIERS;

/// One cell of the board
///
/// A cell is blocked both when its category has no clue for the tier and
/// when that clue was already played; the two cases look the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cell {
    /// The cell can be selected for the given value
    Playable(i64),
    /// The cell cannot be selected
    Blocked,
}

/// The board as presented to the players
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardMessage {
    /// Category headers, upper-cased, in column order
    pub categories: Vec<String>,
    /// One row per tier, each with one cell per category
    pub rows: Vec<Vec<Cell>>,
}

impl BoardMessage {
    /// Lays out a document as a grid of tiers × categories
    pub fn layout(document: &GameDocument) -> Self {
        let categories = document
            .categories()
            .iter()
            .map(|category| category.title().to_uppercase())
            .collect_vec();

        let rows = VALUE_TIERS
            .iter()
            .map(|&value| {
                document
                    .categories()
                    .iter()
                    .map(|category| match category.playable(value) {
                        Some(_) => Cell::Playable(value),
                        None => Cell::Blocked,
                    })
                    .collect_vec()
            })
            .collect_vec();

        Self { categories, rows }
    }

    /// Returns the cell at a tier row and category column
    pub fn cell(&self, row: usize, category: usize) -> Option<Cell> {
        self.rows.get(row)?.get(category).copied()
    }

    /// Number of cells that can still be selected
    pub fn playable_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, Cell::Playable(_)))
            .count()
    }
}
