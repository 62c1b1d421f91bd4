//! Game documents and the board built from them
//!
//! This module contains the authored content of a game (categories and their
//! clues) together with the grid layout that presents it over the canonical
//! value tiers.

pub mod document;
pub mod grid;

pub use document::{Category, Clue, ClueStatus, GameDocument};
pub use grid::{BoardMessage, Cell};
