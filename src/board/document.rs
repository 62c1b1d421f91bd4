//! Game document model
//!
//! A game document is what the authoring service stores: a titled list of
//! categories, each holding point-valued clues. During play the only field
//! that changes is a clue's status, and it only ever moves from unused to
//! used.

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants;

type ValidationResult = garde::Result;

/// Validates that a clue value sits on one of the canonical tiers
///
/// Off-tier clues have no board cell and could never be selected, which would
/// keep the board from ever completing.
fn validate_tier(value: &i64) -> ValidationResult {
    if constants::board::VALUE_TIERS.contains(value) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "value {value} is not one of the tiers {:?}",
            constants::board::VALUE_TIERS
        )))
    }
}

/// Whether a clue can still be played
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClueStatus {
    /// The clue has not been selected yet
    #[default]
    Unused,
    /// The clue was selected; it stays used for the rest of the session
    Used,
}

/// A single clue in a category
///
/// `answer` is shown to the players first and acts as the prompt; `question`
/// is the correct response revealed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Clue {
    /// Points awarded (or deducted) for this clue
    #[garde(custom(|v, _| validate_tier(v)))]
    value: i64,
    /// The prompt displayed when the clue is selected
    #[garde(skip)]
    answer: String,
    /// The correct response
    #[garde(skip)]
    question: String,
    #[serde(default)]
    #[garde(skip)]
    status: ClueStatus,
}

impl Clue {
    /// Creates an unused clue
    pub fn new(value: i64, answer: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            value,
            answer: answer.into(),
            question: question.into(),
            status: ClueStatus::Unused,
        }
    }

    /// Sets the status reported by the authoring service
    pub(crate) fn with_status(mut self, status: ClueStatus) -> Self {
        self.status = status;
        self
    }

    /// Points awarded for this clue
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The prompt shown to the players
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// The correct response
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Current status of the clue
    pub fn status(&self) -> ClueStatus {
        self.status
    }

    /// Returns whether the clue can still be selected
    pub fn is_unused(&self) -> bool {
        self.status == ClueStatus::Unused
    }

    /// Marks the clue as used
    ///
    /// # Returns
    ///
    /// `true` if the clue was unused before this call, `false` if it had
    /// already been used (in which case nothing changes)
    fn mark_used(&mut self) -> bool {
        if self.is_unused() {
            self.status = ClueStatus::Used;
            true
        } else {
            false
        }
    }
}

/// A named column of clues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Category {
    /// Title shown in the board header
    #[garde(length(chars, max = constants::board::MAX_TITLE_LENGTH))]
    title: String,
    /// Clues of this category, ideally one per tier
    #[serde(default)]
    #[garde(dive)]
    clues: Vec<Clue>,
}

impl Category {
    /// Creates a category from its title and clues
    pub fn new(title: impl Into<String>, clues: Vec<Clue>) -> Self {
        Self {
            title: title.into(),
            clues,
        }
    }

    /// Title of the category
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All clues of the category in authored order
    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    /// Finds the clue that a board cell of the given tier currently offers
    ///
    /// Duplicated tiers are played in authored order: the cell offers the
    /// first unused clue with that value.
    pub fn playable(&self, value: i64) -> Option<&Clue> {
        self.clues
            .iter()
            .find(|clue| clue.value == value && clue.is_unused())
    }

    /// Returns whether every clue of the category has been used
    pub fn is_exhausted(&self) -> bool {
        self.clues.iter().all(|clue| !clue.is_unused())
    }
}

/// A complete authored game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GameDocument {
    /// Title of the game
    #[garde(length(chars, min = 1, max = constants::board::MAX_TITLE_LENGTH))]
    title: String,
    /// Categories in board order
    #[serde(default)]
    #[garde(dive)]
    categories: Vec<Category>,
}

impl GameDocument {
    /// Creates a document from its title and categories
    pub fn new(title: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            title: title.into(),
            categories,
        }
    }

    /// Title of the game
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Categories in board order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns whether every clue in every category has been used
    ///
    /// A document without clues is complete.
    pub fn is_complete(&self) -> bool {
        self.categories.iter().all(Category::is_exhausted)
    }

    /// Number of clues that can still be selected
    pub fn remaining(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|category| category.clues.iter())
            .filter(|clue| clue.is_unused())
            .count()
    }

    /// Marks the clue behind a board cell as used and returns it
    ///
    /// # Arguments
    ///
    /// * `category` - Index of the category column
    /// * `value` - Tier of the board row
    ///
    /// # Returns
    ///
    /// The clue that was just consumed, or `None` when the cell is blocked
    /// (no such category, no clue of that tier, or every such clue already
    /// used). A blocked cell is left untouched.
    pub fn claim(&mut self, category: usize, value: i64) -> Option<&Clue> {
        let clue = self
            .categories
            .get_mut(category)?
            .clues
            .iter_mut()
            .find(|clue| clue.value == value && clue.is_unused())?;

        clue.mark_used().then_some(&*clue)
    }
}
