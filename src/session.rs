//! Outbound ports of a game session
//!
//! This module defines the traits through which the controller reaches the
//! outside world: the screen the board is played on, and an optional second
//! display that mirrors the clue being played.

use serde::Serialize;

use crate::game::{SyncMessage, UpdateMessage};

/// Trait for sending messages to the screen the session is played on
///
/// Implementations render the messages however they like (a browser page, a
/// terminal, a test recorder).
pub trait Tunnel {
    /// Sends an update message to the screen
    ///
    /// Update messages describe a change to the current view.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a state synchronization message to the screen
    ///
    /// Sync messages carry the complete current view, typically when a
    /// screen is attached or redrawn.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);

    /// Ends the session and returns to the entry point
    fn close(&self);
}

/// The clue pushed to a secondary display when it is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClueCard {
    /// Title of the clue's category
    pub category: String,
    /// The prompt shown to the players
    pub answer: String,
    /// The correct response
    pub question: String,
    /// Points at stake
    pub value: i64,
}

/// A companion display that mirrors each selected clue
pub trait SecondaryDisplay {
    /// Shows a freshly selected clue
    fn show_clue(&self, card: &ClueCard);
}
