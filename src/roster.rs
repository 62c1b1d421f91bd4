//! Player roster management and validation
//!
//! This module turns the names typed on the setup screen into the ordered
//! list of players for a session, and keeps the turn pointer that decides who
//! is debited when nobody answers a clue.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// How many players a session accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, garde::Validate)]
pub enum RosterPolicy {
    /// Any number of players, at least one
    #[default]
    Flexible,
    /// Exactly this many players
    Fixed(#[garde(range(min = 1, max = constants::roster::MAX_PLAYER_COUNT))] usize),
}

impl RosterPolicy {
    /// The fixed three-player policy
    pub fn standard() -> Self {
        Self::Fixed(constants::roster::FIXED_SIZE)
    }
}

/// Errors that can occur while validating the setup screen
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A name field is empty or contains only whitespace
    #[error("all player names are required")]
    Empty,
    /// A name exceeds the maximum allowed length
    #[error("player name is too long")]
    TooLong,
    /// No name fields were submitted
    #[error("at least one player is required")]
    NoPlayers,
    /// The number of players does not match a fixed roster
    #[error("exactly {expected} players are required, got {found}")]
    WrongCount {
        /// Players required by the policy
        expected: usize,
        /// Players submitted
        found: usize,
    },
    /// More players than a board supports
    #[error("too many players")]
    TooMany,
}

/// A player and their running score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    name: String,
    score: i64,
}

impl Player {
    /// Name shown on the scoreboard
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current score, possibly negative
    pub fn score(&self) -> i64 {
        self.score
    }
}

/// The ordered players of a session plus the turn pointer
///
/// Only [`Roster::new`] builds one, so it never holds zero players.
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    players: Vec<Player>,
    current: usize,
}

impl Roster {
    /// Validates submitted names and builds a roster
    ///
    /// Every name is trimmed before validation. Uniqueness is not enforced.
    ///
    /// # Errors
    ///
    /// * `Error::NoPlayers` - No names were submitted under a flexible policy
    /// * `Error::WrongCount` - The count does not match a fixed policy
    /// * `Error::TooMany` - More names than the board supports
    /// * `Error::Empty` - Some name is blank after trimming
    /// * `Error::TooLong` - Some name exceeds the length limit
    pub fn new<S: AsRef<str>>(names: &[S], policy: RosterPolicy) -> Result<Self, Error> {
        let players = names
            .iter()
            .map(|name| {
                validate_name(name.as_ref()).map(|name| Player {
                    name: name.to_owned(),
                    score: 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match policy {
            RosterPolicy::Fixed(expected) if players.len() != expected => {
                return Err(Error::WrongCount {
                    expected,
                    found: players.len(),
                });
            }
            _ if players.is_empty() => return Err(Error::NoPlayers),
            _ if players.len() > constants::roster::MAX_PLAYER_COUNT => {
                return Err(Error::TooMany);
            }
            _ => {}
        }

        Ok(Self {
            players,
            current: 0,
        })
    }

    /// All players in seating order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Number of players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Always `false`; a roster holds at least one player
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Index of the player whose turn it is
    pub fn current(&self) -> usize {
        self.current
    }

    /// Names of all players in seating order
    pub fn names(&self) -> Vec<String> {
        self.players
            .iter()
            .map(|player| player.name.clone())
            .collect()
    }

    /// Credits a player and hands them the turn
    ///
    /// # Returns
    ///
    /// `false` if no player has that index, in which case nothing changes
    pub fn award(&mut self, player: usize, value: i64) -> bool {
        let Some(target) = self.players.get_mut(player) else {
            return false;
        };
        target.score += value;
        self.current = player;
        true
    }

    /// Debits the player whose turn it is
    pub fn penalize_current(&mut self, value: i64) {
        if let Some(target) = self.players.get_mut(self.current) {
            target.score -= value;
        }
    }

    /// Moves the turn pointer to the next player, wrapping around
    pub fn advance(&mut self) {
        self.current = (self.current + 1).checked_rem(self.players.len()).unwrap_or(0);
    }
}

/// Trims a submitted name and checks its bounds
fn validate_name(name: &str) -> Result<&str, Error> {
    let name = rustrict::trim_whitespace(name);
    if name.is_empty() {
        return Err(Error::Empty);
    }
    if name.chars().count() > constants::roster::MAX_NAME_LENGTH {
        return Err(Error::TooLong);
    }
    Ok(name)
}
