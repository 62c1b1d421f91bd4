//! Scores and the end-of-game outcome
//!
//! This module produces the score snapshots shown between clues and decides
//! who won once the board is cleared.

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::roster::Roster;

/// Score information for the scoreboard
///
/// Players are listed in seating order; `current` marks whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreboardMessage {
    /// `(name, score)` per player
    pub players: Vec<(String, i64)>,
    /// Index of the player whose turn it is
    pub current: usize,
}

impl ScoreboardMessage {
    /// Snapshots the roster
    pub fn new(roster: &Roster) -> Self {
        Self {
            players: roster
                .players()
                .iter()
                .map(|player| (player.name().to_owned(), player.score()))
                .collect_vec(),
            current: roster.current(),
        }
    }
}

/// The result of a finished game
///
/// Every player holding the highest score is a winner; more than one winner
/// is a tie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Names of the players sharing the highest score, in seating order
    pub winners: Vec<String>,
    /// The highest score
    pub score: i64,
}

impl Outcome {
    /// Computes the outcome from the final roster
    ///
    /// # Returns
    ///
    /// `None` only for a roster without players
    pub fn from_roster(roster: &Roster) -> Option<Self> {
        let score = roster.players().iter().map(|player| player.score()).max()?;

        let winners = roster
            .players()
            .iter()
            .filter(|player| player.score() == score)
            .map(|player| player.name().to_owned())
            .collect_vec();

        Some(Self { winners, score })
    }

    /// Returns whether more than one player shares the highest score
    pub fn is_tie(&self) -> bool {
        self.winners.len() > 1
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_tie() {
            write!(
                f,
                "It's a tie between {} with ${}!",
                self.winners.iter().join(" and "),
                self.score
            )
        } else {
            write!(
                f,
                "{} wins with ${}!",
                self.winners.first().map_or("Nobody", String::as_str),
                self.score
            )
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::roster::RosterPolicy;

    fn roster_with_scores(scores: &[(&str, i64)]) -> Roster {
        let names = scores.iter().map(|(name, _)| *name).collect_vec();
        let mut roster = Roster::new(&names, RosterPolicy::Flexible).unwrap();
        for (index, (_, score)) in scores.iter().enumerate() {
            roster.award(index, *score);
        }
        roster
    }

    #[test]
    fn test_tie_names_all_leaders() {
        let roster = roster_with_scores(&[("A", 300), ("B", 300), ("C", 100)]);
        let outcome = Outcome::from_roster(&roster).unwrap();

        assert!(outcome.is_tie());
        assert_eq!(outcome.winners, vec!["A", "B"]);
        assert_eq!(outcome.to_string(), "It's a tie between A and B with $300!");
        assert!(!outcome.to_string().contains('C'));
    }

    #[test]
    fn test_single_winner() {
        let roster = roster_with_scores(&[("A", 500), ("B", 300), ("C", 100)]);
        let outcome = Outcome::from_roster(&roster).unwrap();

        assert!(!outcome.is_tie());
        assert_eq!(outcome.winners, vec!["A"]);
        assert_eq!(outcome.to_string(), "A wins with $500!");
    }

    #[test]
    fn test_negative_scores() {
        let roster = roster_with_scores(&[("A", -200), ("B", -400)]);
        let outcome = Outcome::from_roster(&roster).unwrap();

        assert_eq!(outcome.winners, vec!["A"]);
        assert_eq!(outcome.to_string(), "A wins with $-200!");
    }

    #[test]
    fn test_three_way_tie() {
        let roster = roster_with_scores(&[("A", 0), ("B", 0), ("C", 0)]);
        let outcome = Outcome::from_roster(&roster).unwrap();

        assert_eq!(
            outcome.to_string(),
            "It's a tie between A and B and C with $0!"
        );
    }

    #[test]
    fn test_scoreboard_snapshot() {
        let mut roster = roster_with_scores(&[("A", 200), ("B", 0)]);
        roster.advance();

        let scoreboard = ScoreboardMessage::new(&roster);

        assert_eq!(
            scoreboard.players,
            vec![("A".to_string(), 200), ("B".to_string(), 0)]
        );
        assert_eq!(scoreboard.current, 0);
    }
}
