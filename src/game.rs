//! Game session controller
//!
//! This module contains the state machine that plays a loaded game document:
//! player setup, clue selection, the countdown, revealing the response,
//! manual scorekeeping and detection of a cleared board. Every transition
//! happens synchronously inside `receive_message` or `receive_alarm`.

use std::fmt::{Debug, Display};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{debug, info, warn};
use web_time::Duration;

use super::{
    board::{BoardMessage, ClueStatus, GameDocument},
    roster::{self, Roster, RosterPolicy},
    scoreboard::{Outcome, ScoreboardMessage},
    session::{ClueCard, SecondaryDisplay, Tunnel},
    timer::{AlarmMessage, Countdown, Tick},
};

/// The clue being played, captured when its cell is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentClue {
    /// Column of the clue's category
    pub category_index: usize,
    /// Title of the clue's category
    pub category_title: String,
    /// Points at stake
    pub value: i64,
    /// The prompt shown to the players
    pub answer: String,
    /// The correct response
    pub question: String,
    /// Status of the clue after selection
    pub status: ClueStatus,
}

/// Represents the current phase of the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum State {
    /// Collecting player names
    Setup,
    /// Waiting for a cell to be selected
    Board,
    /// Showing a clue's prompt while the countdown runs
    ClueRevealed(CurrentClue),
    /// Showing the correct response and waiting for scoring
    AnswerRevealed(CurrentClue),
    /// Every clue was played; terminal
    GameOver(Outcome),
    /// The session was abandoned; terminal
    Left,
}

/// The state a message is dispatched on, without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Setup,
    Board,
    ClueRevealed,
    AnswerRevealed,
    GameOver,
    Left,
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            Self::Setup => Phase::Setup,
            Self::Board => Phase::Board,
            Self::ClueRevealed(_) => Phase::ClueRevealed,
            Self::AnswerRevealed(_) => Phase::AnswerRevealed,
            Self::GameOver(_) => Phase::GameOver,
            Self::Left => Phase::Left,
        }
    }
}

/// Validates the countdown given to players for each clue
fn validate_clue_time_limit(val: &Duration) -> garde::Result {
    use crate::constants::timer::{MAX_SECONDS, MIN_SECONDS};

    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "clue_time_limit is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Configuration options for a session
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Options {
    /// How many players the setup screen accepts
    #[garde(dive)]
    roster: RosterPolicy,
    /// Countdown players get before the response is revealed
    #[garde(custom(|v, _| validate_clue_time_limit(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    clue_time_limit: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            roster: RosterPolicy::default(),
            clue_time_limit: Duration::from_secs(crate::constants::timer::DEFAULT_SECONDS),
        }
    }
}

impl Options {
    /// Creates options from a roster policy and a countdown
    pub fn new(roster: RosterPolicy, clue_time_limit: Duration) -> Self {
        Self {
            roster,
            clue_time_limit,
        }
    }

    /// How many players the setup screen accepts
    pub fn roster(&self) -> RosterPolicy {
        self.roster
    }

    /// Countdown players get before the response is revealed
    pub fn clue_time_limit(&self) -> Duration {
        self.clue_time_limit
    }
}

/// Errors that prevent a session from being created
#[derive(Error, Debug)]
pub enum Error {
    /// The game document failed validation
    #[error("invalid game document: {0}")]
    InvalidDocument(garde::Report),
    /// The options failed validation
    #[error("invalid options: {0}")]
    InvalidOptions(garde::Report),
}

/// Events the screen can send to the session
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    /// Submit the setup screen with one entry per name field
    Start(Vec<String>),
    /// Select the cell at a category column and tier
    SelectClue {
        /// Column of the category
        category: usize,
        /// Tier of the row
        value: i64,
    },
    /// Reveal the correct response before the countdown ends
    Reveal,
    /// Credit the player at this index with the clue's value
    Award(usize),
    /// Nobody answered correctly; debit the player whose turn it is
    NobodyCorrect,
    /// Return to the board without scoring
    Continue,
    /// Abandon the session and return to the entry point
    Leave,
}

/// Update messages sent to the screen about state changes
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum UpdateMessage {
    /// The setup screen was rejected
    SetupError(roster::Error),
    /// Show the board
    Board {
        /// The grid of cells
        board: BoardMessage,
        /// Scores and whose turn it is
        scoreboard: ScoreboardMessage,
    },
    /// Show a selected clue and start the countdown display
    ClueRevealed {
        /// Category title, upper-cased
        category: String,
        /// The prompt shown to the players
        answer: String,
        /// Points at stake
        value: i64,
        /// Length of the countdown
        seconds: u64,
    },
    /// Seconds left on the countdown
    Timer(u64),
    /// Show the correct response and the scoring controls
    AnswerRevealed {
        /// The correct response
        question: String,
        /// One scoring control per player, in seating order
        players: Vec<String>,
    },
    /// The board was cleared
    GameOver {
        /// Who won and with what score
        outcome: Outcome,
        /// The terminal announcement
        message: String,
    },
    /// The game document could not be loaded
    LoadFailed(String),
}

/// Sync messages carrying the complete current view
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Sync the setup screen
    Setup {
        /// Title of the game
        title: String,
        /// How many players are accepted
        policy: RosterPolicy,
    },
    /// Sync the board
    Board {
        /// Title of the game
        title: String,
        /// The grid of cells
        board: BoardMessage,
        /// Scores and whose turn it is
        scoreboard: Option<ScoreboardMessage>,
    },
    /// Sync a clue being played
    ClueRevealed {
        /// Category title, upper-cased
        category: String,
        /// The prompt shown to the players
        answer: String,
        /// Points at stake
        value: i64,
        /// Seconds left on the countdown
        remaining: Option<u64>,
        /// Scores and whose turn it is
        scoreboard: Option<ScoreboardMessage>,
    },
    /// Sync the response and scoring controls
    AnswerRevealed {
        /// The correct response
        question: String,
        /// One scoring control per player, in seating order
        players: Vec<String>,
        /// Scores and whose turn it is
        scoreboard: Option<ScoreboardMessage>,
    },
    /// Sync the final result
    GameOver {
        /// Who won and with what score
        outcome: Outcome,
        /// The terminal announcement
        message: String,
    },
    /// The session was abandoned
    Left,
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Formats the terminal announcement for an outcome
fn game_over_message(outcome: &Outcome) -> String {
    format!("Game Over! {outcome}")
}

/// A game session played on one shared screen
///
/// The session owns the document it plays, so clue status changes stay local
/// and are never written back.
pub struct Game {
    /// The document being played
    document: GameDocument,
    /// Session configuration
    options: Options,
    /// Players and turn pointer, present once setup succeeded
    roster: Option<Roster>,
    /// The countdown of the clue being played
    countdown: Countdown,
    /// Current phase of the session
    state: State,
    /// Optional companion display mirroring selected clues
    secondary_display: Option<Box<dyn SecondaryDisplay>>,
}

impl Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("title", &self.document.title())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Creates a session in the setup phase
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDocument` - The document has no title, an over-long
    ///   title, or an off-tier clue value
    /// * `Error::InvalidOptions` - The countdown or roster policy is out of
    ///   bounds
    pub fn new(document: GameDocument, options: Options) -> Result<Self, Error> {
        document.validate().map_err(Error::InvalidDocument)?;
        options.validate().map_err(Error::InvalidOptions)?;

        Ok(Self {
            document,
            options,
            roster: None,
            countdown: Countdown::default(),
            state: State::Setup,
            secondary_display: None,
        })
    }

    /// Opens a session from the result of loading its document
    ///
    /// A failed load or an invalid document is fatal: the screen is told why,
    /// the tunnel is closed and no session is returned. There is no retry.
    /// On success the screen receives the setup view.
    pub fn open<T: Tunnel, E: Display>(
        loaded: Result<GameDocument, E>,
        options: Options,
        tunnel: &T,
    ) -> Option<Self> {
        let game = loaded
            .map_err(|e| e.to_string())
            .and_then(|document| Self::new(document, options).map_err(|e| e.to_string()));

        match game {
            Ok(game) => {
                info!(title = game.document.title(), "game loaded");
                tunnel.send_state(&game.state_message());
                Some(game)
            }
            Err(reason) => {
                warn!(%reason, "game could not be loaded");
                tunnel.send_message(&UpdateMessage::LoadFailed(reason));
                tunnel.close();
                None
            }
        }
    }

    /// Attaches a companion display that mirrors every selected clue
    #[must_use]
    pub fn with_secondary_display(mut self, display: impl SecondaryDisplay + 'static) -> Self {
        self.secondary_display = Some(Box::new(display));
        self
    }

    /// The document being played, with clue status as of now
    pub fn document(&self) -> &GameDocument {
        &self.document
    }

    /// Players and turn pointer, once setup succeeded
    pub fn roster(&self) -> Option<&Roster> {
        self.roster.as_ref()
    }

    /// Current phase of the session
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Seconds left on the countdown, if one is running
    pub fn remaining(&self) -> Option<u64> {
        self.countdown.remaining()
    }

    /// Handles an event from the screen
    ///
    /// Events that do not apply to the current state are ignored, as is
    /// everything once the game is over or was left.
    ///
    /// # Arguments
    ///
    /// * `message` - The event to process
    /// * `schedule_message` - Function to schedule delayed alarms for the countdown
    /// * `tunnel` - The screen to report changes to
    ///
    /// # Type Parameters
    ///
    /// * `T` - Type implementing the Tunnel trait for the screen
    /// * `S` - Function type for scheduling alarm messages
    pub fn receive_message<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: IncomingMessage,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        match (self.state.phase(), message) {
            (Phase::GameOver | Phase::Left, message) => {
                debug!(?message, "session is closed, message ignored");
            }
            (_, IncomingMessage::Leave) => self.leave(tunnel),
            (Phase::Setup, IncomingMessage::Start(names)) => self.start(&names, tunnel),
            (Phase::Board, IncomingMessage::SelectClue { category, value }) => {
                self.select_clue(category, value, &mut schedule_message, tunnel);
            }
            (Phase::ClueRevealed, IncomingMessage::Reveal) => self.reveal(tunnel),
            (Phase::AnswerRevealed, IncomingMessage::Award(player)) => self.award(player, tunnel),
            (Phase::AnswerRevealed, IncomingMessage::NobodyCorrect) => self.nobody_correct(tunnel),
            (Phase::AnswerRevealed, IncomingMessage::Continue) => self.continue_game(tunnel),
            (phase, message) => {
                debug!(?phase, ?message, "message does not apply, ignored");
            }
        }
    }

    /// Handles a scheduled alarm
    ///
    /// Only a tick of the countdown that is currently running has an effect;
    /// alarms of cancelled countdowns are dropped.
    ///
    /// # Arguments
    ///
    /// * `alarm` - The alarm that fired
    /// * `schedule_message` - Function to schedule the next tick
    /// * `tunnel` - The screen to report changes to
    pub fn receive_alarm<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        alarm: AlarmMessage,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        if self.state.phase() != Phase::ClueRevealed {
            debug!(?alarm, "no clue in play, alarm dropped");
            return;
        }

        match self.countdown.tick(alarm, &mut schedule_message) {
            Tick::Running(left) => tunnel.send_message(&UpdateMessage::Timer(left)),
            Tick::Expired => {
                tunnel.send_message(&UpdateMessage::Timer(0));
                debug!("countdown expired");
                self.reveal(tunnel);
            }
            Tick::Stale => debug!(?alarm, "stale alarm dropped"),
        }
    }

    /// Returns the message that brings a screen up to date with the session
    pub fn state_message(&self) -> SyncMessage {
        let scoreboard = self.roster.as_ref().map(ScoreboardMessage::new);

        match &self.state {
            State::Setup => SyncMessage::Setup {
                title: self.document.title().to_owned(),
                policy: self.options.roster,
            },
            State::Board => SyncMessage::Board {
                title: self.document.title().to_owned(),
                board: BoardMessage::layout(&self.document),
                scoreboard,
            },
            State::ClueRevealed(current) => SyncMessage::ClueRevealed {
                category: current.category_title.to_uppercase(),
                answer: current.answer.clone(),
                value: current.value,
                remaining: self.countdown.remaining(),
                scoreboard,
            },
            State::AnswerRevealed(current) => SyncMessage::AnswerRevealed {
                question: current.question.clone(),
                players: self.player_names(),
                scoreboard,
            },
            State::GameOver(outcome) => SyncMessage::GameOver {
                outcome: outcome.clone(),
                message: game_over_message(outcome),
            },
            State::Left => SyncMessage::Left,
        }
    }

    fn player_names(&self) -> Vec<String> {
        self.roster.as_ref().map(Roster::names).unwrap_or_default()
    }

    /// Validates the setup screen and enters the board
    fn start<T: Tunnel>(&mut self, names: &[String], tunnel: &T) {
        match Roster::new(names, self.options.roster) {
            Ok(roster) => {
                info!(players = roster.len(), "session started");
                self.roster = Some(roster);
                self.enter_board(tunnel);
            }
            Err(e) => {
                debug!(error = %e, "setup rejected");
                tunnel.send_message(&UpdateMessage::SetupError(e));
            }
        }
    }

    /// Shows the board, or ends the game when no clue is left
    fn enter_board<T: Tunnel>(&mut self, tunnel: &T) {
        let Some(roster) = &self.roster else {
            return;
        };

        self.state = State::Board;
        tunnel.send_message(&UpdateMessage::Board {
            board: BoardMessage::layout(&self.document),
            scoreboard: ScoreboardMessage::new(roster),
        });

        if !self.document.is_complete() {
            return;
        }

        if let Some(outcome) = Outcome::from_roster(roster) {
            self.game_over(outcome, tunnel);
        }
    }

    /// Announces the outcome and leaves the session
    fn game_over<T: Tunnel>(&mut self, outcome: Outcome, tunnel: &T) {
        info!(winners = ?outcome.winners, score = outcome.score, "board cleared");

        tunnel.send_message(&UpdateMessage::GameOver {
            message: game_over_message(&outcome),
            outcome: outcome.clone(),
        });
        self.state = State::GameOver(outcome);
        tunnel.close();
    }

    /// Consumes the clue behind a cell and starts its countdown
    ///
    /// Blocked cells are ignored; their clues are never touched twice.
    fn select_clue<T: Tunnel, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        category: usize,
        value: i64,
        schedule_message: &mut S,
        tunnel: &T,
    ) {
        let Some(category_title) = self
            .document
            .categories()
            .get(category)
            .map(|c| c.title().to_owned())
        else {
            debug!(category, "no such category, selection ignored");
            return;
        };

        let Some(clue) = self.document.claim(category, value) else {
            debug!(category, value, "cell is blocked, selection ignored");
            return;
        };

        let current = CurrentClue {
            category_index: category,
            category_title,
            value: clue.value(),
            answer: clue.answer().to_owned(),
            question: clue.question().to_owned(),
            status: clue.status(),
        };
        debug!(category, value, "clue selected");

        self.mirror(&current);

        if self.countdown.cancel() {
            warn!("a countdown was still running and has been cancelled");
        }
        let seconds = self.options.clue_time_limit.as_secs();
        self.countdown.start(seconds, schedule_message);

        tunnel.send_message(&UpdateMessage::ClueRevealed {
            category: current.category_title.to_uppercase(),
            answer: current.answer.clone(),
            value: current.value,
            seconds,
        });
        self.state = State::ClueRevealed(current);
    }

    /// Pushes a selected clue to the companion display, when there is one
    fn mirror(&self, current: &CurrentClue) {
        match &self.secondary_display {
            Some(display) => display.show_clue(&ClueCard {
                category: current.category_title.clone(),
                answer: current.answer.clone(),
                question: current.question.clone(),
                value: current.value,
            }),
            None => info!("no secondary display attached, clue not mirrored"),
        }
    }

    /// Stops the countdown and shows the correct response
    fn reveal<T: Tunnel>(&mut self, tunnel: &T) {
        let current = match std::mem::replace(&mut self.state, State::Board) {
            State::ClueRevealed(current) => current,
            other => {
                self.state = other;
                return;
            }
        };

        self.countdown.cancel();

        tunnel.send_message(&UpdateMessage::AnswerRevealed {
            question: current.question.clone(),
            players: self.player_names(),
        });
        self.state = State::AnswerRevealed(current);
    }

    /// Credits a player and hands them the turn before continuing
    fn award<T: Tunnel>(&mut self, player: usize, tunnel: &T) {
        let (Some(roster), State::AnswerRevealed(current)) = (&mut self.roster, &self.state) else {
            return;
        };

        if !roster.award(player, current.value) {
            warn!(player, "no such player, award ignored");
            return;
        }
        debug!(player, value = current.value, "points awarded");

        self.continue_game(tunnel);
    }

    /// Debits the player whose turn it is before continuing
    fn nobody_correct<T: Tunnel>(&mut self, tunnel: &T) {
        let (Some(roster), State::AnswerRevealed(current)) = (&mut self.roster, &self.state) else {
            return;
        };

        roster.penalize_current(current.value);
        debug!(player = roster.current(), value = current.value, "points deducted");

        self.continue_game(tunnel);
    }

    /// Passes the turn and returns to the board
    fn continue_game<T: Tunnel>(&mut self, tunnel: &T) {
        if let Some(roster) = &mut self.roster {
            roster.advance();
        }
        self.enter_board(tunnel);
    }

    /// Stops everything and returns to the entry point
    fn leave<T: Tunnel>(&mut self, tunnel: &T) {
        self.countdown.cancel();
        self.state = State::Left;
        info!("session left");
        tunnel.close();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use super::*;
    use crate::board::{Category, Clue};

    #[derive(Default)]
    struct Recorder {
        messages: RefCell<Vec<UpdateMessage>>,
        states: RefCell<Vec<SyncMessage>>,
        closed: Cell<bool>,
    }

    impl Tunnel for Recorder {
        fn send_message(&self, message: &UpdateMessage) {
            self.messages.borrow_mut().push(message.clone());
        }

        fn send_state(&self, state: &SyncMessage) {
            self.states.borrow_mut().push(state.clone());
        }

        fn close(&self) {
            self.closed.set(true);
        }
    }

    impl Recorder {
        fn take(&self) -> Vec<UpdateMessage> {
            self.messages.take()
        }
    }

    #[derive(Clone, Default)]
    struct Mirror(Rc<RefCell<Vec<ClueCard>>>);

    impl SecondaryDisplay for Mirror {
        fn show_clue(&self, card: &ClueCard) {
            self.0.borrow_mut().push(card.clone());
        }
    }

    struct Host {
        game: Game,
        tunnel: Recorder,
        alarms: Vec<AlarmMessage>,
    }

    impl Host {
        fn new(document: GameDocument, options: Options) -> Self {
            Self {
                game: Game::new(document, options).unwrap(),
                tunnel: Recorder::default(),
                alarms: Vec::new(),
            }
        }

        fn send(&mut self, message: IncomingMessage) {
            let alarms = &mut self.alarms;
            self.game
                .receive_message(message, |alarm, _| alarms.push(alarm), &self.tunnel);
        }

        fn fire(&mut self) -> bool {
            let Some(alarm) = self.alarms.pop() else {
                return false;
            };
            let alarms = &mut self.alarms;
            self.game
                .receive_alarm(alarm, |alarm, _| alarms.push(alarm), &self.tunnel);
            true
        }

        fn start(&mut self, names: &[&str]) {
            self.send(IncomingMessage::Start(
                names.iter().map(|name| (*name).to_owned()).collect(),
            ));
        }

        fn select(&mut self, category: usize, value: i64) {
            self.send(IncomingMessage::SelectClue { category, value });
        }

        fn scores(&self) -> Vec<i64> {
            self.game
                .roster()
                .unwrap()
                .players()
                .iter()
                .map(crate::roster::Player::score)
                .collect()
        }

        fn current(&self) -> usize {
            self.game.roster().unwrap().current()
        }

        fn phase(&self) -> Phase {
            self.game.state().phase()
        }
    }

    fn two_by_two() -> GameDocument {
        GameDocument::new(
            "Two by two",
            vec![
                Category::new(
                    "Planets",
                    vec![
                        Clue::new(200, "Red planet", "What is Mars?"),
                        Clue::new(400, "Ringed giant", "What is Saturn?"),
                    ],
                ),
                Category::new(
                    "Oceans",
                    vec![
                        Clue::new(200, "Largest ocean", "What is the Pacific?"),
                        Clue::new(400, "Between Africa and Australia", "What is the Indian?"),
                    ],
                ),
            ],
        )
    }

    fn play_and_skip(host: &mut Host, category: usize, value: i64) {
        host.select(category, value);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Continue);
    }

    #[test]
    fn test_setup_rejects_blank_names() {
        let mut host = Host::new(two_by_two(), Options::default());

        host.start(&["Ada", "  "]);

        assert_eq!(host.phase(), Phase::Setup);
        assert!(host.game.roster().is_none());
        assert_eq!(
            host.tunnel.take(),
            vec![UpdateMessage::SetupError(roster::Error::Empty)]
        );

        host.start(&["Ada", "Grace"]);
        assert_eq!(host.phase(), Phase::Board);
        assert_eq!(host.game.roster().unwrap().names(), vec!["Ada", "Grace"]);
    }

    #[test]
    fn test_setup_fixed_roster() {
        let options = Options::new(RosterPolicy::standard(), Duration::from_secs(30));
        let mut host = Host::new(two_by_two(), options);

        host.start(&["A", "B"]);
        assert_eq!(host.phase(), Phase::Setup);
        assert_eq!(
            host.tunnel.take(),
            vec![UpdateMessage::SetupError(roster::Error::WrongCount {
                expected: 3,
                found: 2
            })]
        );

        host.start(&["A", "B", "C"]);
        assert_eq!(host.phase(), Phase::Board);
    }

    #[test]
    fn test_select_marks_clue_used_and_starts_countdown() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B"]);
        host.tunnel.take();

        host.select(1, 200);

        let clue = &host.game.document().categories()[1].clues()[0];
        assert_eq!(clue.status(), ClueStatus::Used);
        assert_eq!(host.game.remaining(), Some(30));
        assert_eq!(host.alarms.len(), 1);
        assert_eq!(
            host.tunnel.take(),
            vec![UpdateMessage::ClueRevealed {
                category: "OCEANS".to_owned(),
                answer: "Largest ocean".to_owned(),
                value: 200,
                seconds: 30,
            }]
        );

        let State::ClueRevealed(current) = host.game.state() else {
            panic!("expected a revealed clue");
        };
        assert_eq!(current.category_index, 1);
        assert_eq!(current.category_title, "Oceans");
        assert_eq!(current.question, "What is the Pacific?");
        assert_eq!(current.status, ClueStatus::Used);
    }

    #[test]
    fn test_used_or_missing_cells_are_noops() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A"]);
        play_and_skip(&mut host, 0, 200);
        host.tunnel.take();

        host.select(0, 200);
        host.select(0, 600);
        host.select(7, 200);

        assert_eq!(host.phase(), Phase::Board);
        assert!(host.tunnel.take().is_empty());
        assert!(host.alarms.is_empty());
        assert_eq!(host.game.document().remaining(), 3);
    }

    #[test]
    fn test_countdown_expiry_reveals_once() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B"]);
        host.select(0, 400);
        host.tunnel.take();

        let mut fired = 0;
        while host.fire() {
            fired += 1;
        }

        assert_eq!(fired, 30);
        assert_eq!(host.phase(), Phase::AnswerRevealed);
        assert_eq!(host.game.remaining(), None);

        let messages = host.tunnel.take();
        let reveals = messages
            .iter()
            .filter(|m| matches!(m, UpdateMessage::AnswerRevealed { .. }))
            .count();
        assert_eq!(reveals, 1);
        assert_eq!(
            messages.last(),
            Some(&UpdateMessage::AnswerRevealed {
                question: "What is Saturn?".to_owned(),
                players: vec!["A".to_owned(), "B".to_owned()],
            })
        );
        assert_eq!(
            messages
                .iter()
                .filter_map(|m| match m {
                    UpdateMessage::Timer(left) => Some(*left),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            (0..30).rev().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_manual_reveal_cancels_countdown() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B"]);
        host.select(0, 200);

        for _ in 0..10 {
            assert!(host.fire());
        }
        assert_eq!(host.game.remaining(), Some(20));

        host.send(IncomingMessage::Reveal);
        assert_eq!(host.phase(), Phase::AnswerRevealed);
        host.tunnel.take();

        // The tick scheduled before the reveal still arrives
        assert_eq!(host.alarms.len(), 1);
        assert!(host.fire());

        assert!(host.alarms.is_empty());
        assert!(host.tunnel.take().is_empty());
        assert_eq!(host.phase(), Phase::AnswerRevealed);
    }

    #[test]
    fn test_stale_tick_after_continue_is_dropped() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B"]);
        host.select(0, 200);
        let stale = host.alarms.pop().unwrap();
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Continue);
        host.select(0, 400);
        host.tunnel.take();

        host.alarms.push(stale);
        assert!(host.fire());

        assert_eq!(host.game.remaining(), Some(30));
        assert_eq!(host.alarms.len(), 1);
        assert!(host.tunnel.take().is_empty());
    }

    #[test]
    fn test_award_hands_turn_to_scorer() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B", "C"]);

        host.select(0, 400);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Award(2));

        assert_eq!(host.scores(), vec![0, 0, 400]);
        assert_eq!(host.current(), 0);
        assert_eq!(host.phase(), Phase::Board);
    }

    #[test]
    fn test_nobody_correct_debits_turn_holder() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B", "C"]);
        play_and_skip(&mut host, 0, 200);
        assert_eq!(host.current(), 1);

        host.select(1, 400);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::NobodyCorrect);

        assert_eq!(host.scores(), vec![0, -400, 0]);
        assert_eq!(host.current(), 2);
    }

    #[test]
    fn test_turn_pointer_advances_once_per_clue() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B"]);

        for (expected, (category, value)) in [(1, (0, 200)), (0, (0, 400)), (1, (1, 200))] {
            play_and_skip(&mut host, category, value);
            assert_eq!(host.current(), expected);
        }
    }

    #[test]
    fn test_award_unknown_player_is_ignored() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B"]);
        host.select(0, 200);
        host.send(IncomingMessage::Reveal);

        host.send(IncomingMessage::Award(5));

        assert_eq!(host.phase(), Phase::AnswerRevealed);
        assert_eq!(host.scores(), vec![0, 0]);
        assert_eq!(host.current(), 0);
    }

    #[test]
    fn test_game_over_after_last_clue() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B", "C"]);

        host.select(0, 200);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Award(0));
        host.select(0, 400);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Award(1));
        play_and_skip(&mut host, 1, 200);

        assert_eq!(host.phase(), Phase::Board);
        assert!(!host.tunnel.closed.get());

        host.select(1, 400);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Award(1));

        assert_eq!(host.phase(), Phase::GameOver);
        assert!(host.tunnel.closed.get());
        assert_eq!(
            host.tunnel.take().last(),
            Some(&UpdateMessage::GameOver {
                outcome: Outcome {
                    winners: vec!["B".to_owned()],
                    score: 800,
                },
                message: "Game Over! B wins with $800!".to_owned(),
            })
        );
    }

    #[test]
    fn test_game_over_tie() {
        let document = GameDocument::new(
            "Tie",
            vec![Category::new(
                "Only",
                vec![Clue::new(200, "a", "q"), Clue::new(200, "b", "r")],
            )],
        );
        let mut host = Host::new(document, Options::default());
        host.start(&["A", "B", "C"]);

        host.select(0, 200);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Award(0));
        host.select(0, 200);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Award(2));

        let SyncMessage::GameOver { outcome, message } = host.game.state_message() else {
            panic!("expected game over");
        };
        assert_eq!(outcome.winners, vec!["A", "C"]);
        assert_eq!(message, "Game Over! It's a tie between A and C with $200!");
    }

    #[test]
    fn test_game_over_ignores_everything() {
        let document = GameDocument::new(
            "Tiny",
            vec![Category::new("Only", vec![Clue::new(200, "a", "q")])],
        );
        let mut host = Host::new(document, Options::default());
        host.start(&["A"]);
        play_and_skip(&mut host, 0, 200);
        assert_eq!(host.phase(), Phase::GameOver);
        host.tunnel.take();

        host.send(IncomingMessage::Continue);
        host.send(IncomingMessage::Start(vec!["B".to_owned()]));
        host.send(IncomingMessage::Leave);

        assert_eq!(host.phase(), Phase::GameOver);
        assert!(host.tunnel.take().is_empty());
    }

    #[test]
    fn test_cleared_document_ends_at_start() {
        let mut document = two_by_two();
        for (category, value) in [(0, 200), (0, 400), (1, 200), (1, 400)] {
            document.claim(category, value);
        }
        let mut host = Host::new(document, Options::default());

        host.start(&["Solo"]);

        assert_eq!(host.phase(), Phase::GameOver);
        assert!(host.tunnel.closed.get());
    }

    #[test]
    fn test_continue_without_scoring() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A", "B"]);
        host.select(0, 200);
        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Continue);

        assert_eq!(host.scores(), vec![0, 0]);
        assert_eq!(host.current(), 1);
        assert_eq!(host.phase(), Phase::Board);
    }

    #[test]
    fn test_out_of_state_messages_are_ignored() {
        let mut host = Host::new(two_by_two(), Options::default());

        host.select(0, 200);
        host.send(IncomingMessage::Reveal);
        assert_eq!(host.phase(), Phase::Setup);
        assert_eq!(host.game.document().remaining(), 4);

        host.start(&["A"]);
        host.send(IncomingMessage::Award(0));
        host.send(IncomingMessage::Continue);
        assert_eq!(host.phase(), Phase::Board);
        assert_eq!(host.current(), 0);

        host.select(0, 200);
        host.send(IncomingMessage::NobodyCorrect);
        host.send(IncomingMessage::Start(vec!["B".to_owned()]));
        assert_eq!(host.phase(), Phase::ClueRevealed);
        assert_eq!(host.scores(), vec![0]);
    }

    #[test]
    fn test_secondary_display_receives_clue() {
        let mirror = Mirror::default();
        let mut host = Host::new(two_by_two(), Options::default());
        host.game = Game::new(two_by_two(), Options::default())
            .unwrap()
            .with_secondary_display(mirror.clone());
        host.start(&["A"]);

        host.select(0, 400);

        assert_eq!(
            mirror.0.borrow().as_slice(),
            &[ClueCard {
                category: "Planets".to_owned(),
                answer: "Ringed giant".to_owned(),
                question: "What is Saturn?".to_owned(),
                value: 400,
            }]
        );
    }

    #[test]
    fn test_missing_secondary_display_is_not_an_error() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A"]);

        host.select(0, 400);

        assert_eq!(host.phase(), Phase::ClueRevealed);
    }

    #[test]
    fn test_leave_closes_and_cancels() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A"]);
        host.select(0, 200);

        host.send(IncomingMessage::Leave);

        assert!(host.tunnel.closed.get());
        assert_eq!(host.game.remaining(), None);
        assert_eq!(host.phase(), Phase::Left);
        assert_eq!(host.game.state_message(), SyncMessage::Left);
    }

    #[test]
    fn test_messages_after_leave_are_ignored() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A"]);
        host.select(0, 200);
        host.send(IncomingMessage::Leave);
        host.tunnel.take();

        host.send(IncomingMessage::Reveal);
        host.send(IncomingMessage::Continue);
        host.send(IncomingMessage::SelectClue {
            category: 1,
            value: 200,
        });

        assert_eq!(host.phase(), Phase::Left);
        assert!(host.tunnel.take().is_empty());
        assert_eq!(host.game.document().remaining(), 3);
    }

    #[test]
    fn test_open_reports_load_failure() {
        let tunnel = Recorder::default();

        let game = Game::open(Err::<GameDocument, _>("game not found"), Options::default(), &tunnel);

        assert!(game.is_none());
        assert!(tunnel.closed.get());
        assert_eq!(
            tunnel.take(),
            vec![UpdateMessage::LoadFailed("game not found".to_owned())]
        );
    }

    #[test]
    fn test_open_rejects_invalid_document() {
        let tunnel = Recorder::default();

        let game = Game::open(
            Ok::<_, String>(GameDocument::new("", vec![])),
            Options::default(),
            &tunnel,
        );

        assert!(game.is_none());
        assert!(tunnel.closed.get());
        assert!(matches!(
            tunnel.take().as_slice(),
            [UpdateMessage::LoadFailed(_)]
        ));
    }

    #[test]
    fn test_open_sends_setup_view() {
        let tunnel = Recorder::default();

        let game = Game::open(Ok::<_, String>(two_by_two()), Options::default(), &tunnel);

        assert!(game.is_some());
        assert!(!tunnel.closed.get());
        assert_eq!(
            tunnel.states.take(),
            vec![SyncMessage::Setup {
                title: "Two by two".to_owned(),
                policy: RosterPolicy::Flexible,
            }]
        );
    }

    #[test]
    fn test_state_message_during_clue() {
        let mut host = Host::new(two_by_two(), Options::default());
        host.start(&["A"]);
        host.select(1, 400);
        host.fire();

        let SyncMessage::ClueRevealed {
            category,
            remaining,
            scoreboard,
            ..
        } = host.game.state_message()
        else {
            panic!("expected a revealed clue");
        };
        assert_eq!(category, "OCEANS");
        assert_eq!(remaining, Some(29));
        assert_eq!(scoreboard.map(|s| s.current), Some(0));
    }

    #[test]
    fn test_options_from_json() {
        let options: Options =
            serde_json::from_str(r#"{"roster": {"Fixed": 3}, "clue_time_limit": 45}"#).unwrap();
        assert_eq!(options.roster(), RosterPolicy::Fixed(3));
        assert_eq!(options.clue_time_limit(), Duration::from_secs(45));

        let defaults: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, Options::default());
        assert_eq!(defaults.clue_time_limit(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let too_short = Options::new(RosterPolicy::Flexible, Duration::from_secs(1));
        assert!(matches!(
            Game::new(two_by_two(), too_short),
            Err(Error::InvalidOptions(_))
        ));

        let empty_fixed = Options::new(RosterPolicy::Fixed(0), Duration::from_secs(30));
        assert!(matches!(
            Game::new(two_by_two(), empty_fixed),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_update_message_to_message() {
        let json = UpdateMessage::Timer(12).to_message();
        assert_eq!(json, r#"{"Timer":12}"#);
    }
}
