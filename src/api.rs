//! Client side of the game authoring service
//!
//! The authoring service stores games, their categories and their clues as
//! separate REST resources. This module holds the wire records, merges the
//! three read shapes into a [`GameDocument`], and (with the `http` feature)
//! provides an async client for the whole create/read/update/delete surface.
//!
//! The service is lenient about numbers: identifiers and clue values arrive
//! either as JSON numbers or as numeric strings, and both are accepted.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as, skip_serializing_none};
use thiserror::Error;

use crate::board::{Category, Clue, ClueStatus, GameDocument};

/// Identifier of a stored game, category or clue
#[serde_as]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct RecordId(#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")] u64);

/// Entry of the game listing
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Identifier of the game
    pub id: RecordId,
    /// Title of the game
    pub title: String,
    /// Creation timestamp as reported by the service
    pub created: Option<String>,
}

/// A stored game
///
/// The service may embed the categories (with their clues) directly in the
/// game record; otherwise they are fetched separately.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Identifier of the game
    pub id: RecordId,
    /// Title of the game
    pub title: String,
    /// Embedded categories, when the service includes them
    pub categories: Option<Vec<CategoryRecord>>,
}

/// A stored category
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Identifier of the category
    pub id: RecordId,
    /// Title of the category
    pub title: String,
    /// Embedded clues, when the service includes them
    pub clues: Option<Vec<ClueRecord>>,
}

/// A stored clue
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueRecord {
    /// Identifier of the clue
    pub id: Option<RecordId>,
    /// Points awarded for the clue
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub value: i64,
    /// The prompt shown to the players
    pub answer: String,
    /// The correct response
    pub question: String,
    /// Whether the clue was already played
    ///
    /// Only `"used"` marks a clue as played; a missing, null or unknown
    /// status leaves it playable.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub status: ClueStatus,
}

impl From<ClueRecord> for Clue {
    fn from(record: ClueRecord) -> Self {
        Clue::new(record.value, record.answer, record.question).with_status(record.status)
    }
}

/// Body of a game create or replace request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    /// Title of the game
    pub title: String,
}

/// Body of a category create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    /// Title of the category
    pub title: String,
}

/// Body of a clue create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClue {
    /// Points awarded for the clue
    pub value: i64,
    /// The prompt shown to the players
    pub answer: String,
    /// The correct response
    pub question: String,
}

/// Response to a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    /// Identifier of the new record
    pub id: RecordId,
}

/// Response to a replace request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Updated {
    /// Whether the update was applied
    pub success: bool,
    /// Identifier of the updated record
    pub id: RecordId,
}

/// Database part of the service health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStatus {
    /// Whether the service reached its database
    pub connected: bool,
    /// Number of stored games
    pub game_count: u64,
    /// Number of stored categories
    #[serde(default)]
    pub category_count: u64,
    /// Number of stored clues
    #[serde(default)]
    pub clue_count: u64,
}

/// Health report of the service
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// `"ok"` or `"error"`
    pub status: String,
    /// Database reachability and record counts
    pub database: DatabaseStatus,
    /// Time of the report as reported by the service
    pub timestamp: Option<String>,
    /// Failure description, when the status is an error
    pub error: Option<String>,
}

impl ServiceStatus {
    /// Returns whether the service reported itself healthy
    pub fn is_ok(&self) -> bool {
        self.status == "ok" && self.database.connected
    }
}

/// Error body returned by the service on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Errors that can occur while talking to the authoring service
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or its response not decoded
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The requested record does not exist
    #[error("record not found")]
    NotFound,
    /// The service answered with a failure status
    #[error("service returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error description from the response body
        message: String,
    },
}

impl Error {
    /// Builds a status error from a failure response body
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 404 {
            return Self::NotFound;
        }
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|body| body.error)
            .unwrap_or_else(|_| body.trim().to_owned());
        Self::Status { status, message }
    }
}

/// Merges a game record and its categories into a playable document
///
/// Categories keep the order in which they are given.
///
/// # Arguments
///
/// * `game` - The game record (its embedded categories, if any, are ignored)
/// * `categories` - Each category paired with its clues
pub fn assemble(game: GameRecord, categories: Vec<(CategoryRecord, Vec<ClueRecord>)>) -> GameDocument {
    let categories = categories
        .into_iter()
        .map(|(category, clues)| {
            Category::new(category.title, clues.into_iter().map(Clue::from).collect())
        })
        .collect();

    GameDocument::new(game.title, categories)
}

/// The next resource a [`DocumentLoader`] needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    /// The category list of the game
    Categories,
    /// The clues of the category with this id
    Clues(RecordId),
    /// Everything is known; call [`DocumentLoader::finish`]
    Ready,
}

/// Gathers a game document from the service's separate resources
///
/// The loader performs no I/O. It starts from the game record, reports the
/// next missing piece through [`DocumentLoader::next_step`], and takes what
/// the caller fetched. Categories and clues embedded in a record are used as
/// they are and never requested.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    game: GameRecord,
    pending: Option<VecDeque<CategoryRecord>>,
    columns: Vec<(CategoryRecord, Vec<ClueRecord>)>,
}

impl DocumentLoader {
    /// Starts loading from a game record
    pub fn new(mut game: GameRecord) -> Self {
        let pending = game.categories.take().map(VecDeque::from);
        Self {
            game,
            pending,
            columns: Vec::new(),
        }
    }

    /// Returns the next resource to fetch, in board order
    pub fn next_step(&mut self) -> LoadStep {
        let Some(pending) = &mut self.pending else {
            return LoadStep::Categories;
        };

        while let Some(mut category) = pending.pop_front() {
            match category.clues.take() {
                Some(clues) => self.columns.push((category, clues)),
                None => {
                    let id = category.id;
                    pending.push_front(category);
                    return LoadStep::Clues(id);
                }
            }
        }

        LoadStep::Ready
    }

    /// Supplies the fetched category list
    pub fn supply_categories(&mut self, categories: Vec<CategoryRecord>) {
        self.pending = Some(categories.into());
    }

    /// Supplies the fetched clues of the category last asked for
    pub fn supply_clues(&mut self, clues: Vec<ClueRecord>) {
        if let Some(category) = self.pending.as_mut().and_then(VecDeque::pop_front) {
            self.columns.push((category, clues));
        }
    }

    /// Merges everything gathered into a document
    ///
    /// Categories still waiting for their clues are left out, so this is
    /// meant to be called once [`DocumentLoader::next_step`] returned
    /// [`LoadStep::Ready`].
    pub fn finish(self) -> GameDocument {
        assemble(self.game, self.columns)
    }
}

#[cfg(feature = "http")]
pub use client::Client;

#[cfg(feature = "http")]
mod client {
    use reqwest::{Method, StatusCode};
    use serde::{Serialize, de::DeserializeOwned};
    use tracing::debug;

    use super::{
        CategoryRecord, ClueRecord, Created, DocumentLoader, Error, GameRecord, GameSummary,
        LoadStep, NewCategory, NewClue, NewGame, RecordId, ServiceStatus, Updated,
    };
    use crate::board::GameDocument;

    /// Async client for the authoring service
    #[derive(Debug, Clone)]
    pub struct Client {
        http: reqwest::Client,
        base_url: String,
    }

    impl Client {
        /// Creates a client for a service rooted at `base_url`
        pub fn new(base_url: impl Into<String>) -> Self {
            Self::with_http_client(reqwest::Client::new(), base_url)
        }

        /// Creates a client that reuses an existing HTTP client
        pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
            Self {
                http,
                base_url: base_url.into().trim_end_matches('/').to_owned(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }

        async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
            &self,
            method: Method,
            path: &str,
            body: Option<&B>,
        ) -> Result<T, Error> {
            debug!(%method, path, "authoring service request");

            let mut request = self.http.request(method, self.url(path));
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(Error::NotFound);
            }
            if !status.is_success() {
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(error = %e, "failure body could not be read");
                        String::new()
                    }
                };
                return Err(Error::from_response(status.as_u16(), &body));
            }

            Ok(response.json().await?)
        }

        async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
            self.request::<(), T>(Method::GET, path, None).await
        }

        /// Lists all stored games
        pub async fn list_games(&self) -> Result<Vec<GameSummary>, Error> {
            self.get("games").await
        }

        /// Fetches a game record
        pub async fn game(&self, id: RecordId) -> Result<GameRecord, Error> {
            self.get(&format!("games/{id}")).await
        }

        /// Fetches the categories of a game in board order
        pub async fn categories(&self, game: RecordId) -> Result<Vec<CategoryRecord>, Error> {
            self.get(&format!("games/{game}/categories")).await
        }

        /// Fetches the clues of a category
        pub async fn clues(
            &self,
            game: RecordId,
            category: RecordId,
        ) -> Result<Vec<ClueRecord>, Error> {
            self.get(&format!("games/{game}/categories/{category}/clues"))
                .await
        }

        /// Loads everything needed to play a game
        ///
        /// Embedded categories and clues are used as they are; anything
        /// missing is fetched from its own resource.
        pub async fn load_document(&self, id: RecordId) -> Result<GameDocument, Error> {
            let mut loader = DocumentLoader::new(self.game(id).await?);

            loop {
                match loader.next_step() {
                    LoadStep::Categories => loader.supply_categories(self.categories(id).await?),
                    LoadStep::Clues(category) => loader.supply_clues(self.clues(id, category).await?),
                    LoadStep::Ready => break,
                }
            }

            let document = loader.finish();
            debug!(%id, categories = document.categories().len(), "game document loaded");
            Ok(document)
        }

        /// Creates a game
        pub async fn create_game(&self, game: &NewGame) -> Result<Created, Error> {
            self.request(Method::POST, "games", Some(game)).await
        }

        /// Replaces the title of a game
        pub async fn update_game(&self, id: RecordId, game: &NewGame) -> Result<Updated, Error> {
            self.request(Method::PUT, &format!("games/{id}"), Some(game))
                .await
        }

        /// Deletes a game with its categories and clues
        pub async fn delete_game(&self, id: RecordId) -> Result<(), Error> {
            self.request::<(), serde_json::Value>(Method::DELETE, &format!("games/{id}"), None)
                .await
                .map(|_| ())
        }

        /// Appends a category to a game
        pub async fn create_category(
            &self,
            game: RecordId,
            category: &NewCategory,
        ) -> Result<Created, Error> {
            self.request(
                Method::POST,
                &format!("games/{game}/categories"),
                Some(category),
            )
            .await
        }

        /// Deletes a category with its clues
        pub async fn delete_category(&self, game: RecordId, category: RecordId) -> Result<(), Error> {
            self.request::<(), serde_json::Value>(
                Method::DELETE,
                &format!("games/{game}/categories/{category}"),
                None,
            )
            .await
            .map(|_| ())
        }

        /// Adds a clue to a category
        pub async fn create_clue(
            &self,
            game: RecordId,
            category: RecordId,
            clue: &NewClue,
        ) -> Result<Created, Error> {
            self.request(
                Method::POST,
                &format!("games/{game}/categories/{category}/clues"),
                Some(clue),
            )
            .await
        }

        /// Fetches the service health report
        pub async fn status(&self) -> Result<ServiceStatus, Error> {
            self.get("status").await
        }
    }
}
