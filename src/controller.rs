//! Client-side data controller for the movie browser.
//!
//! `MovieBrowser` owns the result set and the loading/error flags the page
//! renders from. Every fetch is tagged with a [`RequestTicket`]; only the
//! most recently started request may change state when it completes, so a slow
//! popular listing can no longer overwrite a newer search.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{ErrorBody, MovieDetails, MovieSummary, MoviesResponse};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load movies. Please try again.";
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search movies. Please try again";

/// What the browser needs from the proxy.
#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn list_popular(&self) -> Result<Vec<MovieSummary>>;
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>>;
    async fn details(&self, id: i64) -> Result<MovieDetails>;
}

/// Talks to a running proxy over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMovieApi {
    client: Client,
    base_url: String,
}

impl HttpMovieApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build proxy HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let bytes = res.bytes().await.context("reading body failed")?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(anyhow!("{} -> {}: {}", path, status, message));
        }
        serde_json::from_slice(&bytes).context("JSON parse failed")
    }
}

#[async_trait]
impl MovieApi for HttpMovieApi {
    async fn list_popular(&self) -> Result<Vec<MovieSummary>> {
        let data: MoviesResponse = self.get_json("/api/movie").await?;
        Ok(data.movies)
    }

    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>> {
        let path = format!("/api/movies/search?q={}", urlencoding::encode(query));
        let data: MoviesResponse = self.get_json(&path).await?;
        Ok(data.movies)
    }

    async fn details(&self, id: i64) -> Result<MovieDetails> {
        self.get_json(&format!("/api/movies/{id}")).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Popular,
    Search,
}

/// Handed out when a fetch starts and handed back when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    seq: u64,
    kind: RequestKind,
}

impl RequestTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// What the page should show, in priority order.
#[derive(Debug, PartialEq)]
pub enum BrowserView<'a> {
    /// `retry` is offered only when the popular listing failed.
    Error { message: &'a str, retry: bool },
    Loading { message: &'static str },
    Grid(&'a [MovieSummary]),
    Empty,
    Blank,
}

#[derive(Debug)]
pub struct MovieBrowser {
    movies: Vec<MovieSummary>,
    phase: Phase,
    is_initial_load: bool,
    error: Option<String>,
    failed: Option<RequestKind>,
    selected: Option<MovieSummary>,
    next_seq: u64,
    latest_seq: Option<u64>,
}

impl Default for MovieBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieBrowser {
    pub fn new() -> Self {
        Self {
            movies: Vec::new(),
            phase: Phase::Idle,
            is_initial_load: true,
            error: None,
            failed: None,
            selected: None,
            next_seq: 0,
            latest_seq: None,
        }
    }

    pub fn movies(&self) -> &[MovieSummary] {
        &self.movies
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn is_initial_load(&self) -> bool {
        self.is_initial_load
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected(&self) -> Option<&MovieSummary> {
        self.selected.as_ref()
    }

    pub fn start_load_popular(&mut self) -> RequestTicket {
        self.start(RequestKind::Popular)
    }

    pub fn start_search(&mut self) -> RequestTicket {
        self.start(RequestKind::Search)
    }

    fn start(&mut self, kind: RequestKind) -> RequestTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq = Some(seq);
        self.phase = Phase::Loading;
        self.error = None;
        self.failed = None;
        debug!(seq, ?kind, "Request started");
        RequestTicket { seq, kind }
    }

    /// Applies a finished fetch. Returns `false` when the ticket was
    /// superseded by a newer request and the result was dropped.
    pub fn complete(&mut self, ticket: RequestTicket, result: Result<Vec<MovieSummary>>) -> bool {
        if ticket.kind == RequestKind::Popular {
            self.is_initial_load = false;
        }
        if self.latest_seq != Some(ticket.seq) {
            debug!(seq = ticket.seq, "Discarding stale response");
            return false;
        }

        match result {
            Ok(movies) => {
                self.movies = movies;
                self.error = None;
                self.phase = Phase::Success;
            }
            Err(e) => {
                let message = match ticket.kind {
                    RequestKind::Popular => {
                        warn!("Error loading movies: {:#}", e);
                        LOAD_FAILED_MESSAGE
                    }
                    RequestKind::Search => {
                        warn!("Error searching movies: {:#}", e);
                        self.movies.clear();
                        SEARCH_FAILED_MESSAGE
                    }
                };
                self.error = Some(message.to_string());
                self.failed = Some(ticket.kind);
                self.phase = Phase::Error;
            }
        }
        true
    }

    pub async fn load_popular(&mut self, api: &dyn MovieApi) -> bool {
        let ticket = self.start_load_popular();
        let result = api.list_popular().await;
        self.complete(ticket, result)
    }

    /// Blank queries never reach the network.
    pub async fn search(&mut self, api: &dyn MovieApi, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        let ticket = self.start_search();
        let result = api.search(query).await;
        self.complete(ticket, result)
    }

    pub fn select_movie(&mut self, movie: MovieSummary) {
        self.selected = Some(movie);
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn view(&self) -> BrowserView<'_> {
        if let Some(message) = self.error.as_deref() {
            return BrowserView::Error {
                message,
                retry: self.failed == Some(RequestKind::Popular),
            };
        }
        if self.is_loading() {
            let message = if self.is_initial_load {
                "Loading movies..."
            } else {
                "Searching movies..."
            };
            return BrowserView::Loading { message };
        }
        if !self.movies.is_empty() {
            BrowserView::Grid(&self.movies)
        } else if !self.is_initial_load {
            BrowserView::Empty
        } else {
            BrowserView::Blank
        }
    }
}
