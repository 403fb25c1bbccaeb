use anyhow::Result;
use tracing::{debug, warn};

use crate::controller::MovieApi;
use crate::models::{MovieDetails, MovieSummary};
use crate::view;

/// Side effects the page applies while a modal is open.
pub trait ModalHost {
    fn add_escape_listener(&self);
    fn remove_escape_listener(&self);
    fn lock_scroll(&self);
    fn unlock_scroll(&self);
}

/// Holds the escape listener and scroll lock; dropping it releases both.
pub struct ModalGuard<H: ModalHost> {
    host: H,
}

impl<H: ModalHost> ModalGuard<H> {
    pub fn acquire(host: H) -> Self {
        host.add_escape_listener();
        host.lock_scroll();
        Self { host }
    }
}

impl<H: ModalHost> Drop for ModalGuard<H> {
    fn drop(&mut self) {
        self.host.remove_escape_listener();
        self.host.unlock_scroll();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalEvent {
    Escape,
    OtherKey,
    OverlayClick,
    CloseButton,
}

impl ModalEvent {
    pub fn from_key(key: &str) -> Self {
        if key == "Escape" {
            ModalEvent::Escape
        } else {
            ModalEvent::OtherKey
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    NotStarted,
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailRender {
    Loading,
    Content {
        title: String,
        year: String,
        genres: String,
        runtime: Option<String>,
        overview: String,
    },
}

/// One modal session for one movie. Details are fetched once per session and
/// thrown away on close.
pub struct DetailView<H: ModalHost> {
    movie: MovieSummary,
    details: Option<MovieDetails>,
    fetch: FetchState,
    guard: Option<ModalGuard<H>>,
}

impl<H: ModalHost> DetailView<H> {
    pub fn open(movie: MovieSummary, host: H) -> Self {
        debug!(movie_id = movie.id, "Opening detail view");
        Self {
            movie,
            details: None,
            fetch: FetchState::NotStarted,
            guard: Some(ModalGuard::acquire(host)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.guard.is_some()
    }

    pub fn movie(&self) -> &MovieSummary {
        &self.movie
    }

    pub fn details(&self) -> Option<&MovieDetails> {
        self.details.as_ref()
    }

    pub fn needs_fetch(&self) -> bool {
        self.is_open() && self.fetch == FetchState::NotStarted
    }

    /// Marks the fetch as pending and returns the id to request.
    pub fn begin_fetch(&mut self) -> Option<i64> {
        if !self.needs_fetch() {
            return None;
        }
        self.fetch = FetchState::Pending;
        Some(self.movie.id)
    }

    /// Failures fall back to the summary silently.
    pub fn finish_fetch(&mut self, result: Result<MovieDetails>) {
        if !self.is_open() || self.fetch != FetchState::Pending {
            return;
        }
        self.fetch = FetchState::Done;
        match result {
            Ok(details) if details.id() == self.movie.id => self.details = Some(details),
            Ok(details) => warn!(
                expected = self.movie.id,
                got = details.id(),
                "Ignoring details for a different movie"
            ),
            Err(e) => warn!("Error fetching movie details: {:#}", e),
        }
    }

    pub async fn load(&mut self, api: &dyn MovieApi) {
        if let Some(id) = self.begin_fetch() {
            let result = api.details(id).await;
            self.finish_fetch(result);
        }
    }

    /// Returns `true` when the event closed the view.
    pub fn handle(&mut self, event: ModalEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        match event {
            ModalEvent::Escape | ModalEvent::OverlayClick | ModalEvent::CloseButton => {
                self.close();
                true
            }
            ModalEvent::OtherKey => false,
        }
    }

    pub fn close(&mut self) {
        if self.guard.take().is_some() {
            debug!(movie_id = self.movie.id, "Closing detail view");
        }
        self.details = None;
        self.fetch = FetchState::NotStarted;
    }

    pub fn render(&self) -> Option<DetailRender> {
        if !self.is_open() {
            return None;
        }
        if self.fetch == FetchState::Pending {
            return Some(DetailRender::Loading);
        }
        let details = self.details.as_ref();
        Some(DetailRender::Content {
            title: self.movie.title.clone(),
            year: view::release_year(&self.movie.release_date),
            genres: view::genre_text(details.map(|d| d.genres.as_slice())),
            runtime: view::runtime_label(details.map(|d| d.runtime)),
            overview: self.movie.overview.clone(),
        })
    }
}
