//! Display formatting for the poster grid, the search box and the detail modal.

use chrono::{Datelike, NaiveDate};

use crate::models::{Genre, MovieSummary};
use crate::tmdb::POSTER_BASE;

pub const PLACEHOLDER_POSTER: &str = "/placeholder.png";
pub const FALLBACK_GENRE: &str = "Drama";

pub fn poster_url(path: &str) -> String {
    format!("{POSTER_BASE}{path}")
}

/// Partial dates such as "2008" or "2008-07" keep their year; anything else
/// without a leading year is "Unknown".
pub fn release_year(date: &str) -> String {
    let date = date.trim();
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return parsed.year().to_string();
    }
    match (date.get(..4), date.get(4..)) {
        (Some(year), Some(rest))
            if year.bytes().all(|b| b.is_ascii_digit()) && (rest.is_empty() || rest.starts_with('-')) =>
        {
            year.to_string()
        }
        _ => "Unknown".to_string(),
    }
}

/// A zero vote average means "no votes yet".
pub fn rating_label(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v != 0.0 && v.is_finite() => format!("{:.1}", v),
        _ => "N/A".to_string(),
    }
}

pub fn genre_text(genres: Option<&[Genre]>) -> String {
    match genres {
        Some(g) if !g.is_empty() => g
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => FALLBACK_GENRE.to_string(),
    }
}

pub fn runtime_label(runtime: Option<u32>) -> Option<String> {
    runtime.filter(|r| *r > 0).map(|r| format!("{r} min"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterSource {
    Remote(String),
    /// The remote image failed to load.
    Placeholder,
    NoImage,
}

impl PosterSource {
    pub fn src(&self) -> Option<&str> {
        match self {
            PosterSource::Remote(url) => Some(url.as_str()),
            PosterSource::Placeholder => Some(PLACEHOLDER_POSTER),
            PosterSource::NoImage => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub year: String,
    pub rating: String,
    pub poster: PosterSource,
}

impl MovieCard {
    pub fn new(movie: &MovieSummary) -> Self {
        let poster = match movie.poster_path.as_deref() {
            Some(path) if !path.is_empty() => PosterSource::Remote(poster_url(path)),
            _ => PosterSource::NoImage,
        };
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: release_year(&movie.release_date),
            rating: rating_label(movie.vote_average),
            poster,
        }
    }

    pub fn image_failed(&mut self) {
        if matches!(self.poster, PosterSource::Remote(_)) {
            self.poster = PosterSource::Placeholder;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    query: String,
}

impl SearchBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn can_submit(&self, is_loading: bool) -> bool {
        !is_loading && !self.query.trim().is_empty()
    }

    /// Trimmed query, or `None` when there is nothing to search for.
    pub fn submit(&self) -> Option<String> {
        let trimmed = self.query.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn button_label(is_loading: bool) -> &'static str {
        if is_loading {
            "Searching..."
        } else {
            "Search"
        }
    }
}
