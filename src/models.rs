use serde::{Deserialize, Serialize};

/// A movie as shown in the poster grid.
///
/// `poster_path` is relative to the image host (`/abc.jpg`), never a full URL.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: String,
    pub vote_average: Option<f64>,
    pub overview: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Detail-view shape: the summary fields plus runtime and genres.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub summary: MovieSummary,
    pub runtime: u32,
    pub genres: Vec<Genre>,
}

impl MovieDetails {
    pub fn id(&self) -> i64 {
        self.summary.id
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MoviesResponse {
    pub movies: Vec<MovieSummary>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
