use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{Genre, MovieDetails, MovieSummary};

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TMDB answered with status {0}")]
    Status(StatusCode),
    #[error("TMDB request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("TMDB JSON parse failed: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// The three catalog lookups the proxy needs, already normalized.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn popular_movies(&self) -> CatalogResult<Vec<MovieSummary>>;
    async fn movie_details(&self, id: &str) -> CatalogResult<MovieDetails>;
    async fn search_movies(&self, query: &str) -> CatalogResult<Vec<MovieSummary>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("moviefinder/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn popular_url(&self) -> String {
        format!(
            "{}/movie/popular?api_key={}&language=en-US&page=1",
            self.base_url,
            urlencoding::encode(&self.api_key)
        )
    }

    fn details_url(&self, id: &str) -> String {
        format!(
            "{}/movie/{}?api_key={}&language=en-US",
            self.base_url,
            urlencoding::encode(id),
            urlencoding::encode(&self.api_key)
        )
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search/movie?api_key={}&language=en-US&query={}&page=1&include_adult=false",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> CatalogResult<T> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn popular_movies(&self) -> CatalogResult<Vec<MovieSummary>> {
        debug!("Fetching popular movies from TMDB");
        let data: ListResponse = self.get_json(&self.popular_url()).await?;
        Ok(data.into_summaries())
    }

    async fn movie_details(&self, id: &str) -> CatalogResult<MovieDetails> {
        debug!(movie_id = %id, "Fetching movie details from TMDB");
        let detail: UpstreamDetail = self.get_json(&self.details_url(id)).await?;
        Ok(detail.into())
    }

    async fn search_movies(&self, query: &str) -> CatalogResult<Vec<MovieSummary>> {
        debug!(query = %query, "Searching TMDB movies");
        let data: ListResponse = self.get_json(&self.search_url(query)).await?;
        Ok(data.into_summaries())
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    results: Option<Vec<UpstreamMovie>>,
}

impl ListResponse {
    fn into_summaries(self) -> Vec<MovieSummary> {
        self.results
            .unwrap_or_default()
            .into_iter()
            .map(MovieSummary::from)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamMovie {
    id: i64,
    title: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamGenre {
    id: i64,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamDetail {
    #[serde(flatten)]
    movie: UpstreamMovie,
    runtime: Option<f64>,
    genres: Option<Vec<UpstreamGenre>>,
}

impl From<UpstreamMovie> for MovieSummary {
    fn from(m: UpstreamMovie) -> Self {
        MovieSummary {
            id: m.id,
            title: m.title.unwrap_or_default(),
            poster_path: m.poster_path.filter(|p| !p.is_empty()),
            release_date: m.release_date.unwrap_or_default(),
            vote_average: m.vote_average,
            overview: m.overview.unwrap_or_default(),
        }
    }
}

impl From<UpstreamDetail> for MovieDetails {
    fn from(d: UpstreamDetail) -> Self {
        // `as` saturates, so NaN and negatives land on 0.
        let runtime = d.runtime.map(|r| r.round() as u32).unwrap_or(0);
        let genres = d
            .genres
            .unwrap_or_default()
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name.unwrap_or_default(),
            })
            .collect();
        MovieDetails {
            summary: d.movie.into(),
            runtime,
            genres,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> TmdbClient {
        TmdbClient::new("k3y", "https://api.example.test/3/").unwrap()
    }

    #[test]
    fn list_keeps_order_and_drops_unknown_fields() {
        let raw = json!({
            "page": 1,
            "results": [
                {
                    "id": 2,
                    "title": "Second",
                    "poster_path": "/b.jpg",
                    "release_date": "2024-02-02",
                    "vote_average": 6.5,
                    "overview": "b",
                    "adult": false,
                    "popularity": 99.1
                },
                {
                    "id": 1,
                    "title": "First",
                    "poster_path": null,
                    "release_date": "",
                    "vote_average": 7.0,
                    "overview": "a"
                }
            ]
        });
        let parsed: ListResponse = serde_json::from_value(raw).unwrap();
        let movies = parsed.into_summaries();
        assert_eq!(movies.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(movies[0].poster_path.as_deref(), Some("/b.jpg"));
        assert_eq!(movies[1].poster_path, None);
    }

    #[test]
    fn missing_optional_fields_fall_back_to_defaults() {
        let parsed: ListResponse =
            serde_json::from_value(json!({ "results": [{ "id": 7, "release_date": null }] }))
                .unwrap();
        let movie = &parsed.into_summaries()[0];
        assert_eq!(movie.title, "");
        assert_eq!(movie.release_date, "");
        assert_eq!(movie.overview, "");
        assert_eq!(movie.vote_average, None);
    }

    #[test]
    fn missing_results_is_empty_list() {
        let parsed: ListResponse = serde_json::from_value(json!({ "page": 1 })).unwrap();
        assert!(parsed.into_summaries().is_empty());
    }

    #[test]
    fn record_without_id_is_rejected() {
        let parsed = serde_json::from_value::<ListResponse>(json!({ "results": [{ "title": "x" }] }));
        assert!(parsed.is_err());
    }

    #[test]
    fn details_map_runtime_and_genres() {
        let raw = json!({
            "id": 603,
            "title": "The Matrix",
            "poster_path": "/m.jpg",
            "release_date": "1999-03-30",
            "vote_average": 8.2,
            "overview": "Neo",
            "runtime": 136,
            "genres": [{ "id": 28, "name": "Action" }, { "id": 878, "name": "Science Fiction" }],
            "budget": 63000000
        });
        let details: MovieDetails = serde_json::from_value::<UpstreamDetail>(raw).unwrap().into();
        assert_eq!(details.id(), 603);
        assert_eq!(details.runtime, 136);
        assert_eq!(
            details.genres.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
            vec!["Action", "Science Fiction"]
        );
    }

    #[test]
    fn details_clamp_bad_runtime_and_default_genres() {
        let raw = json!({ "id": 1, "runtime": -20, "genres": null });
        let details: MovieDetails = serde_json::from_value::<UpstreamDetail>(raw).unwrap().into();
        assert_eq!(details.runtime, 0);
        assert!(details.genres.is_empty());

        let raw = json!({ "id": 2 });
        let details: MovieDetails = serde_json::from_value::<UpstreamDetail>(raw).unwrap().into();
        assert_eq!(details.runtime, 0);
    }

    #[test]
    fn urls_use_trimmed_base_and_encode_input() {
        let c = client();
        assert_eq!(
            c.popular_url(),
            "https://api.example.test/3/movie/popular?api_key=k3y&language=en-US&page=1"
        );
        assert_eq!(
            c.details_url("12/3"),
            "https://api.example.test/3/movie/12%2F3?api_key=k3y&language=en-US"
        );
        let search = c.search_url("star wars & co");
        assert!(search.contains("query=star%20wars%20%26%20co"));
        assert!(search.ends_with("&page=1&include_adult=false"));
    }
}
