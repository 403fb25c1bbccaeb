use axum::http::StatusCode;
use moviefinder::app::{build_router, AppState};
use moviefinder::controller::{
    BrowserView, HttpMovieApi, MovieApi, MovieBrowser, Phase, LOAD_FAILED_MESSAGE,
    SEARCH_FAILED_MESSAGE,
};
use moviefinder::detail::{DetailRender, DetailView, ModalEvent, ModalHost};
use moviefinder::models::{Genre, MovieDetails, MovieSummary};
use moviefinder::tmdb::{CatalogError, CatalogResult, TmdbApi};
use moviefinder::view::{MovieCard, SearchBox};
use std::cell::Cell;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Catalog {
    healthy: bool,
    searches: AtomicUsize,
}

#[async_trait::async_trait]
impl TmdbApi for Catalog {
    async fn popular_movies(&self) -> CatalogResult<Vec<MovieSummary>> {
        if !self.healthy {
            return Err(CatalogError::Status(StatusCode::UNAUTHORIZED));
        }
        Ok(vec![summary(238, "The Godfather"), summary(424, "Schindler's List")])
    }

    async fn movie_details(&self, id: &str) -> CatalogResult<MovieDetails> {
        if id != "238" {
            return Err(CatalogError::Status(StatusCode::NOT_FOUND));
        }
        Ok(MovieDetails {
            summary: summary(238, "The Godfather"),
            runtime: 175,
            genres: vec![
                Genre {
                    id: 18,
                    name: "Drama".to_string(),
                },
                Genre {
                    id: 80,
                    name: "Crime".to_string(),
                },
            ],
        })
    }

    async fn search_movies(&self, query: &str) -> CatalogResult<Vec<MovieSummary>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if !self.healthy {
            return Err(CatalogError::Status(StatusCode::BAD_GATEWAY));
        }
        if query == "nothing" {
            return Ok(vec![]);
        }
        Ok(vec![summary(240, "The Godfather Part II")])
    }
}

fn summary(id: i64, title: &str) -> MovieSummary {
    MovieSummary {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/{id}.jpg")),
        release_date: "1972-03-14".to_string(),
        vote_average: Some(8.7),
        overview: format!("About {title}."),
    }
}

async fn spawn_proxy(healthy: bool) -> (SocketAddr, Arc<Catalog>) {
    let catalog = Arc::new(Catalog {
        healthy,
        searches: AtomicUsize::new(0),
    });
    let tmdb: Arc<dyn TmdbApi> = catalog.clone();
    let app = build_router(AppState { tmdb: Some(tmdb) });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, catalog)
}

#[derive(Default)]
struct PageHost {
    scroll_locked: Cell<bool>,
    escape_listeners: Cell<u32>,
}

impl ModalHost for &PageHost {
    fn add_escape_listener(&self) {
        self.escape_listeners.set(self.escape_listeners.get() + 1);
    }
    fn remove_escape_listener(&self) {
        self.escape_listeners.set(self.escape_listeners.get() - 1);
    }
    fn lock_scroll(&self) {
        self.scroll_locked.set(true);
    }
    fn unlock_scroll(&self) {
        self.scroll_locked.set(false);
    }
}

#[tokio::test]
async fn startup_search_and_detail_session() {
    let (addr, catalog) = spawn_proxy(true).await;
    let api = HttpMovieApi::new(format!("http://{addr}/")).unwrap();
    let mut browser = MovieBrowser::new();

    assert!(browser.load_popular(&api).await);
    let cards: Vec<MovieCard> = browser.movies().iter().map(MovieCard::new).collect();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].year, "1972");
    assert_eq!(cards[0].rating, "8.7");
    assert_eq!(
        cards[0].poster.src(),
        Some("https://image.tmdb.org/t/p/w500/238.jpg")
    );

    let mut search_box = SearchBox::new();
    search_box.set_query("   ");
    assert_eq!(search_box.submit(), None);
    assert_eq!(catalog.searches.load(Ordering::SeqCst), 0);

    search_box.set_query(" godfather ");
    let query = search_box.submit().unwrap();
    assert!(browser.search(&api, &query).await);
    assert_eq!(browser.movies()[0].id, 240);
    assert_eq!(catalog.searches.load(Ordering::SeqCst), 1);

    browser.search(&api, "nothing").await;
    assert_eq!(browser.view(), BrowserView::Empty);

    let host = PageHost::default();
    browser.select_movie(summary(238, "The Godfather"));
    let selected = browser.selected().cloned().unwrap();
    let mut detail = DetailView::open(selected, &host);
    assert!(host.scroll_locked.get());
    detail.load(&api).await;
    assert_eq!(
        detail.render(),
        Some(DetailRender::Content {
            title: "The Godfather".to_string(),
            year: "1972".to_string(),
            genres: "Drama, Crime".to_string(),
            runtime: Some("175 min".to_string()),
            overview: "About The Godfather.".to_string(),
        })
    );

    assert!(detail.handle(ModalEvent::from_key("Escape")));
    browser.deselect();
    assert!(!host.scroll_locked.get());
    assert_eq!(host.escape_listeners.get(), 0);
    assert!(browser.selected().is_none());
}

#[tokio::test]
async fn detail_failure_degrades_to_summary() {
    let (addr, _catalog) = spawn_proxy(true).await;
    let api = HttpMovieApi::new(format!("http://{addr}")).unwrap();
    assert!(api.details(424).await.is_err());

    let host = PageHost::default();
    let mut detail = DetailView::open(summary(424, "Schindler's List"), &host);
    detail.load(&api).await;
    match detail.render() {
        Some(DetailRender::Content {
            title,
            year,
            genres,
            runtime,
            overview,
        }) => {
            assert_eq!(title, "Schindler's List");
            assert_eq!(year, "1972");
            assert_eq!(genres, "Drama");
            assert_eq!(runtime, None);
            assert_eq!(overview, "About Schindler's List.");
        }
        other => panic!("unexpected render: {:?}", other),
    }
    assert!(detail.handle(ModalEvent::OverlayClick));
    assert!(!host.scroll_locked.get());
}

#[tokio::test]
async fn failures_surface_messages() {
    let (addr, _catalog) = spawn_proxy(false).await;
    let api = HttpMovieApi::new(format!("http://{addr}")).unwrap();
    let mut browser = MovieBrowser::new();

    browser.load_popular(&api).await;
    assert_eq!(browser.phase(), Phase::Error);
    assert!(browser.movies().is_empty());
    assert_eq!(
        browser.view(),
        BrowserView::Error {
            message: LOAD_FAILED_MESSAGE,
            retry: true
        }
    );

    browser.search(&api, "anything").await;
    assert!(browser.movies().is_empty());
    assert_eq!(browser.error(), Some(SEARCH_FAILED_MESSAGE));
    assert!(!browser.is_loading());
}
