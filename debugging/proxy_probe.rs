//! Drive the browser controller against a running proxy and print what the page would show.
//! Usage:
//!   cargo run --bin proxy_probe -- popular
//!   cargo run --bin proxy_probe -- search <query>
//!   cargo run --bin proxy_probe -- details <movie_id>
//! PROXY_URL defaults to http://127.0.0.1:3000 (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use moviefinder::controller::{BrowserView, HttpMovieApi, MovieBrowser};
use moviefinder::detail::{DetailRender, DetailView, ModalHost};
use moviefinder::models::MovieSummary;
use moviefinder::view::MovieCard;
use serde_json::json;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Popular,
    Search,
    Details,
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "popular" => Ok(Command::Popular),
            "search" => Ok(Command::Search),
            "details" => Ok(Command::Details),
            _ => Err(anyhow::anyhow!(
                "command must be 'popular', 'search' or 'details'"
            )),
        }
    }
}

/// Terminal stand-in for the page: nothing to lock, so it just reports.
struct ConsoleHost;

impl ModalHost for ConsoleHost {
    fn add_escape_listener(&self) {
        eprintln!("[modal] escape listener on");
    }
    fn remove_escape_listener(&self) {
        eprintln!("[modal] escape listener off");
    }
    fn lock_scroll(&self) {
        eprintln!("[modal] scroll locked");
    }
    fn unlock_scroll(&self) {
        eprintln!("[modal] scroll restored");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin proxy_probe -- popular");
        eprintln!("       cargo run --bin proxy_probe -- search <query>");
        eprintln!("       cargo run --bin proxy_probe -- details <movie_id>");
        std::process::exit(1);
    }

    let command = Command::from_str(&args[1])?;
    let base = env::var("PROXY_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
    let api = HttpMovieApi::new(base)?;
    let mut browser = MovieBrowser::new();

    match command {
        Command::Popular => {
            browser.load_popular(&api).await;
            print_view(&browser);
        }
        Command::Search => {
            let query = args[2..].join(" ");
            if !browser.search(&api, &query).await {
                eprintln!("Nothing to search for");
                std::process::exit(1);
            }
            print_view(&browser);
        }
        Command::Details => {
            let id: i64 = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("missing movie id"))?
                .parse()
                .context("movie id must be an integer")?;
            let placeholder = MovieSummary {
                id,
                title: format!("Movie {id}"),
                poster_path: None,
                release_date: String::new(),
                vote_average: None,
                overview: String::new(),
            };
            let mut detail = DetailView::open(placeholder, ConsoleHost);
            detail.load(&api).await;
            let out = match (detail.details(), detail.render()) {
                (Some(details), _) => serde_json::to_value(details)?,
                (None, Some(DetailRender::Content { genres, .. })) => {
                    json!({ "fallback": true, "genres": genres })
                }
                (None, _) => json!({ "fallback": true }),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
            detail.close();
        }
    }

    Ok(())
}

fn print_view(browser: &MovieBrowser) {
    match browser.view() {
        BrowserView::Error { message, retry } => {
            println!("error: {message}{}", if retry { " [Try Again]" } else { "" });
        }
        BrowserView::Loading { message } => println!("{message}"),
        BrowserView::Grid(movies) => {
            for card in movies.iter().map(MovieCard::new) {
                println!(
                    "{:>8}  {:<50} {:>7} {:>4}  {}",
                    card.id,
                    card.title,
                    card.year,
                    card.rating,
                    card.poster.src().unwrap_or("No Image")
                );
            }
        }
        BrowserView::Empty => println!("No movies found. Search for something else"),
        BrowserView::Blank => {}
    }
}
