pub mod app;
pub mod config;
pub mod controller;
pub mod detail;
pub mod error;
pub mod models;
pub mod tmdb;
pub mod view;
