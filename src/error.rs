use std::{io,num};

use thiserror::Error;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug,Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    IO(#[from] io::Error),
    #[error("CSV error: {0}")]
    CSV(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JSON(#[from] serde_json::Error),
    #[error("Request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),
    #[error("Integer parse error: {0}")]
    ParseInt(#[from] num::ParseIntError),
    #[error("Date parse error: {0}")]
    ParseDate(#[from] chrono::format::ParseError),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Malformed table: {0}")]
    MalformedTable(String),
    #[error("Missing region: {0}")]
    MissingRegion(String),
    #[error("Missing population for country: {0}")]
    MissingPopulation(String),
    #[error("Duplicate population entry: {0}")]
    DuplicatePopulation(String),
    #[error("No data!")]
    MissingData,
}
