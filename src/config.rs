//! Runtime settings read from the environment (and `.env` when present).

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::extract::{HtmlLayout, Layout, PdfLayout};

pub const DEFAULT_DATABASE_PATH: &str = "forex_rates.db";
pub const DEFAULT_SOURCE_URL: &str =
    "https://www.hdfcbank.com/personal/resources/learning-centre/forex/treasury-forex-card-rates";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_VIEWER_ADDR: &str = "127.0.0.1:8080";

/// Shape of the published rates document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Html,
    Pdf,
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown format {other:?}, expected \"html\" or \"pdf\"")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub format: SourceFormat,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub source: SourceSettings,
    pub pdf_layout: PdfLayout,
    pub viewer_addr: String,
}

impl Settings {
    /// Loads `.env` (if any) and reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let defaults = PdfLayout::default();
        let pdf_layout = PdfLayout {
            group_index: parse_var(&lookup, "FOREX_PDF_GROUP_INDEX", defaults.group_index)?,
            group_count: parse_var(&lookup, "FOREX_PDF_GROUP_COUNT", defaults.group_count)?,
            min_rows: parse_var(&lookup, "FOREX_PDF_MIN_ROWS", defaults.min_rows)?,
        };
        if pdf_layout.group_count == 0 || pdf_layout.group_index >= pdf_layout.group_count {
            return Err(ConfigError::invalid(
                "FOREX_PDF_GROUP_INDEX",
                pdf_layout.group_index.to_string(),
                format!("must be below FOREX_PDF_GROUP_COUNT ({})", pdf_layout.group_count),
            ));
        }

        Ok(Self {
            database_path: PathBuf::from(string_or("FOREX_DATABASE_PATH", DEFAULT_DATABASE_PATH)),
            source: SourceSettings {
                url: string_or("FOREX_SOURCE_URL", DEFAULT_SOURCE_URL),
                format: parse_var(&lookup, "FOREX_SOURCE_FORMAT", SourceFormat::Html)?,
                timeout_secs: parse_var(&lookup, "FOREX_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
                user_agent: string_or("FOREX_USER_AGENT", DEFAULT_USER_AGENT),
            },
            pdf_layout,
            viewer_addr: string_or("FOREX_VIEWER_ADDR", DEFAULT_VIEWER_ADDR),
        })
    }

    /// The extraction layout for the configured document format.
    pub fn layout(&self) -> Layout {
        match self.source.format {
            SourceFormat::Html => Layout::Html(HtmlLayout::default()),
            SourceFormat::Pdf => Layout::Pdf(self.pdf_layout.clone()),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, raw.clone(), e.to_string())),
    }
}
