use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::listing::{self, ListingRecord};
use crate::settings::Credential;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org";
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(StatusCode),
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResult {
    id: u64,
    title: Option<String>, // Movies
    name: Option<String>,  // TV shows
    #[serde(default)]
    overview: Option<String>,
    release_date: Option<String>,   // Movies
    first_air_date: Option<String>, // TV shows
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

impl SearchResult {
    fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Unknown")
    }

    fn date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
    }

    fn into_record(self, make: fn(u64, String, String) -> ListingRecord) -> ListingRecord {
        let title = listing::title_with_year(self.display_title(), self.date());
        let poster = listing::poster_url(self.poster_path.as_deref());
        let fanart = listing::backdrop_url(self.backdrop_path.as_deref());
        make(self.id, title, self.overview.unwrap_or_default()).with_art(poster, fanart)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// TV show details including seasons
#[derive(Debug, Clone, Deserialize)]
struct TvDetails {
    backdrop_path: Option<String>,
    #[serde(default)]
    seasons: Vec<SeasonSummary>,
}

/// Summary of a season (from TV details)
#[derive(Debug, Clone, Deserialize)]
struct SeasonSummary {
    name: String,
    season_number: u32,
    poster_path: Option<String>,
    overview: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonDetails {
    #[serde(default)]
    episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Deserialize)]
struct Episode {
    name: String,
    episode_number: u32,
    overview: Option<String>,
    still_path: Option<String>,
}

/// Catalog client. Every lookup resolves to a (possibly empty) list of records;
/// upstream failures are logged and never reach the caller.
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(credential: &Credential) -> Result<Self, TmdbError> {
        Self::with_base_url(credential, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL (for config overrides and testing)
    pub fn with_base_url(
        credential: &Credential,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TmdbError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: credential.as_str().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        })
    }

    pub fn from_config(config: &CatalogConfig, credential: &Credential) -> Result<Self, TmdbError> {
        let mut client = Self::with_base_url(credential, &config.base_url, config.timeout())?;
        client.language = config.language.clone();
        Ok(client)
    }

    /// Search for movies, first page only
    pub async fn search_movies(&self, query: &str) -> Vec<ListingRecord> {
        let url = self.search_url("movie", query);

        debug!(query, "searching movies");

        match self.get_json::<SearchResponse>(&url).await {
            Ok(response) => response
                .results
                .into_iter()
                .map(|r| r.into_record(ListingRecord::movie))
                .collect(),
            Err(e) => {
                warn!(query, error = %e, "movie search failed");
                Vec::new()
            }
        }
    }

    /// Search for TV shows, first page only
    pub async fn search_shows(&self, query: &str) -> Vec<ListingRecord> {
        let url = self.search_url("tv", query);

        debug!(query, "searching TV shows");

        match self.get_json::<SearchResponse>(&url).await {
            Ok(response) => response
                .results
                .into_iter()
                .map(|r| r.into_record(ListingRecord::show))
                .collect(),
            Err(e) => {
                warn!(query, error = %e, "TV search failed");
                Vec::new()
            }
        }
    }

    /// One record per season of a show. Seasons share the show's backdrop as fanart.
    pub async fn list_seasons(&self, show_id: u64) -> Vec<ListingRecord> {
        let url = format!(
            "{}/3/tv/{}?language={}",
            self.base_url,
            show_id,
            urlencoding::encode(&self.language)
        );

        debug!(show_id, "fetching TV details");

        let details = match self.get_json::<TvDetails>(&url).await {
            Ok(details) => details,
            Err(e) => {
                warn!(show_id, error = %e, "fetching seasons failed");
                return Vec::new();
            }
        };

        let fanart = listing::backdrop_url(details.backdrop_path.as_deref());
        details
            .seasons
            .into_iter()
            .map(|s| {
                let poster = listing::poster_url(s.poster_path.as_deref());
                ListingRecord::season(
                    show_id,
                    s.season_number,
                    s.name,
                    s.overview.unwrap_or_default(),
                )
                .with_art(poster, fanart.clone())
            })
            .collect()
    }

    /// One record per episode of a season. There is no episode backdrop, so the
    /// still image doubles as poster and fanart.
    pub async fn list_episodes(&self, show_id: u64, season_number: u32) -> Vec<ListingRecord> {
        let url = format!(
            "{}/3/tv/{}/season/{}?language={}",
            self.base_url,
            show_id,
            season_number,
            urlencoding::encode(&self.language)
        );

        debug!(show_id, season_number, "fetching season details");

        let details = match self.get_json::<SeasonDetails>(&url).await {
            Ok(details) => details,
            Err(e) => {
                warn!(show_id, season_number, error = %e, "fetching episodes failed");
                return Vec::new();
            }
        };

        details
            .episodes
            .into_iter()
            .map(|e| {
                let still = e.still_path.as_deref();
                ListingRecord::episode(
                    show_id,
                    season_number,
                    e.episode_number,
                    listing::episode_title(e.episode_number, &e.name),
                    e.overview.unwrap_or_default(),
                )
                .with_art(listing::poster_url(still), listing::backdrop_url(still))
            })
            .collect()
    }

    fn search_url(&self, kind: &str, query: &str) -> String {
        format!(
            "{}/3/search/{}?query={}&include_adult=false&language={}&page=1",
            self.base_url,
            kind,
            urlencoding::encode(query),
            urlencoding::encode(&self.language)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TmdbError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TmdbError::Status(response.status()));
        }

        Ok(response.json().await?)
    }
}
