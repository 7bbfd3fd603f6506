use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::CatalogConfig;
use crate::listing::{ListingKind, ListingRecord};
use crate::plugin::{Art, Directory, DirectoryItem, Outcome, PluginContext, Prompt, SortMethod};
use crate::resolver::{ResolveError, StreamResolver};
use crate::settings::{Credential, CredentialStore, SettingsError};
use crate::tmdb::{TmdbClient, TmdbError};

const CATEGORY: &str = "vska";
const LISTING_CATEGORY: &str = "vska - listing";
const CONTENT: &str = "videos";

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid mode: {0:?}")]
    InvalidMode(String),
    #[error("missing external_id")]
    MissingIdentifier,
    #[error("invalid external_id: {0:?}")]
    InvalidIdentifier(String),
    #[error("missing listingtype")]
    MissingListingType,
    #[error("invalid listingtype: {0:?}")]
    InvalidListingType(String),
    #[error("missing season")]
    MissingSeason,
    #[error("invalid season: {0:?}")]
    InvalidSeason(String),
    #[error("invalid episode: {0:?}")]
    InvalidEpisode(String),
    #[error("{kind} record {id} is missing its season or episode number")]
    IncompleteRecord { id: u64, kind: &'static str },
    #[error("failed to build catalog client: {0}")]
    Client(#[from] TmdbError),
    #[error("failed to resolve stream: {0}")]
    Resolve(#[from] ResolveError),
    #[error("failed to save API key: {0}")]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayTarget {
    Movie { id: u64 },
    Episode { show_id: u64, season: u32, episode: u32 },
}

/// Everything a navigation URL can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Menu,
    SearchMovies,
    SearchShows,
    ListSeasons { show_id: u64 },
    ListEpisodes { show_id: u64, season: u32 },
    Play(PlayTarget),
    SetKey,
}

impl Action {
    /// Decode and validate a navigation query string (without the leading `?`)
    pub fn parse(query: &str) -> Result<Self, RouteError> {
        let params: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        if params.is_empty() {
            return Ok(Action::Menu);
        }

        let get = |key: &str| param(&params, key);

        match get("mode") {
            Some("searchmovie") => Ok(Action::SearchMovies),
            Some("searchtv") => Ok(Action::SearchShows),
            Some("setkey") => Ok(Action::SetKey),
            Some("listing") => {
                let listing_type = get("listingtype").ok_or(RouteError::MissingListingType)?;
                match listing_type {
                    "seasons" => Ok(Action::ListSeasons {
                        show_id: parse_id(get("external_id"))?,
                    }),
                    "episodes" => {
                        let show_id = parse_id(get("external_id"))?;
                        let season = get("season").ok_or(RouteError::MissingSeason)?;
                        Ok(Action::ListEpisodes {
                            show_id,
                            season: parse_number(season, RouteError::InvalidSeason)?,
                        })
                    }
                    other => Err(RouteError::InvalidListingType(other.to_string())),
                }
            }
            Some("play") => {
                let id = parse_id(get("external_id"))?;
                match (get("season"), get("episode")) {
                    (Some(season), Some(episode)) => Ok(Action::Play(PlayTarget::Episode {
                        show_id: id,
                        season: parse_number(season, RouteError::InvalidSeason)?,
                        episode: parse_number(episode, RouteError::InvalidEpisode)?,
                    })),
                    _ => Ok(Action::Play(PlayTarget::Movie { id })),
                }
            }
            other => Err(RouteError::InvalidMode(other.unwrap_or_default().to_string())),
        }
    }

    /// Query parameters that `parse` turns back into this action
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        match *self {
            Action::Menu => Vec::new(),
            Action::SearchMovies => vec![("mode", "searchmovie".to_string())],
            Action::SearchShows => vec![("mode", "searchtv".to_string())],
            Action::SetKey => vec![("mode", "setkey".to_string())],
            Action::ListSeasons { show_id } => vec![
                ("mode", "listing".to_string()),
                ("listingtype", "seasons".to_string()),
                ("external_id", show_id.to_string()),
            ],
            Action::ListEpisodes { show_id, season } => vec![
                ("mode", "listing".to_string()),
                ("listingtype", "episodes".to_string()),
                ("external_id", show_id.to_string()),
                ("season", season.to_string()),
            ],
            Action::Play(PlayTarget::Movie { id }) => vec![
                ("mode", "play".to_string()),
                ("external_id", id.to_string()),
            ],
            Action::Play(PlayTarget::Episode {
                show_id,
                season,
                episode,
            }) => vec![
                ("mode", "play".to_string()),
                ("external_id", show_id.to_string()),
                ("season", season.to_string()),
                ("episode", episode.to_string()),
            ],
        }
    }

    /// Where selecting a record leads. Decided by the record's kind alone.
    pub fn for_record(record: &ListingRecord) -> Result<Self, RouteError> {
        let incomplete = || RouteError::IncompleteRecord {
            id: record.id,
            kind: record.kind.as_str(),
        };

        match record.kind {
            ListingKind::Movie => Ok(Action::Play(PlayTarget::Movie { id: record.id })),
            ListingKind::Episode => match (record.season, record.episode) {
                (Some(season), Some(episode)) => Ok(Action::Play(PlayTarget::Episode {
                    show_id: record.id,
                    season,
                    episode,
                })),
                _ => Err(incomplete()),
            },
            ListingKind::Tv => Ok(Action::ListSeasons { show_id: record.id }),
            ListingKind::Season => match record.season {
                Some(season) => Ok(Action::ListEpisodes {
                    show_id: record.id,
                    season,
                }),
                None => Err(incomplete()),
            },
        }
    }
}

fn param<'p>(params: &'p HashMap<String, String>, key: &str) -> Option<&'p str> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn parse_id(value: Option<&str>) -> Result<u64, RouteError> {
    let value = value.ok_or(RouteError::MissingIdentifier)?;
    value
        .parse()
        .map_err(|_| RouteError::InvalidIdentifier(value.to_string()))
}

fn parse_number(value: &str, err: fn(String) -> RouteError) -> Result<u32, RouteError> {
    value.parse().map_err(|_| err(value.to_string()))
}

/// Turn records into a selectable directory. Fails as a whole if any record
/// can't be turned into a navigation target.
pub fn render_listing(
    ctx: &PluginContext,
    records: &[ListingRecord],
) -> Result<Directory, RouteError> {
    let items = records
        .iter()
        .map(|record| -> Result<DirectoryItem, RouteError> {
            let target = Action::for_record(record)?;
            let playable = record.playable();
            Ok(DirectoryItem {
                label: record.title.clone(),
                plot: record.plot.clone(),
                art: Art {
                    icon: record.poster.clone(),
                    fanart: record.fanart.clone(),
                },
                url: ctx.build_url(&target.to_params()),
                is_folder: !playable,
                playable,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Directory {
        category: LISTING_CATEGORY.to_string(),
        content: CONTENT.to_string(),
        sort: SortMethod::LabelIgnoreThe,
        items,
    })
}

/// Top-level menu. The key entry only shows once a key has been stored.
pub fn render_menu(ctx: &PluginContext, has_credential: bool) -> Directory {
    let entry = |label: &str, icon: &str, action: Action, is_folder: bool| DirectoryItem {
        label: label.to_string(),
        plot: String::new(),
        art: Art {
            icon: Some(ctx.icon(icon)),
            fanart: None,
        },
        url: ctx.build_url(&action.to_params()),
        is_folder,
        playable: false,
    };

    let mut items = vec![
        entry("Movies", "movie.png", Action::SearchMovies, true),
        entry("TV", "tv.png", Action::SearchShows, true),
    ];
    if has_credential {
        items.push(entry("Set API key", "key.png", Action::SetKey, false));
    }

    Directory {
        category: CATEGORY.to_string(),
        content: CONTENT.to_string(),
        sort: SortMethod::Size,
        items,
    }
}

/// Dispatches one invocation to exactly one action
pub struct Router<'a> {
    ctx: &'a PluginContext,
    catalog: &'a CatalogConfig,
    settings: &'a mut dyn CredentialStore,
    resolver: &'a dyn StreamResolver,
    prompt: &'a mut dyn Prompt,
}

impl<'a> Router<'a> {
    pub fn new(
        ctx: &'a PluginContext,
        catalog: &'a CatalogConfig,
        settings: &'a mut dyn CredentialStore,
        resolver: &'a dyn StreamResolver,
        prompt: &'a mut dyn Prompt,
    ) -> Self {
        Self {
            ctx,
            catalog,
            settings,
            resolver,
            prompt,
        }
    }

    /// Route the context's query string
    pub async fn route(&mut self) -> Result<Outcome, RouteError> {
        let action = Action::parse(&self.ctx.query)?;
        self.dispatch(action).await
    }

    pub async fn dispatch(&mut self, action: Action) -> Result<Outcome, RouteError> {
        info!(?action, "dispatching");

        match action {
            Action::Menu => {
                let has_credential = self.settings.credential().is_some();
                Ok(Outcome::Directory(render_menu(self.ctx, has_credential)))
            }
            Action::SearchMovies => {
                let Some(query) = self.ask("Search movie...") else {
                    return Ok(Outcome::Cancelled);
                };
                let records = self.client()?.search_movies(&query).await;
                self.listing(&records)
            }
            Action::SearchShows => {
                let Some(query) = self.ask("Search TV show...") else {
                    return Ok(Outcome::Cancelled);
                };
                let records = self.client()?.search_shows(&query).await;
                self.listing(&records)
            }
            Action::ListSeasons { show_id } => {
                let records = self.client()?.list_seasons(show_id).await;
                self.listing(&records)
            }
            Action::ListEpisodes { show_id, season } => {
                let records = self.client()?.list_episodes(show_id, season).await;
                self.listing(&records)
            }
            Action::Play(target) => {
                let url = match target {
                    PlayTarget::Movie { id } => self.resolver.resolve_movie(id)?,
                    PlayTarget::Episode {
                        show_id,
                        season,
                        episode,
                    } => self.resolver.resolve_episode(show_id, season, episode)?,
                };
                debug!(url = %url, "resolved stream");
                Ok(Outcome::Play { url })
            }
            Action::SetKey => {
                let Some(key) = self.ask("Enter API key...") else {
                    return Ok(Outcome::Cancelled);
                };
                self.settings.set_credential(Credential::new(key))?;
                info!("API key updated");
                Ok(Outcome::Refresh)
            }
        }
    }

    fn ask(&mut self, heading: &str) -> Option<String> {
        self.prompt
            .input(heading)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn client(&self) -> Result<TmdbClient, RouteError> {
        let credential = self.settings.credential().unwrap_or_default();
        if credential.is_empty() {
            warn!("no API key set, catalog requests will be rejected");
        }
        Ok(TmdbClient::from_config(self.catalog, &credential)?)
    }

    fn listing(&self, records: &[ListingRecord]) -> Result<Outcome, RouteError> {
        debug!(count = records.len(), "rendering listing");
        Ok(Outcome::Directory(render_listing(self.ctx, records)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PluginContext {
        PluginContext::from_args(vec!["plugin://plugin.video.vska/".to_string(), "1".to_string()])
            .unwrap()
            .with_icons_dir("/icons")
    }

    fn query_of(url: &str) -> &str {
        url.split_once('?').map(|(_, q)| q).unwrap_or_default()
    }

    #[test]
    fn test_parse_empty_is_menu() {
        assert_eq!(Action::parse("").unwrap(), Action::Menu);
    }

    #[test]
    fn test_parse_simple_modes() {
        assert_eq!(Action::parse("mode=searchmovie").unwrap(), Action::SearchMovies);
        assert_eq!(Action::parse("mode=searchtv").unwrap(), Action::SearchShows);
        assert_eq!(Action::parse("mode=setkey").unwrap(), Action::SetKey);
    }

    #[test]
    fn test_parse_unknown_or_absent_mode() {
        assert!(matches!(
            Action::parse("mode=unknown"),
            Err(RouteError::InvalidMode(m)) if m == "unknown"
        ));
        assert!(matches!(
            Action::parse("external_id=5"),
            Err(RouteError::InvalidMode(m)) if m.is_empty()
        ));
    }

    #[test]
    fn test_parse_listing() {
        assert_eq!(
            Action::parse("mode=listing&listingtype=seasons&external_id=1399").unwrap(),
            Action::ListSeasons { show_id: 1399 }
        );
        assert_eq!(
            Action::parse("mode=listing&listingtype=episodes&external_id=1399&season=2").unwrap(),
            Action::ListEpisodes {
                show_id: 1399,
                season: 2
            }
        );
    }

    #[test]
    fn test_parse_listing_errors() {
        assert!(matches!(
            Action::parse("mode=listing&external_id=1399"),
            Err(RouteError::MissingListingType)
        ));
        assert!(matches!(
            Action::parse("mode=listing&listingtype=movies&external_id=1399"),
            Err(RouteError::InvalidListingType(t)) if t == "movies"
        ));
        assert!(matches!(
            Action::parse("mode=listing&listingtype=seasons"),
            Err(RouteError::MissingIdentifier)
        ));
        assert!(matches!(
            Action::parse("mode=listing&listingtype=seasons&external_id=abc"),
            Err(RouteError::InvalidIdentifier(v)) if v == "abc"
        ));
        assert!(matches!(
            Action::parse("mode=listing&listingtype=episodes&external_id=1399"),
            Err(RouteError::MissingSeason)
        ));
        assert!(matches!(
            Action::parse("mode=listing&listingtype=episodes&external_id=1399&season=x"),
            Err(RouteError::InvalidSeason(v)) if v == "x"
        ));
    }

    #[test]
    fn test_parse_play() {
        assert_eq!(
            Action::parse("mode=play&external_id=27205").unwrap(),
            Action::Play(PlayTarget::Movie { id: 27205 })
        );
        assert_eq!(
            Action::parse("mode=play&external_id=1399&season=1&episode=3").unwrap(),
            Action::Play(PlayTarget::Episode {
                show_id: 1399,
                season: 1,
                episode: 3
            })
        );
        // Only one of the pair means a movie
        assert_eq!(
            Action::parse("mode=play&external_id=1399&season=1").unwrap(),
            Action::Play(PlayTarget::Movie { id: 1399 })
        );
        assert!(matches!(
            Action::parse("mode=play"),
            Err(RouteError::MissingIdentifier)
        ));
        assert!(matches!(
            Action::parse("mode=play&external_id=1&season=1&episode=e"),
            Err(RouteError::InvalidEpisode(v)) if v == "e"
        ));
    }

    #[test]
    fn test_every_action_survives_its_own_params() {
        let actions = [
            Action::SearchMovies,
            Action::SearchShows,
            Action::SetKey,
            Action::ListSeasons { show_id: 1 },
            Action::ListEpisodes {
                show_id: 1,
                season: 0,
            },
            Action::Play(PlayTarget::Movie { id: 2 }),
            Action::Play(PlayTarget::Episode {
                show_id: 3,
                season: 4,
                episode: 5,
            }),
        ];

        let ctx = ctx();
        for action in actions {
            let url = ctx.build_url(&action.to_params());
            assert_eq!(Action::parse(query_of(&url)).unwrap(), action);
        }
    }

    #[test]
    fn test_movie_record_round_trips_to_play() {
        let record = ListingRecord::movie(27205, "Inception (2010)".into(), String::new());
        let dir = render_listing(&ctx(), &[record]).unwrap();
        let item = &dir.items[0];

        assert!(item.playable);
        assert!(!item.is_folder);
        assert_eq!(
            Action::parse(query_of(&item.url)).unwrap(),
            Action::Play(PlayTarget::Movie { id: 27205 })
        );
    }

    #[test]
    fn test_render_listing_targets_by_kind() {
        let records = vec![
            ListingRecord::show(1399, "Game of Thrones (2011)".into(), String::new()),
            ListingRecord::season(1399, 1, "Season 1".into(), String::new()),
            ListingRecord::episode(1399, 1, 2, "Episode 2: X".into(), String::new()),
        ];
        let dir = render_listing(&ctx(), &records).unwrap();

        assert_eq!(dir.category, "vska - listing");
        assert_eq!(dir.sort, SortMethod::LabelIgnoreThe);
        assert_eq!(
            query_of(&dir.items[0].url),
            "mode=listing&listingtype=seasons&external_id=1399"
        );
        assert!(dir.items[0].is_folder);
        assert_eq!(
            query_of(&dir.items[1].url),
            "mode=listing&listingtype=episodes&external_id=1399&season=1"
        );
        assert!(dir.items[1].is_folder);
        assert_eq!(
            query_of(&dir.items[2].url),
            "mode=play&external_id=1399&season=1&episode=2"
        );
        assert!(dir.items[2].playable);
    }

    #[test]
    fn test_render_listing_carries_art_and_plot() {
        let record = ListingRecord::movie(1, "A (-)".into(), "plot".into())
            .with_art(Some("https://img/p.jpg".into()), None);
        let dir = render_listing(&ctx(), &[record]).unwrap();

        assert_eq!(dir.items[0].label, "A (-)");
        assert_eq!(dir.items[0].plot, "plot");
        assert_eq!(dir.items[0].art.icon.as_deref(), Some("https://img/p.jpg"));
        assert_eq!(dir.items[0].art.fanart, None);
    }

    #[test]
    fn test_render_listing_rejects_incomplete_record() {
        let mut record = ListingRecord::season(1399, 1, "Season 1".into(), String::new());
        record.season = None;

        assert!(matches!(
            render_listing(&ctx(), &[record]),
            Err(RouteError::IncompleteRecord { id: 1399, kind: "season" })
        ));
    }

    #[test]
    fn test_menu_entries() {
        let ctx = ctx();
        let without_key = render_menu(&ctx, false);
        assert_eq!(without_key.items.len(), 2);
        assert_eq!(without_key.sort, SortMethod::Size);
        assert_eq!(without_key.items[0].label, "Movies");
        assert_eq!(query_of(&without_key.items[0].url), "mode=searchmovie");
        assert_eq!(without_key.items[1].art.icon.as_deref(), Some("/icons/tv.png"));

        let with_key = render_menu(&ctx, true);
        assert_eq!(with_key.items.len(), 3);
        assert_eq!(query_of(&with_key.items[2].url), "mode=setkey");
    }
}
