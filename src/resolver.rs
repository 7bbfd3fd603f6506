use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::ResolverConfig;

pub const DEFAULT_MOVIE_URL: &str = "https://vidsrc.to/embed/movie/{id}";
pub const DEFAULT_EPISODE_URL: &str = "https://vidsrc.to/embed/tv/{id}/{season}/{episode}";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("resolved an invalid stream URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("no stream available: {0}")]
    Unavailable(String),
}

/// Turns a catalog id into something the player can open directly
pub trait StreamResolver {
    fn resolve_movie(&self, id: u64) -> Result<String, ResolveError>;

    fn resolve_episode(
        &self,
        show_id: u64,
        season: u32,
        episode: u32,
    ) -> Result<String, ResolveError>;
}

/// Resolves by filling placeholders in fixed URL templates
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    movie_url: String,
    episode_url: String,
}

impl TemplateResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            movie_url: config.movie_url.clone(),
            episode_url: config.episode_url.clone(),
        }
    }

    fn finish(url: String) -> Result<String, ResolveError> {
        match Url::parse(&url) {
            Ok(parsed) => Ok(parsed.into()),
            Err(source) => Err(ResolveError::InvalidUrl { url, source }),
        }
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl StreamResolver for TemplateResolver {
    fn resolve_movie(&self, id: u64) -> Result<String, ResolveError> {
        debug!(id, "resolving movie stream");
        Self::finish(self.movie_url.replace("{id}", &id.to_string()))
    }

    fn resolve_episode(
        &self,
        show_id: u64,
        season: u32,
        episode: u32,
    ) -> Result<String, ResolveError> {
        debug!(show_id, season, episode, "resolving episode stream");
        let url = self
            .episode_url
            .replace("{id}", &show_id.to_string())
            .replace("{season}", &season.to_string())
            .replace("{episode}", &episode.to_string());
        Self::finish(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates() {
        let resolver = TemplateResolver::default();
        assert_eq!(
            resolver.resolve_movie(27205).unwrap(),
            "https://vidsrc.to/embed/movie/27205"
        );
        assert_eq!(
            resolver.resolve_episode(1399, 1, 3).unwrap(),
            "https://vidsrc.to/embed/tv/1399/1/3"
        );
    }

    #[test]
    fn test_custom_templates() {
        let resolver = TemplateResolver::new(&ResolverConfig {
            movie_url: "http://127.0.0.1:9000/play?movie={id}".to_string(),
            episode_url: "http://127.0.0.1:9000/play?tv={id}&s={season}&e={episode}".to_string(),
        });
        assert_eq!(
            resolver.resolve_movie(7).unwrap(),
            "http://127.0.0.1:9000/play?movie=7"
        );
        assert_eq!(
            resolver.resolve_episode(7, 2, 10).unwrap(),
            "http://127.0.0.1:9000/play?tv=7&s=2&e=10"
        );
    }

    #[test]
    fn test_relative_template_is_rejected() {
        let resolver = TemplateResolver::new(&ResolverConfig {
            movie_url: "movie/{id}".to_string(),
            episode_url: DEFAULT_EPISODE_URL.to_string(),
        });
        assert!(matches!(
            resolver.resolve_movie(1),
            Err(ResolveError::InvalidUrl { .. })
        ));
    }
}
