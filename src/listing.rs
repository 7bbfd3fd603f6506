use serde::{Serialize, Serializer};

pub const BASE_POSTER_PATH: &str = "https://www.themoviedb.org/t/p/w600_and_h900_bestv2";
pub const BASE_BACKDROP_PATH: &str = "https://www.themoviedb.org/t/p/original";

/// What a listing entry represents in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Movie,
    Tv,
    Season,
    Episode,
}

impl ListingKind {
    /// Movies and episodes are leaves; shows and seasons only contain other entries.
    pub fn is_playable(self) -> bool {
        match self {
            ListingKind::Movie | ListingKind::Episode => true,
            ListingKind::Tv | ListingKind::Season => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListingKind::Movie => "movie",
            ListingKind::Tv => "tv",
            ListingKind::Season => "season",
            ListingKind::Episode => "episode",
        }
    }
}

/// One browsable or playable entry, normalized from a catalog response
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    /// Catalog id. For seasons and episodes this is the parent show's id.
    pub id: u64,
    pub title: String,
    pub plot: String,
    pub poster: Option<String>,
    pub fanart: Option<String>,
    pub kind: ListingKind,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ListingRecord {
    pub fn movie(id: u64, title: String, plot: String) -> Self {
        Self::new(id, title, plot, ListingKind::Movie)
    }

    pub fn show(id: u64, title: String, plot: String) -> Self {
        Self::new(id, title, plot, ListingKind::Tv)
    }

    pub fn season(show_id: u64, season: u32, title: String, plot: String) -> Self {
        Self {
            season: Some(season),
            ..Self::new(show_id, title, plot, ListingKind::Season)
        }
    }

    pub fn episode(show_id: u64, season: u32, episode: u32, title: String, plot: String) -> Self {
        Self {
            season: Some(season),
            episode: Some(episode),
            ..Self::new(show_id, title, plot, ListingKind::Episode)
        }
    }

    fn new(id: u64, title: String, plot: String, kind: ListingKind) -> Self {
        Self {
            id,
            title,
            plot,
            poster: None,
            fanart: None,
            kind,
            season: None,
            episode: None,
        }
    }

    pub fn with_art(mut self, poster: Option<String>, fanart: Option<String>) -> Self {
        self.poster = poster;
        self.fanart = fanart;
        self
    }

    pub fn playable(&self) -> bool {
        self.kind.is_playable()
    }
}

impl Serialize for ListingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("ListingRecord", 9)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("plot", &self.plot)?;
        s.serialize_field("poster", &self.poster)?;
        s.serialize_field("fanart", &self.fanart)?;
        s.serialize_field("type", &self.kind)?;
        s.serialize_field("season", &self.season)?;
        s.serialize_field("episode", &self.episode)?;
        s.serialize_field("playable", &self.playable())?;
        s.end()
    }
}

/// Join a relative catalog image path onto a fixed base.
/// Absent or empty paths give `None` rather than a bare base URL.
pub fn image_url(base: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}{}", base, p))
}

pub fn poster_url(path: Option<&str>) -> Option<String> {
    image_url(BASE_POSTER_PATH, path)
}

pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    image_url(BASE_BACKDROP_PATH, path)
}

/// "Inception" + "2010-07-16" -> "Inception (2010)"; a missing date gives "(-)"
pub fn title_with_year(title: &str, date: Option<&str>) -> String {
    let year = date
        .and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .unwrap_or("-");
    format!("{} ({})", title, year)
}

pub fn episode_title(number: u32, name: &str) -> String {
    format!("Episode {}: {}", number, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playable_follows_kind() {
        assert!(ListingKind::Movie.is_playable());
        assert!(ListingKind::Episode.is_playable());
        assert!(!ListingKind::Tv.is_playable());
        assert!(!ListingKind::Season.is_playable());
    }

    #[test]
    fn test_constructors_set_only_their_numbers() {
        let movie = ListingRecord::movie(1, "A".into(), String::new());
        assert_eq!((movie.season, movie.episode), (None, None));

        let show = ListingRecord::show(2, "B".into(), String::new());
        assert_eq!((show.season, show.episode), (None, None));

        let season = ListingRecord::season(2, 3, "Season 3".into(), String::new());
        assert_eq!((season.season, season.episode), (Some(3), None));

        let episode = ListingRecord::episode(2, 3, 4, "Episode 4: D".into(), String::new());
        assert_eq!((episode.season, episode.episode), (Some(3), Some(4)));
        assert_eq!(episode.id, 2);
    }

    #[test]
    fn test_image_url_guards_missing_paths() {
        assert_eq!(
            poster_url(Some("/abc.jpg")),
            Some("https://www.themoviedb.org/t/p/w600_and_h900_bestv2/abc.jpg".to_string())
        );
        assert_eq!(
            backdrop_url(Some("/bg.jpg")),
            Some("https://www.themoviedb.org/t/p/original/bg.jpg".to_string())
        );
        assert_eq!(poster_url(None), None);
        assert_eq!(backdrop_url(Some("")), None);
    }

    #[test]
    fn test_title_with_year() {
        assert_eq!(title_with_year("Inception", Some("2010-07-16")), "Inception (2010)");
        assert_eq!(title_with_year("Unreleased", Some("")), "Unreleased (-)");
        assert_eq!(title_with_year("Unknown", None), "Unknown (-)");
    }

    #[test]
    fn test_episode_title() {
        assert_eq!(episode_title(3, "The Pilot"), "Episode 3: The Pilot");
    }

    #[test]
    fn test_record_serializes_type_and_playable() {
        let record = ListingRecord::episode(1399, 1, 2, "Episode 2: X".into(), "plot".into())
            .with_art(poster_url(Some("/s.jpg")), None);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "episode");
        assert_eq!(json["playable"], true);
        assert_eq!(json["season"], 1);
        assert_eq!(json["episode"], 2);
        assert!(json["fanart"].is_null());
    }
}
