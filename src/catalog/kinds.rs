use std::fmt;
use std::str::FromStr;

use reelgate_core::Error;
use serde::{Deserialize, Serialize};

/// Paginated listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListCategory {
    TrendingMovies,
    TrendingTv,
    PopularMovies,
    PopularTv,
    TopRatedMovies,
    TopRatedTv,
    NowPlaying,
    Upcoming,
    AiringToday,
    OnTheAir,
}

impl ListCategory {
    pub const ALL: [ListCategory; 10] = [
        ListCategory::TrendingMovies,
        ListCategory::TrendingTv,
        ListCategory::PopularMovies,
        ListCategory::PopularTv,
        ListCategory::TopRatedMovies,
        ListCategory::TopRatedTv,
        ListCategory::NowPlaying,
        ListCategory::Upcoming,
        ListCategory::AiringToday,
        ListCategory::OnTheAir,
    ];

    /// Upstream path for this listing.
    pub fn path(self) -> &'static str {
        match self {
            ListCategory::TrendingMovies => "/trending/movie/week",
            ListCategory::TrendingTv => "/trending/tv/week",
            ListCategory::PopularMovies => "/movie/popular",
            ListCategory::PopularTv => "/tv/popular",
            ListCategory::TopRatedMovies => "/movie/top_rated",
            ListCategory::TopRatedTv => "/tv/top_rated",
            ListCategory::NowPlaying => "/movie/now_playing",
            ListCategory::Upcoming => "/movie/upcoming",
            ListCategory::AiringToday => "/tv/airing_today",
            ListCategory::OnTheAir => "/tv/on_the_air",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListCategory::TrendingMovies => "trending-movies",
            ListCategory::TrendingTv => "trending-tv",
            ListCategory::PopularMovies => "popular-movies",
            ListCategory::PopularTv => "popular-tv",
            ListCategory::TopRatedMovies => "top-rated-movies",
            ListCategory::TopRatedTv => "top-rated-tv",
            ListCategory::NowPlaying => "now-playing",
            ListCategory::Upcoming => "upcoming",
            ListCategory::AiringToday => "airing-today",
            ListCategory::OnTheAir => "on-the-air",
        }
    }
}

impl fmt::Display for ListCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("unknown list category '{s}'")))
    }
}

/// Movie or TV show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "tv" | "show" | "shows" => Ok(MediaKind::Tv),
            other => Err(Error::validation(format!("unknown media kind '{other}'"))),
        }
    }
}

/// What a search covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Movie,
    Tv,
    #[default]
    Multi,
}

impl SearchKind {
    pub fn path(self) -> &'static str {
        match self {
            SearchKind::Movie => "/search/movie",
            SearchKind::Tv => "/search/tv",
            SearchKind::Multi => "/search/multi",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchKind::Movie => f.write_str("movie"),
            SearchKind::Tv => f.write_str("tv"),
            SearchKind::Multi => f.write_str("multi"),
        }
    }
}

impl FromStr for SearchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(SearchKind::Movie),
            "tv" | "show" | "shows" => Ok(SearchKind::Tv),
            "multi" | "all" => Ok(SearchKind::Multi),
            other => Err(Error::validation(format!("unknown search kind '{other}'"))),
        }
    }
}
