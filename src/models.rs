use std::fmt;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
  Football,
  Cricket,
}

impl Sport {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Football => "football",
      Self::Cricket => "cricket",
    }
  }
}

impl fmt::Display for Sport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Listing mode applied when fetching matches for a sport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  All,
  Popular,
  Live,
}

impl Category {
  pub fn title(self) -> &'static str {
    match self {
      Self::All => "All",
      Self::Popular => "Popular",
      Self::Live => "Live",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Match {
  pub id: String,
  pub title: String,
  pub category: String,
  #[serde(default)]
  pub date: Option<i64>,
  #[serde(default)]
  pub poster: Option<String>,
  #[serde(default)]
  pub teams: Option<Teams>,
  #[serde(default)]
  pub sources: Vec<Source>,
}

impl Match {
  pub fn is_sport(&self, sport: Sport) -> bool {
    self.category == sport.as_str()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Teams {
  pub home: Team,
  pub away: Team,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
  pub source: String,
  pub id: String,
}

/// Stream metadata as returned by the catalog's stream lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
  pub id: String,
  #[serde(default)]
  pub stream_no: u32,
  #[serde(default)]
  pub language: String,
  #[serde(default)]
  pub hd: bool,
  pub embed_url: String,
  #[serde(default)]
  pub source: String,
}
