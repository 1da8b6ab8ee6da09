use serde::Deserialize;
use serde::Serialize;

use crate::bot::pagination::MATCHES_PER_PAGE;
use crate::bot::pagination::total_pages;
use crate::models::Category;
use crate::models::Match;
use crate::models::Sport;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  #[default]
  Init,
  SportChosen,
  CategoryChosen,
  MatchListShown,
  MatchDetailShown,
}

/// Per-chat browsing state kept in the dialogue storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
  pub stage: Stage,
  pub sport: Option<Sport>,
  pub category: Option<Category>,
  pub matches: Vec<Match>,
  pub current_page: usize,
  pub current_match: Option<usize>,
}

impl Default for Session {
  fn default() -> Self {
    Self {
      stage: Stage::Init,
      sport: None,
      category: None,
      matches: Vec::new(),
      current_page: 1,
      current_match: None,
    }
  }
}

impl Session {
  pub fn total_pages(&self) -> usize {
    total_pages(self.matches.len(), MATCHES_PER_PAGE)
  }

  pub fn choose_sport(&mut self, sport: Sport) {
    *self = Self {
      stage: Stage::SportChosen,
      sport: Some(sport),
      ..Self::default()
    };
  }

  /// Installs a new match snapshot; any earlier selection refers to the old one.
  pub fn replace_matches(&mut self, matches: Vec<Match>) {
    self.matches = matches;
    self.current_page = 1;
    self.current_match = None;
  }

  pub fn match_at(&self, index: usize) -> Option<&Match> {
    self.matches.get(index)
  }

  pub fn selected_match(&self) -> Option<&Match> {
    self.current_match.and_then(|index| self.match_at(index))
  }
}
