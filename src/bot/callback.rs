const SELECT_MATCH_PREFIX: char = 'm';
const GOTO_PAGE_PREFIX: char = 'p';
const BACK: &str = "back";
const PAGE_INDICATOR: &str = "cp";

/// Decoded inline button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
  SelectMatch(usize),
  GotoPage(usize),
  Back,
  NoOp,
}

impl CallbackAction {
  pub fn parse(data: &str) -> Option<Self> {
    match data {
      BACK => return Some(Self::Back),
      PAGE_INDICATOR => return Some(Self::NoOp),
      _ => {},
    }

    if let Some(index) = data.strip_prefix(SELECT_MATCH_PREFIX) {
      return parse_number(index).map(Self::SelectMatch);
    }
    if let Some(page) = data.strip_prefix(GOTO_PAGE_PREFIX) {
      return parse_number(page).map(Self::GotoPage);
    }
    None
  }

  pub fn encode(self) -> String {
    match self {
      Self::SelectMatch(index) => format!("{SELECT_MATCH_PREFIX}{index}"),
      Self::GotoPage(page) => format!("{GOTO_PAGE_PREFIX}{page}"),
      Self::Back => BACK.to_string(),
      Self::NoOp => PAGE_INDICATOR.to_string(),
    }
  }
}

fn parse_number(raw: &str) -> Option<usize> {
  if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  raw.parse().ok()
}
