use chrono_tz::Tz;
use reqwest::Url;
use teloxide::types::InlineKeyboardButton;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::KeyboardButton;
use teloxide::types::KeyboardMarkup;
use teloxide::utils::markdown;
use tracing::warn;

use crate::bot::callback::CallbackAction;
use crate::bot::commands::ALL_LABEL;
use crate::bot::commands::CRICKET_LABEL;
use crate::bot::commands::FOOTBALL_LABEL;
use crate::bot::commands::LIVE_LABEL;
use crate::bot::commands::MAIN_MENU_LABEL;
use crate::bot::commands::POPULAR_LABEL;
use crate::bot::pagination::MATCHES_PER_PAGE;
use crate::bot::pagination::NavControl;
use crate::bot::pagination::navigation;
use crate::bot::pagination::paginate;
use crate::bot::state::Session;
use crate::models::Match;
use crate::models::Source;
use crate::util::format_local_time;
use crate::util::truncate_title;

/// Telegram caps button labels, so match titles are cut well before that.
pub const MAX_BUTTON_TITLE_CHARS: usize = 35;

pub fn main_menu_keyboard() -> KeyboardMarkup {
  KeyboardMarkup::new(vec![vec![
    KeyboardButton::new(FOOTBALL_LABEL),
    KeyboardButton::new(CRICKET_LABEL),
  ]])
  .resize_keyboard()
}

pub fn sub_menu_keyboard() -> KeyboardMarkup {
  KeyboardMarkup::new(vec![
    vec![
      KeyboardButton::new(ALL_LABEL),
      KeyboardButton::new(POPULAR_LABEL),
      KeyboardButton::new(LIVE_LABEL),
    ],
    vec![KeyboardButton::new(MAIN_MENU_LABEL)],
  ])
  .resize_keyboard()
}

pub fn format_match_summary(item: &Match) -> String {
  truncate_title(&item.title, MAX_BUTTON_TITLE_CHARS)
}

/// MarkdownV2 description of a single match.
pub fn format_match_detail(item: &Match, tz: Tz) -> String {
  let mut text = format!("🎮 {}\n\n", markdown::bold(&markdown::escape(&item.title)));

  if let Some(teams) = &item.teams {
    text.push_str(&format!("🏠 Home: {}\n", markdown::escape(&teams.home.name)));
    text.push_str(&format!("🌍 Away: {}\n\n", markdown::escape(&teams.away.name)));
  }

  if let Some(date) = item.date.and_then(|ms| format_local_time(ms, tz)) {
    text.push_str(&format!("📅 Date: {}\n", markdown::escape(&date)));
  }

  text.push_str(&format!("\n📺 Available Sources: {}", item.sources.len()));
  text
}

pub fn stream_link(public_url: &str, source: &Source) -> Option<Url> {
  let mut url = Url::parse(public_url).ok()?;
  url
    .path_segments_mut()
    .ok()?
    .pop_if_empty()
    .extend(["stream", source.source.as_str(), source.id.as_str()]);
  Some(url)
}

pub fn source_buttons(sources: &[Source], public_url: &str) -> InlineKeyboardMarkup {
  let mut rows: Vec<Vec<InlineKeyboardButton>> = sources
    .iter()
    .filter_map(|source| match stream_link(public_url, source) {
      Some(url) => Some(vec![InlineKeyboardButton::url(source.source.to_uppercase(), url)]),
      None => {
        warn!(source = %source.source, id = %source.id, "could not build stream link");
        None
      },
    })
    .collect();

  rows.push(vec![InlineKeyboardButton::callback(
    "🔙 Back to Matches",
    CallbackAction::Back.encode(),
  )]);
  InlineKeyboardMarkup::new(rows)
}

pub fn match_list_text(session: &Session) -> String {
  let category = session.category.map_or("All", |category| category.title());
  let sport = session.sport.map_or("", |sport| sport.as_str());
  format!(
    "{} {} matches (Page {} of {}, Total matches: {})",
    category,
    sport,
    session.current_page,
    session.total_pages(),
    session.matches.len()
  )
}

/// One button per visible match, payloads carry the index into the full list.
pub fn match_list_keyboard(matches: &[Match], page: usize) -> InlineKeyboardMarkup {
  let visible = paginate(matches, page, MATCHES_PER_PAGE);
  let offset = page.saturating_sub(1) * MATCHES_PER_PAGE;

  let mut rows: Vec<Vec<InlineKeyboardButton>> = visible
    .items
    .iter()
    .enumerate()
    .map(|(position, item)| {
      vec![InlineKeyboardButton::callback(
        format_match_summary(item),
        CallbackAction::SelectMatch(offset + position).encode(),
      )]
    })
    .collect();

  let nav: Vec<InlineKeyboardButton> = navigation(page, visible.total_pages)
    .into_iter()
    .map(|control| match control {
      NavControl::Previous(target) => InlineKeyboardButton::callback("⬅️", CallbackAction::GotoPage(target).encode()),
      NavControl::Indicator { page, total } => {
        InlineKeyboardButton::callback(format!("{page}/{total}"), CallbackAction::NoOp.encode())
      },
      NavControl::Next(target) => InlineKeyboardButton::callback("➡️", CallbackAction::GotoPage(target).encode()),
    })
    .collect();

  if !nav.is_empty() {
    rows.push(nav);
  }
  InlineKeyboardMarkup::new(rows)
}
