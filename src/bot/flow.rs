use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::KeyboardMarkup;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::bot::callback::CallbackAction;
use crate::bot::context::AppContext;
use crate::bot::pagination::clamp_page;
use crate::bot::render;
use crate::bot::state::Session;
use crate::bot::state::Stage;
use crate::models::Category;
use crate::models::Sport;

pub const WELCOME_TEXT: &str = "Welcome to Sports Streaming Bot! Please select a sport:";
pub const SELECT_SPORT_TEXT: &str = "Please select a sport:";
pub const SPORT_REQUIRED_TEXT: &str = "Please select a sport first:";
pub const CHOOSE_OPTION_TEXT: &str = "Choose an option:";
pub const NO_MATCHES_TEXT: &str = "No matches available at the moment.";
pub const FETCH_FAILED_TEXT: &str = "Sorry, there was an error fetching the matches. Please try again later.";
pub const NO_LIST_TEXT: &str = "No matches data available. Please select a category again.";
pub const MATCH_NOT_FOUND_TEXT: &str = "Match not found. Please try again.";
pub const RESELECT_TEXT: &str = "Please select a sport and category again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
  Start,
  MainMenu,
  ChooseSport(Sport),
  ChooseCategory(Category),
  Callback(CallbackAction),
}

/// How a rendered match list reaches the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  Send,
  /// Replace the message whose button was pressed.
  Edit,
}

#[derive(Debug, Clone)]
pub enum Reply {
  Menu {
    text: String,
    keyboard: KeyboardMarkup,
  },
  Notice(String),
  MatchList {
    text: String,
    keyboard: InlineKeyboardMarkup,
    delivery: Delivery,
  },
  MatchDetail {
    text: String,
    keyboard: InlineKeyboardMarkup,
    poster_url: Option<String>,
  },
  Ack,
}

#[instrument(skip(session, ctx), fields(stage = ?session.stage))]
pub async fn transition(session: &mut Session, event: Event, ctx: &AppContext) -> Reply {
  match event {
    Event::Start => {
      *session = Session::default();
      menu(WELCOME_TEXT, render::main_menu_keyboard())
    },
    Event::MainMenu => {
      *session = Session::default();
      menu(SELECT_SPORT_TEXT, render::main_menu_keyboard())
    },
    Event::ChooseSport(sport) => {
      session.choose_sport(sport);
      menu(CHOOSE_OPTION_TEXT, render::sub_menu_keyboard())
    },
    Event::ChooseCategory(category) => choose_category(session, category, ctx).await,
    Event::Callback(CallbackAction::SelectMatch(index)) => select_match(session, index, ctx),
    Event::Callback(CallbackAction::GotoPage(page)) => goto_page(session, page),
    Event::Callback(CallbackAction::Back) => back_to_list(session),
    Event::Callback(CallbackAction::NoOp) => Reply::Ack,
  }
}

async fn choose_category(session: &mut Session, category: Category, ctx: &AppContext) -> Reply {
  let Some(sport) = session.sport else {
    info!(?category, "category chosen before sport");
    return menu(SPORT_REQUIRED_TEXT, render::main_menu_keyboard());
  };

  session.category = Some(category);
  match ctx.catalog().fetch_matches(sport, category).await {
    Ok(matches) if matches.is_empty() => {
      info!(%sport, ?category, "no matches to show");
      session.replace_matches(Vec::new());
      session.stage = Stage::CategoryChosen;
      Reply::Notice(NO_MATCHES_TEXT.to_string())
    },
    Ok(matches) => {
      info!(%sport, ?category, count = matches.len(), "showing match list");
      session.replace_matches(matches);
      session.stage = Stage::MatchListShown;
      match_list(session, Delivery::Send)
    },
    Err(err) => {
      warn!(error = %err, %sport, ?category, "match listing unavailable");
      session.replace_matches(Vec::new());
      session.stage = Stage::CategoryChosen;
      Reply::Notice(FETCH_FAILED_TEXT.to_string())
    },
  }
}

fn goto_page(session: &mut Session, page: usize) -> Reply {
  if session.matches.is_empty() {
    info!(page, "page requested without a cached list");
    return Reply::Notice(NO_LIST_TEXT.to_string());
  }

  session.current_page = clamp_page(page, session.total_pages());
  session.stage = Stage::MatchListShown;
  match_list(session, Delivery::Edit)
}

fn select_match(session: &mut Session, index: usize, ctx: &AppContext) -> Reply {
  let Some(item) = session.match_at(index) else {
    info!(index, available = session.matches.len(), "match index out of range");
    return Reply::Notice(MATCH_NOT_FOUND_TEXT.to_string());
  };

  let reply = Reply::MatchDetail {
    text: render::format_match_detail(item, ctx.timezone()),
    keyboard: render::source_buttons(&item.sources, ctx.public_url()),
    poster_url: item.poster.as_deref().map(|path| ctx.catalog().poster_url(path)),
  };
  session.current_match = Some(index);
  session.stage = Stage::MatchDetailShown;
  reply
}

fn back_to_list(session: &mut Session) -> Reply {
  if session.matches.is_empty() {
    return menu(RESELECT_TEXT, render::main_menu_keyboard());
  }

  if let Some(item) = session.selected_match() {
    info!(match_id = %item.id, page = session.current_page, "returning to match list");
  }
  session.current_page = clamp_page(session.current_page, session.total_pages());
  session.stage = Stage::MatchListShown;
  // the detail may be a photo, which cannot be edited into a text list
  match_list(session, Delivery::Send)
}

fn match_list(session: &Session, delivery: Delivery) -> Reply {
  Reply::MatchList {
    text: render::match_list_text(session),
    keyboard: render::match_list_keyboard(&session.matches, session.current_page),
    delivery,
  }
}

fn menu(text: &str, keyboard: KeyboardMarkup) -> Reply {
  Reply::Menu {
    text: text.to_string(),
    keyboard,
  }
}
