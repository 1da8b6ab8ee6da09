use teloxide::utils::command::BotCommands;

use crate::models::Category;
use crate::models::Sport;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
  /// Open the sport menu
  Start,
  /// Show the help text
  Help,
}

pub const FOOTBALL_LABEL: &str = "⚽ Football";
pub const CRICKET_LABEL: &str = "🏏 Cricket";
pub const ALL_LABEL: &str = "All";
pub const POPULAR_LABEL: &str = "Popular";
pub const LIVE_LABEL: &str = "🔴 Live";
pub const MAIN_MENU_LABEL: &str = "Back to Main Menu";

/// Reply-keyboard labels the bot understands as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuText {
  Sport(Sport),
  Category(Category),
  MainMenu,
}

impl MenuText {
  pub fn parse(text: &str) -> Option<Self> {
    match text.trim() {
      FOOTBALL_LABEL => Some(Self::Sport(Sport::Football)),
      CRICKET_LABEL => Some(Self::Sport(Sport::Cricket)),
      ALL_LABEL => Some(Self::Category(Category::All)),
      POPULAR_LABEL => Some(Self::Category(Category::Popular)),
      LIVE_LABEL => Some(Self::Category(Category::Live)),
      MAIN_MENU_LABEL => Some(Self::MainMenu),
      _ => None,
    }
  }
}
