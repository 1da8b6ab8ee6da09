use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use reqwest::Url;
use teloxide::ApiError;
use teloxide::RequestError;
use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::Dialogue;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::types::ChatId;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::InputFile;
use teloxide::types::Message;
use teloxide::types::MessageId;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::bot::Command;
use crate::bot::DialogueStorage;
use crate::bot::HandlerResult;
use crate::bot::callback::CallbackAction;
use crate::bot::commands::MenuText;
use crate::bot::context::AppContext;
use crate::bot::flow;
use crate::bot::flow::Delivery;
use crate::bot::flow::Event;
use crate::bot::flow::Reply;
use crate::bot::state::Session;

type SharedContext = Arc<AppContext>;
type BotDialogue = Dialogue<Session, DialogueStorage>;

const GENERIC_ERROR_TEXT: &str = "An error occurred. Please try again later.";
const LIST_RENDER_ERROR_TEXT: &str = "Error displaying matches. Please try again.";
const DETAIL_RENDER_ERROR_TEXT: &str = "Error displaying match details. Please try again.";
const NOT_MODIFIED_TEXT: &str = "No changes to display";
const EXPIRED_MENU_TEXT: &str = "This menu is no longer available. Use /start.";
const UNRECOGNIZED_TEXT: &str = "I did not understand that. Use the menu buttons or /help.";

pub fn build_schema() -> UpdateHandler<anyhow::Error> {
  let message_handler = Update::filter_message()
    .enter_dialogue::<Message, DialogueStorage, Session>()
    .branch(command_branch())
    .branch(dptree::filter_map(|msg: Message| msg.text().and_then(MenuText::parse)).endpoint(handle_menu_text))
    .branch(dptree::endpoint(handle_unrecognized_text));

  let callback_handler = Update::filter_callback_query()
    .enter_dialogue::<CallbackQuery, DialogueStorage, Session>()
    .endpoint(handle_callback_query);

  dptree::entry().branch(message_handler).branch(callback_handler)
}

fn command_branch() -> UpdateHandler<anyhow::Error> {
  dptree::entry()
    .filter_command::<Command>()
    .branch(dptree::case![Command::Start].endpoint(handle_start))
    .branch(dptree::case![Command::Help].endpoint(handle_help))
}

#[instrument(skip(bot, ctx, dialogue, msg))]
async fn handle_start(bot: Bot, dialogue: BotDialogue, ctx: SharedContext, msg: Message) -> HandlerResult {
  let user_id = msg.from.as_ref().map(|user| user.id.0);
  info!(user_id, chat_id = %msg.chat.id, "received /start command");
  run_message_event(&bot, &dialogue, &ctx, msg.chat.id, Event::Start).await;
  Ok(())
}

#[instrument(skip(bot, msg))]
async fn handle_help(bot: Bot, msg: Message) -> HandlerResult {
  info!(chat_id = %msg.chat.id, "received /help command");
  let mut text = Command::descriptions().to_string();
  text.push_str("\n\nPick a sport, then a category, and tap a match to get its stream links.");
  bot.send_message(msg.chat.id, text).await?;
  Ok(())
}

#[instrument(skip(bot, ctx, dialogue, msg))]
async fn handle_menu_text(
  bot: Bot,
  dialogue: BotDialogue,
  ctx: SharedContext,
  msg: Message,
  menu: MenuText,
) -> HandlerResult {
  info!(chat_id = %msg.chat.id, ?menu, "received menu selection");
  let event = match menu {
    MenuText::Sport(sport) => Event::ChooseSport(sport),
    MenuText::Category(category) => Event::ChooseCategory(category),
    MenuText::MainMenu => Event::MainMenu,
  };
  run_message_event(&bot, &dialogue, &ctx, msg.chat.id, event).await;
  Ok(())
}

#[instrument(skip(bot, msg))]
async fn handle_unrecognized_text(bot: Bot, msg: Message) -> HandlerResult {
  if let Some(text) = msg.text()
    && !text.starts_with('/')
  {
    info!(chat_id = %msg.chat.id, "received unrecognized message");
    bot.send_message(msg.chat.id, UNRECOGNIZED_TEXT).await?;
  }
  Ok(())
}

#[instrument(skip(bot, ctx, dialogue, query))]
async fn handle_callback_query(
  bot: Bot,
  ctx: SharedContext,
  query: CallbackQuery,
  dialogue: BotDialogue,
) -> HandlerResult {
  let user_id = query.from.id.0;
  let message_ctx = query.message.as_ref().map(|message| (message.chat().id, message.id()));
  let callback_data = query.data.as_deref().unwrap_or("<empty>");
  let action = CallbackAction::parse(callback_data);
  info!(user_id, callback = callback_data, ?action, "handling callback query");

  let callback_text = match (action, message_ctx) {
    (Some(action), Some((chat_id, message_id))) => {
      let outcome = async {
        let reply = apply_event(&dialogue, &ctx, Event::Callback(action)).await?;
        deliver(&bot, chat_id, Some(message_id), reply).await
      }
      .await;
      match outcome {
        Ok(text) => text,
        Err(err) => {
          report_failure(&bot, chat_id, &err).await;
          None
        },
      }
    },
    (Some(_), None) => {
      warn!(user_id, callback = callback_data, "callback without message context");
      Some(EXPIRED_MENU_TEXT.to_string())
    },
    (None, _) => {
      warn!(user_id, callback = callback_data, "unknown callback payload");
      None
    },
  };

  if let Some(text) = callback_text {
    bot.answer_callback_query(query.id).text(text).await?;
  } else {
    bot.answer_callback_query(query.id).await?;
  }
  Ok(())
}

async fn run_message_event(bot: &Bot, dialogue: &BotDialogue, ctx: &SharedContext, chat: ChatId, event: Event) {
  let outcome = async {
    let reply = apply_event(dialogue, ctx, event).await?;
    deliver(bot, chat, None, reply).await
  }
  .await;
  if let Err(err) = outcome {
    report_failure(bot, chat, &err).await;
  }
}

/// Loads the chat's session, runs the transition and stores the result.
async fn apply_event(dialogue: &BotDialogue, ctx: &SharedContext, event: Event) -> Result<Reply> {
  let mut session = dialogue.get_or_default().await.context("failed to load session")?;
  let reply = flow::transition(&mut session, event, ctx).await;
  dialogue.update(session).await.context("failed to store session")?;
  Ok(reply)
}

/// Sends a reply. Returns the text for the callback answer, if any.
#[instrument(skip(bot, reply))]
async fn deliver(bot: &Bot, chat: ChatId, origin: Option<MessageId>, reply: Reply) -> Result<Option<String>> {
  match reply {
    Reply::Menu { text, keyboard } => {
      bot.send_message(chat, text).reply_markup(keyboard).await?;
    },
    Reply::Notice(text) => {
      bot.send_message(chat, text).await?;
    },
    Reply::MatchList {
      text,
      keyboard,
      delivery,
    } => return send_match_list(bot, chat, origin, text, keyboard, delivery).await,
    Reply::MatchDetail {
      text,
      keyboard,
      poster_url,
    } => send_match_detail(bot, chat, text, keyboard, poster_url).await?,
    Reply::Ack => {},
  }
  Ok(None)
}

async fn send_match_list(
  bot: &Bot,
  chat: ChatId,
  origin: Option<MessageId>,
  text: String,
  keyboard: InlineKeyboardMarkup,
  delivery: Delivery,
) -> Result<Option<String>> {
  let result = match (delivery, origin) {
    (Delivery::Edit, Some(message_id)) => bot
      .edit_message_text(chat, message_id, text)
      .reply_markup(keyboard)
      .await
      .map(|_| ()),
    _ => bot.send_message(chat, text).reply_markup(keyboard).await.map(|_| ()),
  };

  match result {
    Ok(()) => {
      info!(chat_id = %chat, ?delivery, "rendered match list");
      Ok(None)
    },
    Err(RequestError::Api(ApiError::MessageNotModified)) => {
      info!(chat_id = %chat, "match list already current");
      Ok(Some(NOT_MODIFIED_TEXT.to_string()))
    },
    Err(err) => {
      warn!(error = %err, chat_id = %chat, "failed to render match list");
      bot.send_message(chat, LIST_RENDER_ERROR_TEXT).await?;
      Ok(None)
    },
  }
}

async fn send_match_detail(
  bot: &Bot,
  chat: ChatId,
  text: String,
  keyboard: InlineKeyboardMarkup,
  poster_url: Option<String>,
) -> HandlerResult {
  if let Some(poster) = poster_url {
    let photo = match Url::parse(&poster) {
      Ok(url) => bot
        .send_photo(chat, InputFile::url(url))
        .caption(text.clone())
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard.clone())
        .await
        .map(|_| ())
        .map_err(anyhow::Error::from),
      Err(err) => Err(anyhow::Error::from(err)),
    };
    match photo {
      Ok(()) => {
        info!(chat_id = %chat, "sent match detail with poster");
        return Ok(());
      },
      Err(err) => warn!(error = %err, chat_id = %chat, poster = %poster, "failed to send poster, falling back to text"),
    }
  }

  let sent = bot
    .send_message(chat, text)
    .parse_mode(ParseMode::MarkdownV2)
    .reply_markup(keyboard)
    .await;
  if let Err(err) = sent {
    warn!(error = %err, chat_id = %chat, "failed to send match detail");
    bot.send_message(chat, DETAIL_RENDER_ERROR_TEXT).await?;
  }
  Ok(())
}

async fn report_failure(bot: &Bot, chat: ChatId, err: &anyhow::Error) {
  error!(error = ?err, chat_id = %chat, "handler failed");
  if let Err(send_err) = bot.send_message(chat, GENERIC_ERROR_TEXT).await {
    warn!(error = %send_err, chat_id = %chat, "failed to report handler failure");
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::sync::Arc;
  use std::sync::Mutex;

  use axum::Json;
  use axum::Router;
  use axum::body::Bytes;
  use axum::extract::State;
  use axum::http::StatusCode;
  use axum::http::Uri;
  use chrono_tz::Asia::Dhaka;
  use reqwest::Url;
  use serde_json::Value;
  use serde_json::json;
  use teloxide::dispatching::dialogue::Dialogue;
  use teloxide::dispatching::dialogue::InMemStorage;
  use teloxide::prelude::*;
  use teloxide::types::CallbackQuery;
  use teloxide::types::ChatId;
  use teloxide::types::InlineKeyboardMarkup;

  use super::BotDialogue;
  use super::DETAIL_RENDER_ERROR_TEXT;
  use super::GENERIC_ERROR_TEXT;
  use super::LIST_RENDER_ERROR_TEXT;
  use super::NOT_MODIFIED_TEXT;
  use super::handle_callback_query;
  use super::report_failure;
  use super::send_match_detail;
  use super::send_match_list;
  use crate::bot::context::AppContext;
  use crate::bot::flow::Delivery;
  use crate::bot::render::tests::sample_match;
  use crate::bot::state::Session;
  use crate::bot::state::Stage;
  use crate::catalog::fake::FakeCatalog;
  use crate::models::Sport;

  const CHAT: i64 = 42;
  const NOT_MODIFIED: &str = "Bad Request: message is not modified: specified new message content and reply markup are \
                              exactly the same as a current content and reply markup of the message";

  /// Records every Bot API call and fails the methods it was told to fail.
  #[derive(Clone, Default)]
  struct TelegramStub {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    failures: Arc<HashMap<&'static str, &'static str>>,
  }

  impl TelegramStub {
    fn failing(failures: &[(&'static str, &'static str)]) -> Self {
      Self {
        failures: Arc::new(failures.iter().copied().collect()),
        ..Self::default()
      }
    }

    fn calls(&self) -> Vec<(String, Value)> {
      self.calls.lock().expect("calls lock").clone()
    }

    fn methods(&self) -> Vec<String> {
      self.calls().into_iter().map(|(method, _)| method).collect()
    }

    fn payloads(&self, method: &str) -> Vec<Value> {
      self
        .calls()
        .into_iter()
        .filter(|(name, _)| name == method)
        .map(|(_, payload)| payload)
        .collect()
    }
  }

  fn message_json() -> Value {
    json!({
      "message_id": 7,
      "date": 1_700_000_000,
      "chat": { "id": CHAT, "type": "private", "first_name": "Fan" },
      "from": { "id": 1, "is_bot": true, "first_name": "Matchday" },
      "text": "menu",
    })
  }

  async fn bot_api(State(stub): State<TelegramStub>, uri: Uri, body: Bytes) -> (StatusCode, Json<Value>) {
    let raw = uri.path().rsplit('/').next().unwrap_or_default();
    // Bot API method names are case-insensitive; teloxide sends them PascalCase.
    let mut chars = raw.chars();
    let method = chars
      .next()
      .map(|first| first.to_ascii_lowercase().to_string() + chars.as_str())
      .unwrap_or_default();
    let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
    stub.calls.lock().expect("calls lock").push((method.clone(), payload));

    if let Some(description) = stub.failures.get(method.as_str()) {
      let body = json!({ "ok": false, "error_code": 400, "description": description });
      return (StatusCode::BAD_REQUEST, Json(body));
    }
    let result = match method.as_str() {
      "answerCallbackQuery" => json!(true),
      _ => message_json(),
    };
    (StatusCode::OK, Json(json!({ "ok": true, "result": result })))
  }

  async fn serve(stub: &TelegramStub) -> Bot {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let router = Router::new().fallback(bot_api).with_state(stub.clone());
    tokio::spawn(async move {
      axum::serve(listener, router).await.expect("test server");
    });
    let api_url = Url::parse(&format!("http://{addr}")).expect("api url");
    Bot::new("test-token").set_api_url(api_url)
  }

  fn context() -> Arc<AppContext> {
    Arc::new(AppContext::new(
      Arc::new(FakeCatalog::default()),
      "https://bot.example".to_string(),
      Dhaka,
    ))
  }

  fn callback(data: &str) -> CallbackQuery {
    serde_json::from_value(json!({
      "id": "query-1",
      "from": { "id": CHAT, "is_bot": false, "first_name": "Fan" },
      "message": message_json(),
      "chat_instance": "instance",
      "data": data,
    }))
    .expect("callback query")
  }

  async fn dialogue_with(session: Session) -> BotDialogue {
    let dialogue = Dialogue::new(InMemStorage::<Session>::new(), ChatId(CHAT));
    dialogue.update(session).await.expect("store session");
    dialogue
  }

  fn listed_session() -> Session {
    let mut session = Session::default();
    session.choose_sport(Sport::Football);
    session.replace_matches((0 .. 12).map(sample_match).collect());
    session.stage = Stage::MatchListShown;
    session
  }

  #[tokio::test]
  async fn unchanged_list_edit_answers_with_notice() {
    let stub = TelegramStub::failing(&[("editMessageText", NOT_MODIFIED)]);
    let bot = serve(&stub).await;
    let dialogue = dialogue_with(listed_session()).await;

    handle_callback_query(bot, context(), callback("p1"), dialogue)
      .await
      .expect("callback handled");

    assert_eq!(stub.methods(), vec!["editMessageText", "answerCallbackQuery"]);
    let answers = stub.payloads("answerCallbackQuery");
    assert_eq!(answers[0]["text"], NOT_MODIFIED_TEXT);
  }

  #[tokio::test]
  async fn failed_render_still_answers_callback_once() {
    let stub = TelegramStub::failing(&[("sendMessage", "Bad Request: chat not found")]);
    let bot = serve(&stub).await;
    let dialogue = dialogue_with(Session::default()).await;

    handle_callback_query(bot, context(), callback("p2"), dialogue)
      .await
      .expect("callback handled");

    assert_eq!(stub.payloads("answerCallbackQuery").len(), 1);
    let sent: Vec<Value> = stub.payloads("sendMessage").into_iter().map(|p| p["text"].clone()).collect();
    assert_eq!(sent.last(), Some(&json!(GENERIC_ERROR_TEXT)));
    assert_eq!(stub.methods().last().map(String::as_str), Some("answerCallbackQuery"));
  }

  #[tokio::test]
  async fn unknown_payload_is_still_answered() {
    let stub = TelegramStub::default();
    let bot = serve(&stub).await;
    let dialogue = dialogue_with(Session::default()).await;

    handle_callback_query(bot, context(), callback("bogus"), dialogue)
      .await
      .expect("callback handled");

    assert_eq!(stub.methods(), vec!["answerCallbackQuery"]);
  }

  #[tokio::test]
  async fn failed_list_edit_sends_render_error() {
    let stub = TelegramStub::failing(&[("editMessageText", "Bad Request: message to edit not found")]);
    let bot = serve(&stub).await;

    let answer = send_match_list(
      &bot,
      ChatId(CHAT),
      Some(teloxide::types::MessageId(7)),
      "list".to_string(),
      InlineKeyboardMarkup::default(),
      Delivery::Edit,
    )
    .await
    .expect("list delivery");

    assert_eq!(answer, None);
    assert_eq!(stub.methods(), vec!["editMessageText", "sendMessage"]);
    assert_eq!(stub.payloads("sendMessage")[0]["text"], LIST_RENDER_ERROR_TEXT);
  }

  #[tokio::test]
  async fn poster_failure_falls_back_to_text_detail() {
    let stub = TelegramStub::failing(&[("sendPhoto", "Bad Request: wrong file identifier/HTTP URL specified")]);
    let bot = serve(&stub).await;

    send_match_detail(
      &bot,
      ChatId(CHAT),
      "*Home 0 vs Away 0*".to_string(),
      InlineKeyboardMarkup::default(),
      Some("https://catalog.test/poster.webp".to_string()),
    )
    .await
    .expect("detail delivery");

    assert_eq!(stub.methods(), vec!["sendPhoto", "sendMessage"]);
    let text = &stub.payloads("sendMessage")[0];
    assert_eq!(text["text"], "*Home 0 vs Away 0*");
    assert_eq!(text["parse_mode"], "MarkdownV2");
    assert_ne!(text["text"], DETAIL_RENDER_ERROR_TEXT);
  }

  #[tokio::test]
  async fn handler_failure_reports_generic_error() {
    let stub = TelegramStub::default();
    let bot = serve(&stub).await;

    report_failure(&bot, ChatId(CHAT), &anyhow::anyhow!("session store gone")).await;

    let sent = stub.payloads("sendMessage");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], CHAT);
    assert_eq!(sent[0]["text"], GENERIC_ERROR_TEXT);
  }
}
