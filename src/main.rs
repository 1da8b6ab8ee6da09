mod app;
mod bot;
mod catalog;
mod config;
mod models;
mod telemetry;
mod util;
mod web;

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::Bot;
use tracing::info;

use crate::catalog::HttpCatalog;

#[tokio::main]
async fn main() -> Result<()> {
  // .env may set RUST_LOG
  let _ = dotenv::dotenv();
  telemetry::init()?;
  let config = config::Config::from_env()?;
  info!(
    catalog = %config.catalog_base_url,
    public_url = %config.public_url,
    timezone = %config.timezone,
    "starting bot"
  );

  let bot = Bot::new(config.bot_token.clone());
  let catalog = Arc::new(HttpCatalog::new(config.catalog_base_url.clone(), config.http_timeout)?);
  let app = app::App::new(bot, catalog, &config)?;
  app.run().await
}
