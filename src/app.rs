use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dptree;
use teloxide::prelude::*;
use tokio::net::TcpListener;
use tracing::info;

use crate::bot;
use crate::bot::AppContext;
use crate::bot::DialogueStorage;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::web;
use crate::web::ViewRenderer;
use crate::web::WebState;

pub struct App {
  bot: Bot,
  context: Arc<AppContext>,
  handler: UpdateHandler<anyhow::Error>,
  web: axum::Router,
  addr: SocketAddr,
}

impl App {
  pub fn new(bot: Bot, catalog: Arc<dyn Catalog>, config: &Config) -> anyhow::Result<Self> {
    let context = Arc::new(AppContext::new(
      catalog.clone(),
      config.public_url.clone(),
      config.timezone,
    ));
    let handler = bot::build_schema();
    let views = ViewRenderer::new().context("failed to load page templates")?;
    let web = web::router(Arc::new(WebState::new(catalog, views)));
    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.port)
      .parse()
      .with_context(|| format!("invalid bind address {}:{}", config.bind_host, config.port))?;
    Ok(Self {
      bot,
      context,
      handler,
      web,
      addr,
    })
  }

  pub async fn run(self) -> anyhow::Result<()> {
    let storage: Arc<DialogueStorage> = InMemStorage::new();

    let listener = TcpListener::bind(self.addr)
      .await
      .with_context(|| format!("failed to bind {}", self.addr))?;
    info!(addr = %self.addr, "stream endpoint listening");
    let server = axum::serve(listener, self.web).with_graceful_shutdown(async {
      if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
      }
    });

    let me = self.bot.get_me().await?;
    info!(username = ?me.username, "bot identity resolved");

    let mut dispatcher = Dispatcher::builder(self.bot.clone(), self.handler)
      .dependencies(dptree::deps![self.context.clone(), storage.clone(), me])
      .enable_ctrlc_handler()
      .build();

    let (served, ()) = tokio::join!(async { server.await }, dispatcher.dispatch());
    served.context("stream endpoint stopped with an error")?;
    info!("shutdown complete");
    Ok(())
  }
}
