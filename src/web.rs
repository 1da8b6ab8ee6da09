//! HTTP side of the bot: turns stream links from the chat into player pages.

use std::sync::Arc;

use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use minijinja::Environment;
use minijinja::context;
use tracing::error;
use tracing::info;
use tracing::instrument;

use crate::catalog::Catalog;
use crate::catalog::CatalogError;
use crate::models::Stream;

const STREAM_PLAYER_TITLE: &str = "Stream Player";
const STREAM_UNAVAILABLE_TEXT: &str = "Stream not available";

/// HTML views served by the stream endpoint.
pub struct ViewRenderer {
  env: Environment<'static>,
}

impl ViewRenderer {
  pub fn new() -> Result<Self, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("stream.html", include_str!("../templates/stream.html"))?;
    env.add_template("error.html", include_str!("../templates/error.html"))?;
    Ok(Self { env })
  }

  pub fn stream_player(&self, stream: &Stream) -> Result<String, minijinja::Error> {
    self
      .env
      .get_template("stream.html")?
      .render(context! { title => STREAM_PLAYER_TITLE, stream => stream })
  }

  pub fn error_page(&self, message: &str, detail: &str) -> Result<String, minijinja::Error> {
    self
      .env
      .get_template("error.html")?
      .render(context! { message => message, error => detail })
  }
}

pub struct WebState {
  catalog: Arc<dyn Catalog>,
  views: ViewRenderer,
}

impl WebState {
  pub fn new(catalog: Arc<dyn Catalog>, views: ViewRenderer) -> Self {
    Self { catalog, views }
  }
}

pub fn router(state: Arc<WebState>) -> Router {
  Router::new()
    .route("/stream/{source}/{id}", get(stream_page))
    .route("/health", get(health))
    .with_state(state)
}

async fn health() -> &'static str {
  "ok"
}

#[instrument(skip_all, fields(source = %source, id = %id))]
async fn stream_page(State(state): State<Arc<WebState>>, Path((source, id)): Path<(String, String)>) -> Response {
  match state.catalog.fetch_stream(&source, &id).await {
    Ok(stream) => match state.views.stream_player(&stream) {
      Ok(body) => {
        info!("served stream player");
        Html(body).into_response()
      },
      Err(err) => template_failure(&err),
    },
    Err(err) => {
      let status = match err {
        CatalogError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
      };
      error!(error = %err, %status, "stream lookup failed");
      match state.views.error_page(STREAM_UNAVAILABLE_TEXT, &err.to_string()) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(render_err) => template_failure(&render_err),
      }
    },
  }
}

fn template_failure(err: &minijinja::Error) -> Response {
  error!(error = %err, "failed to render view");
  (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
}
