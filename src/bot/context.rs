use std::sync::Arc;

use chrono_tz::Tz;

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct AppContext {
  catalog: Arc<dyn Catalog>,
  public_url: String,
  timezone: Tz,
}

impl AppContext {
  pub fn new(catalog: Arc<dyn Catalog>, public_url: String, timezone: Tz) -> Self {
    Self {
      catalog,
      public_url,
      timezone,
    }
  }

  pub fn catalog(&self) -> &dyn Catalog {
    self.catalog.as_ref()
  }

  pub fn public_url(&self) -> &str {
    &self.public_url
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }
}
