use std::env;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use chrono_tz::Tz;

const DEFAULT_CATALOG_BASE_URL: &str = "https://streamed.su";
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEZONE: &str = "Asia/Dhaka";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
  pub bot_token: String,
  pub public_url: String,
  pub catalog_base_url: String,
  pub bind_host: String,
  pub port: u16,
  pub timezone: Tz,
  pub http_timeout: Duration,
}

impl Config {
  pub fn from_env() -> Result<Self> {
    let bot_token = env::var("BOT_TOKEN")
      .or_else(|_| env::var("TELOXIDE_TOKEN"))
      .context("BOT_TOKEN or TELOXIDE_TOKEN must be set")?;
    let public_url = normalize_base_url(&env::var("PUBLIC_URL").context("PUBLIC_URL must be set")?);
    reqwest::Url::parse(&public_url).with_context(|| format!("PUBLIC_URL {public_url:?} is not an absolute URL"))?;
    let catalog_base_url = env::var("CATALOG_BASE_URL").unwrap_or_else(|_| DEFAULT_CATALOG_BASE_URL.to_string());
    let bind_host = env::var("BIND_HOST").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());
    let port = parse_or_default(env::var("PORT").ok().as_deref(), DEFAULT_PORT).context("PORT must be a port number")?;
    let timezone = parse_timezone(env::var("DISPLAY_TIMEZONE").ok().as_deref())?;
    let timeout_secs = parse_or_default(env::var("HTTP_TIMEOUT_SECS").ok().as_deref(), DEFAULT_HTTP_TIMEOUT_SECS)
      .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

    Ok(Self {
      bot_token,
      public_url,
      catalog_base_url: normalize_base_url(&catalog_base_url),
      bind_host,
      port,
      timezone,
      http_timeout: Duration::from_secs(timeout_secs),
    })
  }
}

fn normalize_base_url(raw: &str) -> String {
  raw.trim().trim_end_matches('/').to_string()
}

fn parse_or_default<T: std::str::FromStr>(raw: Option<&str>, default: T) -> Result<T>
where
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match raw.map(str::trim).filter(|value| !value.is_empty()) {
    None => Ok(default),
    Some(value) => value
      .parse::<T>()
      .with_context(|| format!("invalid value {value:?}")),
  }
}

fn parse_timezone(raw: Option<&str>) -> Result<Tz> {
  let name = raw
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .unwrap_or(DEFAULT_TIMEZONE);
  name
    .parse::<Tz>()
    .map_err(|err| anyhow::anyhow!("DISPLAY_TIMEZONE {name:?} is not a known zone: {err}"))
}

#[cfg(test)]
mod tests {
  use chrono_tz::Tz;

  use super::normalize_base_url;
  use super::parse_or_default;
  use super::parse_timezone;

  #[test]
  fn trims_trailing_slashes() {
    assert_eq!(normalize_base_url("https://bot.example/ "), "https://bot.example");
    assert_eq!(normalize_base_url("https://bot.example"), "https://bot.example");
  }

  #[test]
  fn falls_back_to_defaults_for_missing_values() {
    assert_eq!(parse_or_default::<u16>(None, 3000).unwrap(), 3000);
    assert_eq!(parse_or_default::<u16>(Some("  "), 3000).unwrap(), 3000);
    assert_eq!(parse_or_default::<u16>(Some("8080"), 3000).unwrap(), 8080);
  }

  #[test]
  fn rejects_invalid_numbers() {
    assert!(parse_or_default::<u16>(Some("eighty"), 3000).is_err());
    assert!(parse_or_default::<u16>(Some("70000"), 3000).is_err());
  }

  #[test]
  fn parses_timezones() {
    assert_eq!(parse_timezone(None).unwrap(), Tz::Asia__Dhaka);
    assert_eq!(parse_timezone(Some("Europe/London")).unwrap(), Tz::Europe__London);
    assert!(parse_timezone(Some("Mars/Olympus")).is_err());
  }
}
