//! Tomorrow.io forecast client
//!
//! This module fetches per-location forecasts through the retrying fetcher,
//! normalizes the upstream JSON into [`LocationWeather`], and keeps a
//! write-through cache in front of the network.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::{DailyWeather, HourlyValues, HourlyWeather, LocationWeather};
use crate::cache::CacheStore;
use crate::retry::{FetchError, RetryingFetcher};

/// Base URL for the Tomorrow.io forecast endpoint
pub const TOMORROW_FORECAST_URL: &str = "https://api.tomorrow.io/v4/weather/forecast";

/// Default time-to-live for cached forecasts
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Prefix of every forecast cache key
const CACHE_KEY_PREFIX: &str = "weatherData-";

/// Client that serves location forecasts from cache or upstream
#[derive(Clone)]
pub struct WeatherClient {
    fetcher: RetryingFetcher,
    cache: CacheStore,
    api_key: String,
    base_url: String,
    cache_ttl: Duration,
}

impl fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherClient")
            .field("base_url", &self.base_url)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl WeatherClient {
    /// Create a new WeatherClient against the public Tomorrow.io endpoint
    pub fn new(fetcher: RetryingFetcher, cache: CacheStore, api_key: impl Into<String>) -> Self {
        Self {
            fetcher,
            cache,
            api_key: api_key.into(),
            base_url: TOMORROW_FORECAST_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Points the client at a different forecast endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets how long fetched forecasts stay fresh in the cache
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Generates the cache key for a coordinate string
    pub fn cache_key(coordinates: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, coordinates)
    }

    /// Returns the forecast for `coordinates`, from cache when fresh
    ///
    /// # Behavior
    /// - A fresh cache entry is returned without touching the network
    /// - Otherwise the forecast is fetched, normalized and written to the cache
    /// - Cache failures are logged and treated as a miss
    /// - Malformed responses are never cached
    #[tracing::instrument(name = "fetch_location_weather", skip(self))]
    pub async fn fetch_and_cache_weather(
        &self,
        coordinates: &str,
    ) -> Result<LocationWeather, FetchError> {
        let cache_key = Self::cache_key(coordinates);

        if let Some(cached) = self.read_cached(&cache_key) {
            tracing::debug!("Cache hit");
            return Ok(cached);
        }
        tracing::debug!("Cache miss, fetching from upstream");

        let url = self.forecast_url(coordinates)?;
        let response = self.fetcher.fetch(&url).await?;
        let weather = parse_forecast(&response.body)?;

        match serde_json::to_string(&weather) {
            Ok(payload) => {
                if let Err(e) = self.cache.put(&cache_key, &payload, self.cache_ttl) {
                    tracing::warn!(error = %e, "Failed to write forecast to cache");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize forecast for cache"),
        }

        Ok(weather)
    }

    /// Reads a fresh, parseable entry from the cache
    fn read_cached(&self, cache_key: &str) -> Option<LocationWeather> {
        let entry = match self.cache.get_fresh(cache_key) {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&entry.payload) {
            Ok(weather) => Some(weather),
            Err(e) => {
                tracing::warn!(error = %e, "Cached forecast unreadable, treating as miss");
                None
            }
        }
    }

    /// Builds the forecast URL with query parameters encoded
    fn forecast_url(&self, coordinates: &str) -> Result<String, FetchError> {
        reqwest::Url::parse_with_params(
            &self.base_url,
            &[("location", coordinates), ("apikey", self.api_key.as_str())],
        )
        .map(String::from)
        .map_err(|e| FetchError::Network(format!("invalid forecast URL: {}", e)))
    }
}

/// Parses and normalizes a Tomorrow.io forecast body
pub fn parse_forecast(body: &str) -> Result<LocationWeather, FetchError> {
    let response: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    normalize(response)
}

/// Converts the upstream shape into the internal schema
fn normalize(response: ForecastResponse) -> Result<LocationWeather, FetchError> {
    let timelines = response
        .timelines
        .ok_or_else(|| FetchError::MalformedResponse("missing timelines".to_string()))?;
    let daily = timelines
        .daily
        .ok_or_else(|| FetchError::MalformedResponse("missing timelines.daily".to_string()))?;
    let hourly = timelines
        .hourly
        .ok_or_else(|| FetchError::MalformedResponse("missing timelines.hourly".to_string()))?;

    let daily = daily
        .into_iter()
        .enumerate()
        .map(|(day, entry)| normalize_daily(day, entry.values))
        .collect::<Result<Vec<_>, _>>()?;

    let hourly = hourly
        .into_iter()
        .map(|entry| HourlyWeather {
            time: entry.time,
            values: HourlyValues {
                snow_accumulation: entry
                    .values
                    .and_then(|values| values.snow_accumulation)
                    .unwrap_or(0.0),
            },
        })
        .collect();

    Ok(LocationWeather { daily, hourly })
}

fn normalize_daily(day: usize, values: Option<DailyValues>) -> Result<DailyWeather, FetchError> {
    let values = values.ok_or_else(|| {
        FetchError::MalformedResponse(format!("daily[{}] has no values", day))
    })?;
    let require = |value: Option<f64>, field: &str| {
        value.ok_or_else(|| FetchError::MalformedResponse(format!("daily[{}] missing {}", day, field)))
    };

    Ok(DailyWeather {
        temperature_avg: require(values.temperature_avg, "temperatureAvg")?,
        temperature_min: require(values.temperature_min, "temperatureMin")?,
        temperature_max: require(values.temperature_max, "temperatureMax")?,
        snow_accumulation: values.snow_accumulation.unwrap_or(0.0),
    })
}

/// Tomorrow.io forecast response structure
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    timelines: Option<Timelines>,
}

#[derive(Debug, Deserialize)]
struct Timelines {
    daily: Option<Vec<DailyEntry>>,
    hourly: Option<Vec<HourlyEntry>>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    values: Option<DailyValues>,
}

/// Daily values; upstream sends many more fields than these
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyValues {
    temperature_avg: Option<f64>,
    temperature_min: Option<f64>,
    temperature_max: Option<f64>,
    snow_accumulation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyEntry {
    time: chrono::DateTime<chrono::Utc>,
    values: Option<HourlyEntryValues>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HourlyEntryValues {
    snow_accumulation: Option<f64>,
}
