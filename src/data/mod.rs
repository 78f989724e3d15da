//! Core data models for snowdash
//!
//! This module contains the data types shared by the fetch pipeline and the
//! dashboard: the static resort list and the normalized forecast records.
//! Forecast records serialize with camelCase field names, which is also the
//! format stored in the cache.

pub mod resorts;
pub mod weather;

pub use resorts::{all_resorts, get_resort_by_id, RESORTS};
pub use weather::{WeatherClient, DEFAULT_CACHE_TTL, TOMORROW_FORECAST_URL};

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// A ski resort tracked by the dashboard
///
/// Uses `&'static str` fields so the resort list can be a static array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resort {
    /// Stable identifier, used as the key in [`WeatherData`]
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl Resort {
    /// The `lat,lon` string sent upstream and used in cache keys
    pub fn coordinates(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// One forecast day, temperatures in Celsius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeather {
    pub temperature_avg: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    /// Snow accumulation for the day in cm, 0 when upstream omits it
    #[serde(default)]
    pub snow_accumulation: f64,
}

/// Values reported for a single forecast hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyValues {
    /// Snow accumulation in cm
    #[serde(default)]
    pub snow_accumulation: f64,
}

/// One forecast hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeather {
    pub time: DateTime<Utc>,
    pub values: HourlyValues,
}

/// Normalized forecast for one location
///
/// Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWeather {
    /// Daily entries ordered by day offset from today
    pub daily: Vec<DailyWeather>,
    /// Hourly entries in chronological order
    pub hourly: Vec<HourlyWeather>,
}

/// Forecasts for every resort
///
/// Can only be built when every resort has data, so consumers never see a
/// record with a missing location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherData {
    entries: Vec<(&'static Resort, LocationWeather)>,
}

impl WeatherData {
    /// Assembles a complete record from per-resort results keyed by resort id
    ///
    /// Returns the ids of the resorts without data, in resort order, if any are
    /// missing.
    pub fn from_results(
        mut results: HashMap<&'static str, LocationWeather>,
    ) -> Result<Self, Vec<&'static str>> {
        let missing: Vec<&'static str> = all_resorts()
            .iter()
            .filter(|resort| !results.contains_key(resort.id))
            .map(|resort| resort.id)
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let entries = all_resorts()
            .iter()
            .filter_map(|resort| results.remove(resort.id).map(|weather| (resort, weather)))
            .collect();
        Ok(Self { entries })
    }

    /// Returns the forecast for a resort id
    pub fn get(&self, id: &str) -> Option<&LocationWeather> {
        self.entries
            .iter()
            .find(|(resort, _)| resort.id == id)
            .map(|(_, weather)| weather)
    }

    /// Iterates resorts and their forecasts in resort order
    pub fn iter(&self) -> impl Iterator<Item = (&'static Resort, &LocationWeather)> + '_ {
        self.entries.iter().map(|(resort, weather)| (*resort, weather))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for WeatherData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (resort, weather) in &self.entries {
            map.serialize_entry(resort.id, weather)?;
        }
        map.end()
    }
}
