//! Derived snowfall metrics and unit conversions
//!
//! Upstream reports hourly snow accumulation in centimetres and temperatures in
//! Celsius; the dashboard shows inches and Fahrenheit.

use chrono::{DateTime, Utc};

use crate::data::HourlyWeather;

/// Centimetres to inches
pub const CM_TO_INCHES: f64 = 0.393701;

/// Number of daily snowfall totals shown per resort
pub const FORECAST_DAYS: usize = 6;

/// Hourly entries per daily window
const HOURS_PER_DAY: usize = 24;

pub fn cm_to_inches(cm: f64) -> f64 {
    cm * CM_TO_INCHES
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Sums hourly snow accumulation into six consecutive 24-hour totals, in inches
///
/// Day `d` covers `hourly[24*d .. 24*d + 24]` regardless of the calendar dates in
/// the `time` fields. Windows past the end of the data total 0.
pub fn daily_snow_totals(hourly: &[HourlyWeather]) -> [f64; FORECAST_DAYS] {
    let mut totals = [0.0; FORECAST_DAYS];
    for (day, window) in hourly.chunks(HOURS_PER_DAY).take(FORECAST_DAYS).enumerate() {
        let cm: f64 = window.iter().map(|hour| hour.values.snow_accumulation).sum();
        totals[day] = cm_to_inches(cm);
    }
    totals
}

/// First `limit` hours of snow accumulation, converted to inches
pub fn hourly_snow_inches(hourly: &[HourlyWeather], limit: usize) -> Vec<(DateTime<Utc>, f64)> {
    hourly
        .iter()
        .take(limit)
        .map(|hour| (hour.time, cm_to_inches(hour.values.snow_accumulation)))
        .collect()
}
