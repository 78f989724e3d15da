//! Forecast summaries shared by the dashboard cards and the `--once` report

use chrono::{Datelike, Days, NaiveDate};

use crate::data::{LocationWeather, WeatherData};
use crate::snow::{celsius_to_fahrenheit, daily_snow_totals, FORECAST_DAYS};

/// Hours shown in the hourly snow list
pub const HOURLY_LIMIT: usize = 120;

/// Headline figures for a resort card
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub avg_f: f64,
    pub min_f: f64,
    pub max_f: f64,
    /// Snow expected over the first 24 forecast hours, in inches
    pub next_24h_snow_in: f64,
}

impl Summary {
    /// Today's temperatures and next-day snow, `None` if there are no daily entries
    pub fn from_weather(weather: &LocationWeather) -> Option<Self> {
        let today = weather.daily.first()?;
        Some(Self {
            avg_f: celsius_to_fahrenheit(today.temperature_avg),
            min_f: celsius_to_fahrenheit(today.temperature_min),
            max_f: celsius_to_fahrenheit(today.temperature_max),
            next_24h_snow_in: daily_snow_totals(&weather.hourly)[0],
        })
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("Average Daily Temperature: {:.1} °F", self.avg_f),
            format!("Min: {:.1} °F | Max: {:.1} °F", self.min_f, self.max_f),
            format!("Next 24hr Snow Forecast: {:.1} inches", self.next_24h_snow_in),
        ]
    }
}

/// One row of the 6-day outlook
#[derive(Debug, Clone, PartialEq)]
pub struct DayOutlook {
    /// Weekday name, e.g. "Monday"
    pub label: String,
    /// Min and max in °F, `None` when upstream sent fewer daily entries
    pub temps_f: Option<(f64, f64)>,
    pub snow_in: f64,
}

/// Six days starting at `today`, labelled by weekday
pub fn outlook(weather: &LocationWeather, today: NaiveDate) -> Vec<DayOutlook> {
    let totals = daily_snow_totals(&weather.hourly);
    (0..FORECAST_DAYS)
        .map(|offset| {
            let label = today
                .checked_add_days(Days::new(offset as u64))
                .map(|date| weekday_name(date.weekday()))
                .unwrap_or("-")
                .to_string();
            let temps_f = weather.daily.get(offset).map(|day| {
                (
                    celsius_to_fahrenheit(day.temperature_min),
                    celsius_to_fahrenheit(day.temperature_max),
                )
            });
            DayOutlook {
                label,
                temps_f,
                snow_in: totals[offset],
            }
        })
        .collect()
}

fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

/// Plain text report, one block per resort
pub fn render_text(data: &WeatherData, today: NaiveDate) -> String {
    let mut out = String::new();
    for (resort, weather) in data.iter() {
        out.push_str(resort.name);
        out.push('\n');
        match Summary::from_weather(weather) {
            Some(summary) => {
                for line in summary.lines() {
                    out.push_str("  ");
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            None => out.push_str("  No daily forecast available\n"),
        }

        let snowfall: Vec<String> = outlook(weather, today)
            .iter()
            .map(|day| format!("{} {:.1}", day.label.get(..3).unwrap_or(day.label.as_str()), day.snow_in))
            .collect();
        out.push_str(&format!("  6-Day Snowfall (in): {}\n\n", snowfall.join(", ")));
    }
    out
}

/// Full forecast data keyed by resort id
pub fn render_json(data: &WeatherData) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{all_resorts, weather::parse_forecast};
    use crate::test_support::forecast_body;
    use std::collections::HashMap;

    fn weather(days: usize, hours: usize, snow_cm: f64) -> LocationWeather {
        parse_forecast(&forecast_body(days, hours, snow_cm)).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_summary_converts_units() {
        // -5 °C avg, -10 min, 0 max; 1 cm per hour
        let summary = Summary::from_weather(&weather(6, 144, 1.0)).unwrap();
        assert!((summary.avg_f - 23.0).abs() < 1e-9);
        assert!((summary.min_f - 14.0).abs() < 1e-9);
        assert!((summary.max_f - 32.0).abs() < 1e-9);
        assert!((summary.next_24h_snow_in - 24.0 * 0.393701).abs() < 1e-9);
    }

    #[test]
    fn test_summary_lines_format() {
        let summary = Summary::from_weather(&weather(6, 144, 1.0)).unwrap();
        let lines = summary.lines();
        assert_eq!(lines[0], "Average Daily Temperature: 23.0 °F");
        assert_eq!(lines[1], "Min: 14.0 °F | Max: 32.0 °F");
        assert_eq!(lines[2], "Next 24hr Snow Forecast: 9.4 inches");
    }

    #[test]
    fn test_summary_none_without_daily_entries() {
        assert!(Summary::from_weather(&weather(0, 24, 1.0)).is_none());
    }

    #[test]
    fn test_outlook_labels_start_today() {
        let days = outlook(&weather(6, 144, 0.0), monday());
        let labels: Vec<&str> = days.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
        );
    }

    #[test]
    fn test_outlook_short_daily_data() {
        let days = outlook(&weather(2, 48, 1.0), monday());
        assert_eq!(days.len(), 6);
        assert!(days[1].temps_f.is_some());
        assert!(days[2].temps_f.is_none());
        assert_eq!(days[2].snow_in, 0.0);
    }

    fn full_data() -> WeatherData {
        let results: HashMap<_, _> = all_resorts()
            .iter()
            .map(|resort| (resort.id, weather(6, 144, 0.5)))
            .collect();
        WeatherData::from_results(results).unwrap()
    }

    #[test]
    fn test_render_text_lists_every_resort() {
        let text = render_text(&full_data(), monday());
        for resort in all_resorts() {
            assert!(text.contains(resort.name), "missing {}", resort.name);
        }
        assert!(text.contains("6-Day Snowfall (in): Mon 4.7, Tue 4.7"));
    }

    #[test]
    fn test_render_json_keyed_by_id() {
        let json = render_json(&full_data()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["crestedButte"]["daily"].is_array());
        assert_eq!(value.as_object().unwrap().len(), 6);
    }
}
