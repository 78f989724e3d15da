//! Fakes shared by unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use crate::cache::{CacheError, Storage};
use crate::retry::{FetchError, HttpResponse, HttpTransport};

type Handler = Box<dyn Fn(&str) -> Result<HttpResponse, FetchError> + Send + Sync>;

/// Transport that answers from a handler and records every requested URL
pub struct FakeTransport {
    handler: Handler,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Result<HttpResponse, FetchError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers requests with `responses` in order, then with network errors
    pub fn scripted(responses: Vec<Result<HttpResponse, FetchError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Network("script exhausted".to_string())))
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        (self.handler)(url)
    }
}

/// Storage whose every operation fails, like a full or unavailable disk
pub struct FailingStorage;

impl Storage for FailingStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Io(std::io::Error::other("storage unavailable")))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
        Err(CacheError::Io(std::io::Error::other("quota exceeded")))
    }
}

/// Builds a Tomorrow.io style forecast body
pub fn forecast_body(days: usize, hours: usize, snow_cm: f64) -> String {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let daily: Vec<_> = (0..days)
        .map(|day| {
            json!({
                "time": (start + Duration::days(day as i64)).to_rfc3339(),
                "values": {
                    "temperatureAvg": -5.0,
                    "temperatureMin": -10.0,
                    "temperatureMax": 0.0,
                    "snowAccumulation": snow_cm * 24.0
                }
            })
        })
        .collect();
    let hourly: Vec<_> = (0..hours)
        .map(|hour| {
            json!({
                "time": (start + Duration::hours(hour as i64)).to_rfc3339(),
                "values": { "snowAccumulation": snow_cm }
            })
        })
        .collect();

    json!({ "timelines": { "daily": daily, "hourly": hourly } }).to_string()
}
