use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{WeatherFields, compass_code, display_condition};

use super::{ProviderError, ProviderResponse, WeatherProvider};

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, CURRENT_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    /// Current-conditions URL with the location and key percent-encoded.
    pub fn request_url(&self, location: &str) -> String {
        format!(
            "{}?units={}&q={}&appid={}",
            self.base_url,
            UNITS,
            urlencoding::encode(location),
            urlencoding::encode(&self.api_key),
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, location: &str) -> Result<ProviderResponse, ProviderError> {
        let res = self
            .http
            .get(self.request_url(location))
            .send()
            .await
            .map_err(ProviderError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            });
        }

        let body = res.text().await.map_err(ProviderError::Transport)?;
        parse_current(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: Option<u8>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: Option<OwCoord>,
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: Option<OwWind>,
    clouds: Option<OwClouds>,
    sys: Option<OwSys>,
    dt: Option<i64>,
}

/// Parses an OpenWeather current-conditions JSON body.
pub fn parse_current(body: &str) -> Result<ProviderResponse, ProviderError> {
    let raw: serde_json::Value = serde_json::from_str(body)?;
    let parsed: OwCurrentResponse = serde_json::from_value(raw.clone())?;

    let weather = parsed.weather.into_iter().next().ok_or(ProviderError::MissingField("weather"))?;
    if !parsed.main.temp.is_finite() {
        return Err(ProviderError::MissingField("main.temp"));
    }

    let (latitude, longitude) = parsed.coord.map(|c| (c.lat, c.lon)).unwrap_or_default();
    let (country, sunrise, sunset) = parsed
        .sys
        .map(|s| (s.country, s.sunrise.and_then(unix_to_utc), s.sunset.and_then(unix_to_utc)))
        .unwrap_or_default();
    let (wind_speed_mps, wind_direction_deg) =
        parsed.wind.map(|w| (w.speed, w.deg)).unwrap_or_default();

    let fields = WeatherFields {
        name: parsed.name,
        country,
        latitude,
        longitude,
        sunrise,
        sunset,
        condition_text: display_condition(&weather.description),
        condition_raw: weather.description,
        condition_icon_id: weather.icon,
        temperature_c: parsed.main.temp,
        humidity_pct: parsed.main.humidity,
        pressure_hpa: parsed.main.pressure,
        cloud_cover_pct: parsed.clouds.and_then(|c| c.all),
        wind_speed_mps,
        wind_direction_code: wind_direction_deg.map(|d| compass_code(d).to_string()),
        wind_direction_deg,
        last_updated: parsed.dt.and_then(unix_to_utc),
    };

    Ok(ProviderResponse { fields, raw })
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
