use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Outcome of the most recent fetch for a location.
///
/// Only `Ok` reports are ever displayed. Unexpected failures are not a status:
/// they travel as [`crate::provider::FatalError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    Ok,
    NotFound,
    Unauthorized,
    TransportError(u16),
}

/// Current conditions for one location, as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherFields {
    pub name: String,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Condition text exactly as the provider sent it.
    pub condition_raw: String,
    /// Title-cased condition text with "Intensity " removed.
    pub condition_text: String,
    pub condition_icon_id: String,
    pub temperature_c: f64,
    pub humidity_pct: Option<u8>,
    pub pressure_hpa: Option<f64>,
    pub cloud_cover_pct: Option<u8>,
    pub wind_speed_mps: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub wind_direction_code: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Immutable snapshot of one location's weather plus the fetch status that produced it.
///
/// Reports are never edited in place; a refresh builds a whole new value and the
/// registry swaps it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportModel {
    location: String,
    status: FetchStatus,
    error_message: Option<String>,
    fields: Option<WeatherFields>,
}

impl ReportModel {
    pub fn ok(location: impl Into<String>, fields: WeatherFields) -> Self {
        Self {
            location: location.into(),
            status: FetchStatus::Ok,
            error_message: None,
            fields: Some(fields),
        }
    }

    /// A failed report. `status` must not be `Ok`.
    pub fn failed(location: impl Into<String>, status: FetchStatus, message: impl Into<String>) -> Self {
        debug_assert!(status != FetchStatus::Ok, "failed report with Ok status");
        Self {
            location: location.into(),
            status,
            error_message: Some(message.into()),
            fields: None,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn fields(&self) -> Option<&WeatherFields> {
        self.fields.as_ref()
    }

    /// Temperature label shown under the icon, e.g. `"12C"`.
    pub fn temperature_label(&self) -> Option<String> {
        self.fields.as_ref().map(|f| format!("{}C", round_to_int(f.temperature_c)))
    }

    /// Second line of a panel: humidity when asked for and known, condition text otherwise.
    pub fn info_line(&self, show_humidity: bool) -> Option<String> {
        let fields = self.fields.as_ref()?;
        match (show_humidity, fields.humidity_pct) {
            (true, Some(pct)) => Some(format!("({pct}%)")),
            _ => Some(fields.condition_text.clone()),
        }
    }

    /// Multi-line human-readable report written to stderr in verbose mode.
    pub fn summary(&self) -> String {
        let Some(f) = self.fields.as_ref() else {
            return format!(
                "Location : \t\t{}\nError : \t\t{}\n",
                self.location,
                self.error_message.as_deref().unwrap_or("unknown")
            );
        };

        let mut out = String::new();
        let _ = writeln!(out, "Location : \t\t{}", f.name);
        if let Some(country) = &f.country {
            let _ = writeln!(out, "Country : \t\t{country}");
        }
        if let (Some(lat), Some(lon)) = (f.latitude, f.longitude) {
            let _ = writeln!(out, "Lat/Long : \t\t{lat:+06.2},{lon:+07.2}");
        }
        if let Some(rise) = f.sunrise {
            let _ = writeln!(out, "Sunrise : \t\t{}", local_time(rise));
        }
        if let Some(set) = f.sunset {
            let _ = writeln!(out, "Sunset : \t\t{}", local_time(set));
        }
        out.push('\n');
        let _ = writeln!(out, "Description: \t\t{}", title_case(&f.condition_raw));
        let _ = writeln!(out, "Temperature : \t\t{} C", round_to_int(f.temperature_c));
        if let Some(h) = f.humidity_pct {
            let _ = writeln!(out, "Humidity : \t\t{h} %");
        }
        if let Some(p) = f.pressure_hpa {
            let _ = writeln!(out, "Pressure : \t\t{} mb/hPa", p.trunc() as i64);
        }
        if let Some(c) = f.cloud_cover_pct {
            let _ = writeln!(out, "Cloud Cover : \t\t{c} %");
        }
        if let Some(speed) = f.wind_speed_mps {
            let _ = writeln!(
                out,
                "Wind Speed : \t\t{} km/h (Force {})",
                (speed * 3.6).trunc() as i64,
                beaufort_scale(speed)
            );
        }
        if let Some(deg) = f.wind_direction_deg {
            let code = f.wind_direction_code.as_deref().unwrap_or("?");
            let _ = writeln!(out, "Wind Direction : \t{}\u{b0} ({code})", deg.trunc() as i64);
        }
        if let Some(updated) = f.last_updated {
            let _ = writeln!(out, "\nUpdated : \t\t{}", local_time(updated));
        }
        out
    }
}

fn round_to_int(value: f64) -> i64 {
    // `as` saturates and maps NaN to 0
    value.round() as i64
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%a %d %b %Y %I:%M %p %Z").to_string()
}

/// Display form of a provider condition: "heavy intensity rain" -> "Heavy Rain".
pub fn display_condition(raw: &str) -> String {
    title_case(raw).replace("Intensity ", "")
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Beaufort force for a wind speed in m/s.
pub fn beaufort_scale(speed_mps: f64) -> u8 {
    const UPPER_BOUNDS: [f64; 12] = [0.5, 1.6, 3.4, 5.5, 8.0, 10.8, 13.9, 17.2, 20.5, 24.5, 28.5, 32.7];
    UPPER_BOUNDS.iter().take_while(|bound| speed_mps > **bound).count() as u8
}

/// 16-point compass code for a bearing in degrees.
pub fn compass_code(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
    ];
    let index = ((degrees.rem_euclid(360.0) / 22.5).round() as usize) % POINTS.len();
    POINTS[index]
}
