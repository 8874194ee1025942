use crate::{
    config::FetchOptions,
    diagnostics::Diagnostics,
    model::{FetchStatus, ReportModel, WeatherFields},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Failure reported by a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {code}: {reason}")]
    Http { code: u16, reason: String },

    #[error("request failed")]
    Transport(#[source] reqwest::Error),

    #[error("malformed response")]
    Parse(#[from] serde_json::Error),

    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}

/// A successful provider answer: the typed fields plus the raw payload for debugging.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub fields: WeatherFields,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions at `location`, in metric units.
    async fn get_weather(&self, location: &str) -> Result<ProviderResponse, ProviderError>;
}

/// An unexpected failure. The caller is expected to log it and end the process.
#[derive(Debug, Error)]
#[error("unexpected failure fetching weather for '{location}'")]
pub struct FatalError {
    pub location: String,
    #[source]
    pub source: ProviderError,
}

/// Turns provider answers into [`ReportModel`]s.
///
/// HTTP failures become failed reports; anything else is a [`FatalError`].
#[derive(Debug, Clone)]
pub struct Fetcher {
    provider: Arc<dyn WeatherProvider>,
    options: FetchOptions,
    diagnostics: Diagnostics,
}

impl Fetcher {
    /// A fetcher writing its debug and verbose output to stderr.
    pub fn new(provider: Arc<dyn WeatherProvider>, options: FetchOptions) -> Self {
        Self { provider, options, diagnostics: Diagnostics::stderr() }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub async fn fetch(&self, location: &str) -> Result<ReportModel, FatalError> {
        debug!(location, "fetching current conditions");

        match self.provider.get_weather(location).await {
            Ok(response) => {
                let report = ReportModel::ok(location, response.fields);
                if self.options.debug {
                    match serde_json::to_string_pretty(&response.raw) {
                        Ok(dump) => self.diagnostics.emit(&format!("{location}\n{dump}\n")),
                        Err(e) => warn!(location, error = %e, "could not dump raw payload"),
                    }
                } else if self.options.verbose {
                    self.diagnostics.emit(&report.summary());
                }
                info!(location, "weather updated");
                Ok(report)
            }
            Err(ProviderError::Http { code, reason }) => {
                let (status, message) = classify_http(location, code, reason);
                warn!("Error : {code} - {message}");
                Ok(ReportModel::failed(location, status, message))
            }
            Err(source) => Err(FatalError { location: location.to_string(), source }),
        }
    }
}

fn classify_http(location: &str, code: u16, reason: String) -> (FetchStatus, String) {
    match code {
        404 => (FetchStatus::NotFound, format!("Location ({location}) not found.")),
        401 => (FetchStatus::Unauthorized, "Check your application ID is valid.".to_string()),
        _ => (FetchStatus::TransportError(code), reason),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{diagnostics::tests::Captured, model::tests::london_fields};
    use std::{collections::HashMap, sync::Mutex};

    /// Scripted provider: each location answers with the queued results in order,
    /// repeating the last one once the queue runs dry.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedProvider {
        script: Mutex<HashMap<String, Vec<Scripted>>>,
    }

    #[derive(Debug, Clone)]
    pub(crate) enum Scripted {
        Ok(f64),
        Http(u16, &'static str),
        Malformed,
    }

    impl ScriptedProvider {
        pub(crate) fn with(entries: &[(&str, Vec<Scripted>)]) -> Self {
            let script = entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
            Self { script: Mutex::new(script) }
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn get_weather(&self, location: &str) -> Result<ProviderResponse, ProviderError> {
            let next = {
                let mut script = self.script.lock().unwrap();
                let queue = script.get_mut(location).expect("location not scripted");
                if queue.len() > 1 { queue.remove(0) } else { queue[0].clone() }
            };
            match next {
                Scripted::Ok(temp) => {
                    let mut fields = london_fields(temp);
                    fields.name = location.to_string();
                    Ok(ProviderResponse { fields, raw: serde_json::json!({ "name": location }) })
                }
                Scripted::Http(code, reason) => {
                    Err(ProviderError::Http { code, reason: reason.to_string() })
                }
                Scripted::Malformed => {
                    Err(serde_json::from_str::<serde_json::Value>("{").unwrap_err().into())
                }
            }
        }
    }

    fn fetcher(entries: &[(&str, Vec<Scripted>)]) -> Fetcher {
        Fetcher::new(Arc::new(ScriptedProvider::with(entries)), FetchOptions::default())
    }

    #[tokio::test]
    async fn success_yields_ok_report_with_required_fields() {
        let f = fetcher(&[("London", vec![Scripted::Ok(11.6)])]);
        let report = f.fetch("London").await.expect("not fatal");
        assert_eq!(report.status(), FetchStatus::Ok);
        let fields = report.fields().expect("fields present");
        assert_eq!(fields.name, "London");
        assert!(fields.temperature_c.is_finite());
        assert!(!fields.condition_text.is_empty());
        assert!(!fields.condition_icon_id.is_empty());
        assert!(report.error_message().is_none());
    }

    #[tokio::test]
    async fn not_found_names_the_location() {
        let f = fetcher(&[("New Atlantis, XX", vec![Scripted::Http(404, "Not Found")])]);
        let report = f.fetch("New Atlantis, XX").await.expect("not fatal");
        assert_eq!(report.status(), FetchStatus::NotFound);
        assert_eq!(report.error_message(), Some("Location (New Atlantis, XX) not found."));
    }

    #[tokio::test]
    async fn unauthorized_points_at_app_id() {
        let f = fetcher(&[("London", vec![Scripted::Http(401, "Unauthorized")])]);
        let report = f.fetch("London").await.expect("not fatal");
        assert_eq!(report.status(), FetchStatus::Unauthorized);
        assert_eq!(report.error_message(), Some("Check your application ID is valid."));
    }

    #[tokio::test]
    async fn other_http_errors_keep_reason_phrase() {
        let f = fetcher(&[("London", vec![Scripted::Http(503, "Service Unavailable")])]);
        let report = f.fetch("London").await.expect("not fatal");
        assert_eq!(report.status(), FetchStatus::TransportError(503));
        assert_eq!(report.error_message(), Some("Service Unavailable"));
    }

    #[tokio::test]
    async fn malformed_payload_is_fatal() {
        let f = fetcher(&[("London", vec![Scripted::Malformed])]);
        let err = f.fetch("London").await.unwrap_err();
        assert_eq!(err.location, "London");
        assert!(matches!(err.source, ProviderError::Parse(_)));
    }

    async fn fetch_with(options: FetchOptions) -> (ReportModel, String) {
        let captured = Captured::default();
        let f = Fetcher::new(Arc::new(ScriptedProvider::with(&[("London", vec![Scripted::Ok(11.6)])])), options)
            .with_diagnostics(Diagnostics::new(captured.clone()));
        let report = f.fetch("London").await.expect("not fatal");
        (report, captured.text())
    }

    #[tokio::test]
    async fn debug_dumps_raw_payload_under_location() {
        let (report, out) = fetch_with(FetchOptions { debug: true, verbose: false }).await;
        assert!(report.is_ok());
        assert!(out.starts_with("London\n{"), "{out}");
        assert!(out.contains("\"name\": \"London\""), "{out}");
    }

    #[tokio::test]
    async fn verbose_prints_summary() {
        let (report, out) = fetch_with(FetchOptions { debug: false, verbose: true }).await;
        assert!(report.is_ok());
        assert_eq!(out, report.summary());
        assert!(out.contains("Location : \t\tLondon"), "{out}");
    }

    #[tokio::test]
    async fn debug_takes_precedence_over_verbose() {
        let (_, out) = fetch_with(FetchOptions { debug: true, verbose: true }).await;
        assert!(!out.contains("Location :"), "{out}");
    }

    #[tokio::test]
    async fn quiet_fetch_writes_nothing() {
        let (_, out) = fetch_with(FetchOptions::default()).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_writes_no_diagnostics() {
        let captured = Captured::default();
        let f = Fetcher::new(
            Arc::new(ScriptedProvider::with(&[("Atlantis", vec![Scripted::Http(404, "Not Found")])])),
            FetchOptions { debug: true, verbose: true },
        )
        .with_diagnostics(Diagnostics::new(captured.clone()));
        f.fetch("Atlantis").await.expect("not fatal");
        assert!(captured.text().is_empty());
    }
}
