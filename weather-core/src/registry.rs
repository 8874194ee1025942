use tracing::{debug, info, warn};

use crate::{
    layout::LayoutEngine,
    model::ReportModel,
    provider::{FatalError, Fetcher},
};

/// What happened to a location offered to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Primary,
    Secondary,
    /// The initial fetch failed; the location is left out for good.
    FetchFailed,
    /// No room left on the canvas for another secondary panel.
    NoRoom,
}

/// Tracked locations in insertion order. Every stored report is `Ok`.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    reports: Vec<ReportModel>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches each location in order and admits the ones that succeed and fit.
    pub async fn populate<S: AsRef<str>>(
        fetcher: &Fetcher,
        locations: &[S],
        layout: &LayoutEngine,
    ) -> Result<Self, FatalError> {
        let mut registry = Self::new();
        for location in locations {
            let location = location.as_ref();
            if !registry.has_room(layout) {
                debug!(location, "no room left on the canvas; skipping");
                continue;
            }
            let report = fetcher.fetch(location).await?;
            match registry.admit(report, layout) {
                Admission::Primary | Admission::Secondary => info!(location, "location added"),
                Admission::FetchFailed => warn!(location, "location left out after failed fetch"),
                Admission::NoRoom => debug!(location, "no room left on the canvas; skipping"),
            }
        }
        Ok(registry)
    }

    /// Whether another location would fit if its fetch succeeds.
    pub fn has_room(&self, layout: &LayoutEngine) -> bool {
        self.reports.is_empty() || layout.admits_secondary(self.secondary_count())
    }

    /// Offers a freshly fetched report. Failed reports and overflow are dropped.
    pub fn admit(&mut self, report: ReportModel, layout: &LayoutEngine) -> Admission {
        if !report.is_ok() {
            return Admission::FetchFailed;
        }
        if self.reports.is_empty() {
            self.reports.push(report);
            return Admission::Primary;
        }
        if !layout.admits_secondary(self.secondary_count()) {
            return Admission::NoRoom;
        }
        self.reports.push(report);
        Admission::Secondary
    }

    /// Swaps in a refreshed report for `slot`.
    ///
    /// A failed refresh leaves the previous snapshot untouched. Returns whether
    /// the slot changed.
    pub fn replace(&mut self, slot: usize, report: ReportModel) -> bool {
        let Some(current) = self.reports.get_mut(slot) else {
            warn!(slot, "refresh result for unknown slot");
            return false;
        };
        if !report.is_ok() {
            warn!(
                location = current.location(),
                status = ?report.status(),
                "refresh failed; keeping previous report"
            );
            return false;
        }
        *current = report;
        true
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn secondary_count(&self) -> usize {
        self.reports.len().saturating_sub(1)
    }

    pub fn get(&self, slot: usize) -> Option<&ReportModel> {
        self.reports.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportModel> {
        self.reports.iter()
    }

    /// Slot and location string of every tracked location.
    pub fn locations(&self) -> Vec<(usize, String)> {
        self.reports.iter().enumerate().map(|(slot, r)| (slot, r.location().to_string())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DisplaySettings, FetchOptions},
        model::{FetchStatus, tests::london_fields},
        provider::tests::{Scripted, ScriptedProvider},
    };
    use std::sync::Arc;

    fn layout(canvas_width: u32) -> LayoutEngine {
        LayoutEngine::new(&DisplaySettings { canvas_width, ..DisplaySettings::default() })
    }

    fn fetcher(entries: &[(&str, Vec<Scripted>)]) -> Fetcher {
        Fetcher::new(Arc::new(ScriptedProvider::with(entries)), FetchOptions::default())
    }

    #[tokio::test]
    async fn populate_keeps_order_and_drops_failures() {
        let f = fetcher(&[
            ("London", vec![Scripted::Ok(10.0)]),
            ("Atlantis", vec![Scripted::Http(404, "Not Found")]),
            ("Paris", vec![Scripted::Ok(14.0)]),
        ]);
        let registry = LocationRegistry::populate(&f, &["London", "Atlantis", "Paris"], &layout(800))
            .await
            .expect("not fatal");
        let names: Vec<_> = registry.iter().map(|r| r.location()).collect();
        assert_eq!(names, ["London", "Paris"]);
    }

    #[tokio::test]
    async fn failed_first_location_promotes_next_to_primary() {
        let f = fetcher(&[
            ("Atlantis", vec![Scripted::Http(404, "Not Found")]),
            ("Paris", vec![Scripted::Ok(14.0)]),
        ]);
        let registry =
            LocationRegistry::populate(&f, &["Atlantis", "Paris"], &layout(800)).await.expect("not fatal");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).map(|r| r.location()), Some("Paris"));
    }

    #[tokio::test]
    async fn narrow_canvas_caps_secondary_locations() {
        // 300 / 4 < 96, so only floor(300 / 96) = 3 secondaries fit.
        let names = ["London", "Paris", "Berlin", "Tokyo", "Oslo"];
        let script: Vec<_> = names.iter().map(|n| (*n, vec![Scripted::Ok(5.0)])).collect();
        let f = fetcher(&script);
        let registry = LocationRegistry::populate(&f, &names, &layout(300)).await.expect("not fatal");
        assert_eq!(registry.secondary_count(), 3);
        assert_eq!(registry.get(3).map(|r| r.location()), Some("Tokyo"));
    }

    #[tokio::test]
    async fn canvas_under_two_panels_wide_admits_one_secondary() {
        // 150 / 4 < 96 and floor(150 / 96) = 1.
        let names = ["London", "Paris", "Berlin", "Tokyo"];
        let script: Vec<_> = names.iter().map(|n| (*n, vec![Scripted::Ok(5.0)])).collect();
        let f = fetcher(&script);
        let registry = LocationRegistry::populate(&f, &names, &layout(150)).await.expect("not fatal");
        assert_eq!(registry.secondary_count(), 1);
        let admitted: Vec<_> = registry.iter().map(|r| r.location()).collect();
        assert_eq!(admitted, ["London", "Paris"]);
    }

    #[tokio::test]
    async fn fatal_fetch_aborts_population() {
        let f = fetcher(&[("London", vec![Scripted::Ok(1.0)]), ("Paris", vec![Scripted::Malformed])]);
        let err = LocationRegistry::populate(&f, &["London", "Paris"], &layout(800)).await.unwrap_err();
        assert_eq!(err.location, "Paris");
    }

    #[test]
    fn admission_past_capacity_does_not_grow() {
        let layout = layout(800);
        let mut registry = LocationRegistry::new();
        for i in 0..20 {
            registry.admit(ReportModel::ok(format!("L{i}"), london_fields(1.0)), &layout);
        }
        assert_eq!(registry.secondary_count(), 8);
        let outcome = registry.admit(ReportModel::ok("Extra", london_fields(1.0)), &layout);
        assert_eq!(outcome, Admission::NoRoom);
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot() {
        let mut registry = LocationRegistry::new();
        registry.admit(ReportModel::ok("London", london_fields(11.0)), &layout(800));
        let before = registry.get(0).cloned();

        let failed = ReportModel::failed("London", FetchStatus::TransportError(503), "Service Unavailable");
        assert!(!registry.replace(0, failed));
        assert_eq!(registry.get(0).cloned(), before);

        assert!(registry.replace(0, ReportModel::ok("London", london_fields(15.0))));
        assert_eq!(registry.get(0).and_then(|r| r.temperature_label()).as_deref(), Some("15C"));
    }

    #[test]
    fn replace_ignores_unknown_slot() {
        let mut registry = LocationRegistry::new();
        assert!(!registry.replace(3, ReportModel::ok("London", london_fields(1.0))));
        assert!(registry.is_empty());
    }
}
