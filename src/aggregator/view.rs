//! Dashboard read model
//!
//! Pure functions that turn an aggregate snapshot plus the hidden set into
//! what a dashboard renders: region groups of sensor cards, the list of
//! known regions and a newest-first slice of a sensor's history.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::aggregator::stats::Stats;
use crate::aggregator::types::{AggregateStore, HistoryPoint, SensorState};

/// Lower bound of the optimal temperature band, inclusive
pub const OPTIMAL_TEMP_MIN: f64 = 22.0;

/// Upper bound of the optimal temperature band, inclusive
pub const OPTIMAL_TEMP_MAX: f64 = 27.0;

/// Classification of a temperature reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBand {
    Low,
    Optimal,
    High,
}

impl TemperatureBand {
    pub fn classify(temp: f64) -> Self {
        if temp < OPTIMAL_TEMP_MIN {
            TemperatureBand::Low
        } else if temp <= OPTIMAL_TEMP_MAX {
            TemperatureBand::Optimal
        } else {
            TemperatureBand::High
        }
    }
}

impl std::fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemperatureBand::Low => write!(f, "low"),
            TemperatureBand::Optimal => write!(f, "optimal"),
            TemperatureBand::High => write!(f, "high"),
        }
    }
}

/// Listing criteria for the dashboard
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DashboardFilter {
    /// Only sensors in this region
    #[serde(default)]
    pub region: Option<String>,
    /// Case-insensitive substring of the sensor name
    #[serde(default)]
    pub search: Option<String>,
}

impl DashboardFilter {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Whether a visible sensor passes the region and name criteria
    pub fn matches(&self, name: &str, state: &SensorState) -> bool {
        let region_ok = match self.region.as_deref().filter(|r| !r.is_empty()) {
            Some(region) => state.region == region,
            None => true,
        };
        let search_ok = match self.search.as_deref().filter(|s| !s.is_empty()) {
            Some(search) => name.to_lowercase().contains(&search.to_lowercase()),
            None => true,
        };
        region_ok && search_ok
    }
}

/// One sensor as rendered on the dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SensorCard {
    pub name: String,
    pub temp: f64,
    pub hum: f64,
    pub region: String,
    pub band: TemperatureBand,
    pub stats: Stats,
    /// Chart series, oldest first
    pub history: Vec<HistoryPoint>,
}

impl SensorCard {
    pub fn new(name: &str, state: &SensorState) -> Self {
        Self {
            name: name.to_string(),
            temp: state.temp,
            hum: state.hum,
            region: state.region.clone(),
            band: TemperatureBand::classify(state.temp),
            stats: Stats::from_history(&state.history),
            history: state.history.iter().copied().collect(),
        }
    }
}

/// Cards sharing a region
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionGroup {
    pub region: String,
    pub sensors: Vec<SensorCard>,
}

/// Distinct regions across all sensors, hidden ones included
pub fn regions(sensors: &AggregateStore) -> Vec<String> {
    sensors
        .values()
        .map(|s| s.region.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Group visible, matching sensors by region
///
/// Regions and the cards inside them are sorted; regions with no listed
/// sensor are omitted.
pub fn dashboard(
    sensors: &AggregateStore,
    hidden: &BTreeSet<String>,
    filter: &DashboardFilter,
) -> Vec<RegionGroup> {
    let mut groups: BTreeMap<&str, Vec<SensorCard>> = BTreeMap::new();

    for (name, state) in sensors {
        if hidden.contains(name) || !filter.matches(name, state) {
            continue;
        }
        groups
            .entry(state.region.as_str())
            .or_default()
            .push(SensorCard::new(name, state));
    }

    groups
        .into_iter()
        .map(|(region, sensors)| RegionGroup {
            region: region.to_string(),
            sensors,
        })
        .collect()
}

/// Newest-first slice of a sensor's history, `None` meaning all of it
pub fn recent_history(state: &SensorState, limit: Option<usize>) -> Vec<HistoryPoint> {
    let limit = limit.unwrap_or(state.history.len());
    state.history.iter().rev().take(limit).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::types::SensorReading;

    fn store_with(readings: &[SensorReading]) -> AggregateStore {
        let mut store = AggregateStore::new();
        for (i, reading) in readings.iter().enumerate() {
            let mut state = crate::aggregator::types::get_or_default(
                &store,
                &reading.name,
                reading.region_hint(),
            );
            state.apply(reading, i as i64);
            store.insert(reading.name.clone(), state);
        }
        store
    }

    #[test]
    fn test_temperature_band() {
        assert_eq!(TemperatureBand::classify(21.9), TemperatureBand::Low);
        assert_eq!(TemperatureBand::classify(22.0), TemperatureBand::Optimal);
        assert_eq!(TemperatureBand::classify(27.0), TemperatureBand::Optimal);
        assert_eq!(TemperatureBand::classify(27.1), TemperatureBand::High);
        assert_eq!(TemperatureBand::High.to_string(), "high");
    }

    #[test]
    fn test_regions_are_distinct_and_sorted() {
        let store = store_with(&[
            SensorReading::new("A", 1.0, 1.0).region("Sur"),
            SensorReading::new("B", 1.0, 1.0).region("Norte"),
            SensorReading::new("C", 1.0, 1.0).region("Sur"),
            SensorReading::new("D", 1.0, 1.0),
        ]);
        assert_eq!(regions(&store), vec!["N/A", "Norte", "Sur"]);
    }

    #[test]
    fn test_dashboard_groups_and_hides() {
        let store = store_with(&[
            SensorReading::new("alpha", 23.0, 40.0).region("Sur"),
            SensorReading::new("beta", 30.0, 40.0).region("Norte"),
            SensorReading::new("gamma", 10.0, 40.0).region("Sur"),
        ]);
        let hidden: BTreeSet<String> = ["gamma".to_string()].into_iter().collect();

        let groups = dashboard(&store, &hidden, &DashboardFilter::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].region, "Norte");
        assert_eq!(groups[0].sensors[0].band, TemperatureBand::High);
        assert_eq!(groups[1].region, "Sur");
        assert_eq!(groups[1].sensors.len(), 1);
        assert_eq!(groups[1].sensors[0].name, "alpha");
    }

    #[test]
    fn test_dashboard_filters() {
        let store = store_with(&[
            SensorReading::new("Kitchen", 23.0, 40.0).region("Casa"),
            SensorReading::new("Garage", 23.0, 40.0).region("Casa"),
            SensorReading::new("Office-kit", 23.0, 40.0).region("Trabajo"),
        ]);
        let hidden = BTreeSet::new();

        let groups = dashboard(&store, &hidden, &DashboardFilter::default().search("KIT"));
        let names: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.sensors.iter().map(|c| c.name.as_str()))
            .collect();
        assert_eq!(names, vec!["Kitchen", "Office-kit"]);

        let groups = dashboard(
            &store,
            &hidden,
            &DashboardFilter::default().region("Casa").search("kit"),
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sensors.len(), 1);

        let groups = dashboard(&store, &hidden, &DashboardFilter::default().region("Nada"));
        assert!(groups.is_empty());
    }

    #[test]
    fn test_card_carries_stats() {
        let store = store_with(&[
            SensorReading::new("A", 10.0, 50.0),
            SensorReading::new("A", 20.0, 60.0),
        ]);
        let card = SensorCard::new("A", &store["A"]);
        assert_eq!(card.stats.avg_temp, 15.0);
        assert_eq!(card.history.len(), 2);
        assert_eq!(card.temp, 20.0);
    }

    #[test]
    fn test_recent_history_newest_first() {
        let readings: Vec<SensorReading> = (0..8)
            .map(|i| SensorReading::new("A", i as f64, 0.0))
            .collect();
        let store = store_with(&readings);
        let state = &store["A"];

        let recent = recent_history(state, Some(5));
        let temps: Vec<f64> = recent.iter().map(|p| p.temp).collect();
        assert_eq!(temps, vec![7.0, 6.0, 5.0, 4.0, 3.0]);

        assert_eq!(recent_history(state, None).len(), 8);
        assert_eq!(recent_history(state, Some(50)).len(), 8);
    }
}
