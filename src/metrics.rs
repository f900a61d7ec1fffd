use prometheus::core::Collector;
use prometheus::{GaugeVec, Opts};
use std::collections::BTreeMap;

pub const STAKE_LABELS: &[&str] = &["chain", "address", "name", "group", "denom"];

/// A labeled gauge family being filled during one collection cycle.
///
/// Samples are plain values until [`GaugeSet::into_collector`] is called, so a
/// family that never received a sample is never registered.
#[derive(Debug, Clone)]
pub struct GaugeSet {
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
    samples: BTreeMap<Vec<String>, f64>,
}

impl GaugeSet {
    pub fn new(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            labels,
            samples: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Set a sample. Label values are given in the order of the family's label names.
    pub fn set(&mut self, values: Vec<String>, value: f64) {
        debug_assert_eq!(values.len(), self.labels.len());
        self.samples.insert(values, value);
    }

    pub fn get(&self, values: &[&str]) -> Option<f64> {
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.samples.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_collector(self) -> eyre::Result<Option<Box<dyn Collector>>> {
        if self.samples.is_empty() {
            return Ok(None);
        }

        let gauge = GaugeVec::new(Opts::new(self.name, self.help), self.labels)
            .map_err(|e| eyre::eyre!("Invalid gauge '{}': {}", self.name, e))?;
        for (values, value) in &self.samples {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            gauge
                .get_metric_with_label_values(&values)
                .map_err(|e| eyre::eyre!("Invalid labels for '{}': {}", self.name, e))?
                .set(*value);
        }

        Ok(Some(Box::new(gauge)))
    }
}

/// Turn filled families into collectors, dropping empty ones.
pub fn into_collectors(sets: Vec<GaugeSet>) -> Vec<Box<dyn Collector>> {
    sets.into_iter()
        .filter_map(|set| {
            let name = set.name();
            match set.into_collector() {
                Ok(collector) => collector,
                Err(e) => {
                    tracing::error!(gauge = name, error = %e, "Failed to build gauge, skipping");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_family_is_not_registered() {
        let set = GaugeSet::new("test_empty", "empty", STAKE_LABELS);
        assert!(set.into_collector().unwrap().is_none());
    }

    #[test]
    fn test_collector_exposes_samples() {
        let mut set = GaugeSet::new("test_stake", "stake", STAKE_LABELS);
        let labels = ["pocket", "addr", "main", "ops", "pokt"];
        set.set(labels.iter().map(|s| s.to_string()).collect(), 1.5);
        assert_eq!(set.get(&labels), Some(1.5));

        let collector = set.into_collector().unwrap().unwrap();
        let families = collector.collect();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), "test_stake");
        assert_eq!(families[0].get_metric().len(), 1);
        assert_eq!(families[0].get_metric()[0].get_gauge().get_value(), 1.5);
    }

    #[test]
    fn test_into_collectors_skips_empty() {
        let mut filled = GaugeSet::new("test_filled", "filled", &["chain"]);
        filled.set(vec!["pocket".to_string()], 1.0);
        let empty = GaugeSet::new("test_unfilled", "unfilled", &["chain"]);

        let collectors = into_collectors(vec![filled, empty]);
        assert_eq!(collectors.len(), 1);
        assert_eq!(collectors[0].collect()[0].get_name(), "test_filled");
    }
}
