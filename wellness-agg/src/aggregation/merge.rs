//! Fan-in: fold per-source observations into per-country metric sets
//!
//! Sources are visited in registration order. When more than one source
//! holds `{country}_{metric}`, the [`MergePolicy`] picks the winner and the
//! collision is reported as a [`MetricConflict`].

use crate::fetchers::FetchedObservations;
use crate::types::{
    CountryId, CountryMetricSet, MetricConflict, MetricName, Observation, ObservationKey, SourceId,
};
use wellness_common::config::MergePolicy;

/// Successful fetch of one source, in registration order
pub(crate) struct SourceContribution<'a> {
    pub source: &'a SourceId,
    pub observations: &'a FetchedObservations,
}

/// Index of the winning contender
///
/// `contenders` is non-empty and in registration order.
pub(crate) fn select_winner(
    policy: MergePolicy,
    contenders: &[(&SourceId, &Observation)],
) -> usize {
    match policy {
        MergePolicy::LastRegisteredWins => contenders.len() - 1,
        MergePolicy::HighestConfidence => {
            let mut best = 0;
            for (i, (_, observation)) in contenders.iter().enumerate().skip(1) {
                // `>=` hands ties to the later source
                if observation.validity.confidence >= contenders[best].1.validity.confidence {
                    best = i;
                }
            }
            best
        }
    }
}

/// Build one metric set per requested country
pub(crate) fn merge(
    contributions: &[SourceContribution<'_>],
    countries: &[CountryId],
    metrics: &[MetricName],
    year: i32,
    policy: MergePolicy,
) -> (Vec<CountryMetricSet>, Vec<MetricConflict>) {
    let mut data = Vec::with_capacity(countries.len());
    let mut conflicts = Vec::new();

    for country in countries {
        let mut set = CountryMetricSet::new(country.as_str(), year);

        for metric in metrics {
            let key = ObservationKey::new(country.as_str(), metric.as_str());
            let contenders: Vec<(&SourceId, &Observation)> = contributions
                .iter()
                .filter_map(|c| c.observations.get(&key).map(|o| (c.source, o)))
                .collect();

            if contenders.is_empty() {
                continue;
            }

            let winner = select_winner(policy, &contenders);
            if contenders.len() > 1 {
                conflicts.push(MetricConflict {
                    country: country.clone(),
                    metric: metric.clone(),
                    winner: contenders[winner].0.clone(),
                    discarded: contenders
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != winner)
                        .map(|(_, (source, _))| (*source).clone())
                        .collect(),
                });
            }
            set.metrics.insert(metric.clone(), contenders[winner].1.clone());
        }

        data.push(set);
    }

    (data, conflicts)
}
