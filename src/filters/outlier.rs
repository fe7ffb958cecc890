use crate::config::{ReferencePolicy, Thresholds};
use crate::distance::haversine_distance;
use crate::types::TelemetrySample;

/// Distance/accuracy outlier rejection over a time-ordered trajectory.
///
/// The first sample is always kept. A later sample is kept when it lies at least
/// `distance_meters` from the reference sample and its accuracy is within
/// `accuracy_meters`. Samples without a reported accuracy pass the accuracy check.
///
/// With [`ReferencePolicy::LastRetained`] consecutive kept samples are therefore always
/// `distance_meters` or more apart.
pub fn filter(samples: &[TelemetrySample], thresholds: &Thresholds) -> Vec<TelemetrySample> {
    let Some((first, rest)) = samples.split_first() else {
        return Vec::new();
    };

    let mut kept = Vec::with_capacity(samples.len());
    kept.push(*first);
    let mut previous_raw = first;

    for current in rest {
        let reference = match thresholds.reference() {
            ReferencePolicy::LastRetained => kept.last().unwrap_or(first),
            ReferencePolicy::PreviousRaw => previous_raw,
        };
        if passes(reference, current, thresholds) {
            kept.push(*current);
        }
        previous_raw = current;
    }

    log::debug!(
        "Outlier filter kept {}/{} samples (distance >= {} m, accuracy <= {} m, {:?})",
        kept.len(),
        samples.len(),
        thresholds.distance_meters(),
        thresholds.accuracy_meters(),
        thresholds.reference()
    );
    kept
}

fn passes(reference: &TelemetrySample, current: &TelemetrySample, thresholds: &Thresholds) -> bool {
    let distance = haversine_distance(
        reference.latitude,
        reference.longitude,
        current.latitude,
        current.longitude,
    );
    let accurate = current
        .accuracy_meters
        .map_or(true, |acc| acc <= thresholds.accuracy_meters());
    distance >= thresholds.distance_meters() && accurate
}
