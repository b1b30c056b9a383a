//! Bandwidth extraction from pod annotations
//!
//! Rates come from two well-known annotations and must lie between 1 kbit/s
//! and 1 Pbit/s. Out-of-range values are rejected, never clamped.

use std::collections::HashMap;
use tracing::debug;

use podnet_core::{BandwidthError, Quantity, Result};

use crate::options::BandWidth;

/// Annotation holding the ingress rate
pub const INGRESS_BANDWIDTH_ANNOTATION: &str = "kubernetes.io/ingress-bandwidth";
/// Annotation holding the egress rate
pub const EGRESS_BANDWIDTH_ANNOTATION: &str = "kubernetes.io/egress-bandwidth";

/// Smallest accepted rate (1k)
pub const MIN_BANDWIDTH: Quantity = Quantity::from_value(1_000);
/// Largest accepted rate (1P)
pub const MAX_BANDWIDTH: Quantity = Quantity::from_value(1_000_000_000_000_000);

/// Burst ceiling attached to every rate (`u32::MAX`)
pub const MAX_BURST: u64 = 4_294_967_295;

/// Read and validate the ingress and egress rates
///
/// A missing annotation yields `None` for that direction. The first parse or
/// range failure aborts the whole extraction.
pub fn extract_bandwidth(
    annotations: &HashMap<String, String>,
) -> std::result::Result<(Option<Quantity>, Option<Quantity>), BandwidthError> {
    let ingress = read_annotation(annotations, INGRESS_BANDWIDTH_ANNOTATION)?;
    let egress = read_annotation(annotations, EGRESS_BANDWIDTH_ANNOTATION)?;
    Ok((ingress, egress))
}

fn read_annotation(
    annotations: &HashMap<String, String>,
    key: &str,
) -> std::result::Result<Option<Quantity>, BandwidthError> {
    let Some(raw) = annotations.get(key) else {
        return Ok(None);
    };

    let quantity = raw
        .parse::<Quantity>()
        .map_err(|error| BandwidthError::Parse {
            annotation: key.to_string(),
            error,
        })?;
    validate_bandwidth(quantity)?;

    debug!(annotation = key, value = %quantity, "Parsed bandwidth annotation");
    Ok(Some(quantity))
}

/// Check a rate against the accepted range
pub fn validate_bandwidth(rate: Quantity) -> std::result::Result<(), BandwidthError> {
    if rate.value() < MIN_BANDWIDTH.value() {
        return Err(BandwidthError::TooSmall);
    }
    if rate.value() > MAX_BANDWIDTH.value() {
        return Err(BandwidthError::TooLarge);
    }
    Ok(())
}

/// Build the bandwidth capability from the annotations
///
/// Returns `None` when neither annotation is present.
pub fn to_bandwidth(annotations: &HashMap<String, String>) -> Result<Option<BandWidth>> {
    let (ingress, egress) = extract_bandwidth(annotations)?;

    if ingress.is_none() && egress.is_none() {
        return Ok(None);
    }

    Ok(Some(BandWidth {
        ingress_rate: ingress.map(|rate| rate.value().unsigned_abs()),
        ingress_burst: ingress.map(|_| MAX_BURST),
        egress_rate: egress.map(|rate| rate.value().unsigned_abs()),
        egress_burst: egress.map(|_| MAX_BURST),
    }))
}
