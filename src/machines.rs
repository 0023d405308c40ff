//! The vending machine catalog.
//!
//! Machines come from a static JSON dataset produced by the scraping and
//! geocoding pipeline that maintains `data/machines.json`. Loading is a
//! one-time, one-way transformation: raw records missing either coordinate
//! are dropped, and the display name gets a region suffix derived from the
//! address. After load the catalog is never mutated; ranking copies it.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::{debug, info};

use crate::geo::{self, Coordinate};

/// Region suffix used when an address is too short to carry one.
const UNKNOWN_REGION: &str = "Unknown Area";

/// What a machine dispenses. The dataset is first and foremost a Pokemon
/// card machine list, so records without an explicit category default to
/// [`Category::Pokemon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pokemon,
    General,
}

/// One machine as it appears in the raw dataset. `lat`/`lng` are nullable
/// because the upstream geocoder leaves them null when it cannot resolve
/// an address.
#[derive(Debug, Deserialize)]
struct RawMachine {
    machine_id: String,
    name: String,
    address: String,
    coordinates: RawCoordinates,
    #[serde(default)]
    category: Option<Category>,
}

#[derive(Debug, Deserialize)]
struct RawCoordinates {
    lat: Option<f64>,
    lng: Option<f64>,
}

/// A machine that survived the load-time coordinate filter.
#[derive(Debug, Clone)]
pub struct MachineRecord {
    pub id: String,
    /// Display label: `"<dataset name> - <region>"`, where the region is
    /// the second-to-last comma-delimited segment of the address.
    pub name: String,
    pub address: String,
    pub location: Coordinate,
    pub category: Category,
}

impl MachineRecord {
    fn from_raw(raw: RawMachine) -> Option<Self> {
        let (Some(lat), Some(lng)) = (raw.coordinates.lat, raw.coordinates.lng) else {
            debug!(machine_id = %raw.machine_id, "dropping machine without coordinates");
            return None;
        };
        Some(Self {
            name: format!("{} - {}", raw.name, region_segment(&raw.address)),
            id: raw.machine_id,
            address: raw.address,
            location: Coordinate::new(lat, lng),
            category: raw.category.unwrap_or(Category::Pokemon),
        })
    }
}

/// A machine plus its distance from the user, once known.
///
/// `distance_miles` is `None` until a position fix has been applied; lists
/// where it is populated are sorted ascending by it, otherwise they keep
/// dataset order.
#[derive(Debug, Clone)]
pub struct RankedMachine {
    pub record: MachineRecord,
    pub distance_miles: Option<f64>,
}

/// The second-to-last comma-delimited address segment, verbatim.
///
/// Deliberately does no trimming: the dataset joins street and city/state
/// with ", ", so the segment usually arrives with a leading space and the
/// label preserves it. Addresses with fewer than two segments fall back to
/// a fixed placeholder.
fn region_segment(address: &str) -> &str {
    let parts: Vec<&str> = address.split(',').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        UNKNOWN_REGION
    }
}

/// Parses raw dataset JSON into the catalog, dropping records without a
/// complete coordinate pair.
pub fn parse_machines(json: &str) -> serde_json::Result<Vec<MachineRecord>> {
    let raw: Vec<RawMachine> = serde_json::from_str(json)?;
    let total = raw.len();
    let machines: Vec<MachineRecord> = raw.into_iter().filter_map(MachineRecord::from_raw).collect();
    debug!(
        kept = machines.len(),
        dropped = total - machines.len(),
        "filtered machine dataset"
    );
    Ok(machines)
}

/// Loads the catalog from the dataset file configured in `config.toml`.
pub fn load_machines(path: &Path) -> Result<Vec<MachineRecord>> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("could not read machine dataset at {}", path.display()))?;
    let machines = parse_machines(&text)
        .wrap_err_with(|| format!("could not parse machine dataset at {}", path.display()))?;
    info!(count = machines.len(), path = %path.display(), "loaded machine dataset");
    Ok(machines)
}

/// Wraps the catalog for display before any position is known: no
/// distances, dataset order preserved.
pub fn unranked(records: &[MachineRecord]) -> Vec<RankedMachine> {
    records
        .iter()
        .map(|record| RankedMachine {
            record: record.clone(),
            distance_miles: None,
        })
        .collect()
}

/// Ranks the full catalog by distance from `origin`, nearest first.
///
/// Every element gets a populated `distance_miles`. The sort is stable, so
/// machines at identical distances keep their dataset order.
pub fn rank(origin: Coordinate, records: &[MachineRecord]) -> Vec<RankedMachine> {
    let mut ranked: Vec<RankedMachine> = records
        .iter()
        .map(|record| RankedMachine {
            distance_miles: Some(geo::distance_miles(origin, record.location)),
            record: record.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.distance_miles
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance_miles.unwrap_or(f64::INFINITY))
    });
    ranked
}
