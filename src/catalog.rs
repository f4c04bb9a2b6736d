//! Built-in device catalog and the device-lookup boundary.
//!
//! The simulation only ever receives finished [`Device`] records. Turning a
//! free-text name into a wattage happens here, behind [`DeviceLookup`], so a
//! remote resolver can be swapped in without touching the core.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::panel::types::{Device, DeviceCategory};

/// Wattage assigned when nothing better is known.
pub const FALLBACK_WATTS: f64 = 100.0;

/// Longest device name kept, in characters.
pub const MAX_NAME_CHARS: usize = 30;

/// Name, wattage, and category of a device before it is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    pub watts: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DeviceCategory>,
}

impl DeviceSpec {
    /// A 100 W "other" device named after `query`.
    pub fn fallback(query: &str) -> Self {
        Self {
            name: query.to_string(),
            watts: FALLBACK_WATTS,
            category: Some(DeviceCategory::Other),
        }
    }

    /// Truncates the name and replaces unusable wattage with [`FALLBACK_WATTS`].
    pub fn normalized(mut self) -> Self {
        if let Some((cut, _)) = self.name.char_indices().nth(MAX_NAME_CHARS) {
            self.name.truncate(cut);
        }
        if !self.watts.is_finite() || self.watts <= 0.0 {
            self.watts = FALLBACK_WATTS;
        }
        self
    }
}

impl Device {
    /// Builds a device from a spec. New devices start switched on.
    pub fn from_spec(uid: String, spec: DeviceSpec) -> Self {
        let spec = spec.normalized();
        Self {
            uid,
            name: spec.name,
            watts: spec.watts,
            is_on: true,
            category: spec.category,
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub watts: f64,
    pub category: DeviceCategory,
}

impl CatalogEntry {
    pub fn spec(&self) -> DeviceSpec {
        DeviceSpec {
            name: self.name.to_string(),
            watts: self.watts,
            category: Some(self.category),
        }
    }
}

const fn entry(name: &'static str, watts: f64, category: DeviceCategory) -> CatalogEntry {
    CatalogEntry {
        name,
        watts,
        category,
    }
}

use DeviceCategory::{
    Electronics, Hvac, Kitchen, Laundry, Lighting, Other, Outdoor, Personal, Plumbing, Tools,
};

static CATALOG: &[CatalogEntry] = &[
    entry("LED Bulb (9W)", 9.0, Lighting),
    entry("LED Bulb (15W)", 15.0, Lighting),
    entry("CFL Bulb (13W)", 13.0, Lighting),
    entry("Incandescent (60W)", 60.0, Lighting),
    entry("Incandescent (100W)", 100.0, Lighting),
    entry("Halogen Bulb (50W)", 50.0, Lighting),
    entry("LED Strip (5m)", 30.0, Lighting),
    entry("Chandelier (Incandescent)", 300.0, Lighting),
    entry("Desk Lamp (LED)", 10.0, Lighting),
    entry("Outdoor Floodlight (Halogen)", 300.0, Lighting),
    entry("Electric Range", 12000.0, Kitchen),
    entry("Induction Cooktop (per element)", 1800.0, Kitchen),
    entry("Electric Oven", 2500.0, Kitchen),
    entry("Microwave", 1000.0, Kitchen),
    entry("Microwave (Large)", 1500.0, Kitchen),
    entry("Toaster (2-slice)", 850.0, Kitchen),
    entry("Toaster (4-slice)", 1400.0, Kitchen),
    entry("Toaster Oven", 1200.0, Kitchen),
    entry("Coffee Maker (Drip)", 1000.0, Kitchen),
    entry("Espresso Machine", 1500.0, Kitchen),
    entry("Electric Kettle", 1500.0, Kitchen),
    entry("Blender", 400.0, Kitchen),
    entry("Air Fryer", 1500.0, Kitchen),
    entry("Slow Cooker", 250.0, Kitchen),
    entry("Refrigerator (French Door)", 250.0, Kitchen),
    entry("Freezer (Chest)", 100.0, Kitchen),
    entry("Dishwasher", 1800.0, Kitchen),
    entry("Garbage Disposal (1/2 HP)", 500.0, Kitchen),
    entry("Washing Machine (Top Load)", 500.0, Laundry),
    entry("Dryer (Electric)", 5000.0, Laundry),
    entry("Dryer (Electric - Large)", 5400.0, Laundry),
    entry("Steam Iron", 1800.0, Laundry),
    entry("Central AC (2 ton)", 3500.0, Hvac),
    entry("Window AC (5,000 BTU)", 500.0, Hvac),
    entry("Mini Split AC (18,000 BTU)", 1800.0, Hvac),
    entry("Electric Furnace (10 kW)", 10000.0, Hvac),
    entry("Space Heater (Small)", 750.0, Hvac),
    entry("Space Heater", 1500.0, Hvac),
    entry("Ceiling Fan", 75.0, Hvac),
    entry("Dehumidifier (30 pint)", 500.0, Hvac),
    entry("Sump Pump (1/3 HP)", 800.0, Plumbing),
    entry("Well Pump (3/4 HP)", 1100.0, Plumbing),
    entry("Electric Water Heater (40 gal)", 4500.0, Plumbing),
    entry("Tankless Water Heater (Medium)", 18000.0, Plumbing),
    entry("TV (55\" LED)", 100.0, Electronics),
    entry("TV (65\" LED)", 120.0, Electronics),
    entry("Laptop", 65.0, Electronics),
    entry("Laptop (Gaming)", 180.0, Electronics),
    entry("Desktop PC", 200.0, Electronics),
    entry("Router", 10.0, Electronics),
    entry("Phone Charger", 20.0, Electronics),
    entry("Phone Charger (Fast)", 45.0, Electronics),
    entry("3D Printer", 200.0, Electronics),
    entry("Drill (Corded)", 600.0, Tools),
    entry("Circular Saw", 1400.0, Tools),
    entry("Table Saw (Cabinet)", 3000.0, Tools),
    entry("Air Compressor (Pancake)", 1200.0, Tools),
    entry("Welder (MIG 220V)", 7500.0, Tools),
    entry("EV Charger (Level 2 - 32A)", 7700.0, Tools),
    entry("Lawn Mower (Electric)", 1400.0, Outdoor),
    entry("Pool Pump (2 HP)", 2500.0, Outdoor),
    entry("Electric Smoker", 800.0, Outdoor),
    entry("Hair Dryer", 1800.0, Personal),
    entry("Curling Iron", 150.0, Personal),
    entry("Sauna (4 person)", 6000.0, Personal),
    entry("Vacuum Cleaner (Canister)", 1200.0, Other),
    entry("Aquarium (100+ gal)", 250.0, Other),
    entry("Heated Mattress Pad", 200.0, Other),
];

static COMMON: &[&str] = &[
    "LED Bulb (9W)",
    "TV (55\" LED)",
    "Laptop",
    "Microwave",
    "Coffee Maker (Drip)",
    "Phone Charger",
    "Ceiling Fan",
    "Space Heater",
    "Refrigerator (French Door)",
    "Dishwasher",
];

/// Every catalog entry.
pub fn all() -> &'static [CatalogEntry] {
    CATALOG
}

/// Entries in one category, in catalog order.
pub fn by_category(category: DeviceCategory) -> impl Iterator<Item = &'static CatalogEntry> {
    CATALOG.iter().filter(move |e| e.category == category)
}

/// The most frequently used devices, in display order.
pub fn common() -> Vec<&'static CatalogEntry> {
    COMMON
        .iter()
        .filter_map(|name| CATALOG.iter().find(|e| e.name == *name))
        .collect()
}

/// Case-insensitive search by name.
///
/// An entry matches when its name starts with or contains the query, or
/// contains every whitespace-separated word of it. Prefix matches sort
/// first, then entries are ordered by name.
pub fn search(query: &str) -> Vec<&'static CatalogEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut hits: Vec<(&'static CatalogEntry, bool)> = CATALOG
        .iter()
        .filter_map(|e| {
            let name = e.name.to_lowercase();
            let prefix = name.starts_with(&query);
            let hit = prefix || name.contains(&query) || words.iter().all(|w| name.contains(w));
            hit.then_some((e, prefix))
        })
        .collect();

    hits.sort_by(|(a, a_prefix), (b, b_prefix)| match (a_prefix, b_prefix) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(b.name)),
    });
    hits.into_iter().map(|(e, _)| e).collect()
}

/// Resolves a free-text device name into a finished spec.
///
/// Implementations never fail; an unknown name yields a fallback spec.
pub trait DeviceLookup {
    fn lookup(&self, query: &str) -> DeviceSpec;
}

/// Lookup backed by the built-in catalog.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogLookup;

impl DeviceLookup for CatalogLookup {
    fn lookup(&self, query: &str) -> DeviceSpec {
        let wanted = query.trim();
        let exact = CATALOG.iter().find(|e| e.name.eq_ignore_ascii_case(wanted));
        let spec = match exact.or_else(|| search(wanted).into_iter().next()) {
            Some(e) => e.spec(),
            None => {
                tracing::debug!(query = %wanted, "no catalog match, using fallback device");
                DeviceSpec::fallback(wanted)
            }
        };
        spec.normalized()
    }
}
