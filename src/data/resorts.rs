//! Static resort data for the Colorado ski resorts on the dashboard
//!
//! The list order is the order in which resorts are fetched and displayed.

use super::Resort;

/// Static array of all tracked resorts
pub static RESORTS: [Resort; 6] = [
    Resort {
        id: "breckenridge",
        name: "Breckenridge",
        latitude: 39.4817,
        longitude: -106.0384,
    },
    Resort {
        id: "aspen",
        name: "Aspen",
        latitude: 39.1911,
        longitude: -106.8175,
    },
    Resort {
        id: "vail",
        name: "Vail",
        latitude: 39.6403,
        longitude: -106.3742,
    },
    Resort {
        id: "crestedButte",
        name: "Crested Butte",
        latitude: 38.8697,
        longitude: -106.9878,
    },
    Resort {
        id: "telluride",
        name: "Telluride",
        latitude: 37.9375,
        longitude: -107.8123,
    },
    Resort {
        id: "beaverCreek",
        name: "Beaver Creek",
        latitude: 39.6042,
        longitude: -106.5165,
    },
];

/// Returns all resorts in display order
pub fn all_resorts() -> &'static [Resort] {
    &RESORTS
}

/// Get a resort by its ID
///
/// # Example
///
/// ```
/// use snowdash::data::get_resort_by_id;
///
/// if let Some(resort) = get_resort_by_id("telluride") {
///     println!("Found: {}", resort.name);
/// }
/// ```
pub fn get_resort_by_id(id: &str) -> Option<&'static Resort> {
    RESORTS.iter().find(|resort| resort.id == id)
}
