use geojson::FeatureCollection;
use serde_json::json;

use crate::catalog::{collection, point, Status};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacilityKind {
    Manufacturing,
    Dc,
}

impl FacilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FacilityKind::Manufacturing => "Manufacturing",
            FacilityKind::Dc => "DC",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Facility {
    pub name: &'static str,
    pub kind: FacilityKind,
    pub status: Status,
    pub lat: f64,
    pub lon: f64,
    /// Plants only
    pub primary_function: Option<&'static str>,
    /// DCs only
    pub role: Option<&'static str>,
    pub districts: &'static [&'static str],
    pub fleet_count: u32,
}

const fn plant(name: &'static str, status: Status, lat: f64, lon: f64, function: &'static str) -> Facility {
    Facility {
        name,
        kind: FacilityKind::Manufacturing,
        status,
        lat,
        lon,
        primary_function: Some(function),
        role: None,
        districts: &[],
        fleet_count: 0,
    }
}

const fn dc(
    name: &'static str,
    status: Status,
    lat: f64,
    lon: f64,
    role: &'static str,
    districts: &'static [&'static str],
    fleet_count: u32,
) -> Facility {
    Facility {
        name,
        kind: FacilityKind::Dc,
        status,
        lat,
        lon,
        primary_function: None,
        role: Some(role),
        districts,
        fleet_count,
    }
}

pub static MANUFACTURING_PLANTS: [Facility; 7] = [
    plant("Sandakan Sibuga Plant 1", Status::Current, 5.8380, 118.1170, "Water_Carbonated_Fruit"),
    plant("KK IZ4 Plant", Status::Current, 5.9300, 116.0500, "Water"),
    plant("KK IZ8 Plant 1", Status::Current, 5.9350, 116.0600, "Water_Packaging"),
    plant("Keningau Plant", Status::Current, 5.3370, 116.1600, "Water"),
    plant("Twinine Facility", Status::Current, 5.9800, 116.1100, "Condiments"),
    plant("Sandakan Sibuga Plant 2", Status::Future, 5.8500, 118.1300, "Water"),
    plant("KK IZ8 Plant 2", Status::Future, 5.9400, 116.0700, "Water_Relocation"),
];

pub static DISTRIBUTION_CENTRES: [Facility; 6] = [
    dc(
        "Sandakan Sibuga DC 1",
        Status::Current,
        5.8462,
        118.0743,
        "Central_Hub_Fleet_Depot",
        &["Sandakan", "Telupid", "Beluran", "Kinabatangan", "Tongod"],
        30,
    ),
    dc(
        "Sandakan Sibuga DC 2",
        Status::Future,
        5.8474,
        118.0731,
        "Expansion_Fleet_Depot",
        &["Sandakan", "Telupid", "Beluran"],
        0,
    ),
    dc(
        "KK IZ2 DC",
        Status::Current,
        6.0719,
        116.1762,
        "West_Coast_Warehouse",
        &["Kota Kinabalu", "Penampang", "Papar", "Putatan", "Tuaran"],
        22,
    ),
    // Fleet shared with DC 2
    dc(
        "Lahad Datu DC 1",
        Status::Current,
        5.0269,
        118.3245,
        "Eastern_Sales_Warehouse",
        &["Lahad Datu", "Kunak"],
        0,
    ),
    dc(
        "Lahad Datu DC 2",
        Status::Current,
        5.0281,
        118.3229,
        "Carbonated_Drinks_Hub",
        &["Lahad Datu", "Kunak", "Semporna", "Tawau"],
        18,
    ),
    dc(
        "Tawau DC",
        Status::Future,
        4.3052,
        117.9056,
        "Tawau_Demand_Hub",
        &["Tawau", "Semporna"],
        0,
    ),
];

/// Plants first, then DCs
pub fn all_facilities() -> impl Iterator<Item = &'static Facility> {
    MANUFACTURING_PLANTS.iter().chain(DISTRIBUTION_CENTRES.iter())
}

pub fn facility_by_name(name: &str) -> Option<&'static Facility> {
    all_facilities().find(|f| f.name == name)
}

/// The only plant producing carbonated drinks
pub fn carbonated_source() -> Option<&'static Facility> {
    MANUFACTURING_PLANTS
        .iter()
        .find(|p| p.name == "Sandakan Sibuga Plant 1")
}

pub fn twinine_facility() -> Option<&'static Facility> {
    MANUFACTURING_PLANTS.iter().find(|p| p.name == "Twinine Facility")
}

/// Point features with `name`, `type`, `status`, `function`, `role` and
/// `fleet` properties
pub fn facility_features<'a>(facilities: impl IntoIterator<Item = &'a Facility>) -> FeatureCollection {
    collection(facilities.into_iter().map(|f| {
        point(
            f.lon,
            f.lat,
            json!({
                "name": f.name,
                "type": f.kind.as_str(),
                "status": f.status.as_str(),
                "function": f.primary_function,
                "role": f.role,
                "fleet": f.fleet_count,
                "districts": f.districts.join(", "),
            }),
        )
    }))
}
