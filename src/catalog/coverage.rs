//! Districts served by each distribution centre, named as in the district
//! GeoJSON.

use crate::catalog::facilities::DISTRIBUTION_CENTRES;

#[derive(Clone, Debug, PartialEq)]
pub struct DistrictCoverage {
    pub dc_name: &'static str,
    pub districts: &'static [&'static str],
    pub center_lat: f64,
    pub center_lon: f64,
}

/// One entry per DC, centred on the DC itself
pub fn district_coverage() -> impl Iterator<Item = DistrictCoverage> {
    DISTRIBUTION_CENTRES.iter().map(|dc| DistrictCoverage {
        dc_name: dc.name,
        districts: dc.districts,
        center_lat: dc.lat,
        center_lon: dc.lon,
    })
}

/// Districts for a DC; empty when unknown
pub fn districts_for_dc(dc_name: &str) -> &'static [&'static str] {
    DISTRIBUTION_CENTRES
        .iter()
        .find(|dc| dc.name == dc_name)
        .map(|dc| dc.districts)
        .unwrap_or_default()
}

/// Every covered district once, first-seen order
pub fn covered_districts() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = Vec::new();
    for district in DISTRIBUTION_CENTRES.iter().flat_map(|dc| dc.districts.iter()) {
        if !all.contains(district) {
            all.push(*district);
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_lookup() {
        assert_eq!(districts_for_dc("Tawau DC"), &["Tawau", "Semporna"]);
        assert!(districts_for_dc("Nowhere").is_empty());
        let kk = district_coverage().find(|c| c.dc_name == "KK IZ2 DC").unwrap();
        assert_eq!((kk.center_lat, kk.center_lon), (6.0719, 116.1762));
    }

    #[test]
    fn test_covered_districts_are_unique() {
        let all = covered_districts();
        assert_eq!(all.len(), 14);
        assert_eq!(all[0], "Sandakan");
    }
}
