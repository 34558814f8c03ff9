use geojson::Feature;

/// `code_state` of Sabah in the district dataset
pub const SABAH_CODE: i64 = 12;

fn name_of(feature: &Feature) -> Option<&str> {
    feature.property("name").and_then(|v| v.as_str())
}

pub fn is_sabah_district(feature: &Feature) -> bool {
    feature.property("code_state").and_then(|v| v.as_i64()) == Some(SABAH_CODE)
        || feature.property("state").and_then(|v| v.as_str()) == Some("SBH")
}

pub fn sabah_districts(all: &[Feature]) -> Vec<Feature> {
    all.iter().filter(|f| is_sabah_district(f)).cloned().collect()
}

/// Case-insensitive, whitespace-trimmed name match
pub fn district_by_name<'a>(districts: &'a [Feature], name: &str) -> Option<&'a Feature> {
    let wanted = name.trim().to_lowercase();
    districts
        .iter()
        .find(|d| name_of(d).map_or(false, |n| n.trim().to_lowercase() == wanted))
}

/// Districts for each name that resolves, in the order given
pub fn districts_by_names<'a>(districts: &'a [Feature], names: &[&str]) -> Vec<&'a Feature> {
    names
        .iter()
        .filter_map(|name| district_by_name(districts, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn district(name: &str, code_state: i64, state: &str) -> Feature {
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: json!({ "name": name, "code_state": code_state, "state": state })
                .as_object()
                .cloned(),
            foreign_members: None,
        }
    }

    fn all() -> Vec<Feature> {
        vec![
            district("Kota Kinabalu", 12, "SBH"),
            district("Kuching", 13, "SWK"),
            district(" Sandakan ", 0, "SBH"),
            district("Tawau", 12, ""),
        ]
    }

    #[test]
    fn test_sabah_filter_accepts_either_marker() {
        let sabah = sabah_districts(&all());
        assert_eq!(sabah.len(), 3);
        assert!(sabah.iter().all(|d| name_of(d) != Some("Kuching")));
    }

    #[test]
    fn test_lookup_by_name() {
        let districts = all();
        assert!(district_by_name(&districts, "kota kinabalu ").is_some());
        assert!(district_by_name(&districts, "SANDAKAN").is_some());
        assert!(district_by_name(&districts, "Keningau").is_none());

        let found = districts_by_names(&districts, &["Tawau", "Nowhere", "Kuching"]);
        let names: Vec<_> = found.iter().filter_map(|d| name_of(d)).collect();
        assert_eq!(names, vec!["Tawau", "Kuching"]);
    }
}
