use geojson::FeatureCollection;
use ratatui::style::Color;
use serde_json::json;

use crate::catalog::{collection, point};
use crate::map::rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaType {
    RemoteDistrict,
    ExternalMarket,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceModel {
    InteriorDirectLowDensity,
    ThirdPartyDomestic,
    ThirdPartySarawak,
    LowDensityEastern,
}

impl ServiceModel {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceModel::InteriorDirectLowDensity => "Interior_Direct_Low_Density",
            ServiceModel::ThirdPartyDomestic => "3PL_Domestic",
            ServiceModel::ThirdPartySarawak => "3PL_Sarawak",
            ServiceModel::LowDensityEastern => "Low_Density_Eastern",
        }
    }

    pub fn is_third_party(self) -> bool {
        self.as_str().contains("3PL")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RemoteArea {
    pub name: &'static str,
    pub area_type: AreaType,
    pub service_model: ServiceModel,
    pub lat: f64,
    pub lon: f64,
}

const fn area(name: &'static str, area_type: AreaType, service_model: ServiceModel, lat: f64, lon: f64) -> RemoteArea {
    RemoteArea {
        name,
        area_type,
        service_model,
        lat,
        lon,
    }
}

pub static REMOTE_AREAS: [RemoteArea; 7] = [
    area("Nabawan", AreaType::RemoteDistrict, ServiceModel::InteriorDirectLowDensity, 4.9376, 116.5121),
    area("Sook", AreaType::RemoteDistrict, ServiceModel::InteriorDirectLowDensity, 5.2866, 116.5460),
    area("Keningau Remote", AreaType::RemoteDistrict, ServiceModel::InteriorDirectLowDensity, 5.3302, 116.1656),
    area("Paitan", AreaType::RemoteDistrict, ServiceModel::LowDensityEastern, 6.4635, 117.2570),
    area("Labuan", AreaType::ExternalMarket, ServiceModel::ThirdPartyDomestic, 5.2767, 115.2410),
    area("Limbang", AreaType::ExternalMarket, ServiceModel::ThirdPartySarawak, 4.7500, 115.0005),
    area("Lawas", AreaType::ExternalMarket, ServiceModel::ThirdPartySarawak, 4.8614, 115.4090),
];

/// Fallback for service models outside the table
pub const UNKNOWN_MODEL_COLOR: Color = rgb(0xBDC3C7);

pub fn service_model_color(model: &str) -> Color {
    match model {
        "3PL_Domestic" => rgb(0xE67E22),
        "3PL_Sarawak" => rgb(0xD35400),
        "Interior_Direct_Low_Density" | "Low_Density_Eastern" => rgb(0xF39C12),
        _ => UNKNOWN_MODEL_COLOR,
    }
}

/// Two-line map label: name, then how the area is served
pub fn remote_area_label(area: &RemoteArea) -> String {
    if area.service_model.is_third_party() {
        format!("{}\n3PL", area.name)
    } else {
        format!("{}\nLow Density", area.name)
    }
}

/// Points with `name`, `serviceModel` and single-line `label` properties
pub fn remote_area_features() -> FeatureCollection {
    collection(REMOTE_AREAS.iter().map(|a| {
        point(
            a.lon,
            a.lat,
            json!({
                "name": a.name,
                "serviceModel": a.service_model.as_str(),
                "external": a.area_type == AreaType::ExternalMarket,
                "label": remote_area_label(a).replace('\n', " · "),
            }),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors() {
        assert_eq!(service_model_color("3PL_Sarawak"), rgb(0xD35400));
        assert_eq!(
            service_model_color("Low_Density_Eastern"),
            service_model_color("Interior_Direct_Low_Density")
        );
        assert_eq!(service_model_color("Air_Drop"), UNKNOWN_MODEL_COLOR);
    }

    #[test]
    fn test_labels() {
        assert_eq!(remote_area_label(&REMOTE_AREAS[4]), "Labuan\n3PL");
        assert_eq!(remote_area_label(&REMOTE_AREAS[0]), "Nabawan\nLow Density");
    }

    #[test]
    fn test_external_markets_are_third_party() {
        assert!(REMOTE_AREAS
            .iter()
            .filter(|a| a.area_type == AreaType::ExternalMarket)
            .all(|a| a.service_model.is_third_party()));
        assert_eq!(remote_area_features().features.len(), 7);
    }
}
