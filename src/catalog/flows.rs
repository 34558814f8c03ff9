use geojson::{FeatureCollection, Value};
use serde_json::json;

use crate::catalog::{collection, feature};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProductType {
    Carbonated,
    Water,
    Condiments,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [
        ProductType::Carbonated,
        ProductType::Water,
        ProductType::Condiments,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Carbonated => "Carbonated",
            ProductType::Water => "Water",
            ProductType::Condiments => "Condiments",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowRoute {
    pub from: &'static str,
    pub to: &'static str,
    pub product: ProductType,
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,
}

const fn route(
    product: ProductType,
    from: &'static str,
    to: &'static str,
    (from_lat, from_lon): (f64, f64),
    (to_lat, to_lon): (f64, f64),
) -> FlowRoute {
    FlowRoute {
        from,
        to,
        product,
        from_lat,
        from_lon,
        to_lat,
        to_lon,
    }
}

const SANDAKAN_P1: (f64, f64) = (5.8450, 118.0755);
const TWININE: (f64, f64) = (5.9780, 116.0725);
const SANDAKAN_DC1: (f64, f64) = (5.8462, 118.0743);
const KK_IZ2_DC: (f64, f64) = (6.0719, 116.1762);

/// Carbonated drinks come from one plant; water runs short local routes;
/// condiments ride the existing DC network
pub static ALL_FLOWS: [FlowRoute; 10] = [
    route(ProductType::Carbonated, "Sandakan Sibuga Plant 1", "Sandakan Sibuga DC 1", SANDAKAN_P1, SANDAKAN_DC1),
    route(ProductType::Carbonated, "Sandakan Sibuga Plant 1", "KK IZ2 DC", SANDAKAN_P1, KK_IZ2_DC),
    route(ProductType::Carbonated, "Sandakan Sibuga Plant 1", "Lahad Datu DC 2", SANDAKAN_P1, (5.0281, 118.3229)),
    route(ProductType::Water, "KK IZ4 Plant", "KK IZ2 DC", (6.0756, 116.1873), KK_IZ2_DC),
    route(ProductType::Water, "KK IZ8 Plant 1", "KK IZ2 DC", (6.0701, 116.2046), KK_IZ2_DC),
    route(ProductType::Water, "Keningau Plant", "KK IZ2 DC", (5.3364, 116.1672), KK_IZ2_DC),
    route(ProductType::Water, "Sandakan Sibuga Plant 1", "Sandakan Sibuga DC 1", SANDAKAN_P1, SANDAKAN_DC1),
    route(ProductType::Condiments, "Twinine Facility", "KK IZ2 DC", TWININE, KK_IZ2_DC),
    route(ProductType::Condiments, "Twinine Facility", "Sandakan Sibuga DC 1", TWININE, SANDAKAN_DC1),
    route(ProductType::Condiments, "Twinine Facility", "Lahad Datu DC 1", TWININE, (5.0269, 118.3245)),
];

pub fn flows_by_type(product: ProductType) -> impl Iterator<Item = &'static FlowRoute> {
    ALL_FLOWS.iter().filter(move |f| f.product == product)
}

/// Straight line features with `from`, `to` and `productType` properties
pub fn flow_features<'a>(flows: impl IntoIterator<Item = &'a FlowRoute>) -> FeatureCollection {
    collection(flows.into_iter().map(|f| {
        feature(
            Value::LineString(vec![vec![f.from_lon, f.from_lat], vec![f.to_lon, f.to_lat]]),
            json!({
                "from": f.from,
                "to": f.to,
                "productType": f.product.as_str(),
            }),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_type() {
        assert_eq!(flows_by_type(ProductType::Carbonated).count(), 3);
        assert_eq!(flows_by_type(ProductType::Water).count(), 4);
        assert_eq!(flows_by_type(ProductType::Condiments).count(), 3);
    }

    #[test]
    fn test_carbonated_has_single_origin() {
        assert!(flows_by_type(ProductType::Carbonated).all(|f| f.from == "Sandakan Sibuga Plant 1"));
    }

    #[test]
    fn test_line_features() {
        let fc = flow_features(flows_by_type(ProductType::Condiments));
        assert_eq!(fc.features.len(), 3);
        let geometry = fc.features[2].geometry.as_ref().unwrap();
        assert_eq!(
            geometry.value,
            Value::LineString(vec![vec![116.0725, 5.9780], vec![118.3245, 5.0269]])
        );
    }
}
