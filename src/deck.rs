//! The presentation itself: every slide, built once from the loaded datasets
//! and the static catalog.

use std::collections::BTreeMap;

use geojson::FeatureCollection;
use ratatui::style::Color;

use crate::catalog::capacity::{self, PLANT_CAPACITIES};
use crate::catalog::coverage::{covered_districts, district_coverage};
use crate::catalog::facilities::{facility_features, DISTRIBUTION_CENTRES, MANUFACTURING_PLANTS};
use crate::catalog::fleet::{total_allocated_trucks, FLEET_ALLOCATION, TOTAL_FLEET_SIZE};
use crate::catalog::flows::{flow_features, flows_by_type, ProductType, ALL_FLOWS};
use crate::catalog::remote::{remote_area_features, service_model_color, ServiceModel, REMOTE_AREAS};
use crate::catalog::replacement::{categories, EXCLUDES, FRAMING, TOTAL};
use crate::catalog::script::{FINAL_LINE, ONE_LINE_TAKEAWAY, SEGMENTS};
use crate::catalog::{collection, Status};
use crate::data::districts::sabah_districts;
use crate::data::states::StatePopulation;
use crate::data::statistics::{tourism_by_hotels, water_by_scarcity, ScarcityBand, TourismRow, WaterRow};
use crate::data::{Datasets, STATES_GEOJSON};
use crate::hooks::InteractionHandlers;
use crate::map::{
    rgb, CameraTarget, ColorRule, Filter, LayerGroup, LayerKind, LinePattern, MapHandle, Paint, Popup, StyleLayer,
};
use crate::overlay::{ContentBlock, Legend, LegendEntry, SidePanel, StatCard};
use crate::slideshow::{hook, Slide};

pub const TITLE: &str = "Malaysia Geographic Insights";
pub const SUBTITLE: &str = "Interactive visualization of tourism, infrastructure, and resource distribution";

const OCEAN_BLUE: Color = rgb(0x0077BE);
const STATE_FILL: Color = rgb(0xE8F4F8);
const HOTEL_RED: Color = rgb(0xFF6B6B);
const STORE_GREEN: Color = rgb(0x00C851);
const SCARCITY_HIGH: Color = rgb(0xEF4444);
const SCARCITY_MEDIUM: Color = rgb(0xF59E0B);
const SCARCITY_LOW: Color = rgb(0x10B981);
const NO_DATA: Color = rgb(0xE5E7EB);
const OUTLINE_DARK: Color = rgb(0x1F2937);

const PLANT_CURRENT: Color = rgb(0x3498DB);
const PLANT_FUTURE: Color = rgb(0x85C1E9);
const DC_CURRENT: Color = rgb(0x9B59B6);
const DC_FUTURE: Color = rgb(0xD2B4DE);

/// One color per distribution centre, in catalog order
const DC_PALETTE: [Color; 6] = [
    rgb(0x1ABC9C),
    rgb(0x3498DB),
    rgb(0xE67E22),
    rgb(0x9B59B6),
    rgb(0xF1C40F),
    rgb(0xE74C3C),
];

fn malaysia() -> CameraTarget {
    CameraTarget::at(109.6976, 3.1390, 5.5)
}

fn sabah() -> CameraTarget {
    CameraTarget::at(117.0, 5.4, 7.0)
}

fn product_color(product: ProductType) -> Color {
    match product {
        ProductType::Carbonated => rgb(0xE74C3C),
        ProductType::Water => rgb(0x3498DB),
        ProductType::Condiments => rgb(0x9B59B6),
    }
}

/// Every slide in presentation order. Data-driven slides are left out when
/// their dataset is missing.
pub fn build_deck(data: &Datasets) -> Vec<Slide> {
    let mut slides = vec![overview()];
    if let Some(hotels) = &data.hotels {
        slides.push(tourism(hotels, &data.tourism));
    }
    slides.push(water(&data.water));
    if let Some(stores) = &data.stores {
        slides.push(retail(stores));
    }
    if !data.population.is_empty() {
        slides.push(population(&data.population));
    }
    slides.push(manufacturing());
    slides.push(distribution(data.districts.as_ref()));
    slides.push(product_flows());
    slides.push(remote_markets());
    slides.push(replacement_cost());
    slides
}

/// Click handler that opens a popup with the first hit's `name`
fn popup_on_click(detail: &'static [&'static str]) -> InteractionHandlers {
    InteractionHandlers::default().on_click(move |_, features, map| {
        let Some(hit) = features.first() else {
            map.close_popup();
            return;
        };
        let mut text = hit.property_str("name").unwrap_or("Unnamed").to_string();
        for key in detail {
            if let Some(value) = hit.property_str(key) {
                text.push('\n');
                text.push_str(value);
            }
        }
        map.show_popup(Popup {
            lon: hit.anchor.0,
            lat: hit.anchor.1,
            text,
        });
    })
}

fn clickable(slide: Slide, layers: &[&str], detail: &'static [&'static str]) -> Slide {
    slide
        .interactions(popup_on_click(detail).layers(layers.iter().copied()))
        .on_exit(hook(|map: &mut dyn MapHandle| {
            map.close_popup();
            Ok(())
        }))
}

fn narrative(index: usize) -> Vec<ContentBlock> {
    SEGMENTS
        .get(index)
        .map(|s| {
            vec![
                ContentBlock::heading(&format!("{} ({})", s.title, s.time)),
                ContentBlock::paragraph(s.full_text),
            ]
        })
        .unwrap_or_default()
}

fn overview() -> Slide {
    Slide::new("overview", "Malaysia Overview")
        .description("Exploring Malaysia's geographic and economic landscape")
        .camera(malaysia())
        .duration_ms(6000)
        .layer(
            LayerGroup::url("malaysia-states", STATES_GEOJSON)
                .with_layer(StyleLayer::new("states-fill", LayerKind::Fill).paint(Paint::color(STATE_FILL).with_opacity(0.4)))
                .with_layer(
                    StyleLayer::new("states-outline", LayerKind::Line).paint(Paint::color(OCEAN_BLUE).with_width(2.0)),
                ),
        )
        .legend(
            Legend::new("Map Legend")
                .collapsible()
                .entry(LegendEntry::new("State Boundaries", OCEAN_BLUE))
                .entry(LegendEntry::new("State Areas", STATE_FILL)),
        )
        .side_panel(
            SidePanel::new("Malaysia Overview")
                .collapsible()
                .block(ContentBlock::heading("Country Statistics"))
                .block(ContentBlock::Stats(vec![
                    StatCard::new("Total States", 13, OCEAN_BLUE),
                    StatCard::new("Population", "32.7M", OCEAN_BLUE),
                    StatCard::new("Area", "330,803 km²", OCEAN_BLUE),
                ]))
                .block(ContentBlock::paragraph(
                    "Malaysia is a Southeast Asian country located partly on a peninsula of the Asian \
                     mainland and partly on the northern third of the island of Borneo.",
                )),
        )
}

fn tourism(hotels: &FeatureCollection, rows: &[TourismRow]) -> Slide {
    let ranked = tourism_by_hotels(rows)
        .into_iter()
        .map(|r| {
            (
                format!("{}: {} hotels", r.state, r.hotels),
                format!("{} rooms • {} visitors", r.rooms, r.tourist_arrivals),
                HOTEL_RED,
            )
        })
        .collect();

    let slide = Slide::new("tourism-hotels", "Tourism Infrastructure")
        .description("Hotel distribution across Sabah")
        .camera(CameraTarget::at(116.0735, 5.9804, 8.0).pitch(45.0).bearing(-20.0))
        .duration_ms(8000)
        .layer(
            LayerGroup::inline("hotels-source", hotels.clone())
                .with_layer(
                    StyleLayer::new("hotels-heatmap", LayerKind::Heatmap).maxzoom(12.0).paint(
                        Paint::color(rgb(0x67A9CF)).with_ramp(vec![
                            (0.2, rgb(0x67A9CF)),
                            (0.4, rgb(0xD1E5F0)),
                            (0.6, rgb(0xFDDBC7)),
                            (0.8, rgb(0xEF8A62)),
                            (1.0, rgb(0xB2182B)),
                        ]),
                    ),
                )
                .with_layer(
                    StyleLayer::new("hotels-points", LayerKind::Circle)
                        .minzoom(10.0)
                        .paint(Paint::color(HOTEL_RED).with_radius(8.0).with_opacity(0.8)),
                ),
        )
        .legend(
            Legend::new("Hotels")
                .entry(LegendEntry::new("Hotel Locations", HOTEL_RED))
                .entry(LegendEntry::new("High Density", Color::Rgb(178, 24, 43)))
                .entry(LegendEntry::new("Low Density", Color::Rgb(103, 169, 207))),
        )
        .side_panel(
            SidePanel::new("Tourism Statistics")
                .block(ContentBlock::heading("Hotel Distribution"))
                .block(ContentBlock::Stats(vec![StatCard::new(
                    "Total Hotels in Sabah",
                    hotels.features.len(),
                    HOTEL_RED,
                )]))
                .block(ContentBlock::heading("By State"))
                .block(ContentBlock::Ranked(ranked)),
        );
    clickable(slide, &["hotels-points"], &["address"])
}

fn band_color(band: ScarcityBand) -> Color {
    match band {
        ScarcityBand::High => SCARCITY_HIGH,
        ScarcityBand::Medium => SCARCITY_MEDIUM,
        ScarcityBand::Low => SCARCITY_LOW,
    }
}

/// State fill keyed on the state `name` property
pub fn scarcity_rule(rows: &[WaterRow]) -> ColorRule {
    ColorRule::Match {
        property: "name".to_string(),
        cases: rows
            .iter()
            .map(|r| (r.state.clone(), band_color(ScarcityBand::of(r.water_scarcity_percent))))
            .collect(),
        fallback: NO_DATA,
    }
}

fn water(rows: &[WaterRow]) -> Slide {
    let ranked = water_by_scarcity(rows)
        .into_iter()
        .map(|r| {
            (
                r.state.clone(),
                format!(
                    "Water Access: {}% • Scarcity Level: {:.1}%",
                    r.water_access_percent, r.water_scarcity_percent
                ),
                band_color(ScarcityBand::of(r.water_scarcity_percent)),
            )
        })
        .collect();

    Slide::new("water-scarcity", "Water Access & Scarcity")
        .description("Understanding water distribution challenges")
        .camera(malaysia())
        .duration_ms(8000)
        .layer(
            LayerGroup::url("water-data", STATES_GEOJSON)
                .with_layer(
                    StyleLayer::new("water-fill", LayerKind::Fill)
                        .paint(Paint::default().with_rule(scarcity_rule(rows)).with_opacity(0.7)),
                )
                .with_layer(
                    StyleLayer::new("water-outline", LayerKind::Line).paint(Paint::color(OUTLINE_DARK).with_width(1.5)),
                ),
        )
        .legend(
            Legend::new("Water Scarcity Level")
                .entry(LegendEntry::new("Low (<10%)", SCARCITY_LOW))
                .entry(LegendEntry::new("Medium (10-20%)", SCARCITY_MEDIUM))
                .entry(LegendEntry::new("High (>20%)", SCARCITY_HIGH)),
        )
        .side_panel(
            SidePanel::new("Water Access Statistics")
                .block(ContentBlock::heading("Water Scarcity Analysis"))
                .block(ContentBlock::Ranked(ranked)),
        )
}

/// Feature counts per string property value; missing values count as "Unknown"
fn count_by(fc: &FeatureCollection, property: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for feature in &fc.features {
        let key = feature
            .property(property)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown");
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

fn retail(stores: &FeatureCollection) -> Slide {
    let mut by_district: Vec<(String, usize)> = count_by(stores, "district").into_iter().collect();
    by_district.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let slide = Slide::new("speedmart-network", "Retail Distribution Network")
        .description("99 SpeedMart store locations across Sabah")
        .camera(CameraTarget::at(116.0735, 5.9804, 8.5).pitch(35.0))
        .duration_ms(8000)
        .layer(
            LayerGroup::inline("speedmart-source", stores.clone())
                .with_layer(
                    StyleLayer::new("speedmart-points", LayerKind::Circle)
                        .paint(Paint::color(STORE_GREEN).with_radius(6.0).with_opacity(0.9)),
                )
                .with_layer(
                    StyleLayer::new("speedmart-labels", LayerKind::Symbol)
                        .minzoom(11.0)
                        .text_field("name")
                        .paint(Paint::color(Color::White)),
                ),
        )
        .legend(Legend::new("Retail Network").entry(LegendEntry::new("99 SpeedMart Stores", STORE_GREEN)))
        .side_panel(
            SidePanel::new("Retail Network")
                .block(ContentBlock::heading("99 SpeedMart Network"))
                .block(ContentBlock::Stats(vec![
                    StatCard::new("Total Stores in Sabah", stores.features.len(), STORE_GREEN),
                    StatCard::new("Coverage Area", "Sabah State", STORE_GREEN),
                ]))
                .block(ContentBlock::heading("Store Distribution"))
                .block(ContentBlock::key_values(
                    by_district.into_iter().map(|(district, n)| (district, n.to_string())),
                ))
                .block(ContentBlock::paragraph(
                    "99 SpeedMart stores are strategically located across Sabah to provide convenient \
                     access to daily necessities for local communities.",
                )),
        );
    clickable(slide, &["speedmart-points"], &["address", "district"])
}

fn density_color(density: f64) -> Color {
    if density > 1000.0 {
        rgb(0xB2182B)
    } else if density > 100.0 {
        rgb(0xEF8A62)
    } else {
        rgb(0x67A9CF)
    }
}

fn population(states: &[StatePopulation]) -> Slide {
    let rule = ColorRule::Match {
        property: "name".to_string(),
        cases: states
            .iter()
            .map(|s| (s.state_name.clone(), density_color(s.density)))
            .collect(),
        fallback: NO_DATA,
    };
    let total: u64 = states.iter().map(|s| s.population).sum();
    let ranked = states
        .iter()
        .map(|s| {
            (
                format!("{} ({})", s.state_name, s.state_code),
                format!("{} people • {:.2}/km²", s.population, s.density),
                density_color(s.density),
            )
        })
        .collect();

    Slide::new("state-population", "Population by State")
        .description("Residents and density per state")
        .camera(malaysia())
        .duration_ms(8000)
        .layer(
            LayerGroup::url("population-states", STATES_GEOJSON)
                .with_layer(
                    StyleLayer::new("population-fill", LayerKind::Fill)
                        .paint(Paint::default().with_rule(rule).with_opacity(0.6)),
                )
                .with_layer(
                    StyleLayer::new("population-outline", LayerKind::Line).paint(Paint::color(OUTLINE_DARK)),
                ),
        )
        .legend(
            Legend::new("People per km²")
                .entry(LegendEntry::new("> 1000", rgb(0xB2182B)))
                .entry(LegendEntry::new("100 - 1000", rgb(0xEF8A62)))
                .entry(LegendEntry::new("< 100", rgb(0x67A9CF))),
        )
        .side_panel(
            SidePanel::new("State Population")
                .collapsible()
                .block(ContentBlock::Stats(vec![StatCard::new("Total Population", total, OCEAN_BLUE)]))
                .block(ContentBlock::Ranked(ranked)),
        )
}

fn status_rule(current: Color, future: Color) -> ColorRule {
    ColorRule::Match {
        property: "status".to_string(),
        cases: vec![
            (Status::Current.as_str().to_string(), current),
            (Status::Future.as_str().to_string(), future),
        ],
        fallback: current,
    }
}

fn manufacturing() -> Slide {
    let water = capacity::drinking_water_totals();
    let carbonated = capacity::carbonated_totals();
    let plants = PLANT_CAPACITIES.iter().map(|p| {
        let figure = match &p.drinking_water {
            Some(w) => format!("{:.0} ML/yr, {:.0}% used", w.current_capacity, w.utilization),
            None => p.packaging.as_ref().map_or("-".to_string(), |pk| pk.function.to_string()),
        };
        (format!("{} ({})", p.name, p.status), figure)
    });

    let mut panel = SidePanel::new("Manufacturing Capacity")
        .collapsible()
        .block(ContentBlock::Stats(vec![
            StatCard::new("Water capacity (ML/yr)", format!("{:.0}", water.current_capacity), PLANT_CURRENT),
            StatCard::new("Future capacity (ML/yr)", format!("{:.0}", water.future_capacity), PLANT_FUTURE),
            StatCard::new("Capacity growth", format!("{:.1}%", water.growth), PLANT_CURRENT),
            StatCard::new(
                "Carbonated utilisation",
                format!("{:.0}%", carbonated.utilization),
                product_color(ProductType::Carbonated),
            ),
        ]))
        .block(ContentBlock::heading("Plants"))
        .block(ContentBlock::key_values(plants))
        .block(ContentBlock::paragraph(capacity::INSIGHTS.key_takeaway));
    for block in narrative(0) {
        panel = panel.block(block);
    }

    let slide = Slide::new("manufacturing", "Manufacturing Footprint")
        .description("Plants and packaging hubs feeding the Sabah network")
        .camera(sabah())
        .duration_ms(10000)
        .layer(
            LayerGroup::inline("plants-source", facility_features(MANUFACTURING_PLANTS.iter())).with_layer(
                StyleLayer::new("plants-points", LayerKind::Circle)
                    .paint(Paint::default().with_rule(status_rule(PLANT_CURRENT, PLANT_FUTURE)).with_radius(7.0)),
            ),
        )
        .legend(
            Legend::new("Manufacturing")
                .entry(LegendEntry::new("Operating plant", PLANT_CURRENT))
                .entry(LegendEntry::new("Planned plant", PLANT_FUTURE)),
        )
        .side_panel(panel);
    clickable(slide, &["plants-points"], &["status", "function"])
}

fn distribution(districts: Option<&FeatureCollection>) -> Slide {
    let coverage: Vec<_> = district_coverage().collect();
    let mut slide = Slide::new("distribution-coverage", "Distribution Coverage")
        .description("Distribution centres and the districts they serve")
        .camera(sabah())
        .duration_ms(10000);

    if let Some(districts) = districts {
        let cases = coverage
            .iter()
            .zip(DC_PALETTE.iter().cycle())
            .flat_map(|(dc, color)| dc.districts.iter().map(move |d| (d.to_string(), *color)))
            .collect();
        let covered = covered_districts().into_iter().map(serde_json::Value::from).collect();
        slide = slide.layer(
            LayerGroup::inline("coverage-districts", collection(sabah_districts(&districts.features)))
                .with_layer(
                    StyleLayer::new("coverage-fill", LayerKind::Fill)
                        .filter(Filter::In("name".to_string(), covered))
                        .paint(
                            Paint::default()
                                .with_rule(ColorRule::Match {
                                    property: "name".to_string(),
                                    cases,
                                    fallback: NO_DATA,
                                })
                                .with_opacity(0.35),
                        ),
                )
                .with_layer(
                    StyleLayer::new("coverage-outline", LayerKind::Line)
                        .paint(Paint::color(Color::DarkGray).with_pattern(LinePattern::Dotted)),
                ),
        );
    }

    let mut legend = Legend::new("Distribution Centres").collapsible();
    for (dc, color) in coverage.iter().zip(DC_PALETTE.iter().cycle()) {
        legend = legend.entry(LegendEntry::new(dc.dc_name, *color).description(&dc.districts.join(", ")));
    }

    let fleet = FLEET_ALLOCATION
        .iter()
        .map(|f| (f.dc_name.to_string(), format!("{} trucks", f.trucks)));

    let slide = slide
        .layer(
            LayerGroup::inline("dc-source", facility_features(DISTRIBUTION_CENTRES.iter()))
                .with_layer(
                    StyleLayer::new("dc-points", LayerKind::Circle)
                        .paint(Paint::default().with_rule(status_rule(DC_CURRENT, DC_FUTURE)).with_radius(6.0)),
                )
                .with_layer(StyleLayer::new("dc-labels", LayerKind::Symbol).minzoom(8.0).text_field("name")),
        )
        .legend(legend)
        .side_panel(
            SidePanel::new("Fleet Allocation")
                .collapsible()
                .block(ContentBlock::Stats(vec![
                    StatCard::new("Fleet size", TOTAL_FLEET_SIZE, DC_CURRENT),
                    StatCard::new("Assigned to DCs", total_allocated_trucks(), DC_CURRENT),
                ]))
                .block(ContentBlock::key_values(fleet)),
        );
    clickable(slide, &["dc-points"], &["role", "districts"])
}

fn product_flows() -> Slide {
    let rule = ColorRule::Match {
        property: "productType".to_string(),
        cases: ProductType::ALL
            .iter()
            .map(|p| (p.as_str().to_string(), product_color(*p)))
            .collect(),
        fallback: Color::Gray,
    };

    let mut legend = Legend::new("Product Flows");
    for product in ProductType::ALL {
        let routes = flows_by_type(product).count();
        legend = legend.entry(
            LegendEntry::new(product.as_str(), product_color(product))
                .pattern(if product == ProductType::Condiments {
                    LinePattern::Dashed
                } else {
                    LinePattern::Solid
                })
                .description(&format!("{} routes", routes)),
        );
    }

    let mut panel = SidePanel::new("Hub and Spoke").collapsible();
    for block in narrative(1) {
        panel = panel.block(block);
    }

    Slide::new("product-flows", "Product Flows")
        .description("How each product moves from plant to distribution centre")
        .camera(sabah())
        .duration_ms(10000)
        .layer(
            LayerGroup::inline("flows-source", flow_features(ALL_FLOWS.iter()))
                .with_layer(
                    StyleLayer::new("flows-lines", LayerKind::Line)
                        .filter(Filter::Not(Box::new(Filter::eq("productType", "Condiments"))))
                        .paint(Paint::default().with_rule(rule.clone()).with_width(2.0)),
                )
                .with_layer(
                    StyleLayer::new("flows-condiments", LayerKind::Line)
                        .filter(Filter::eq("productType", "Condiments"))
                        .paint(Paint::default().with_rule(rule).with_pattern(LinePattern::Dashed)),
                ),
        )
        .layer(
            LayerGroup::inline(
                "flow-facilities",
                facility_features(MANUFACTURING_PLANTS.iter().chain(DISTRIBUTION_CENTRES.iter())),
            )
            .with_layer(
                StyleLayer::new("flow-facility-points", LayerKind::Circle)
                    .filter(Filter::eq("status", Status::Current.as_str()))
                    .paint(Paint::color(Color::White).with_radius(3.0)),
            ),
        )
        .legend(legend)
        .side_panel(panel)
}

fn remote_markets() -> Slide {
    let models = [
        ServiceModel::InteriorDirectLowDensity,
        ServiceModel::LowDensityEastern,
        ServiceModel::ThirdPartyDomestic,
        ServiceModel::ThirdPartySarawak,
    ];
    let rule = ColorRule::Match {
        property: "serviceModel".to_string(),
        cases: models
            .iter()
            .map(|m| (m.as_str().to_string(), service_model_color(m.as_str())))
            .collect(),
        fallback: service_model_color(""),
    };
    let areas = REMOTE_AREAS
        .iter()
        .map(|a| (a.name.to_string(), a.service_model.as_str().replace('_', " ")));

    let slide = Slide::new("remote-markets", "Remote & External Markets")
        .description("Low-density districts and third-party served markets")
        .camera(CameraTarget::at(116.4, 5.0, 6.5))
        .duration_ms(10000)
        .layer(
            LayerGroup::inline("remote-source", remote_area_features())
                .with_layer(
                    StyleLayer::new("remote-points", LayerKind::Circle).paint(Paint::default().with_rule(rule).with_radius(6.0)),
                )
                .with_layer(StyleLayer::new("remote-labels", LayerKind::Symbol).text_field("label")),
        )
        .legend(
            Legend::new("Service Model")
                .entry(LegendEntry::new("Direct, low density", service_model_color("Interior_Direct_Low_Density")))
                .entry(LegendEntry::new("3PL domestic", service_model_color("3PL_Domestic")))
                .entry(LegendEntry::new("3PL Sarawak", service_model_color("3PL_Sarawak"))),
        )
        .side_panel(SidePanel::new("Remote Areas").collapsible().block(ContentBlock::key_values(areas)));
    clickable(slide, &["remote-points"], &["serviceModel"])
}

fn replacement_cost() -> Slide {
    let mut panel = SidePanel::new("Replacement Cost").width(48);
    for category in categories() {
        panel = panel
            .block(ContentBlock::heading(&format!("{} ({})", category.category, category.subtotal)))
            .block(ContentBlock::key_values(
                category
                    .items
                    .iter()
                    .map(|i| (format!("{} × {}", i.asset, i.units), format!("RM{}", i.total_cost))),
            ));
    }
    panel = panel
        .block(ContentBlock::Stats(vec![StatCard::new("Total", TOTAL, rgb(0xF1C40F))]))
        .block(ContentBlock::heading("Excludes"))
        .block(ContentBlock::bullets(EXCLUDES))
        .block(ContentBlock::paragraph(FRAMING));
    for block in narrative(2).into_iter().chain(narrative(3)) {
        panel = panel.block(block);
    }
    panel = panel
        .block(ContentBlock::heading("Takeaway"))
        .block(ContentBlock::paragraph(ONE_LINE_TAKEAWAY))
        .block(ContentBlock::paragraph(FINAL_LINE));

    Slide::new("replacement-cost", "The Cost Moat")
        .description("What a new entrant would spend to rebuild the network")
        .camera(sabah())
        .duration_ms(12000)
        .layer(
            LayerGroup::inline(
                "moat-facilities",
                facility_features(MANUFACTURING_PLANTS.iter().chain(DISTRIBUTION_CENTRES.iter())),
            )
            .with_layer(
                StyleLayer::new("moat-points", LayerKind::Circle)
                    .paint(Paint::default().with_rule(status_rule(PLANT_CURRENT, PLANT_FUTURE)).with_radius(5.0)),
            ),
        )
        .side_panel(panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::point;
    use serde_json::json;
    use std::collections::HashSet;

    fn ids(slides: &[Slide]) -> Vec<&str> {
        slides.iter().map(|s| s.id.as_str()).collect()
    }

    fn water_rows() -> Vec<WaterRow> {
        vec![
            WaterRow {
                state: "Sabah".to_string(),
                water_access_percent: 78.0,
                water_scarcity_percent: 22.0,
            },
            WaterRow {
                state: "Selangor".to_string(),
                water_access_percent: 99.0,
                water_scarcity_percent: 4.5,
            },
        ]
    }

    #[test]
    fn test_optional_slides_need_data() {
        let slides = build_deck(&Datasets::default());
        assert_eq!(
            ids(&slides),
            vec![
                "overview",
                "water-scarcity",
                "manufacturing",
                "distribution-coverage",
                "product-flows",
                "remote-markets",
                "replacement-cost",
            ]
        );
    }

    #[test]
    fn test_data_slides_in_order() {
        let data = Datasets {
            hotels: Some(collection([point(116.07, 5.98, json!({"name": "Hotel A"}))])),
            stores: Some(collection([
                point(116.1, 5.9, json!({"name": "Store 1", "district": "Kota Kinabalu"})),
                point(116.2, 5.8, json!({"name": "Store 2"})),
            ])),
            ..Datasets::default()
        };
        let slides = build_deck(&data);
        assert_eq!(&ids(&slides)[..4], &["overview", "tourism-hotels", "water-scarcity", "speedmart-network"]);

        let retail = &slides[3];
        let panel = retail.side_panel.as_ref().unwrap();
        assert!(panel.content.contains(&ContentBlock::Stats(vec![
            StatCard::new("Total Stores in Sabah", 2, STORE_GREEN),
            StatCard::new("Coverage Area", "Sabah State", STORE_GREEN),
        ])));
        assert!(retail.interactions.is_some() && retail.on_exit.is_some());
    }

    #[test]
    fn test_slide_and_layer_ids_unique() {
        let data = Datasets {
            districts: Some(collection([point(116.0, 5.9, json!({"name": "Ranau", "code_state": 12}))])),
            ..Datasets::default()
        };
        let slides = build_deck(&data);
        let slide_ids: HashSet<&str> = ids(&slides).into_iter().collect();
        assert_eq!(slide_ids.len(), slides.len());

        let mut seen = HashSet::new();
        for id in slides.iter().flat_map(|s| s.attached_ids()) {
            assert!(seen.insert(id), "duplicate id {}", id);
        }
        assert!(seen.contains("coverage-fill"));
    }

    #[test]
    fn test_scarcity_rule_bands_states() {
        let rule = scarcity_rule(&water_rows());
        let props = |name: &str| json!({ "name": name }).as_object().cloned();
        assert_eq!(rule.resolve(props("Sabah").as_ref()), SCARCITY_HIGH);
        assert_eq!(rule.resolve(props("Selangor").as_ref()), SCARCITY_LOW);
        assert_eq!(rule.resolve(props("Perlis").as_ref()), NO_DATA);
    }

    #[test]
    fn test_water_panel_worst_first() {
        let slide = water(&water_rows());
        let panel = slide.side_panel.unwrap();
        let Some(ContentBlock::Ranked(rows)) = panel.content.last() else {
            panic!("expected ranked rows");
        };
        assert_eq!(rows[0].0, "Sabah");
        assert_eq!(rows[0].1, "Water Access: 78% • Scarcity Level: 22.0%");
        assert_eq!(rows[0].2, SCARCITY_HIGH);
    }

    #[test]
    fn test_count_by_property() {
        let fc = collection([
            point(0.0, 0.0, json!({"district": "Tawau"})),
            point(0.0, 0.0, json!({"district": "Tawau"})),
            point(0.0, 0.0, json!({"district": ""})),
        ]);
        let counts = count_by(&fc, "district");
        assert_eq!(counts.get("Tawau"), Some(&2));
        assert_eq!(counts.get("Unknown"), Some(&1));
    }
}
