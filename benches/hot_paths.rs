use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use tui_slides::data::generate_simple_world;
use tui_slides::data::spreadsheet::{rows_from_grid, Cell};
use tui_slides::data::states::aggregate_population;
use tui_slides::map::{
    mount_group, zoom_factor, LayerGroup, LayerKind, MapRenderer, MapView, Paint, StyleLayer, Viewport,
};
use ratatui::style::Color;

fn stores(n: usize) -> FeatureCollection {
    let features = (0..n)
        .map(|i| {
            let lon = 115.5 + (i % 60) as f64 * 0.06;
            let lat = 4.3 + (i / 60) as f64 * 0.05;
            let properties: JsonObject = json!({ "name": format!("Store {}", i) })
                .as_object()
                .cloned()
                .unwrap_or_default();
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn sabah_view() -> MapView {
    let mut renderer = MapRenderer::new();
    generate_simple_world(&mut renderer);
    let viewport = Viewport::new(117.0, 5.4, zoom_factor(7.0), 320, 160);
    let mut view = MapView::new(renderer, viewport, "data");
    let group = LayerGroup::inline("stores", stores(3000))
        .with_layer(StyleLayer::new("stores-heat", LayerKind::Heatmap).paint(Paint::color(Color::Red)))
        .with_layer(StyleLayer::new("stores-points", LayerKind::Circle).paint(Paint::color(Color::Green)))
        .with_layer(StyleLayer::new("stores-labels", LayerKind::Symbol).text_field("name"));
    mount_group(&mut view, &group).expect("mount bench layers");
    view
}

fn bench_render(c: &mut Criterion) {
    let view = sabah_view();
    c.bench_function("render_sabah_3000_points", |b| {
        b.iter(|| view.render(black_box(160), black_box(40)))
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let states = ["Sabah", "Selangor", "W.P Kuala Lumpur", "Johor", "Sarawak", "Perak"];
    let mut grid = vec![vec![Cell::Text("State".into()), Cell::Text("District".into()), Cell::Text("Population".into())]];
    for i in 0..5000 {
        grid.push(vec![
            Cell::Text(states[i % states.len()].to_string()),
            Cell::Text(format!("District {}", i)),
            Cell::Number((1000 + i * 7) as f64),
        ]);
    }
    let rows = rows_from_grid(grid);
    c.bench_function("aggregate_population_5000_rows", |b| {
        b.iter(|| aggregate_population(black_box(&rows)))
    });
}

criterion_group!(benches, bench_render, bench_aggregate);
criterion_main!(benches);
