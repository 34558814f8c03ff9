//! Plant capacities, in million litres per year.

use crate::catalog::Status;

#[derive(Clone, Debug, PartialEq)]
pub struct DrinkingWater {
    pub lines: u32,
    pub current_capacity: f64,
    /// Percent
    pub utilization: f64,
    pub current_output: f64,
    pub future_capacity: f64,
    pub future_additions: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Carbonated {
    pub lines: u32,
    pub capacity: f64,
    pub utilization: f64,
    pub current_output: f64,
    pub expansion: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Packaging {
    pub function: &'static str,
    pub current_state: &'static str,
    pub future_role: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlantCapacity {
    pub name: &'static str,
    pub status: Status,
    pub drinking_water: Option<DrinkingWater>,
    pub carbonated: Option<Carbonated>,
    pub packaging: Option<Packaging>,
}

const fn water(
    lines: u32,
    current_capacity: f64,
    utilization: f64,
    current_output: f64,
    future_capacity: f64,
    future_additions: Option<&'static str>,
) -> Option<DrinkingWater> {
    Some(DrinkingWater {
        lines,
        current_capacity,
        utilization,
        current_output,
        future_capacity,
        future_additions,
    })
}

pub static PLANT_CAPACITIES: [PlantCapacity; 7] = [
    PlantCapacity {
        name: "Sandakan Sibuga Plant 1",
        status: Status::Current,
        drinking_water: water(3, 294.0, 51.0, 150.0, 294.0, None),
        carbonated: Some(Carbonated {
            lines: 1,
            capacity: 37.0,
            utilization: 45.0,
            current_output: 17.0,
            expansion: Some("None announced"),
        }),
        packaging: None,
    },
    PlantCapacity {
        name: "KK IZ4 Plant",
        status: Status::Current,
        drinking_water: water(2, 95.0, 64.0, 61.0, 95.0, None),
        carbonated: None,
        packaging: None,
    },
    PlantCapacity {
        name: "KK IZ8 Plant 1",
        status: Status::Current,
        // Line relocates to IZ8 Plant 2
        drinking_water: water(1, 178.0, 76.0, 135.0, 0.0, Some("DW line to be relocated")),
        carbonated: None,
        packaging: Some(Packaging {
            function: "PET preforms & caps",
            current_state: "4 preform machines, 1 cap machine",
            future_role: Some("Becomes dedicated packaging hub"),
        }),
    },
    PlantCapacity {
        name: "Keningau Plant",
        status: Status::Current,
        drinking_water: water(1, 59.0, 68.0, 40.0, 59.0, None),
        carbonated: None,
        packaging: None,
    },
    PlantCapacity {
        name: "Sandakan Sibuga Plant 2",
        status: Status::Future,
        drinking_water: water(1, 0.0, 0.0, 0.0, 178.0, Some("New DW line (2H 2027)")),
        carbonated: None,
        packaging: None,
    },
    PlantCapacity {
        name: "KK IZ8 Plant 2",
        status: Status::Future,
        drinking_water: water(1, 0.0, 0.0, 0.0, 178.0, Some("Relocation from IZ8 P1")),
        carbonated: None,
        packaging: None,
    },
    PlantCapacity {
        name: "Twinine Facility",
        status: Status::Current,
        drinking_water: None,
        carbonated: None,
        packaging: Some(Packaging {
            function: "Sauces & condiments",
            current_state: "Single shift",
            future_role: Some("Scale to 1.5 shifts (+70%) by 1H 2026"),
        }),
    },
];

pub fn capacity_by_name(name: &str) -> Option<&'static PlantCapacity> {
    PLANT_CAPACITIES.iter().find(|p| p.name == name)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterTotals {
    pub current_capacity: f64,
    pub future_capacity: f64,
    pub current_output: f64,
    /// Percent growth from current to future capacity
    pub growth: f64,
}

/// Current figures count operating plants only; future capacity counts every
/// plant with a drinking water line
pub fn drinking_water_totals() -> WaterTotals {
    let current = || {
        PLANT_CAPACITIES
            .iter()
            .filter(|p| p.status == Status::Current)
            .filter_map(|p| p.drinking_water.as_ref())
    };
    let current_capacity: f64 = current().map(|w| w.current_capacity).sum();
    let current_output: f64 = current().map(|w| w.current_output).sum();
    let future_capacity: f64 = PLANT_CAPACITIES
        .iter()
        .filter_map(|p| p.drinking_water.as_ref())
        .map(|w| w.future_capacity)
        .sum();
    let growth = if current_capacity > 0.0 {
        (future_capacity - current_capacity) / current_capacity * 100.0
    } else {
        0.0
    };
    WaterTotals {
        current_capacity,
        future_capacity,
        current_output,
        growth,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarbonatedTotals {
    pub capacity: f64,
    pub current_output: f64,
    pub utilization: f64,
}

pub fn carbonated_totals() -> CarbonatedTotals {
    let lines = PLANT_CAPACITIES.iter().filter_map(|p| p.carbonated.as_ref());
    let (capacity, current_output) = lines.fold((0.0, 0.0), |(c, o), l| (c + l.capacity, o + l.current_output));
    CarbonatedTotals {
        capacity,
        current_output,
        utilization: if capacity > 0.0 { current_output / capacity * 100.0 } else { 0.0 },
    }
}

/// Headline figures quoted on the capacity slide
pub struct Insights {
    pub water_current_capacity: f64,
    pub water_future_capacity: f64,
    pub water_growth: f64,
    pub water_utilization: f64,
    /// Future capacity at 75% utilisation
    pub water_future_output: f64,
    pub water_current_output: f64,
    pub water_output_growth: f64,
    pub carbonated_capacity: f64,
    pub carbonated_output: f64,
    pub carbonated_utilization: f64,
    pub carbonated_note: &'static str,
    pub key_takeaway: &'static str,
}

pub const INSIGHTS: Insights = Insights {
    water_current_capacity: 626.0,
    water_future_capacity: 804.0,
    water_growth: 28.4,
    water_utilization: 62.0,
    water_future_output: 603.0,
    water_current_output: 386.0,
    water_output_growth: 56.2,
    carbonated_capacity: 37.0,
    carbonated_output: 17.0,
    carbonated_utilization: 45.0,
    carbonated_note: "Capacity-available but demand-constrained, offering optional upside without capex",
    key_takeaway: "The Group has already completed the bulk of its drinking water capacity build-out, \
        with utilisation at only 62%. Near-term growth will be driven by utilisation ramp-up, while the \
        Sandakan Sibuga Plant 2 provides a clear medium-term step-up to over 800 million litres of annual \
        capacity.",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_totals_match_insights() {
        let totals = drinking_water_totals();
        assert_eq!(totals.current_capacity, INSIGHTS.water_current_capacity);
        assert_eq!(totals.future_capacity, INSIGHTS.water_future_capacity);
        assert_eq!(totals.current_output, INSIGHTS.water_current_output);
        assert!((totals.growth - INSIGHTS.water_growth).abs() < 0.05);
    }

    #[test]
    fn test_carbonated_totals() {
        let totals = carbonated_totals();
        assert_eq!(totals.capacity, 37.0);
        assert_eq!(totals.current_output, 17.0);
        assert!((totals.utilization - 45.9).abs() < 0.1);
    }

    #[test]
    fn test_lookup() {
        let iz8 = capacity_by_name("KK IZ8 Plant 1").unwrap();
        assert!(iz8.packaging.is_some());
        assert_eq!(iz8.drinking_water.as_ref().map(|w| w.future_capacity), Some(0.0));
        assert!(capacity_by_name("Twinine Facility").unwrap().drinking_water.is_none());
    }
}
