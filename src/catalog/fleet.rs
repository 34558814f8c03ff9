#[derive(Clone, Debug, PartialEq)]
pub struct FleetAllocation {
    pub dc_name: &'static str,
    pub trucks: u32,
    pub rationale: &'static str,
}

pub const TOTAL_FLEET_SIZE: u32 = 90;

/// Reserve row, not tied to a DC
pub const BUFFER: &str = "Buffer / Float / Peak demand";

pub static FLEET_ALLOCATION: [FleetAllocation; 5] = [
    FleetAllocation {
        dc_name: "Sandakan Sibuga DC 1",
        trucks: 30,
        rationale: "Central hub, carbonated drinks redistribution, fleet depot",
    },
    FleetAllocation {
        dc_name: "KK IZ2 DC",
        trucks: 22,
        rationale: "Highest population density, retail intensity",
    },
    FleetAllocation {
        dc_name: "Lahad Datu DC 2",
        trucks: 18,
        rationale: "Eastern Sabah coverage + carbonated drinks hub",
    },
    FleetAllocation {
        dc_name: "Keningau (Interior)",
        trucks: 10,
        rationale: "Interior routes, lower density but longer distances",
    },
    FleetAllocation {
        dc_name: BUFFER,
        trucks: 10,
        rationale: "Maintenance, seasonal peaks, redundancy",
    },
];

/// Trucks assigned to a DC; 0 when it has no allocation
pub fn fleet_for_dc(dc_name: &str) -> u32 {
    FLEET_ALLOCATION
        .iter()
        .find(|f| f.dc_name == dc_name)
        .map_or(0, |f| f.trucks)
}

/// Trucks assigned to operating locations, excluding the buffer
pub fn total_allocated_trucks() -> u32 {
    FLEET_ALLOCATION
        .iter()
        .filter(|f| f.dc_name != BUFFER)
        .map(|f| f.trucks)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_sums() {
        let all: u32 = FLEET_ALLOCATION.iter().map(|f| f.trucks).sum();
        assert_eq!(all, TOTAL_FLEET_SIZE);
        assert_eq!(total_allocated_trucks(), 80);
    }

    #[test]
    fn test_lookup_defaults_to_zero() {
        assert_eq!(fleet_for_dc("KK IZ2 DC"), 22);
        assert_eq!(fleet_for_dc("Tawau DC"), 0);
    }
}
