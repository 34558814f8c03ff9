//! What it would cost a new entrant to rebuild the asset base. Figures are
//! display strings in RM.

#[derive(Clone, Debug, PartialEq)]
pub struct CostItem {
    pub asset: &'static str,
    pub units: &'static str,
    pub cost_per_unit: &'static str,
    pub total_cost: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CostCategory {
    pub category: &'static str,
    pub items: &'static [CostItem],
    pub subtotal: &'static str,
}

const fn item(asset: &'static str, units: &'static str, cost_per_unit: &'static str, total_cost: &'static str) -> CostItem {
    CostItem {
        asset,
        units,
        cost_per_unit,
        total_cost,
    }
}

pub static MANUFACTURING: CostCategory = CostCategory {
    category: "Manufacturing",
    items: &[
        item("Bottled water production line", "4–5 lines", "15–25m", "75–100m"),
        item("Carbonated drinks line", "1 line", "25–35m", "25–35m"),
        item("PET preform + cap lines", "1 integrated hub", "30–40m", "30–40m"),
        item("Condiments plant (Twinine-equivalent)", "1 facility", "10–15m", "10–15m"),
    ],
    subtotal: "~RM140–190m",
};

pub static LOGISTICS: CostCategory = CostCategory {
    category: "Distribution & Logistics",
    items: &[
        item("Distribution centres / warehouses", "5–6", "5–10m", "30–50m"),
        item("Delivery trucks (medium-duty)", "90", "180k–250k", "16–22m"),
        item("Cold/ambient handling, racking, systems", "—", "—", "8–12m"),
    ],
    subtotal: "~RM55–80m",
};

pub const TOTAL: &str = "RM200–270 million";

/// Costs that money alone does not buy
pub const EXCLUDES: [&str; 4] = [
    "Time (5–8 years to build retailer relationships)",
    "Driver availability",
    "Route optimisation learning curve",
    "Sabah-specific operational know-how",
];

pub const FRAMING: &str = "Life Water's current market position embeds over RM200m of replacement \
    value that does not sit on the balance sheet, and would take years, not quarters, to replicate.";

pub fn categories() -> [&'static CostCategory; 2] {
    [&MANUFACTURING, &LOGISTICS]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables() {
        assert_eq!(MANUFACTURING.items.len(), 4);
        assert_eq!(LOGISTICS.items.len(), 3);
        assert!(categories().iter().all(|c| c.subtotal.starts_with("~RM")));
        assert!(LOGISTICS.items.iter().any(|i| i.units == "90"));
    }
}
