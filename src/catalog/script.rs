//! The two-minute narrative read over the slides.

use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptSegment {
    pub time: &'static str,
    pub duration: Duration,
    pub title: &'static str,
    pub full_text: &'static str,
}

pub static SEGMENTS: [ScriptSegment; 4] = [
    ScriptSegment {
        time: "0:00–0:30",
        duration: Duration::from_secs(30),
        title: "Set the Frame",
        full_text: "This map explains why Life Water wins in Sabah. Bottled water and carbonated \
            drinks here are not branding businesses; they're logistics businesses. Sabah's geography \
            makes delivery cost, not shelf appeal, the key determinant of profitability.",
    },
    ScriptSegment {
        time: "0:30–1:10",
        duration: Duration::from_secs(40),
        title: "Manufacturing → DC Conversion",
        full_text: "All carbonated drinks originate from a single plant in Sandakan, then flow into a \
            decentralised DC network across the state. Water production is localised closer to \
            demand, reducing freight cost and improving service reliability. This is a deliberate \
            hub-and-spoke system optimised for Sabah's terrain.",
    },
    ScriptSegment {
        time: "1:10–1:40",
        duration: Duration::from_secs(30),
        title: "Cost Moat & Operating Leverage",
        full_text: "What matters is not just coverage, but density. With 90 trucks and five \
            distribution centres already embedded, incremental volume rides on the same routes at \
            marginal cost, whether water, flavoured drinks, or Twinine sauces. A new entrant would \
            need to spend over RM200m and several years just to stand still.",
    },
    ScriptSegment {
        time: "1:40–2:00",
        duration: Duration::from_secs(20),
        title: "Why This Is a Catalyst",
        full_text: "As capacity expands and new FMCG SKUs are layered in, fixed logistics costs are \
            amortised over higher revenue. This is operating leverage driven by sunk infrastructure, \
            and it's why Life Water should structurally out-earn smaller or Peninsular Malaysia \
            competitors in Sabah.",
    },
];

pub const FINAL_LINE: &str = "Life Water's moat is physical, local, and already paid for, which is \
    why growth converts to earnings faster than investors expect.";

pub const ONE_LINE_TAKEAWAY: &str = "Life Water's advantage is not just scale, but the physical \
    conversion of manufacturing capacity into cash through a dense, local DC network that \
    competitors cannot economically replicate.";

pub fn total_duration() -> Duration {
    SEGMENTS.iter().map(|s| s.duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_fill_two_minutes() {
        assert_eq!(total_duration(), Duration::from_secs(120));
        assert_eq!(SEGMENTS[1].title, "Manufacturing → DC Conversion");
    }
}
