use serde::Serialize;
use std::fmt;

/// Shown for offers whose distance was fetched but came back empty.
pub const UNAVAILABLE_LABEL: &str = "Distance unavailable";
/// Shown while the distance fetch is still outstanding.
pub const LOADING_LABEL: &str = "Loading distance...";

/// Coarse vendor-to-warehouse bucket. Informs the decision, never gates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProximityCategory {
    Nearby,
    Regional,
    LongDistance,
    OutOfRange,
}

impl ProximityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ProximityCategory::Nearby => "Nearby",
            ProximityCategory::Regional => "Regional",
            ProximityCategory::LongDistance => "Long distance",
            ProximityCategory::OutOfRange => "Out of range",
        }
    }
}

impl fmt::Display for ProximityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive upper bound in whole km for each bucket; anything above the last is out of range.
const BUCKETS: [(u64, ProximityCategory); 3] = [
    (50, ProximityCategory::Nearby),
    (250, ProximityCategory::Regional),
    (500, ProximityCategory::LongDistance),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Proximity {
    pub km: u64,
    pub category: ProximityCategory,
}

impl Proximity {
    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    /// e.g. `45km Nearby`
    pub fn display(&self) -> String {
        format!("{}km {}", self.km, self.label())
    }
}

/// Meters to whole kilometres, rounding half away from zero (`f64::round`).
///
/// Negative and NaN readings count as zero.
pub fn distance_km(meters: f64) -> u64 {
    if meters.is_nan() || meters <= 0.0 {
        return 0;
    }
    // `as` saturates, so an infinite reading lands out of range
    (meters / 1000.0).round() as u64
}

/// Bucket a distance. Rounding to whole km happens before the comparison.
pub fn classify(meters: f64) -> Proximity {
    let km = distance_km(meters);
    let category = BUCKETS
        .iter()
        .find(|(upper, _)| km <= *upper)
        .map(|(_, category)| *category)
        .unwrap_or(ProximityCategory::OutOfRange);

    Proximity { km, category }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km(whole: u64) -> f64 {
        whole as f64 * 1000.0
    }

    #[test]
    fn bucket_edges() {
        assert_eq!(classify(km(0)).category, ProximityCategory::Nearby);
        assert_eq!(classify(km(50)).category, ProximityCategory::Nearby);
        assert_eq!(classify(km(51)).category, ProximityCategory::Regional);
        assert_eq!(classify(km(250)).category, ProximityCategory::Regional);
        assert_eq!(classify(km(251)).category, ProximityCategory::LongDistance);
        assert_eq!(classify(km(500)).category, ProximityCategory::LongDistance);
        assert_eq!(classify(km(501)).category, ProximityCategory::OutOfRange);
    }

    #[test]
    fn rounding_happens_before_bucketing() {
        assert_eq!(classify(50_499.0).km, 50);
        assert_eq!(classify(50_499.0).category, ProximityCategory::Nearby);
        assert_eq!(classify(50_500.0).km, 51);
        assert_eq!(classify(50_500.0).category, ProximityCategory::Regional);
        assert_eq!(classify(500_499.0).category, ProximityCategory::LongDistance);
        assert_eq!(classify(500_500.0).category, ProximityCategory::OutOfRange);
    }

    #[test]
    fn labels_and_display() {
        let nearby = classify(45_000.0);
        assert_eq!(nearby.category, ProximityCategory::Nearby);
        assert_eq!(nearby.label(), "Nearby");
        assert_eq!(nearby.display(), "45km Nearby");

        let far = classify(812_300.0);
        assert_eq!(far.category, ProximityCategory::OutOfRange);
        assert_eq!(far.label(), "Out of range");

        assert_eq!(classify(300_000.0).label(), "Long distance");
        assert_eq!(classify(120_000.0).label(), "Regional");
    }

    #[test]
    fn exactly_one_bucket_per_km() {
        let mut previous = ProximityCategory::Nearby;
        let order = [
            ProximityCategory::Nearby,
            ProximityCategory::Regional,
            ProximityCategory::LongDistance,
            ProximityCategory::OutOfRange,
        ];
        let rank = |c: ProximityCategory| order.iter().position(|o| *o == c).unwrap();

        for whole in 0..=1_000u64 {
            let category = classify(km(whole)).category;
            assert!(rank(category) >= rank(previous), "buckets must not interleave at {whole} km");
            previous = category;
        }
    }

    #[test]
    fn odd_readings() {
        assert_eq!(classify(-20.0).km, 0);
        assert_eq!(classify(f64::NAN).category, ProximityCategory::Nearby);
        assert_eq!(classify(f64::INFINITY).category, ProximityCategory::OutOfRange);
    }
}
