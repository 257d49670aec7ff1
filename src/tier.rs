pub const TIER_NAMES: [&str; 7] = [
    "unranked", "bronze", "silver", "gold", "platinum", "diamond", "master",
];

/// Competitive rank bucket carried by every match-player row. Anything outside
/// the seven named tiers collapses into `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Unranked,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Unknown,
}

impl Tier {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "unranked" => Tier::Unranked,
            "bronze" => Tier::Bronze,
            "silver" => Tier::Silver,
            "gold" => Tier::Gold,
            "platinum" => Tier::Platinum,
            "diamond" => Tier::Diamond,
            "master" => Tier::Master,
            _ => Tier::Unknown,
        }
    }

    /// Fixed total order over the named tiers; Unknown sits below Unranked.
    pub fn ordinal(self) -> i8 {
        match self {
            Tier::Unranked => 0,
            Tier::Bronze => 1,
            Tier::Silver => 2,
            Tier::Gold => 3,
            Tier::Platinum => 4,
            Tier::Diamond => 5,
            Tier::Master => 6,
            Tier::Unknown => -1,
        }
    }

    pub fn weight(self) -> f64 {
        f64::from(self.ordinal()).exp()
    }
}
