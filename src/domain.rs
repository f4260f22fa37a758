use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DECEASED: &str = "deceased";
pub const NOT_REVEALED: &str = "NOT_REVEALED";

/// One collectible's normalized state.
///
/// Numeric-looking attributes keep the text they arrived with; use
/// [`parse_int`] at the comparison site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "tokenId")]
    pub token_id: u64,
    pub image: Option<String>,
    pub age: Option<String>,
    pub body: String,
    pub disposition: Option<String>,
    pub health: Option<String>,
    #[serde(rename = "isAwake")]
    pub is_awake: Option<String>,
    #[serde(rename = "isBuried")]
    pub is_buried: Option<String>,
    pub generation: Option<String>,
    #[serde(rename = "mitosisCredits")]
    pub mitosis_credits: Option<String>,
    #[serde(rename = "parentID")]
    pub parent_id: Option<String>,
}

impl Record {
    /// A record carrying only an id, everything else absent.
    pub fn bare(token_id: u64) -> Self {
        Self {
            token_id,
            image: None,
            age: None,
            body: NOT_REVEALED.to_string(),
            disposition: None,
            health: None,
            is_awake: None,
            is_buried: None,
            generation: None,
            mitosis_credits: None,
            parent_id: None,
        }
    }

    pub fn is_deceased(&self) -> bool {
        self.age.as_deref() == Some(DECEASED)
    }

    pub fn health_value(&self) -> Option<i64> {
        parse_int(self.health.as_deref())
    }

    pub fn generation_value(&self) -> Option<i64> {
        parse_int(self.generation.as_deref())
    }

    pub fn mitosis_credits_value(&self) -> Option<i64> {
        parse_int(self.mitosis_credits.as_deref())
    }

    /// Generation grouping key; a missing generation groups under "".
    pub fn generation_key(&self) -> &str {
        self.generation.as_deref().unwrap_or("")
    }

    /// Parent grouping key, `None` for founders.
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Integer-prefix parse: surrounding whitespace, an optional sign, then the
/// leading run of ASCII digits. Anything else yields `None`, which numeric
/// predicates treat as "no match".
pub fn parse_int(value: Option<&str>) -> Option<i64> {
    let trimmed = value?.trim();
    let (negative, rest) = match *trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest.len() - rest.trim_start_matches(|ch: char| ch.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    Population,
    HealthRisk,
    MitosisLeaderboard,
    BodyTypesByGen,
    Extinction,
    DeFactoRarity,
    Rarity,
    Fertility,
    FertilityByGen,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Population => "population",
            QueryKind::HealthRisk => "health-risk",
            QueryKind::MitosisLeaderboard => "mitosis-leaderboard",
            QueryKind::BodyTypesByGen => "body-types-by-gen",
            QueryKind::Extinction => "extinction",
            QueryKind::DeFactoRarity => "de-facto-rarity",
            QueryKind::Rarity => "rarity",
            QueryKind::Fertility => "fertility",
            QueryKind::FertilityByGen => "fertility-by-gen",
        };
        write!(f, "{name}")
    }
}
