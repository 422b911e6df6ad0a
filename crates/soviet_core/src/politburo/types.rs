//! Political actors and the records they leave behind.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tables::{FIRST_NAMES, LEADER_NAMES, SURNAMES};
use crate::error::GameError;

/// Upper bound of every minister and leader stat.
pub const STAT_MAX: f64 = 100.0;

/// Clamp a stat into `[0, 100]`.
#[must_use]
pub fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, STAT_MAX)
    }
}

/// A cabinet portfolio. Exactly one minister holds each at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ministry {
    /// Collective farms.
    Agriculture,
    /// Steel, coal, machines.
    HeavyIndustry,
    /// Consumer goods.
    LightIndustry,
    /// The army.
    Defense,
    /// Secret police.
    StateSecurity,
    /// Hospitals and sanitation.
    Health,
    /// Schools.
    Education,
    /// Art and propaganda.
    Culture,
    /// Gosplan.
    Planning,
    /// Railways and roads.
    Transport,
}

impl Ministry {
    /// All ministries in cabinet order.
    pub const ALL: [Self; 10] = [
        Self::Agriculture,
        Self::HeavyIndustry,
        Self::LightIndustry,
        Self::Defense,
        Self::StateSecurity,
        Self::Health,
        Self::Education,
        Self::Culture,
        Self::Planning,
        Self::Transport,
    ];

    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agriculture => "agriculture",
            Self::HeavyIndustry => "heavy_industry",
            Self::LightIndustry => "light_industry",
            Self::Defense => "defense",
            Self::StateSecurity => "state_security",
            Self::Health => "health",
            Self::Education => "education",
            Self::Culture => "culture",
            Self::Planning => "planning",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for Ministry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ministry {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| GameError::UnknownMinistry(s.to_string()))
    }
}

/// Political temperament of a minister or leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// True believer; distrusts change.
    Zealot,
    /// Believes in the cause and the people.
    Idealist,
    /// Wants to fix the system.
    Reformer,
    /// Cares about results and numbers.
    Technocrat,
    /// Career bureaucrat.
    Apparatchik,
    /// Sees everything as a front.
    Militarist,
}

impl Personality {
    /// All personalities in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Zealot,
        Self::Idealist,
        Self::Reformer,
        Self::Technocrat,
        Self::Apparatchik,
        Self::Militarist,
    ];

    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zealot => "zealot",
            Self::Idealist => "idealist",
            Self::Reformer => "reformer",
            Self::Technocrat => "technocrat",
            Self::Apparatchik => "apparatchik",
            Self::Militarist => "militarist",
        }
    }

    /// Uniformly random personality.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Personality {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| GameError::UnknownPersonality(s.to_string()))
    }
}

/// A cabinet member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Minister {
    /// Unique id across the whole game.
    pub id: u32,
    /// Full name.
    pub name: String,
    /// Portfolio held.
    pub ministry: Ministry,
    /// Temperament.
    pub personality: Personality,
    /// Devotion to the leader.
    pub loyalty: f64,
    /// Hunger for power.
    pub ambition: f64,
    /// Appetite for the treasury.
    pub corruption: f64,
    /// Ability to run the portfolio.
    pub competence: f64,
    /// Accumulated suspicion.
    pub purge_risk: f64,
    /// Years in office.
    pub tenure: u32,
    /// Faction membership, rebuilt every year.
    pub faction_id: Option<u32>,
}

impl Minister {
    /// Fresh minister with random stats.
    pub fn generate<R: Rng + ?Sized>(
        id: u32,
        ministry: Ministry,
        personality: Personality,
        rng: &mut R,
    ) -> Self {
        Self {
            id,
            name: random_name(rng),
            ministry,
            personality,
            loyalty: rng.gen_range(30.0..70.0),
            ambition: rng.gen_range(20.0..80.0),
            corruption: rng.gen_range(10.0..60.0),
            competence: rng.gen_range(20.0..90.0),
            purge_risk: rng.gen_range(0.0..20.0),
            tenure: 0,
            faction_id: None,
        }
    }

    /// Keep every stat inside `[0, 100]`.
    pub fn clamp_stats(&mut self) {
        self.loyalty = clamp_stat(self.loyalty);
        self.ambition = clamp_stat(self.ambition);
        self.corruption = clamp_stat(self.corruption);
        self.competence = clamp_stat(self.competence);
        self.purge_risk = clamp_stat(self.purge_risk);
    }
}

/// How a General Secretary left office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseOfDeath {
    /// Removed by a minister.
    Coup,
    /// Health ran out.
    Illness,
    /// Sudden death in old age.
    NaturalCauses,
}

impl fmt::Display for CauseOfDeath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Coup => "coup",
            Self::Illness => "illness",
            Self::NaturalCauses => "natural causes",
        })
    }
}

/// The leader of the party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSecretary {
    /// Unique id.
    pub id: u32,
    /// Name.
    pub name: String,
    /// Temperament; selects the appointment strategy.
    pub personality: Personality,
    /// Suspicion of the cabinet.
    pub paranoia: f64,
    /// Health; death by illness at zero.
    pub health: f64,
    /// Age in years.
    pub age: u32,
    /// Whether still alive.
    pub alive: bool,
    /// Set when the leader leaves office.
    pub cause_of_death: Option<CauseOfDeath>,
    /// Year the leader took office.
    pub took_office: u32,
}

impl GeneralSecretary {
    /// New leader with random stats.
    pub fn generate<R: Rng + ?Sized>(
        id: u32,
        personality: Personality,
        year: u32,
        rng: &mut R,
    ) -> Self {
        let name = LEADER_NAMES
            .choose(rng)
            .copied()
            .unwrap_or("Comrade Secretary")
            .to_string();
        Self {
            id,
            name,
            personality,
            paranoia: rng.gen_range(10.0..90.0),
            health: rng.gen_range(60.0..100.0),
            age: rng.gen_range(50..70),
            alive: true,
            cause_of_death: None,
            took_office: year,
        }
    }
}

/// Ministers sharing a personality. Rebuilt from cabinet state every year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    /// Id, stable only until the next rebuild.
    pub id: u32,
    /// Shared personality.
    pub personality: Personality,
    /// Ministries of the members, in cabinet order.
    pub members: Vec<Ministry>,
}

/// An entry in the append-only purge log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeRecord {
    /// Year of the purge.
    pub year: u32,
    /// Portfolio.
    pub ministry: Ministry,
    /// Who was removed.
    pub minister_name: String,
    /// Their temperament.
    pub personality: Personality,
    /// Who replaced them.
    pub replacement_name: String,
}

/// Unordered pair of ministries whose relationship is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TensionKey(pub Ministry, pub Ministry);

impl TensionKey {
    /// Key with the ministries in cabinet order.
    #[must_use]
    pub fn new(a: Ministry, b: Ministry) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

impl fmt::Display for TensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// Something that happened inside the politburo this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolitburoEvent {
    /// A minister helped themselves to the treasury.
    Embezzlement {
        /// Portfolio.
        ministry: Ministry,
        /// Rubles taken.
        amount: f64,
    },
    /// A minister schemed and was noticed.
    Intrigue {
        /// Portfolio.
        ministry: Ministry,
    },
    /// Tension between two ministries boiled over.
    Conflict(TensionKey),
    /// Two ministries found common cause.
    Cooperation(TensionKey),
    /// A minister was purged and replaced.
    Purge {
        /// Portfolio.
        ministry: Ministry,
        /// Who was removed.
        removed: String,
        /// Who took over.
        replacement: String,
    },
    /// A minister overthrew the leader.
    Coup {
        /// Portfolio of the plotter.
        ministry: Ministry,
        /// Name of the plotter.
        plotter: String,
    },
    /// The leader left office.
    LeaderDied {
        /// Name.
        name: String,
        /// Why.
        cause: CauseOfDeath,
    },
    /// A new leader took office.
    Succession {
        /// Name.
        name: String,
        /// Temperament.
        personality: Personality,
        /// Paranoia of the new leader.
        paranoia: f64,
        /// Ministers kept from the previous cabinet.
        retained: usize,
    },
}

fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ivan");
    let last = SURNAMES.choose(rng).copied().unwrap_or("Ivanov");
    format!("{first} {last}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_ministry_names_parse() {
        for ministry in Ministry::ALL {
            assert_eq!(ministry.as_str().parse::<Ministry>().unwrap(), ministry);
        }
        assert!(matches!(
            "propaganda".parse::<Ministry>(),
            Err(GameError::UnknownMinistry(_))
        ));
    }

    #[test]
    fn test_personality_names_parse() {
        assert_eq!("zealot".parse::<Personality>().unwrap(), Personality::Zealot);
        assert!(matches!(
            "anarchist".parse::<Personality>(),
            Err(GameError::UnknownPersonality(_))
        ));
    }

    #[test]
    fn test_generated_stats_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for i in 0..100 {
            let m = Minister::generate(i, Ministry::Health, Personality::Idealist, &mut rng);
            for stat in [m.loyalty, m.ambition, m.corruption, m.competence, m.purge_risk] {
                assert!((0.0..=STAT_MAX).contains(&stat));
            }
            assert!(!m.name.is_empty());
        }
    }

    #[test]
    fn test_tension_key_is_unordered() {
        assert_eq!(
            TensionKey::new(Ministry::Transport, Ministry::Agriculture),
            TensionKey::new(Ministry::Agriculture, Ministry::Transport)
        );
        assert_eq!(
            TensionKey::new(Ministry::Defense, Ministry::Planning).to_string(),
            "defense:planning"
        );
    }

    #[test]
    fn test_clamp_stat() {
        assert_eq!(clamp_stat(-3.0), 0.0);
        assert_eq!(clamp_stat(140.0), 100.0);
        assert_eq!(clamp_stat(f64::NAN), 0.0);
    }
}
