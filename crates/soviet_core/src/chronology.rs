//! Calendar, seasons, weather and time of day.
//!
//! [`Chronology`] is the only writer of the [`SimDate`]. Each call to
//! [`Chronology::advance`] moves time forward by one tick and reports the
//! boundaries crossed; every other subsystem keys its cadence off those flags.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;

/// In-game date. Ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimDate {
    /// Calendar year.
    pub year: u32,
    /// Month, 1-based.
    pub month: u32,
    /// Tick within the month, 0-based.
    pub tick: u32,
}

/// Season of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    /// December through February.
    Winter,
    /// March through May.
    Spring,
    /// June through August.
    Summer,
    /// September through November.
    Autumn,
}

impl Season {
    /// Season for a 1-based month in a year of `months_per_year` months.
    ///
    /// Calendars that are not twelve months long are scaled onto the
    /// twelve-month mapping.
    #[must_use]
    pub fn from_month(month: u32, months_per_year: u32) -> Self {
        let months_per_year = months_per_year.max(1);
        let month = month.clamp(1, months_per_year);
        let equivalent = (month - 1) * 12 / months_per_year + 1;
        match equivalent {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    /// Whether this is winter.
    #[must_use]
    pub const fn is_winter(self) -> bool {
        matches!(self, Self::Winter)
    }

    /// Multiplier on farm output.
    #[must_use]
    pub const fn farm_factor(self) -> f64 {
        match self {
            Self::Winter => 0.2,
            Self::Spring => 0.9,
            Self::Summer => 1.3,
            Self::Autumn => 1.0,
        }
    }

    /// Multiplier on building decay.
    #[must_use]
    pub const fn decay_factor(self) -> f64 {
        match self {
            Self::Winter => 1.5,
            _ => 1.0,
        }
    }

    fn weather_table(self) -> &'static [(Weather, u32)] {
        match self {
            Self::Winter => &[
                (Weather::Clear, 20),
                (Weather::Overcast, 30),
                (Weather::Snow, 35),
                (Weather::Blizzard, 15),
            ],
            Self::Spring => &[
                (Weather::Clear, 35),
                (Weather::Overcast, 35),
                (Weather::Rain, 30),
            ],
            Self::Summer => &[
                (Weather::Clear, 50),
                (Weather::Overcast, 20),
                (Weather::Rain, 20),
                (Weather::Heatwave, 10),
            ],
            Self::Autumn => &[
                (Weather::Clear, 25),
                (Weather::Overcast, 35),
                (Weather::Rain, 30),
                (Weather::Snow, 10),
            ],
        }
    }
}

/// Daily weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    /// Clear skies.
    Clear,
    /// Grey and still.
    Overcast,
    /// Rain.
    Rain,
    /// Snowfall.
    Snow,
    /// Blizzard; outdoor work mostly stops.
    Blizzard,
    /// Summer heat.
    Heatwave,
}

impl Weather {
    /// Multiplier on production while this weather holds.
    #[must_use]
    pub const fn production_factor(self) -> f64 {
        match self {
            Self::Clear => 1.0,
            Self::Overcast => 0.95,
            Self::Rain => 0.85,
            Self::Snow => 0.75,
            Self::Blizzard => 0.5,
            Self::Heatwave => 0.8,
        }
    }
}

/// Quarter of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPhase {
    /// Midnight to dawn.
    Night,
    /// Dawn to noon.
    Morning,
    /// Noon to dusk.
    Afternoon,
    /// Dusk to midnight.
    Evening,
}

impl DayPhase {
    fn from_tick_in_day(tick_in_day: u32, ticks_per_day: u32) -> Self {
        match tick_in_day * 4 / ticks_per_day.max(1) {
            0 => Self::Night,
            1 => Self::Morning,
            2 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

/// Boundaries crossed by a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickBoundaries {
    /// A new day started.
    pub new_day: bool,
    /// A new month started.
    pub new_month: bool,
    /// A new year started.
    pub new_year: bool,
    /// The season differs from the previous tick.
    pub season_changed: bool,
    /// The weather differs from the previous tick.
    pub weather_changed: bool,
    /// The day phase differs from the previous tick.
    pub day_phase_changed: bool,
}

impl TickBoundaries {
    /// Whether this tick starts a new quarter (months 1, 4, 7, 10 of a
    /// twelve-month year; scaled for other calendars).
    #[must_use]
    pub fn new_quarter(&self, date: SimDate, months_per_year: u32) -> bool {
        let quarter_len = (months_per_year / 4).max(1);
        self.new_month && (date.month - 1) % quarter_len == 0
    }
}

/// Owner of the simulation clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chronology {
    date: SimDate,
    total_ticks: u64,
    ticks_per_day: u32,
    days_per_month: u32,
    months_per_year: u32,
    season: Season,
    weather: Weather,
    day_phase: DayPhase,
}

impl Chronology {
    /// Clock at tick 0 of January of the configured start year.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            date: SimDate {
                year: config.start_year,
                month: 1,
                tick: 0,
            },
            total_ticks: 0,
            ticks_per_day: config.ticks_per_day,
            days_per_month: config.days_per_month,
            months_per_year: config.months_per_year,
            season: Season::from_month(1, config.months_per_year),
            weather: Weather::Clear,
            day_phase: DayPhase::Night,
        }
    }

    /// Current date.
    #[must_use]
    pub const fn date(&self) -> SimDate {
        self.date
    }

    /// Ticks elapsed since the start of the game.
    #[must_use]
    pub const fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Current season.
    #[must_use]
    pub const fn season(&self) -> Season {
        self.season
    }

    /// Current weather.
    #[must_use]
    pub const fn weather(&self) -> Weather {
        self.weather
    }

    /// Current day phase.
    #[must_use]
    pub const fn day_phase(&self) -> DayPhase {
        self.day_phase
    }

    /// Day of the month, 1-based.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.date.tick / self.ticks_per_day + 1
    }

    /// Months in a year on this calendar.
    #[must_use]
    pub const fn months_per_year(&self) -> u32 {
        self.months_per_year
    }

    /// Ticks in one month on this calendar.
    #[must_use]
    pub const fn ticks_per_month(&self) -> u32 {
        self.ticks_per_day * self.days_per_month
    }

    /// Advance by one tick, rolling the weather on each new day.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickBoundaries {
        let mut boundaries = TickBoundaries::default();

        self.total_ticks += 1;
        self.date.tick += 1;
        if self.date.tick >= self.ticks_per_month() {
            self.date.tick = 0;
            self.date.month += 1;
            boundaries.new_month = true;
            if self.date.month > self.months_per_year {
                self.date.month = 1;
                self.date.year += 1;
                boundaries.new_year = true;
            }
        }
        boundaries.new_day = self.date.tick % self.ticks_per_day == 0;

        let season = Season::from_month(self.date.month, self.months_per_year);
        boundaries.season_changed = season != self.season;
        self.season = season;

        let phase = DayPhase::from_tick_in_day(self.date.tick % self.ticks_per_day, self.ticks_per_day);
        boundaries.day_phase_changed = phase != self.day_phase;
        self.day_phase = phase;

        if boundaries.new_day {
            let weather = roll_weather(season, rng);
            boundaries.weather_changed = weather != self.weather;
            self.weather = weather;
        }

        boundaries
    }
}

fn roll_weather<R: Rng + ?Sized>(season: Season, rng: &mut R) -> Weather {
    let table = season.weather_table();
    let total: u32 = table.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for &(weather, weight) in table {
        if roll < weight {
            return weather;
        }
        roll -= weight;
    }
    Weather::Overcast
}
