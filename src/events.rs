use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Outcome of a tagged possession. Each variant carries a fixed point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotResult {
    #[serde(rename = "Made 2")]
    Made2,
    #[serde(rename = "Made 3")]
    Made3,
    #[serde(rename = "Missed 2")]
    Missed2,
    #[serde(rename = "Missed 3")]
    Missed3,
    #[serde(rename = "Foul")]
    Foul,
}

impl ShotResult {
    pub const ALL: [ShotResult; 5] = [
        ShotResult::Made2,
        ShotResult::Made3,
        ShotResult::Missed2,
        ShotResult::Missed3,
        ShotResult::Foul,
    ];

    pub const fn points(self) -> u32 {
        match self {
            ShotResult::Made2 => 2,
            ShotResult::Made3 => 3,
            ShotResult::Missed2 | ShotResult::Missed3 | ShotResult::Foul => 0,
        }
    }

    pub const fn is_made(self) -> bool {
        matches!(self, ShotResult::Made2 | ShotResult::Made3)
    }

    /// Fouls are attempts but not shot attempts.
    pub const fn is_shot(self) -> bool {
        !matches!(self, ShotResult::Foul)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShotResult::Made2 => "Made 2",
            ShotResult::Made3 => "Made 3",
            ShotResult::Missed2 => "Missed 2",
            ShotResult::Missed3 => "Missed 3",
            ShotResult::Foul => "Foul",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let needle = label.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for ShotResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShotResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown result: {}", s.trim()))
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
    #[serde(rename = "4")]
    Fourth,
    #[serde(rename = "OT")]
    Overtime,
}

impl Quarter {
    pub const ALL: [Quarter; 5] = [
        Quarter::First,
        Quarter::Second,
        Quarter::Third,
        Quarter::Fourth,
        Quarter::Overtime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::First => "1",
            Quarter::Second => "2",
            Quarter::Third => "3",
            Quarter::Fourth => "4",
            Quarter::Overtime => "OT",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown quarter: {}", needle))
    }
}

/// Game fields stamped onto every tagged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub opponent: String,
    pub game_date: NaiveDate,
    pub quarter: Quarter,
}

impl GameContext {
    pub fn header(&self) -> String {
        format!(
            "vs {} | Date: {} | Quarter: {}",
            self.opponent, self.game_date, self.quarter
        )
    }
}

/// Partially filled game setup, as collected before tagging starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSetup {
    pub opponent: String,
    pub game_date: Option<NaiveDate>,
    pub quarter: Option<Quarter>,
}

impl GameSetup {
    /// Complete context once opponent, date and quarter are all set.
    pub fn ready(&self) -> Option<GameContext> {
        let opponent = self.opponent.trim();
        if opponent.is_empty() {
            return None;
        }
        Some(GameContext {
            opponent: opponent.to_string(),
            game_date: self.game_date?,
            quarter: self.quarter?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub opponent: String,
    pub game_date: NaiveDate,
    pub quarter: Quarter,
    pub play: String,
    pub result: ShotResult,
    pub points: u32,
}

impl Event {
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Append-only record of tagged events in chronological order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
    // Running SHA-256 over the JSON line of every event since the last clear.
    hasher: Sha256,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&mut self, play: &str, result: ShotResult, ctx: &GameContext) -> &Event {
        self.tag_at(play, result, ctx, Local::now())
    }

    pub fn tag_at(
        &mut self,
        play: &str,
        result: ShotResult,
        ctx: &GameContext,
        timestamp: DateTime<Local>,
    ) -> &Event {
        let event = Event {
            timestamp,
            opponent: ctx.opponent.clone(),
            game_date: ctx.game_date,
            quarter: ctx.quarter,
            play: play.to_string(),
            result,
            points: result.points(),
        };
        if let Ok(line) = serde_json::to_vec(&event) {
            self.hasher.update(&line);
            self.hasher.update(b"\n");
        }
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.hasher = Sha256::new();
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// SHA-256 over the ordered events as JSON lines, hex encoded.
    pub fn digest(&self) -> String {
        hex::encode(self.hasher.clone().finalize())
    }
}
