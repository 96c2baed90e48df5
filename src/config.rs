use chrono::{Local, NaiveDate};

use crate::events::{GameSetup, Quarter};

#[derive(Debug, Clone)]
pub struct Config {
    pub playbook: Vec<String>,
    pub opponent: String,
    pub game_date: NaiveDate,
    pub quarter: Option<Quarter>,
    pub print_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            playbook: std::env::var("PLAYBOOK")
                .map(|v| parse_playbook(&v))
                .unwrap_or_default(),
            opponent: std::env::var("OPPONENT").unwrap_or_default(),
            game_date: std::env::var("GAME_DATE")
                .ok()
                .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
                .unwrap_or_else(|| Local::now().date_naive()),
            quarter: std::env::var("QUARTER").ok().and_then(|v| v.parse().ok()),
            print_json: matches!(std::env::var("PRINT_JSON").as_deref(), Ok("1") | Ok("true")),
        }
    }

    /// Starting sidebar state for the session.
    pub fn setup(&self) -> GameSetup {
        GameSetup {
            opponent: self.opponent.clone(),
            game_date: Some(self.game_date),
            quarter: self.quarter,
        }
    }
}

/// Comma-separated play names. Blank entries are dropped.
pub fn parse_playbook(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
