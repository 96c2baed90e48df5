//! JSON-lines command protocol for driving a session from the outside:
//! one command per line, tagged by `"cmd"`.
//!
//! ```text
//! {"cmd":"add_play","name":"Horns"}
//! {"cmd":"set_context","opponent":"Rivals","game_date":"2024-01-12","quarter":"1"}
//! {"cmd":"tag","play":"Horns","result":"Made 3"}
//! {"cmd":"metrics"}
//! {"cmd":"reset"}
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::events::{Event, GameSetup, Quarter, ShotResult};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::metrics::MetricsTable;
use crate::playbook::PlayRejection;
use crate::session::GameSession;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    AddPlay {
        name: String,
    },
    SetContext {
        #[serde(default)]
        opponent: Option<String>,
        #[serde(default)]
        game_date: Option<NaiveDate>,
        #[serde(default)]
        quarter: Option<Quarter>,
    },
    Tag {
        play: String,
        result: String,
    },
    Reset,
    Metrics,
    Plays,
}

pub fn parse_command(line: &str) -> Result<Command> {
    serde_json::from_str(line.trim()).with_context(|| format!("bad command: {}", line.trim()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    PlayAdded(String),
    PlayRejected(PlayRejection),
    ContextUpdated { header: Option<String> },
    Tagged(Event),
    NotReady,
    UnknownResult(String),
    Reset,
    Metrics(MetricsTable),
    Plays(Vec<String>),
}

/// A session plus the game setup fields gating tagging.
#[derive(Debug, Clone, Default)]
pub struct Tagger {
    pub session: GameSession,
    pub setup: GameSetup,
}

impl Tagger {
    pub fn new(session: GameSession, setup: GameSetup) -> Self {
        Self { session, setup }
    }

    pub fn apply(&mut self, command: Command) -> Outcome {
        match command {
            Command::AddPlay { name } => match self.session.add_play(&name) {
                Ok(()) => Outcome::PlayAdded(name.trim().to_string()),
                Err(rejection) => Outcome::PlayRejected(rejection),
            },
            Command::SetContext {
                opponent,
                game_date,
                quarter,
            } => {
                if let Some(opponent) = opponent {
                    self.setup.opponent = opponent;
                }
                if game_date.is_some() {
                    self.setup.game_date = game_date;
                }
                if quarter.is_some() {
                    self.setup.quarter = quarter;
                }
                let header = self.setup.ready().map(|ctx| ctx.header());
                log(
                    Level::Info,
                    Domain::Session,
                    "context",
                    obj(&[
                        ("opponent", v_str(&self.setup.opponent)),
                        ("ready", serde_json::Value::Bool(header.is_some())),
                    ]),
                );
                Outcome::ContextUpdated { header }
            }
            Command::Tag { play, result } => {
                let Some(ctx) = self.setup.ready() else {
                    log(
                        Level::Warn,
                        Domain::Tag,
                        "not_ready",
                        obj(&[
                            ("msg", v_str("opponent, game date and quarter required")),
                            ("play", v_str(&play)),
                        ]),
                    );
                    return Outcome::NotReady;
                };
                let Some(result) = ShotResult::from_label(&result) else {
                    log(
                        Level::Warn,
                        Domain::Tag,
                        "unknown_result",
                        obj(&[("play", v_str(&play)), ("result", v_str(&result))]),
                    );
                    return Outcome::UnknownResult(result);
                };
                Outcome::Tagged(self.session.tag(&play, result, &ctx).clone())
            }
            Command::Reset => {
                self.session.reset();
                Outcome::Reset
            }
            Command::Metrics => Outcome::Metrics(self.session.compute_metrics()),
            Command::Plays => Outcome::Plays(self.session.list_plays().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::use_temp_log_dir;

    fn ready_tagger() -> Tagger {
        let mut tagger = Tagger::new(GameSession::with_plays(["Horns"]), GameSetup::default());
        tagger.apply(Command::SetContext {
            opponent: Some("Rivals".to_string()),
            game_date: NaiveDate::from_ymd_opt(2024, 1, 12),
            quarter: Some(Quarter::First),
        });
        tagger
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command(r#"{"cmd":"add_play","name":"Horns"}"#).unwrap(),
            Command::AddPlay {
                name: "Horns".to_string()
            }
        );
        assert_eq!(
            parse_command(r#"{"cmd":"set_context","quarter":"OT"}"#).unwrap(),
            Command::SetContext {
                opponent: None,
                game_date: None,
                quarter: Some(Quarter::Overtime),
            }
        );
        assert_eq!(parse_command(r#" {"cmd":"reset"} "#).unwrap(), Command::Reset);
        assert!(parse_command(r#"{"cmd":"dance"}"#).is_err());
        assert!(parse_command("not json").is_err());
    }

    #[test]
    fn test_tag_refused_until_ready() {
        use_temp_log_dir();
        let mut tagger = Tagger::new(GameSession::with_plays(["Horns"]), GameSetup::default());
        let outcome = tagger.apply(Command::Tag {
            play: "Horns".to_string(),
            result: "Made 2".to_string(),
        });
        assert_eq!(outcome, Outcome::NotReady);
        assert!(tagger.session.events().is_empty());
    }

    #[test]
    fn test_context_header_once_ready() {
        use_temp_log_dir();
        let mut tagger = Tagger::default();
        let partial = tagger.apply(Command::SetContext {
            opponent: Some("Rivals".to_string()),
            game_date: None,
            quarter: None,
        });
        assert_eq!(partial, Outcome::ContextUpdated { header: None });
        let full = tagger.apply(Command::SetContext {
            opponent: None,
            game_date: NaiveDate::from_ymd_opt(2024, 1, 12),
            quarter: Some(Quarter::Third),
        });
        assert_eq!(
            full,
            Outcome::ContextUpdated {
                header: Some("vs Rivals | Date: 2024-01-12 | Quarter: 3".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_result_skipped() {
        use_temp_log_dir();
        let mut tagger = ready_tagger();
        let outcome = tagger.apply(Command::Tag {
            play: "Horns".to_string(),
            result: "Turnover".to_string(),
        });
        assert_eq!(outcome, Outcome::UnknownResult("Turnover".to_string()));
        assert!(tagger.session.events().is_empty());
    }

    #[test]
    fn test_tag_then_metrics() {
        use_temp_log_dir();
        let mut tagger = ready_tagger();
        match tagger.apply(Command::Tag {
            play: "Horns".to_string(),
            result: "made 3".to_string(),
        }) {
            Outcome::Tagged(event) => {
                assert_eq!(event.result, ShotResult::Made3);
                assert_eq!(event.quarter, Quarter::First);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        match tagger.apply(Command::Metrics) {
            Outcome::Metrics(table) => assert_eq!(table.row("Horns").unwrap().points, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_add_play_outcomes() {
        use_temp_log_dir();
        let mut tagger = Tagger::default();
        assert_eq!(
            tagger.apply(Command::AddPlay {
                name: " Spain ".to_string()
            }),
            Outcome::PlayAdded("Spain".to_string())
        );
        assert_eq!(
            tagger.apply(Command::AddPlay {
                name: "spain".to_string()
            }),
            Outcome::PlayRejected(PlayRejection::Duplicate {
                existing: "Spain".to_string()
            })
        );
        assert_eq!(
            tagger.apply(Command::Plays),
            Outcome::Plays(vec!["Spain".to_string()])
        );
    }
}
