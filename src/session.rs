use chrono::{DateTime, Local};

use crate::events::{Event, EventLog, GameContext, ShotResult};
use crate::logging::{
    log_metrics, log_play_added, log_play_rejected, log_reset, log_tag, log_unknown_play,
    ProfileScope,
};
use crate::metrics::{compute_metrics, MetricsTable};
use crate::playbook::{PlayRejection, Playbook};

/// One game's playbook and event log, owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    playbook: Playbook,
    log: EventLog,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the playbook. Rejected names are logged and skipped.
    pub fn with_plays<I, S>(plays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut session = Self::new();
        for play in plays {
            let _ = session.add_play(play.as_ref());
        }
        session
    }

    pub fn add_play(&mut self, name: &str) -> Result<(), PlayRejection> {
        match self.playbook.add(name) {
            Ok(()) => {
                log_play_added(name.trim(), self.playbook.len());
                Ok(())
            }
            Err(rejection) => {
                log_play_rejected(name, rejection.reason());
                Err(rejection)
            }
        }
    }

    pub fn list_plays(&self) -> &[String] {
        self.playbook.plays()
    }

    pub fn playbook(&self) -> &Playbook {
        &self.playbook
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
        // Registered plays are stored under their playbook spelling.
        let name = match self.playbook.find(play) {
            Some(stored) => stored.to_string(),
            None => {
                log_unknown_play(play);
                play.to_string()
            }
        };
        self.log.tag_at(&name, result, ctx, timestamp);
        let state_hash = self.log.digest();
        let events = self.log.events();
        let event = &events[events.len() - 1];
        log_tag(event, events.len(), &state_hash);
        event
    }

    /// Empties the event log. The playbook is kept.
    pub fn clear_log(&mut self) {
        let cleared = self.log.len();
        self.log.clear();
        log_reset(cleared, self.playbook.len());
    }

    pub fn reset(&mut self) {
        self.clear_log();
    }

    pub fn events(&self) -> &[Event] {
        self.log.events()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn compute_metrics(&self) -> MetricsTable {
        let _scope = ProfileScope::new("compute_metrics");
        let table = compute_metrics(self.log.events());
        log_metrics(&table);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Quarter;
    use crate::logging::use_temp_log_dir;
    use chrono::NaiveDate;

    fn ctx() -> GameContext {
        GameContext {
            opponent: "Rivals".to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            quarter: Quarter::Fourth,
        }
    }

    #[test]
    fn test_with_plays_skips_rejections() {
        use_temp_log_dir();
        let session = GameSession::with_plays(["Horns", "", "horns", "Floppy"]);
        assert_eq!(session.list_plays(), &["Horns", "Floppy"]);
    }

    #[test]
    fn test_add_play_reports_reason() {
        use_temp_log_dir();
        let mut session = GameSession::new();
        assert!(session.add_play("Spain").is_ok());
        assert_eq!(session.add_play("  ").unwrap_err().reason(), "empty");
        assert_eq!(session.add_play("SPAIN").unwrap_err().reason(), "duplicate");
        assert_eq!(session.list_plays().len(), 1);
    }

    #[test]
    fn test_tag_returns_appended_event() {
        use_temp_log_dir();
        let mut session = GameSession::with_plays(["Spain"]);
        let event = session.tag("Spain", ShotResult::Made3, &ctx()).clone();
        assert_eq!(event.points, 3);
        assert_eq!(event.opponent, "Rivals");
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.events()[0], event);
    }

    #[test]
    fn test_tag_unknown_play_still_recorded() {
        use_temp_log_dir();
        let mut session = GameSession::new();
        session.tag("Iso", ShotResult::Missed2, &ctx());
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.compute_metrics().row("Iso").unwrap().attempts, 1);
    }

    #[test]
    fn test_reset_keeps_playbook() {
        use_temp_log_dir();
        let mut session = GameSession::with_plays(["Spain", "Horns"]);
        session.tag("Spain", ShotResult::Made2, &ctx());
        session.tag("Horns", ShotResult::Foul, &ctx());
        assert_eq!(session.compute_metrics().len(), 2);

        session.reset();
        assert!(session.events().is_empty());
        assert!(session.compute_metrics().is_empty());
        assert_eq!(session.list_plays().len(), 2);
    }

    #[test]
    fn test_tag_uses_playbook_spelling() {
        use_temp_log_dir();
        let mut session = GameSession::with_plays(["Horns"]);
        session.tag("Horns", ShotResult::Made2, &ctx());
        let event = session.tag("horns", ShotResult::Missed2, &ctx()).clone();
        assert_eq!(event.play, "Horns");

        let table = session.compute_metrics();
        assert_eq!(table.len(), 1);
        assert_eq!(table.row("Horns").unwrap().attempts, 2);
        assert!(table.row("horns").is_none());
    }

    #[test]
    fn test_unregistered_play_keeps_raw_name() {
        use_temp_log_dir();
        let mut session = GameSession::with_plays(["Horns"]);
        let event = session.tag("Iso Left", ShotResult::Made3, &ctx()).clone();
        assert_eq!(event.play, "Iso Left");
    }
}
