use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::events::Event;

/// Per-play efficiency line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRow {
    #[serde(rename = "Play")]
    pub play: String,
    #[serde(rename = "Attempts")]
    pub attempts: u64,
    #[serde(rename = "Points")]
    pub points: u64,
    #[serde(rename = "PPP")]
    pub ppp: f64,
    #[serde(rename = "Frequency")]
    pub frequency: f64,
    #[serde(rename = "Success Rate")]
    pub success_rate: f64,
}

impl MetricsRow {
    fn cells(&self) -> [String; 6] {
        [
            self.play.clone(),
            self.attempts.to_string(),
            self.points.to_string(),
            format!("{:.3}", self.ppp),
            format!("{:.3}", self.frequency),
            format!("{:.3}", self.success_rate),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsTable {
    pub columns: [&'static str; 6],
    pub rows: Vec<MetricsRow>,
}

impl MetricsTable {
    pub const COLUMNS: [&'static str; 6] = [
        "Play",
        "Attempts",
        "Points",
        "PPP",
        "Frequency",
        "Success Rate",
    ];

    pub fn empty() -> Self {
        Self {
            columns: Self::COLUMNS,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, play: &str) -> Option<&MetricsRow> {
        self.rows.iter().find(|r| r.play == play)
    }

    pub fn total_attempts(&self) -> u64 {
        self.rows.iter().map(|r| r.attempts).sum()
    }
}

impl fmt::Display for MetricsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 6]> = self.rows.iter().map(MetricsRow::cells).collect();
        let mut widths = Self::COLUMNS.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }

        // Play name left-aligned, numbers right-aligned.
        let mut header = Vec::with_capacity(6);
        for (i, col) in Self::COLUMNS.iter().enumerate() {
            if i == 0 {
                header.push(format!("{:<w$}", col, w = widths[i]));
            } else {
                header.push(format!("{:>w$}", col, w = widths[i]));
            }
        }
        writeln!(f, "{}", header.join("  ").trim_end())?;
        for row in &cells {
            let mut line = Vec::with_capacity(6);
            for (i, cell) in row.iter().enumerate() {
                if i == 0 {
                    line.push(format!("{:<w$}", cell, w = widths[i]));
                } else {
                    line.push(format!("{:>w$}", cell, w = widths[i]));
                }
            }
            writeln!(f, "{}", line.join("  "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PlayAccumulator {
    attempts: u64,
    points: u64,
    made: u64,
    shot_attempts: u64,
}

impl PlayAccumulator {
    fn ingest(&mut self, event: &Event) {
        self.attempts += 1;
        self.points += u64::from(event.points);
        if event.result.is_shot() {
            self.shot_attempts += 1;
        }
        if event.result.is_made() {
            self.made += 1;
        }
    }

    fn success_rate(&self) -> f64 {
        if self.shot_attempts == 0 {
            0.0
        } else {
            self.made as f64 / self.shot_attempts as f64
        }
    }
}

/// Derive the per-play metrics table from the event log.
///
/// Plays that were never tagged are omitted. Rows sort by PPP, then
/// attempts (both descending), then play name ascending.
pub fn compute_metrics(events: &[Event]) -> MetricsTable {
    if events.is_empty() {
        return MetricsTable::empty();
    }

    let mut groups: HashMap<&str, PlayAccumulator> = HashMap::new();
    for event in events {
        groups.entry(event.play.as_str()).or_default().ingest(event);
    }

    let total: u64 = groups.values().map(|g| g.attempts).sum();
    let denom = total.max(1) as f64;

    let mut rows: Vec<MetricsRow> = groups
        .into_iter()
        .map(|(play, acc)| MetricsRow {
            play: play.to_string(),
            attempts: acc.attempts,
            points: acc.points,
            ppp: acc.points as f64 / acc.attempts as f64,
            frequency: acc.attempts as f64 / denom,
            success_rate: acc.success_rate(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.ppp
            .total_cmp(&a.ppp)
            .then_with(|| b.attempts.cmp(&a.attempts))
            .then_with(|| a.play.cmp(&b.play))
    });

    MetricsTable {
        columns: MetricsTable::COLUMNS,
        rows,
    }
}
