use std::fs::File;
use std::io::{self, BufRead, BufReader};

use anyhow::{Context, Result};
use serde_json::json;

use playtagger::config::Config;
use playtagger::logging::{log, obj, v_str, Domain, Level};
use playtagger::metrics::MetricsTable;
use playtagger::script::{parse_command, Outcome, Tagger};
use playtagger::session::GameSession;

fn print_metrics(table: &MetricsTable, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(table)?);
    } else {
        print!("{}", table);
    }
    Ok(())
}

fn report(tagger: &Tagger, outcome: Outcome, cfg: &Config) -> Result<()> {
    match outcome {
        Outcome::PlayAdded(play) => println!("added play: {}", play),
        Outcome::PlayRejected(rejection) => eprintln!("warning: {}", rejection),
        Outcome::ContextUpdated { header: Some(header) } => println!("Game: {}", header),
        Outcome::ContextUpdated { header: None } => {
            eprintln!("warning: select opponent, game date and quarter to begin tagging")
        }
        Outcome::NotReady => {
            eprintln!("warning: select opponent, game date and quarter to begin tagging")
        }
        Outcome::UnknownResult(result) => eprintln!("warning: unknown result: {}", result),
        Outcome::Tagged(event) => {
            println!(
                "[{}] {} -> {} (+{})",
                event.timestamp_label(),
                event.play,
                event.result,
                event.points
            );
            print_metrics(&tagger.session.compute_metrics(), cfg.print_json)?;
        }
        Outcome::Reset => {
            println!("game state cleared");
            print_metrics(&tagger.session.compute_metrics(), cfg.print_json)?;
        }
        Outcome::Metrics(table) => print_metrics(&table, cfg.print_json)?,
        Outcome::Plays(plays) => {
            for play in plays {
                println!("- {}", play);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let session = GameSession::with_plays(&cfg.playbook);
    let mut tagger = Tagger::new(session, cfg.setup());

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("playbook_size", json!(tagger.session.list_plays().len())),
            ("ready", json!(tagger.setup.ready().is_some())),
        ]),
    );

    // Commands come from the file named on the command line, or stdin.
    let reader: Box<dyn BufRead> = match std::env::args().nth(1) {
        Some(path) => Box::new(BufReader::new(
            File::open(&path).with_context(|| format!("cannot open {}", path))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut applied = 0u64;
    let mut skipped = 0u64;
    for line in reader.lines() {
        let line = line.context("reading commands")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command = match parse_command(trimmed) {
            Ok(c) => c,
            Err(err) => {
                eprintln!("{:#}", err);
                skipped += 1;
                continue;
            }
        };
        let outcome = tagger.apply(command);
        report(&tagger, outcome, &cfg)?;
        applied += 1;
    }

    log(
        Level::Info,
        Domain::System,
        "shutdown",
        obj(&[
            ("commands", json!(applied)),
            ("skipped", json!(skipped)),
            ("events", json!(tagger.session.events().len())),
            ("state_hash", v_str(&tagger.session.log().digest())),
        ]),
    );
    Ok(())
}
