//! Viewer state management.
//!
//! Holds the loaded replay session and the option table, and turns parsed
//! commands into protocol output. Options set before `load` apply to the
//! session that is loaded next; options set afterwards apply immediately.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;

use tracing::{error, warn};

use crate::protocol::notation::{format_verification, LineBuffer};
use crate::protocol::parser::Command;
use crate::protocol::record::{MatchRecord, MoveRecord, RecordError};
use crate::session::{ReplaySession, SessionError, SessionOptions};

/// Holds the mutable state of the viewer between commands.
pub struct Driver {
    pub session: Option<ReplaySession>,
    pub options: HashMap<String, String>,
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

/// Parses an option value as a boolean, accepting the usual spellings.
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Driver {
    /// Creates a driver with no session loaded.
    pub fn new() -> Self {
        Driver {
            session: None,
            options: HashMap::new(),
        }
    }

    /// Sets an option. A missing value means `true`.
    pub fn set_option(&mut self, name: String, value: Option<String>) {
        let value = value.unwrap_or_else(|| "true".to_string());
        self.options.insert(name, value);
        let options = self.session_options();
        if let Some(session) = self.session.as_mut() {
            session.options = options;
        }
    }

    fn bool_option(&self, name: &str, default: bool) -> bool {
        match self.options.get(name) {
            Some(v) => parse_bool(v).unwrap_or_else(|| {
                warn!("option {} has non-boolean value '{}', using {}", name, v, default);
                default
            }),
            None => default,
        }
    }

    /// Session options derived from the option table, with defaults.
    pub fn session_options(&self) -> SessionOptions {
        let defaults = SessionOptions::default();
        SessionOptions {
            auto_score: self.bool_option("AutoScore", defaults.auto_score),
            futures: self.bool_option("Futures", defaults.futures),
            splurge_budget: self.bool_option("SplurgeBudget", defaults.splurge_budget),
        }
    }

    /// Loads a match record and starts a session at turn 0.
    pub fn load(&mut self, path: &Path) -> Result<(), SessionError> {
        let record = MatchRecord::load(path)?;
        self.session = Some(ReplaySession::from_record(&record, self.session_options())?);
        Ok(())
    }

    /// Dispatches one command. Returns `false` when the loop should stop.
    pub fn handle<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<bool> {
        match cmd {
            Command::Quit => return Ok(false),
            Command::IsReady => writeln!(out, "readyok")?,
            Command::SetOption { name, value } => self.set_option(name, value),
            Command::Load { path } => self.handle_load(&path, out)?,
            Command::Seek { turn } => self.with_session(out, |s, buf| {
                s.request_seek(turn);
                s.flush(buf).map(|_| ())
            })?,
            Command::Next => self.with_session(out, |s, buf| s.step(1, buf))?,
            Command::Prev => self.with_session(out, |s, buf| s.step(-1, buf))?,
            Command::Scores => self.with_session(out, |s, buf| {
                s.emit_scores(buf);
                Ok(())
            })?,
            Command::Status => self.handle_status(out)?,
            Command::Verify => self.handle_verify(out)?,
            Command::Move { json } => self.handle_move(&json, out)?,
        }
        out.flush()?;
        Ok(true)
    }

    fn handle_load<W: Write>(&mut self, path: &str, out: &mut W) -> io::Result<()> {
        if let Err(e) = self.load(Path::new(path)) {
            error!("load failed: {}", e);
            self.session = None;
            return writeln!(out, "error {}", e);
        }
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let graph = session.graph();
        writeln!(
            out,
            "loaded sites {} rivers {} mines {} punters {} moves {}",
            graph.site_count(),
            graph.river_count(),
            graph.mines().len(),
            session.player_count(),
            session.move_count()
        )?;
        if session.options.auto_score {
            let mut buf = LineBuffer::default();
            session.emit_scores(&mut buf);
            write_lines(out, &buf.lines)?;
        }
        Ok(())
    }

    fn handle_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match &self.session {
            Some(s) => writeln!(
                out,
                "status turn {} of {} {}",
                s.current_turn(),
                s.move_count(),
                if s.is_live() { "live" } else { "behind" }
            ),
            None => writeln!(out, "status empty"),
        }
    }

    fn handle_verify<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(session) = &self.session else {
            return writeln!(out, "error no match loaded");
        };
        match session.verify() {
            Ok(v) => write_lines(out, &format_verification(&v)),
            Err(e) => writeln!(out, "error {}", e),
        }
    }

    fn handle_move<W: Write>(&mut self, json: &str, out: &mut W) -> io::Result<()> {
        let parsed = MoveRecord::from_json(json).and_then(|record| {
            let turn = self.session.as_ref().map_or(0, |s| s.move_count());
            let mv = record.to_move().ok_or(RecordError::MissingAction { turn })?;
            Ok((mv, record.score_rows()))
        });
        let (mv, recorded) = match parsed {
            Ok(p) => p,
            Err(e) => return writeln!(out, "rejected {}", e),
        };

        let Some(session) = self.session.as_mut() else {
            return writeln!(out, "error no match loaded");
        };
        let mut buf = LineBuffer::default();
        match session.push_move(mv, recorded, &mut buf) {
            Ok(_) => {
                writeln!(out, "appended {}", session.move_count())?;
                write_lines(out, &buf.lines)
            }
            Err(e) => writeln!(out, "rejected {}", e),
        }
    }

    /// Runs `f` against the loaded session, writing its notifications or
    /// its error.
    fn with_session<W, F>(&mut self, out: &mut W, f: F) -> io::Result<()>
    where
        W: Write,
        F: FnOnce(&mut ReplaySession, &mut LineBuffer) -> Result<(), SessionError>,
    {
        let Some(session) = self.session.as_mut() else {
            return writeln!(out, "error no match loaded");
        };
        let mut buf = LineBuffer::default();
        let result = f(session, &mut buf);
        write_lines(out, &buf.lines)?;
        if let Err(e) = result {
            writeln!(out, "error {}", e)?;
        }
        Ok(())
    }
}

fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parser::parse_command;
    use crate::protocol::record::tests::SAMPLE_MATCH;

    fn driver_with_sample() -> Driver {
        let record = MatchRecord::from_json(SAMPLE_MATCH).unwrap();
        let mut driver = Driver::new();
        driver.session = Some(ReplaySession::from_record(&record, driver.session_options()).unwrap());
        driver
    }

    fn run(driver: &mut Driver, line: &str) -> Vec<String> {
        let mut out = Vec::new();
        let cmd = parse_command(line).unwrap();
        driver.handle(cmd, &mut out).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn new_driver_has_no_session() {
        let driver = Driver::new();
        assert!(driver.session.is_none());
        assert!(driver.options.is_empty());
        assert_eq!(driver.session_options(), SessionOptions::default());
    }

    #[test]
    fn options_map_to_session_options() {
        let mut driver = Driver::new();
        driver.set_option("AutoScore".to_string(), Some("off".to_string()));
        driver.set_option("SplurgeBudget".to_string(), None);
        driver.set_option("Futures".to_string(), Some("maybe".to_string()));
        let opts = driver.session_options();
        assert!(!opts.auto_score);
        assert!(opts.splurge_budget);
        assert!(opts.futures);
    }

    #[test]
    fn options_apply_to_loaded_session() {
        let mut driver = driver_with_sample();
        run(&mut driver, "setoption name AutoScore value false");
        assert!(!driver.session.as_ref().unwrap().options.auto_score);
        let lines = run(&mut driver, "seek 1");
        assert_eq!(lines, vec!["edge 3 4 0"]);
    }

    #[test]
    fn commands_without_session_report_error() {
        let mut driver = Driver::new();
        assert_eq!(run(&mut driver, "seek 3"), vec!["error no match loaded"]);
        assert_eq!(run(&mut driver, "verify"), vec!["error no match loaded"]);
        assert_eq!(run(&mut driver, "status"), vec!["status empty"]);
    }

    #[test]
    fn seek_emits_edges_then_scores() {
        let mut driver = driver_with_sample();
        let lines = run(&mut driver, "seek 2");
        assert_eq!(
            lines,
            vec!["edge 3 4 0", "edge 0 1 0", "scores 2 computed 0=1,1,0"]
        );
        let back = run(&mut driver, "prev");
        assert_eq!(back, vec!["edge 0 1 none", "scores 1 computed 0=0,0,0"]);
    }

    #[test]
    fn final_turn_shows_recorded_scores() {
        let mut driver = driver_with_sample();
        let lines = run(&mut driver, "seek 12");
        let tail: Vec<&String> = lines.iter().filter(|l| !l.starts_with("edge")).collect();
        assert_eq!(tail, vec!["scores 12 recorded 0=32,32,0", "computed 12 0=32,32,0"]);
        assert_eq!(run(&mut driver, "status"), vec!["status turn 12 of 12 live"]);
        assert_eq!(run(&mut driver, "verify"), vec!["verify ok"]);
    }

    #[test]
    fn out_of_range_seek_reports_error() {
        let mut driver = driver_with_sample();
        let lines = run(&mut driver, "seek 40");
        assert_eq!(lines, vec!["error turn 40 is outside 0..=12"]);
        assert_eq!(run(&mut driver, "status"), vec!["status turn 0 of 12 behind"]);
    }

    #[test]
    fn live_moves_append_or_reject() {
        let mut driver = driver_with_sample();
        run(&mut driver, "seek 12");
        let ok = run(&mut driver, r#"move {"pass": {"punter": 0}}"#);
        assert_eq!(ok[0], "appended 13");
        assert_eq!(ok[1], "scores 13 computed 0=32,32,0");

        let bad = run(&mut driver, r#"move {"claim": {"punter": 0, "source": 3, "target": 4}}"#);
        assert_eq!(bad.len(), 1);
        assert!(bad[0].starts_with("rejected "), "{}", bad[0]);

        let garbage = run(&mut driver, "move {not json");
        assert!(garbage[0].starts_with("rejected "));
        assert_eq!(driver.session.as_ref().unwrap().move_count(), 13);
    }

    #[test]
    fn isready_and_quit() {
        let mut driver = Driver::new();
        assert_eq!(run(&mut driver, "isready"), vec!["readyok"]);
        let mut out = Vec::new();
        assert!(!driver.handle(Command::Quit, &mut out).unwrap());
    }
}
