//! Text notation for viewer output.
//!
//! Ownership notifications are written as `edge <a> <b> <owner|none>`.
//! Scores are written as `scores <turn> <recorded|computed>` followed by one
//! `<punter>=<total>,<basic>,<futures>` field per punter.

use crate::board::graph::{EdgeId, River};
use crate::board::moves::PlayerId;
use crate::eval::score::{ScoreReport, ScoreRow};
use crate::session::{ReplayObserver, Verification};

/// Formats an ownership notification.
pub fn format_edge(river: River, owner: Option<PlayerId>) -> String {
    match owner {
        Some(p) => format!("edge {} {} {}", river.a, river.b, p),
        None => format!("edge {} {} none", river.a, river.b),
    }
}

/// Formats score rows as space-separated `punter=total,basic,futures` fields.
pub fn format_rows(rows: &[ScoreRow]) -> String {
    rows.iter()
        .map(|r| format!("{}={},{},{}", r.player, r.total, r.basic, r.futures))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a score report.
///
/// The first line carries the rows to display. When recorded scores exist,
/// a `computed` line follows with the recomputed rows, then one `mismatch`
/// line per punter whose totals disagree.
pub fn format_scores(report: &ScoreReport) -> Vec<String> {
    let source = if report.is_recorded() { "recorded" } else { "computed" };
    let mut lines = vec![format!(
        "scores {} {} {}",
        report.turn,
        source,
        format_rows(report.displayed())
    )];
    if report.is_recorded() {
        lines.push(format!(
            "computed {} {}",
            report.turn,
            format_rows(&report.computed)
        ));
        for m in report.mismatches() {
            lines.push(format!(
                "mismatch score {} computed {} recorded {}",
                m.player, m.computed, m.recorded
            ));
        }
    }
    lines
}

/// Formats a verification result, ending with `verify ok` or
/// `verify failed <count>`.
pub fn format_verification(v: &Verification) -> Vec<String> {
    let mut lines = Vec::new();
    for m in &v.scores {
        lines.push(format!(
            "mismatch score {} computed {} recorded {}",
            m.player, m.computed, m.recorded
        ));
    }
    for m in &v.rivers {
        lines.push(format!(
            "mismatch river {} {} replayed {} recorded {}",
            m.river.a,
            m.river.b,
            owner_token(m.replayed),
            owner_token(m.recorded)
        ));
    }
    if v.is_ok() {
        lines.push("verify ok".to_string());
    } else {
        lines.push(format!("verify failed {}", v.scores.len() + v.rivers.len()));
    }
    lines
}

fn owner_token(owner: Option<PlayerId>) -> String {
    owner.map_or_else(|| "none".to_string(), |p| p.to_string())
}

/// Observer that renders notifications into protocol lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pub lines: Vec<String>,
}

impl LineBuffer {
    /// Returns the buffered lines and clears the buffer.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl ReplayObserver for LineBuffer {
    fn on_edge_ownership_changed(&mut self, _edge: EdgeId, river: River, owner: Option<PlayerId>) {
        self.lines.push(format_edge(river, owner));
    }

    fn on_scores_computed(&mut self, report: &ScoreReport) {
        self.lines.extend(format_scores(report));
    }
}
