use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::{BoardRow, ContestState, ProblemCell, ProblemStatus, RankChange};
use crate::services::standings;

/// Builds the visible scoreboard, best team first. Rows carry the rank
/// stored by the last flush; standings are recomputed fresh.
pub fn snapshot_rows(state: &ContestState, penalty_minutes: i64) -> Vec<BoardRow> {
    standings::ranked_standings(&state.teams, false, penalty_minutes)
        .into_iter()
        .map(|standing| {
            let team = &state.teams[&standing.team];
            BoardRow {
                rank: team.rank,
                solved: standing.solved,
                penalty: standing.penalty,
                cells: state
                    .problem_labels
                    .iter()
                    .map(|label| cell_for(team.problems.get(label)))
                    .collect(),
                team: standing.team,
            }
        })
        .collect()
}

fn cell_for(status: Option<&ProblemStatus>) -> ProblemCell {
    match status {
        None => ProblemCell::Untried,
        Some(status) if status.frozen => ProblemCell::Frozen {
            wrong: status.wrong_before_freeze,
            pending: status.pending_after_freeze,
        },
        Some(status) if status.solved => ProblemCell::Solved {
            wrong: status.wrong_before_success,
        },
        Some(status) if status.wrong_before_freeze == 0 => ProblemCell::Untried,
        Some(status) => ProblemCell::Failing {
            wrong: status.wrong_before_freeze,
        },
    }
}

pub fn format_cell(cell: ProblemCell) -> String {
    match cell {
        ProblemCell::Untried => ".".to_string(),
        ProblemCell::Failing { wrong } => format!("-{wrong}"),
        ProblemCell::Solved { wrong: 0 } => "+".to_string(),
        ProblemCell::Solved { wrong } => format!("+{wrong}"),
        ProblemCell::Frozen { wrong: 0, pending } => format!("0/{pending}"),
        ProblemCell::Frozen { wrong, pending } => format!("-{wrong}/{pending}"),
    }
}

pub fn format_row(row: &BoardRow) -> String {
    let mut line = format!("{} {} {} {}", row.team, row.rank, row.solved, row.penalty);
    for cell in &row.cells {
        line.push(' ');
        line.push_str(&format_cell(*cell));
    }
    line
}

pub fn format_rank_change(change: &RankChange) -> String {
    format!(
        "{} {} {} {}",
        change.team, change.displaced, change.solved, change.penalty
    )
}

/// Serializes the final standings to the configured path.
pub fn export_standings(path: &Path, rows: &[BoardRow]) -> Result<()> {
    let payload = serde_json::to_string_pretty(rows).context("serializing standings")?;
    fs::write(path, payload)
        .with_context(|| format!("writing standings to {}", path.display()))?;
    info!("Exported {} standings rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContestPhase, Team, Verdict};

    #[test]
    fn cell_grammar_matches_board_format() {
        assert_eq!(format_cell(ProblemCell::Untried), ".");
        assert_eq!(format_cell(ProblemCell::Failing { wrong: 3 }), "-3");
        assert_eq!(format_cell(ProblemCell::Solved { wrong: 0 }), "+");
        assert_eq!(format_cell(ProblemCell::Solved { wrong: 2 }), "+2");
        assert_eq!(
            format_cell(ProblemCell::Frozen {
                wrong: 0,
                pending: 1
            }),
            "0/1"
        );
        assert_eq!(
            format_cell(ProblemCell::Frozen {
                wrong: 2,
                pending: 3
            }),
            "-2/3"
        );
    }

    #[test]
    fn wrong_attempt_during_freeze_renders_pending_cell() {
        let mut state = ContestState::new();
        state.phase = ContestPhase::Frozen;
        state.problem_labels = vec!["A".to_string(), "B".to_string()];
        let mut team = Team::new("cobalt".to_string());
        team.rank = 1;
        team.apply_submission("B", Verdict::WrongAnswer, 100, true);
        state.teams.insert(team.name.clone(), team);

        let rows = snapshot_rows(&state, 20);
        assert_eq!(rows.len(), 1);
        assert_eq!(format_row(&rows[0]), "cobalt 1 0 0 . 0/1");
    }

    #[test]
    fn untried_problems_render_as_dots() {
        let mut state = ContestState::new();
        state.problem_labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let mut team = Team::new("cobalt".to_string());
        team.rank = 1;
        team.apply_submission("A", Verdict::WrongAnswer, 5, false);
        team.apply_submission("A", Verdict::Accepted, 15, false);
        state.teams.insert(team.name.clone(), team);

        let rows = snapshot_rows(&state, 20);
        assert_eq!(format_row(&rows[0]), "cobalt 1 1 35 +1 . .");
    }
}
