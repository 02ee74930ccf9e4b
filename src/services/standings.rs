use std::collections::HashMap;

use crate::models::{ContestState, Standing, Team};

/// Recomputes one team's visible score from its problem statuses. A problem
/// counts only if it is solved and not hidden behind the freeze.
pub fn compute_standing(team: &Team, include_frozen: bool, penalty_minutes: i64) -> Standing {
    let mut solved = 0u32;
    let mut penalty = 0i64;
    let mut solve_minutes = Vec::new();

    for status in team.problems.values() {
        if status.solved && (include_frozen || !status.frozen) {
            solved += 1;
            penalty +=
                status.solve_minute + penalty_minutes * i64::from(status.wrong_before_success);
            solve_minutes.push(status.solve_minute);
        }
    }

    solve_minutes.sort_unstable_by(|a, b| b.cmp(a));

    Standing {
        team: team.name.clone(),
        solved,
        penalty,
        solve_minutes,
    }
}

/// Every team's standing in rank order, best first.
pub fn ranked_standings(
    teams: &HashMap<String, Team>,
    include_frozen: bool,
    penalty_minutes: i64,
) -> Vec<Standing> {
    let mut standings: Vec<Standing> = teams
        .values()
        .map(|team| compute_standing(team, include_frozen, penalty_minutes))
        .collect();
    standings.sort();
    standings
}

/// Recomputes and stores every team's rank from the frozen-aware order.
/// Idempotent: repeated calls without intervening submissions are no-ops.
pub fn flush(state: &mut ContestState, penalty_minutes: i64) -> Vec<Standing> {
    let standings = ranked_standings(&state.teams, false, penalty_minutes);
    for (index, standing) in standings.iter().enumerate() {
        if let Some(team) = state.teams.get_mut(&standing.team) {
            team.rank = index + 1;
        }
    }
    standings
}
