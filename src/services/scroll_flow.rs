use tracing::{debug, error, info};

use crate::models::{ContestPhase, ContestState, RankChange, ScrollReport, Team, Verdict};
use crate::services::{board_render, standings};

/// Drains every frozen problem status, one reveal at a time: lowest-ranked
/// team first, lowest-lettered problem first, re-ranking after each reveal.
/// Terminates because each pass clears exactly one frozen flag and nothing
/// re-freezes during the loop.
pub fn run_scroll(state: &mut ContestState, penalty_minutes: i64) -> ScrollReport {
    standings::flush(state, penalty_minutes);
    let opening = board_render::snapshot_rows(state, penalty_minutes);

    let mut reveals = Vec::new();
    loop {
        let order: Vec<String> = standings::ranked_standings(&state.teams, false, penalty_minutes)
            .into_iter()
            .map(|standing| standing.team)
            .collect();

        let Some(team_name) = order
            .iter()
            .rev()
            .find(|name| state.teams[name.as_str()].has_frozen_problem())
            .cloned()
        else {
            break;
        };

        let Some(problem) = state
            .problem_labels
            .iter()
            .find(|label| {
                state.teams[&team_name]
                    .problems
                    .get(label.as_str())
                    .is_some_and(|status| status.frozen)
            })
            .cloned()
        else {
            error!("Team {team_name} reported a frozen status outside the problem set");
            unreachable!()
        };

        let Some(team) = state.teams.get_mut(&team_name) else {
            error!("Ranked team {team_name} missing from the registry");
            unreachable!()
        };
        let old_rank = team.rank;
        debug!("Revealing problem {problem} for {team_name} at rank {old_rank}");
        replay_hidden_submissions(team, &problem);

        standings::flush(state, penalty_minutes);

        let team = &state.teams[&team_name];
        let new_rank = team.rank;
        if new_rank < old_rank {
            // The displaced team is whoever held new_rank before this reveal.
            let displaced = order[new_rank - 1].clone();
            let standing = standings::compute_standing(team, false, penalty_minutes);
            debug!("{team_name} climbed from rank {old_rank} to {new_rank}, displacing {displaced}");
            reveals.push(RankChange {
                team: team_name,
                displaced,
                solved: standing.solved,
                penalty: standing.penalty,
            });
        }
    }

    let closing = board_render::snapshot_rows(state, penalty_minutes);

    state.phase = ContestPhase::Running;
    for team in state.teams.values_mut() {
        for status in team.problems.values_mut() {
            status.pending_after_freeze = 0;
        }
    }
    info!("Scroll complete: {} rank changes", reveals.len());

    ScrollReport {
        opening,
        reveals,
        closing,
    }
}

/// Replays the submissions hidden behind the freeze for one problem, in
/// ledger arrival order. Wrong attempts replayed before an acceptance count
/// toward the penalty; attempts after it are ledger-only.
fn replay_hidden_submissions(team: &mut Team, problem: &str) {
    let replays: Vec<(Verdict, i64)> = team
        .submissions
        .iter()
        .filter(|sub| sub.problem == problem && !sub.before_freeze)
        .map(|sub| (sub.verdict, sub.minute))
        .collect();

    let Some(status) = team.problems.get_mut(problem) else {
        error!("No status recorded for revealed problem {problem}");
        unreachable!()
    };
    status.frozen = false;

    let mut replay_wrong = 0u32;
    for (verdict, minute) in replays {
        if status.solved {
            break;
        }
        if verdict.is_accepted() {
            status.solved = true;
            status.solve_minute = minute;
            status.wrong_before_success = status.wrong_before_freeze + replay_wrong;
        } else {
            replay_wrong += 1;
        }
    }

    if !status.solved {
        status.wrong_before_freeze += replay_wrong;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen_state(problems: &[&str]) -> ContestState {
        let mut state = ContestState::new();
        state.phase = ContestPhase::Frozen;
        state.problem_labels = problems.iter().map(|p| p.to_string()).collect();
        state
    }

    fn add_team(state: &mut ContestState, name: &str) {
        state
            .teams
            .insert(name.to_string(), Team::new(name.to_string()));
    }

    fn submit(
        state: &mut ContestState,
        team: &str,
        problem: &str,
        verdict: Verdict,
        minute: i64,
        frozen: bool,
    ) {
        state
            .teams
            .get_mut(team)
            .expect("team registered")
            .apply_submission(problem, verdict, minute, frozen);
    }

    #[test]
    fn reveal_emits_rank_change_for_climbing_team() {
        let mut state = frozen_state(&["A", "B"]);
        add_team(&mut state, "alpha");
        add_team(&mut state, "beta");
        add_team(&mut state, "gamma");
        submit(&mut state, "alpha", "A", Verdict::Accepted, 10, false);
        submit(&mut state, "beta", "A", Verdict::WrongAnswer, 15, false);
        submit(&mut state, "beta", "A", Verdict::Accepted, 20, false);
        submit(&mut state, "gamma", "B", Verdict::Accepted, 100, true);
        submit(&mut state, "beta", "B", Verdict::Accepted, 110, true);

        let report = run_scroll(&mut state, 20);

        // gamma reveals first (lowest rank) but stays third; beta's reveal
        // lifts it past alpha.
        assert_eq!(
            report.reveals,
            vec![RankChange {
                team: "beta".to_string(),
                displaced: "alpha".to_string(),
                solved: 2,
                penalty: 150,
            }]
        );
        assert_eq!(state.teams["beta"].rank, 1);
        assert_eq!(state.teams["alpha"].rank, 2);
        assert_eq!(state.teams["gamma"].rank, 3);
        assert_eq!(report.closing[0].team, "beta");
    }

    #[test]
    fn scroll_clears_every_frozen_flag_and_counter() {
        let mut state = frozen_state(&["A", "B"]);
        add_team(&mut state, "delta");
        submit(&mut state, "delta", "B", Verdict::WrongAnswer, 90, true);
        submit(&mut state, "delta", "B", Verdict::RuntimeError, 95, true);

        run_scroll(&mut state, 20);

        assert_eq!(state.phase, ContestPhase::Running);
        let status = &state.teams["delta"].problems["B"];
        assert!(!status.frozen);
        assert!(!status.solved);
        assert_eq!(status.wrong_before_freeze, 2);
        assert_eq!(status.pending_after_freeze, 0);
    }

    #[test]
    fn replay_counts_wrong_attempts_before_hidden_acceptance() {
        let mut state = frozen_state(&["A"]);
        add_team(&mut state, "echo");
        submit(&mut state, "echo", "A", Verdict::WrongAnswer, 5, false);
        submit(&mut state, "echo", "A", Verdict::WrongAnswer, 60, true);
        submit(&mut state, "echo", "A", Verdict::Accepted, 70, true);
        submit(&mut state, "echo", "A", Verdict::WrongAnswer, 80, true);

        run_scroll(&mut state, 20);

        let status = &state.teams["echo"].problems["A"];
        assert!(status.solved);
        assert_eq!(status.solve_minute, 70);
        // one pre-freeze wrong plus one replayed wrong before the acceptance
        assert_eq!(status.wrong_before_success, 2);

        let standing = standings::compute_standing(&state.teams["echo"], false, 20);
        assert_eq!(standing.penalty, 110);
    }

    #[test]
    fn hidden_progress_is_invisible_until_scroll() {
        let mut state = frozen_state(&["A"]);
        add_team(&mut state, "echo");
        submit(&mut state, "echo", "A", Verdict::Accepted, 40, true);

        standings::flush(&mut state, 20);
        let before = standings::compute_standing(&state.teams["echo"], false, 20);
        assert_eq!(before.solved, 0);

        run_scroll(&mut state, 20);
        let after = standings::compute_standing(&state.teams["echo"], false, 20);
        assert_eq!(after.solved, 1);
        assert_eq!(after.penalty, 40);
    }

    #[test]
    fn reveals_walk_lowest_problem_first() {
        let mut state = frozen_state(&["A", "B", "C"]);
        add_team(&mut state, "foxtrot");
        add_team(&mut state, "golf");
        submit(&mut state, "golf", "A", Verdict::Accepted, 10, false);
        submit(&mut state, "foxtrot", "C", Verdict::Accepted, 30, true);
        submit(&mut state, "foxtrot", "B", Verdict::Accepted, 50, true);

        let report = run_scroll(&mut state, 20);

        // B reveals before C; the first reveal alone does not pass golf,
        // the second does.
        assert_eq!(report.reveals.len(), 1);
        assert_eq!(report.reveals[0].team, "foxtrot");
        assert_eq!(report.reveals[0].displaced, "golf");
        assert_eq!(report.reveals[0].solved, 2);
        assert_eq!(report.reveals[0].penalty, 80);
    }
}
