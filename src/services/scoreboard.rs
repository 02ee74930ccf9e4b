use chrono::Duration;
use tracing::{info, warn};

use crate::error::ContestError;
use crate::models::{
    BoardRow, ContestPhase, ContestState, ProblemFilter, ScrollReport, Submission, Team, Verdict,
    VerdictFilter,
};
use crate::services::{board_render, scroll_flow, standings};

/// The contest state machine. Every operation runs to completion before the
/// next command is processed; command order in the input stream is the only
/// ordering guarantee there is.
pub struct Scoreboard {
    state: ContestState,
    penalty_minutes: i64,
}

impl Scoreboard {
    pub fn new(penalty_minutes: i64) -> Self {
        Self {
            state: ContestState::new(),
            penalty_minutes,
        }
    }

    pub fn phase(&self) -> ContestPhase {
        self.state.phase
    }

    pub fn add_team(&mut self, name: &str) -> Result<(), ContestError> {
        if self.state.phase != ContestPhase::Setup {
            return Err(ContestError::CompetitionStarted);
        }
        if self.state.teams.contains_key(name) {
            return Err(ContestError::DuplicateTeam);
        }
        self.state
            .teams
            .insert(name.to_string(), Team::new(name.to_string()));
        info!("Registered team {name}");
        Ok(())
    }

    /// Fixes the problem set as the first `problem_count` letters and seeds
    /// initial ranks from team-name order.
    pub fn start(&mut self, duration_minutes: i64, problem_count: usize) -> Result<(), ContestError> {
        if self.state.phase != ContestPhase::Setup {
            return Err(ContestError::CompetitionStarted);
        }

        self.state.duration = Some(Duration::minutes(duration_minutes));
        self.state.problem_labels = (0..problem_count)
            .map(|index| char::from(b'A' + index as u8).to_string())
            .collect();

        let mut names: Vec<String> = self.state.teams.keys().cloned().collect();
        names.sort();
        for (index, name) in names.iter().enumerate() {
            if let Some(team) = self.state.teams.get_mut(name) {
                team.rank = index + 1;
            }
        }

        self.state.phase = ContestPhase::Running;
        info!(
            "Competition started: {} minutes, {} problems, {} teams",
            duration_minutes,
            problem_count,
            self.state.teams.len()
        );
        Ok(())
    }

    /// Appends to the ledger and updates the problem status. Unknown team or
    /// problem references are rejected instead of being materialized.
    pub fn submit(
        &mut self,
        problem: &str,
        team_name: &str,
        verdict: Verdict,
        minute: i64,
    ) -> Result<(), ContestError> {
        if !self.state.problem_labels.iter().any(|label| label == problem) {
            return Err(ContestError::UnknownProblem);
        }
        if let Some(duration) = self.state.duration
            && minute > duration.num_minutes()
        {
            warn!("Submission for {team_name} at minute {minute} is past the contest duration");
        }
        let frozen = self.state.phase == ContestPhase::Frozen;
        let Some(team) = self.state.teams.get_mut(team_name) else {
            return Err(ContestError::UnknownTeam);
        };
        team.apply_submission(problem, verdict, minute, frozen);
        Ok(())
    }

    pub fn flush(&mut self) {
        standings::flush(&mut self.state, self.penalty_minutes);
    }

    pub fn freeze(&mut self) -> Result<(), ContestError> {
        match self.state.phase {
            ContestPhase::Frozen => Err(ContestError::AlreadyFrozen),
            ContestPhase::Setup | ContestPhase::Running => {
                self.state.phase = ContestPhase::Frozen;
                info!("Scoreboard frozen");
                Ok(())
            }
        }
    }

    pub fn scroll(&mut self) -> Result<ScrollReport, ContestError> {
        if self.state.phase != ContestPhase::Frozen {
            return Err(ContestError::NotFrozen);
        }
        Ok(scroll_flow::run_scroll(&mut self.state, self.penalty_minutes))
    }

    /// Returns the stored rank plus a staleness flag: while frozen, ranks may
    /// not reflect hidden submissions until a scroll happens.
    pub fn query_ranking(&self, team_name: &str) -> Result<(usize, bool), ContestError> {
        let team = self
            .state
            .teams
            .get(team_name)
            .ok_or(ContestError::UnknownTeam)?;
        Ok((team.rank, self.state.phase == ContestPhase::Frozen))
    }

    /// Most recent ledger entry matching both filters, if any.
    pub fn query_submission(
        &self,
        team_name: &str,
        problem: &ProblemFilter,
        verdict: VerdictFilter,
    ) -> Result<Option<&Submission>, ContestError> {
        let team = self
            .state
            .teams
            .get(team_name)
            .ok_or(ContestError::UnknownTeam)?;
        Ok(team
            .submissions
            .iter()
            .rev()
            .find(|sub| problem.matches(&sub.problem) && verdict.matches(sub.verdict)))
    }

    pub fn snapshot(&self) -> Vec<BoardRow> {
        board_render::snapshot_rows(&self.state, self.penalty_minutes)
    }
}
