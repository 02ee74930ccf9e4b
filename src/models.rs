use std::collections::HashMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    #[serde(rename = "Accepted")]
    Accepted,
    #[serde(rename = "Wrong_Answer")]
    WrongAnswer,
    #[serde(rename = "Runtime_Error")]
    RuntimeError,
    #[serde(rename = "Time_Limit_Exceed")]
    TimeLimitExceed,
}

impl Verdict {
    pub fn parse(label: &str) -> Option<Verdict> {
        match label {
            "Accepted" => Some(Verdict::Accepted),
            "Wrong_Answer" => Some(Verdict::WrongAnswer),
            "Runtime_Error" => Some(Verdict::RuntimeError),
            "Time_Limit_Exceed" => Some(Verdict::TimeLimitExceed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong_Answer",
            Verdict::RuntimeError => "Runtime_Error",
            Verdict::TimeLimitExceed => "Time_Limit_Exceed",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemFilter {
    Any,
    Named(String),
}

impl ProblemFilter {
    pub fn parse(token: &str) -> ProblemFilter {
        if token == "ALL" {
            ProblemFilter::Any
        } else {
            ProblemFilter::Named(token.to_string())
        }
    }

    pub fn matches(&self, problem: &str) -> bool {
        match self {
            ProblemFilter::Any => true,
            ProblemFilter::Named(name) => name == problem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictFilter {
    Any,
    Exact(Verdict),
}

impl VerdictFilter {
    pub fn parse(token: &str) -> Option<VerdictFilter> {
        if token == "ALL" {
            Some(VerdictFilter::Any)
        } else {
            Verdict::parse(token).map(VerdictFilter::Exact)
        }
    }

    pub fn matches(&self, verdict: Verdict) -> bool {
        match self {
            VerdictFilter::Any => true,
            VerdictFilter::Exact(expected) => *expected == verdict,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub problem: String,
    pub verdict: Verdict,
    pub minute: i64,
    pub before_freeze: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProblemStatus {
    pub solved: bool,
    /// Only meaningful while solved is true.
    pub solve_minute: i64,
    pub wrong_before_success: u32,
    pub wrong_before_freeze: u32,
    pub pending_after_freeze: u32,
    /// While frozen, submissions made after the freeze are hidden from ranking.
    pub frozen: bool,
}

#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub rank: usize,
    pub problems: HashMap<String, ProblemStatus>,
    pub submissions: Vec<Submission>,
}

impl Team {
    pub fn new(name: String) -> Self {
        Self {
            name,
            rank: 0,
            problems: HashMap::new(),
            submissions: Vec::new(),
        }
    }

    /// Records a submission in the ledger and folds it into the problem status.
    /// First acceptance wins: a solved status never changes again.
    pub fn apply_submission(&mut self, problem: &str, verdict: Verdict, minute: i64, frozen: bool) {
        self.submissions.push(Submission {
            problem: problem.to_string(),
            verdict,
            minute,
            before_freeze: !frozen,
        });

        let status = self.problems.entry(problem.to_string()).or_default();
        if frozen {
            if !status.solved {
                status.frozen = true;
                status.pending_after_freeze += 1;
            }
        } else if !status.solved {
            if verdict.is_accepted() {
                status.solved = true;
                status.solve_minute = minute;
                status.wrong_before_success = status.wrong_before_freeze;
            } else {
                status.wrong_before_freeze += 1;
            }
        }
    }

    pub fn has_frozen_problem(&self) -> bool {
        self.problems.values().any(|status| status.frozen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestPhase {
    Setup,
    Running,
    Frozen,
}

#[derive(Debug)]
pub struct ContestState {
    pub phase: ContestPhase,
    pub duration: Option<Duration>,
    pub problem_labels: Vec<String>,
    pub teams: HashMap<String, Team>,
}

impl ContestState {
    pub fn new() -> Self {
        ContestState {
            phase: ContestPhase::Setup,
            duration: None,
            problem_labels: Vec::new(),
            teams: HashMap::new(),
        }
    }
}

/// A team's visible score at one point in time, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub team: String,
    pub solved: u32,
    pub penalty: i64,
    /// Solve minutes of counted problems, sorted descending.
    pub solve_minutes: Vec<i64>,
}

impl PartialEq for Standing {
    fn eq(&self, other: &Self) -> bool {
        self.team == other.team
    }
}

impl Eq for Standing {}

impl PartialOrd for Standing {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Standing {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by solved problem count
        if self.solved != other.solved {
            return other.solved.cmp(&self.solved);
        }
        // Sort by penalty time
        if self.penalty != other.penalty {
            return self.penalty.cmp(&other.penalty);
        }
        // Compare solve minutes largest-first; the earlier worst solve wins
        match self.solve_minutes.cmp(&other.solve_minutes) {
            std::cmp::Ordering::Equal => self.team.cmp(&other.team),
            ordering => ordering,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProblemCell {
    Untried,
    Failing { wrong: u32 },
    Solved { wrong: u32 },
    Frozen { wrong: u32, pending: u32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardRow {
    pub team: String,
    pub rank: usize,
    pub solved: u32,
    pub penalty: i64,
    pub cells: Vec<ProblemCell>,
}

/// Emitted during a scroll when a reveal moves a team up the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankChange {
    pub team: String,
    pub displaced: String,
    pub solved: u32,
    pub penalty: i64,
}

#[derive(Debug)]
pub struct ScrollReport {
    pub opening: Vec<BoardRow>,
    pub reveals: Vec<RankChange>,
    pub closing: Vec<BoardRow>,
}
