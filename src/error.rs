use thiserror::Error;

/// Errors surfaced by scoreboard operations. None of them abort the run;
/// the driver reports the failure and moves on to the next command.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContestError {
    #[error("competition has started")]
    CompetitionStarted,

    #[error("duplicated team name")]
    DuplicateTeam,

    #[error("scoreboard has been frozen")]
    AlreadyFrozen,

    #[error("scoreboard has not been frozen")]
    NotFrozen,

    #[error("cannot find the team")]
    UnknownTeam,

    #[error("cannot find the problem")]
    UnknownProblem,
}
