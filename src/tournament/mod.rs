//! The tournament: five teams play a round robin, the best four go through
//! to the semifinals, and the two semifinal winners meet in the final.
//!
//! All the advancement and scoring rules live in the submodules of this
//! module; the pages that drive them sit next to the rules they call.

use std::fmt;

use axum::response::Redirect;

use crate::{
    flash::Flash,
    util_resp::{StandardResponse, err_not_found, see_other_flash},
};

pub mod challenges;
pub mod dashboard;
pub mod draws;
pub mod matches;
pub mod teams;

/// The tournament only supports exactly this many teams.
pub const TEAMS_IN_TOURNAMENT: usize = 5;

/// How many group matches must be finished before the semifinals may be
/// drawn.
pub const MIN_FINISHED_GROUP_MATCHES: i64 = 6;

pub const POINTS_FOR_WIN: i64 = 3;
pub const POINTS_FOR_TIE: i64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Groups,
    Semifinal,
    Final,
}

impl Phase {
    pub fn as_code(&self) -> &'static str {
        match self {
            Phase::Groups => "GROUPS",
            Phase::Semifinal => "SEMIFINAL",
            Phase::Final => "FINAL",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "GROUPS" => Some(Phase::Groups),
            "SEMIFINAL" => Some(Phase::Semifinal),
            "FINAL" => Some(Phase::Final),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Groups => "Group stage",
            Phase::Semifinal => "Semifinal",
            Phase::Final => "Final",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
}

impl MatchStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "P",
            MatchStatus::InProgress => "E",
            MatchStatus::Finished => "F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(MatchStatus::Scheduled),
            "E" => Some(MatchStatus::InProgress),
            "F" => Some(MatchStatus::Finished),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "Scheduled",
            MatchStatus::InProgress => "In progress",
            MatchStatus::Finished => "Finished",
        }
    }
}

/// Reasons a tournament operation was refused.
///
/// The error messages will be shown on the application page, and therefore
/// should be readable.
#[derive(Debug)]
pub enum BracketError {
    WrongTeamCount { expected: usize, found: usize },
    NotEnoughTeamsForSemifinals { found: usize },
    GroupStageIncomplete { finished: i64 },
    SemifinalsUndecided { decided: usize },
    NoChallenges,
    ResultAlreadyRecorded,
    InvalidTeamName(String),
    TeamNotFound,
    MatchNotFound,
    ChallengeNotFound,
    Database(diesel::result::Error),
}

impl fmt::Display for BracketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketError::WrongTeamCount { expected, found } => write!(
                f,
                "Exactly {expected} teams are needed for the tournament \
                 (there are currently {found})."
            ),
            BracketError::NotEnoughTeamsForSemifinals { found } => write!(
                f,
                "There are not enough teams to generate the semifinals \
                 (4 are needed, there are {found})."
            ),
            BracketError::GroupStageIncomplete { finished } => write!(
                f,
                "At least {MIN_FINISHED_GROUP_MATCHES} group matches must be \
                 finished before the semifinals ({finished} finished so far)."
            ),
            BracketError::SemifinalsUndecided { decided } => write!(
                f,
                "Both semifinals must have a winner before the final can be \
                 generated ({decided} decided so far)."
            ),
            BracketError::NoChallenges => {
                write!(f, "There are no challenges to choose from.")
            }
            BracketError::ResultAlreadyRecorded => write!(
                f,
                "A result has already been recorded for this match."
            ),
            BracketError::InvalidTeamName(msg) => write!(f, "{msg}"),
            BracketError::TeamNotFound => write!(f, "No such team."),
            BracketError::MatchNotFound => write!(f, "No such match."),
            BracketError::ChallengeNotFound => write!(f, "No such challenge."),
            BracketError::Database(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for BracketError {}

impl From<diesel::result::Error> for BracketError {
    fn from(e: diesel::result::Error) -> Self {
        BracketError::Database(e)
    }
}

/// Sends the user back to `to` with the reason an operation was refused.
/// Missing records and storage failures are not banner material and become
/// the matching failure responses instead.
pub(crate) fn refuse(e: BracketError, to: &str) -> StandardResponse {
    match e {
        BracketError::TeamNotFound
        | BracketError::MatchNotFound
        | BracketError::ChallengeNotFound => err_not_found(),
        BracketError::Database(e) => Err(e.into()),
        e => {
            tracing::info!("refused: {e}");
            see_other_flash(Redirect::to(to), Flash::error(e.to_string()))
        }
    }
}
