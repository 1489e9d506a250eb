use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User's reading status for a saved manga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingStatus {
    PlanToRead,
    Reading,
    Completed,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanToRead => "Plan to Read",
            Self::Reading => "Reading",
            Self::Completed => "Completed",
        }
    }

    /// The status that follows this one in the manual progress cycle.
    pub fn next(self) -> Self {
        match self {
            Self::PlanToRead => Self::Reading,
            Self::Reading => Self::Completed,
            Self::Completed => Self::PlanToRead,
        }
    }

    pub const ALL: &[ReadingStatus] = &[Self::PlanToRead, Self::Reading, Self::Completed];
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One manga on the user's saved list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedManga {
    pub id: u64,
    pub title: String,
    pub cover_url: String,
    pub status: ReadingStatus,
    #[serde(default)]
    pub favorite: bool,
    pub added_at: DateTime<Utc>,
}
