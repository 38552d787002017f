use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(RequestSeq);

impl RequestSeq {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Lifecycle of the single caption submission a client tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_submitting(self) -> bool {
        self == Self::Submitting
    }
}
