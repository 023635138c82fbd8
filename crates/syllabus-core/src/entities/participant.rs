use serde::{Deserialize, Serialize};

use super::required_text;
use crate::error::WorkbenchResult;

pub const MAX_PERSON_LEN: usize = 200;

/// Operator input for attaching a person to a plan or schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantForm {
    pub person: String,
}

impl ParticipantForm {
    pub fn new(person: impl Into<String>) -> Self {
        Self {
            person: person.into(),
        }
    }

    /// The normalized person reference.
    pub fn validate(&self) -> WorkbenchResult<String> {
        required_text("person", &self.person, MAX_PERSON_LEN)
    }
}
