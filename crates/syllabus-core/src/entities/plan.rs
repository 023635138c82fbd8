use serde::{Deserialize, Serialize};

use syllabus_db::models::NewPlan;

use super::required_text;
use crate::error::WorkbenchResult;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_OWNER_LEN: usize = 200;

/// Operator input for a new plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanForm {
    pub title: String,
    pub owner: String,
}

impl PlanForm {
    pub fn new(title: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            owner: owner.into(),
        }
    }

    pub fn validate(&self) -> WorkbenchResult<NewPlan> {
        Ok(NewPlan {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            owner: required_text("owner", &self.owner, MAX_OWNER_LEN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn valid_form_is_trimmed() {
        let plan = PlanForm::new("  Spring term ", " registrar").validate().unwrap();
        assert_eq!(plan.title, "Spring term");
        assert_eq!(plan.owner, "registrar");
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = PlanForm::new("", "registrar").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn empty_owner_is_rejected() {
        let err = PlanForm::new("Spring term", "  ").validate().unwrap_err();
        assert!(err.to_string().contains("owner"), "got: {err}");
    }

    #[test]
    fn title_length_limit() {
        let at_limit = "t".repeat(MAX_TITLE_LEN);
        assert!(PlanForm::new(at_limit, "o").validate().is_ok());

        let over = "t".repeat(MAX_TITLE_LEN + 1);
        assert!(PlanForm::new(over, "o").validate().is_err());
    }
}
