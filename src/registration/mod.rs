//! Re-registration wizard: a strictly linear multi-step form flow.
//!
//! The draft lives only in memory for the lifetime of the wizard value.
//! Nothing is persisted and completing the flow has no side effect beyond
//! what the caller chooses to display; the draft is dropped with the
//! wizard.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declarations a parent must accept before signing.
pub const CONFIRMATIONS: [&str; 4] = [
    "I have read and understood the school's Code of Conduct.",
    "I confirm that all information provided in this application is true and correct.",
    "I agree to abide by the school's rules, policies, and code of conduct.",
    "I acknowledge responsibility for all school fees as per the agreement.",
];

/// Minimum number of characters for a digital signature to count.
pub const MIN_SIGNATURE_LEN: usize = 3;

/// Wizard steps, in order. There is no branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    SelectChildren,
    UpdateDetails,
    ChooseFinancing,
    Declaration,
    Review,
    Complete,
}

impl Step {
    pub fn next(self) -> Option<Step> {
        match self {
            Step::SelectChildren => Some(Step::UpdateDetails),
            Step::UpdateDetails => Some(Step::ChooseFinancing),
            Step::ChooseFinancing => Some(Step::Declaration),
            Step::Declaration => Some(Step::Review),
            Step::Review => Some(Step::Complete),
            Step::Complete => None,
        }
    }

    pub fn prev(self) -> Option<Step> {
        match self {
            Step::SelectChildren => None,
            Step::UpdateDetails => Some(Step::SelectChildren),
            Step::ChooseFinancing => Some(Step::UpdateDetails),
            Step::Declaration => Some(Step::ChooseFinancing),
            Step::Review => Some(Step::Declaration),
            Step::Complete => Some(Step::Review),
        }
    }

    pub fn number(self) -> usize {
        match self {
            Step::SelectChildren => 1,
            Step::UpdateDetails => 2,
            Step::ChooseFinancing => 3,
            Step::Declaration => 4,
            Step::Review => 5,
            Step::Complete => 6,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::SelectChildren => "Select Children",
            Step::UpdateDetails => "Update Details",
            Step::ChooseFinancing => "Choose Financing",
            Step::Declaration => "Declaration",
            Step::Review => "Review & Submit",
            Step::Complete => "Complete",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A learner eligible for re-registration, as shown on the selection step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub student_number: String,
    pub enrolled_since: String,
}

/// Contact, learner and banking fields collected on the details step.
/// Every field is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailFields {
    pub first_name: String,
    pub last_name: String,
    pub current_grade: String,
    pub next_grade: String,
    pub phone: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postcode: String,
    pub account_holder_name: String,
    pub bank_name: String,
    pub account_type: String,
    pub account_number: String,
    pub branch_code: String,
}

impl DetailFields {
    fn required(&self) -> [&String; 15] {
        [
            &self.first_name,
            &self.last_name,
            &self.current_grade,
            &self.next_grade,
            &self.phone,
            &self.email,
            &self.street,
            &self.city,
            &self.province,
            &self.postcode,
            &self.account_holder_name,
            &self.bank_name,
            &self.account_type,
            &self.account_number,
            &self.branch_code,
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.required().iter().all(|f| !f.trim().is_empty())
    }
}

/// The in-memory draft. Never persisted; discarded when the wizard goes
/// out of scope, whether completed or abandoned.
#[derive(Debug, Clone, Default)]
pub struct RegistrationDraft {
    pub selected_students: Vec<String>,
    pub details: DetailFields,
    pub selected_plan: Option<String>,
    pub confirmations: [bool; CONFIRMATIONS.len()],
    pub signature: String,
    pub signed_at_city: String,
}

impl RegistrationDraft {
    pub fn all_confirmed(&self) -> bool {
        self.confirmations.iter().all(|c| *c)
    }

    pub fn signature_valid(&self) -> bool {
        self.signature.trim().chars().count() >= MIN_SIGNATURE_LEN
    }
}

/// The inline alert shown when a step's gate fails. Deliberately just a
/// message; the flow has no richer error contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct Blocked(pub String);

impl Blocked {
    fn new(message: &str) -> Self {
        Blocked(message.to_string())
    }
}

/// The wizard: current step plus the draft it gates.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    step: Step,
    draft: RegistrationDraft,
}

impl Default for Step {
    fn default() -> Self {
        Step::SelectChildren
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RegistrationDraft {
        &mut self.draft
    }

    pub fn is_complete(&self) -> bool {
        self.step == Step::Complete
    }

    /// Adds or removes a student from the selection.
    pub fn toggle_student(&mut self, id: &str) {
        let selected = &mut self.draft.selected_students;
        if let Some(pos) = selected.iter().position(|s| s == id) {
            selected.remove(pos);
        } else {
            selected.push(id.to_string());
        }
    }

    /// Whether the current step's gate passes against the draft as it
    /// stands. Evaluated on current state only; earlier steps are never
    /// re-checked.
    pub fn can_continue(&self) -> Result<(), Blocked> {
        match self.step {
            Step::SelectChildren => {
                if self.draft.selected_students.is_empty() {
                    return Err(Blocked::new("Please select at least one child to continue"));
                }
            }
            Step::UpdateDetails => {
                if !self.draft.details.is_complete() {
                    return Err(Blocked::new("Please fill in all required fields"));
                }
            }
            Step::ChooseFinancing => {
                if self.draft.selected_plan.is_none() {
                    return Err(Blocked::new("Please select a payment plan"));
                }
            }
            Step::Declaration => {
                if !self.draft.all_confirmed() || !self.draft.signature_valid() {
                    return Err(Blocked::new(
                        "Please complete all required fields and confirmations",
                    ));
                }
            }
            Step::Review => {}
            Step::Complete => {
                return Err(Blocked::new("Registration is already complete"));
            }
        }
        Ok(())
    }

    /// Advances to the next step if the gate passes.
    pub fn try_advance(&mut self) -> Result<Step, Blocked> {
        self.can_continue()?;
        // Complete is rejected by the gate above, so next() always exists.
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Steps backward without validation. Returns the new step, or None
    /// when already at the first step.
    pub fn back(&mut self) -> Option<Step> {
        let prev = self.step.prev()?;
        self.step = prev;
        Some(prev)
    }
}

/// The learners available for selection. The roster is seeded data; the
/// portal has no live enrollment feed yet.
pub fn sample_roster() -> Vec<StudentRecord> {
    vec![StudentRecord {
        id: "1".to_string(),
        name: "Mikhenso Rikhotso".to_string(),
        grade: "Grade 11".to_string(),
        student_number: "2020155260088".to_string(),
        enrolled_since: "03/12/2020".to_string(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_details() -> DetailFields {
        DetailFields {
            first_name: "Mikhenso".to_string(),
            last_name: "Rikhotso".to_string(),
            current_grade: "Grade 11".to_string(),
            next_grade: "12".to_string(),
            phone: "0647939043".to_string(),
            email: "mikhenso@example.com".to_string(),
            street: "Joni".to_string(),
            city: "Giyani".to_string(),
            province: "Free State".to_string(),
            postcode: "2025".to_string(),
            account_holder_name: "Ronald Rikhotso".to_string(),
            bank_name: "African Bank".to_string(),
            account_type: "Savings".to_string(),
            account_number: "1668677022".to_string(),
            branch_code: "302520".to_string(),
        }
    }

    fn wizard_at_declaration() -> Wizard {
        let mut wizard = Wizard::new();
        wizard.toggle_student("1");
        wizard.try_advance().unwrap();
        wizard.draft_mut().details = complete_details();
        wizard.try_advance().unwrap();
        wizard.draft_mut().selected_plan = Some("monthly".to_string());
        wizard.try_advance().unwrap();
        assert_eq!(wizard.step(), Step::Declaration);
        wizard
    }

    #[test]
    fn starts_empty_at_first_step() {
        let wizard = Wizard::new();
        assert_eq!(wizard.step(), Step::SelectChildren);
        assert!(wizard.draft().selected_students.is_empty());
        assert!(wizard.draft().selected_plan.is_none());
        assert!(!wizard.is_complete());
    }

    #[test]
    fn select_children_requires_at_least_one() {
        let mut wizard = Wizard::new();
        let err = wizard.try_advance().unwrap_err();
        assert_eq!(err.0, "Please select at least one child to continue");
        assert_eq!(wizard.step(), Step::SelectChildren);

        wizard.toggle_student("1");
        assert_eq!(wizard.try_advance().unwrap(), Step::UpdateDetails);
    }

    #[test]
    fn toggling_twice_deselects() {
        let mut wizard = Wizard::new();
        wizard.toggle_student("1");
        wizard.toggle_student("1");
        assert!(wizard.try_advance().is_err());
    }

    #[test]
    fn details_step_requires_every_field() {
        let mut wizard = Wizard::new();
        wizard.toggle_student("1");
        wizard.try_advance().unwrap();

        let mut details = complete_details();
        details.branch_code = "   ".to_string();
        wizard.draft_mut().details = details;

        let err = wizard.try_advance().unwrap_err();
        assert_eq!(err.0, "Please fill in all required fields");

        wizard.draft_mut().details.branch_code = "302520".to_string();
        assert_eq!(wizard.try_advance().unwrap(), Step::ChooseFinancing);
    }

    #[test]
    fn financing_step_requires_a_plan() {
        let mut wizard = Wizard::new();
        wizard.toggle_student("1");
        wizard.try_advance().unwrap();
        wizard.draft_mut().details = complete_details();
        wizard.try_advance().unwrap();

        let err = wizard.try_advance().unwrap_err();
        assert_eq!(err.0, "Please select a payment plan");
    }

    #[test]
    fn declaration_gate_is_a_strict_conjunction() {
        let mut wizard = wizard_at_declaration();
        wizard.draft_mut().confirmations = [true; CONFIRMATIONS.len()];
        wizard.draft_mut().signature = "MRi".to_string();
        assert!(wizard.can_continue().is_ok());

        // Any single unchecked flag fails, regardless of the signature.
        for i in 0..CONFIRMATIONS.len() {
            let mut partial = wizard_at_declaration();
            partial.draft_mut().confirmations = [true; CONFIRMATIONS.len()];
            partial.draft_mut().confirmations[i] = false;
            partial.draft_mut().signature = "Mikhenso R".to_string();
            assert!(partial.can_continue().is_err());
        }
    }

    #[test]
    fn signature_boundary_is_three_characters() {
        let mut wizard = wizard_at_declaration();
        wizard.draft_mut().confirmations = [true; CONFIRMATIONS.len()];

        wizard.draft_mut().signature = "MR".to_string();
        assert!(wizard.can_continue().is_err());

        wizard.draft_mut().signature = "MRi".to_string();
        assert!(wizard.can_continue().is_ok());

        // Whitespace padding does not help.
        wizard.draft_mut().signature = " M R ".to_string();
        assert!(wizard.can_continue().is_err());
    }

    #[test]
    fn review_continues_to_terminal_complete() {
        let mut wizard = wizard_at_declaration();
        wizard.draft_mut().confirmations = [true; CONFIRMATIONS.len()];
        wizard.draft_mut().signature = "Mikhenso".to_string();
        assert_eq!(wizard.try_advance().unwrap(), Step::Review);
        assert_eq!(wizard.try_advance().unwrap(), Step::Complete);
        assert!(wizard.is_complete());

        // Terminal: there is nowhere further to go.
        assert!(wizard.try_advance().is_err());
    }

    #[test]
    fn back_never_validates_and_stops_at_first_step() {
        let mut wizard = Wizard::new();
        assert!(wizard.back().is_none());

        wizard.toggle_student("1");
        wizard.try_advance().unwrap();
        // Going back with an incomplete details form is allowed.
        assert_eq!(wizard.back(), Some(Step::SelectChildren));
    }

    #[test]
    fn steps_are_numbered_in_order() {
        assert_eq!(Step::SelectChildren.number(), 1);
        assert_eq!(Step::Complete.number(), 6);
        assert_eq!(Step::SelectChildren.next(), Some(Step::UpdateDetails));
        assert_eq!(Step::Complete.next(), None);
    }
}
