//! Admin access fields and the tri-state decision collected for each.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One of the five independent capabilities an admin can hold.
///
/// [`AccessField::ALL`] is the order in which the fields are prompted for,
/// displayed and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessField {
    Checkin,
    Anticheat,
    QrManagement,
    QuestionManagement,
    Communication,
}

impl AccessField {
    /// Every field, in prompt order.
    pub const ALL: [Self; 5] = [
        Self::Checkin,
        Self::Anticheat,
        Self::QrManagement,
        Self::QuestionManagement,
        Self::Communication,
    ];

    /// Label used when asking the operator about this field.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Checkin => "Checkin",
            Self::Anticheat => "Anticheat",
            Self::QrManagement => "Qr Management",
            Self::QuestionManagement => "Question Management",
            Self::Communication => "Communication",
        }
    }
}

impl fmt::Display for AccessField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operator answer to a single access prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Turn the capability on.
    Grant,
    /// Turn the capability off.
    Deny,
    /// Keep whatever value the field already has.
    Unchanged,
}

impl Decision {
    /// Interpret one line of prompt input.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for anything that is not a decision, including the
    /// exit keywords, which the prompt handles before calling this.
    #[must_use]
    pub fn from_answer(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "t" => Some(Self::Grant),
            "n" | "f" => Some(Self::Deny),
            "" => Some(Self::Unchanged),
            _ => None,
        }
    }

    /// Resolve the decision against the field's current value.
    #[must_use]
    pub const fn resolve(self, current: bool) -> bool {
        match self {
            Self::Grant => true,
            Self::Deny => false,
            Self::Unchanged => current,
        }
    }
}

/// The five access booleans of an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct AccessSet {
    pub checkin: bool,
    pub anticheat: bool,
    pub qr_management: bool,
    pub question_management: bool,
    pub communication: bool,
}

impl AccessSet {
    /// Value of a single field.
    #[must_use]
    pub const fn get(&self, field: AccessField) -> bool {
        match field {
            AccessField::Checkin => self.checkin,
            AccessField::Anticheat => self.anticheat,
            AccessField::QrManagement => self.qr_management,
            AccessField::QuestionManagement => self.question_management,
            AccessField::Communication => self.communication,
        }
    }

    /// Apply an operator decision to a single field.
    pub fn apply(&mut self, field: AccessField, decision: Decision) {
        let slot = match field {
            AccessField::Checkin => &mut self.checkin,
            AccessField::Anticheat => &mut self.anticheat,
            AccessField::QrManagement => &mut self.qr_management,
            AccessField::QuestionManagement => &mut self.question_management,
            AccessField::Communication => &mut self.communication,
        };
        *slot = decision.resolve(*slot);
    }

    /// `(field, value)` pairs in prompt order.
    pub fn iter(&self) -> impl Iterator<Item = (AccessField, bool)> + '_ {
        AccessField::ALL.into_iter().map(|field| (field, self.get(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_are_case_insensitive() {
        assert_eq!(Decision::from_answer("Y"), Some(Decision::Grant));
        assert_eq!(Decision::from_answer("t"), Some(Decision::Grant));
        assert_eq!(Decision::from_answer(" N "), Some(Decision::Deny));
        assert_eq!(Decision::from_answer("F"), Some(Decision::Deny));
    }

    #[test]
    fn test_empty_answer_is_unchanged() {
        assert_eq!(Decision::from_answer(""), Some(Decision::Unchanged));
        assert_eq!(Decision::from_answer("   "), Some(Decision::Unchanged));
    }

    #[test]
    fn test_other_answers_are_rejected() {
        for answer in ["yes", "no", "1", "maybe", "q"] {
            assert_eq!(Decision::from_answer(answer), None, "{answer}");
        }
    }

    #[test]
    fn test_unchanged_keeps_current_value() {
        let mut access = AccessSet {
            anticheat: true,
            ..AccessSet::default()
        };
        access.apply(AccessField::Anticheat, Decision::Unchanged);
        access.apply(AccessField::Checkin, Decision::Unchanged);
        assert!(access.anticheat);
        assert!(!access.checkin);
    }

    #[test]
    fn test_apply_grant_and_deny() {
        let mut access = AccessSet::default();
        access.apply(AccessField::Communication, Decision::Grant);
        assert!(access.get(AccessField::Communication));
        access.apply(AccessField::Communication, Decision::Deny);
        assert!(!access.get(AccessField::Communication));
    }

    #[test]
    fn test_iter_follows_prompt_order() {
        let access = AccessSet {
            qr_management: true,
            ..AccessSet::default()
        };
        let fields: Vec<_> = access.iter().collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], (AccessField::Checkin, false));
        assert_eq!(fields[2], (AccessField::QrManagement, true));
        assert_eq!(fields[4].0, AccessField::Communication);
    }
}
