//! Guarded status machines shared by tenants, risks, evidence and workflows.

use std::fmt;

use crate::errors::ServiceError;

/// A status enum with an explicit transition table.
///
/// Staying in the same status is always allowed and is a no-op.
pub trait Lifecycle: Copy + PartialEq + fmt::Display + 'static {
    /// Entity label used in errors, logs and metrics.
    const ENTITY: &'static str;

    /// Statuses reachable in one step.
    fn targets(self) -> &'static [Self];

    fn can_transition(self, to: Self) -> bool { self == to || self.targets().contains(&to) }

    fn is_terminal(self) -> bool { self.targets().is_empty() }

    fn ensure_transition(self, to: Self) -> Result<(), ServiceError> {
        if self.can_transition(to) {
            return Ok(());
        }
        Err(ServiceError::InvalidTransition {
            entity: Self::ENTITY,
            from: self.to_string(),
            to: to.to_string(),
            allowed: self.targets().iter().map(ToString::to_string).collect(),
        })
    }
}

/// Lowercase and drop spaces, underscores and dashes: `"Under_Assessment"` -> `"underassessment"`.
pub(crate) fn fold_status(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}
