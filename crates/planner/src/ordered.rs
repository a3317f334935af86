use swapflow_types::{Step, StepKind};

use crate::PlanError;

/// Planned steps in execution order.
///
/// Construction checks the ordering rules, so holding an `OrderedSteps` means:
/// - at most one revoke and one approve, revoke first;
/// - a wrap never follows the terminal step;
/// - at most one terminal step, and it is last.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedSteps {
    steps: Vec<Step>,
}

impl OrderedSteps {
    pub fn new(steps: Vec<Step>) -> Result<Self, PlanError> {
        check_ordering(&steps)?;
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(Step::kind).collect()
    }

    /// The terminal trade step, absent for wrap-only plans
    pub fn terminal(&self) -> Option<&Step> {
        self.steps.last().filter(|step| step.is_terminal())
    }

    pub fn transaction_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_transaction()).count()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

impl<'a> IntoIterator for &'a OrderedSteps {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

fn check_ordering(steps: &[Step]) -> Result<(), PlanError> {
    match steps.last().map(Step::kind) {
        None => return Err(PlanError::Ordering("plan has no steps".to_string())),
        Some(kind) if kind.is_terminal() || kind == StepKind::Wrap => {}
        Some(kind) => {
            return Err(PlanError::Ordering(format!(
                "plan must end with a trade or wrap step, not {kind}"
            )))
        }
    }

    let mut revoke_at = None;
    let mut approve_at = None;
    let mut terminal_at = None;

    for (index, step) in steps.iter().enumerate() {
        if terminal_at.is_some() {
            return Err(PlanError::Ordering(format!(
                "{} at position {index} follows the terminal step",
                step.kind()
            )));
        }

        match step.kind() {
            StepKind::Revoke => {
                if revoke_at.replace(index).is_some() {
                    return Err(PlanError::Ordering("more than one revoke".to_string()));
                }
                if approve_at.is_some() {
                    return Err(PlanError::Ordering(
                        "revoke must precede approve".to_string(),
                    ));
                }
            }
            StepKind::Approve => {
                if approve_at.replace(index).is_some() {
                    return Err(PlanError::Ordering("more than one approve".to_string()));
                }
            }
            kind if kind.is_terminal() => terminal_at = Some(index),
            _ => {}
        }
    }

    Ok(())
}
