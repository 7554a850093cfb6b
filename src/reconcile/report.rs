use crate::foundation::error::SceneError;

/// Which collaborator an outcome refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// A compositor layer.
    Layer,
    /// An audio mixer input.
    Mixer,
}

/// What the reconciler did (or tried to do) for one name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Registered a new layer or audio input.
    Added,
    /// Removed and re-registered a layer whose content changed under the same name.
    Replaced,
    /// Sent new geometry/visibility to an existing layer.
    Updated,
    /// Removed a layer or audio input.
    Removed,
    /// Removal found nothing to remove; treated as done.
    AlreadyRemoved,
    /// Audio input already present; nothing sent.
    AlreadyPresent,
}

/// Result of one per-name operation.
#[derive(Debug)]
pub struct Outcome {
    /// Layer or device name.
    pub name: String,
    /// Collaborator addressed.
    pub target: Target,
    /// Attempted action.
    pub action: Action,
    /// Failure, if the action did not complete.
    pub error: Option<SceneError>,
}

impl Outcome {
    pub(crate) fn ok(name: impl Into<String>, target: Target, action: Action) -> Self {
        Self {
            name: name.into(),
            target,
            action,
            error: None,
        }
    }

    pub(crate) fn failed(
        name: impl Into<String>,
        target: Target,
        action: Action,
        error: SceneError,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            action,
            error: Some(error),
        }
    }

    /// Whether the action completed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-name outcomes of one reconciliation, in the order the passes ran.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// All outcomes.
    pub outcomes: Vec<Outcome>,
}

impl ApplyReport {
    pub(crate) fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Append every outcome of `other`.
    pub fn extend(&mut self, other: Self) {
        self.outcomes.extend(other.outcomes);
    }

    /// Whether every action completed.
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_ok)
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// Outcome for `name` on `target`, if any.
    pub fn outcome(&self, target: Target, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.target == target && o.name == name)
    }

    /// Names that completed `action` on `target`.
    pub fn names_with(&self, target: Target, action: Action) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_ok() && o.target == target && o.action == action)
            .map(|o| o.name.as_str())
            .collect()
    }
}
