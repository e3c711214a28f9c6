use std::{collections::HashSet, hash::Hash, ops::Deref};

/// Fixed-length feature vector describing a board after a hypothetical action.
///
/// Produced by the environment and never modified afterwards. Equality is
/// element-wise and exact (`f32 == f32`), which is what the driver relies on to
/// map a policy's choice back to an action.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector(Box<[f32]>);

impl StateVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl Deref for StateVector {
    type Target = [f32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<f32>> for StateVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values.into_boxed_slice())
    }
}

impl<const N: usize> From<[f32; N]> for StateVector {
    fn from(values: [f32; N]) -> Self {
        Self(Box::new(values))
    }
}

impl From<&[f32]> for StateVector {
    fn from(values: &[f32]) -> Self {
        Self(values.into())
    }
}

/// Mapping from action to the state it leads to, for one decision step.
///
/// Entries keep their insertion order and keys are unique. Actions and states
/// are stored side by side so that the states can be handed to a policy as a
/// plain slice.
///
/// # Example
///
/// ```
/// use tetrabot_harness::{NextStates, StateVector};
///
/// let mut next = NextStates::new();
/// next.push('a', StateVector::from([1.0, 0.0]));
/// next.push('b', StateVector::from([0.0, 1.0]));
///
/// assert_eq!(next.len(), 2);
/// assert_eq!(next.find_action(&StateVector::from([0.0, 1.0])), Some(&'b'));
/// assert_eq!(next.find_action(&StateVector::from([9.0, 9.0])), None);
/// ```
#[derive(Debug, Clone)]
pub struct NextStates<A> {
    actions: Vec<A>,
    states: Vec<StateVector>,
    keys: HashSet<A>,
}

impl<A> Default for NextStates<A> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            states: Vec::new(),
            keys: HashSet::new(),
        }
    }
}

impl<A> NextStates<A>
where
    A: Clone + Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            actions: Vec::with_capacity(capacity),
            states: Vec::with_capacity(capacity),
            keys: HashSet::with_capacity(capacity),
        }
    }

    /// Appends an entry.
    ///
    /// # Panics
    ///
    /// Panics if `action` is already present.
    pub fn push(&mut self, action: A, state: StateVector) {
        let inserted = self.keys.insert(action.clone());
        assert!(inserted, "duplicate action in next-state mapping");
        self.actions.push(action);
        self.states.push(state);
    }

    #[must_use]
    pub fn contains_action(&self, action: &A) -> bool {
        self.keys.contains(action)
    }

    /// Returns the first action whose state equals `chosen` exactly.
    #[must_use]
    pub fn find_action(&self, chosen: &StateVector) -> Option<&A> {
        self.states
            .iter()
            .position(|state| state == chosen)
            .map(|index| &self.actions[index])
    }
}

impl<A> NextStates<A> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    #[must_use]
    pub fn states(&self) -> &[StateVector] {
        &self.states
    }

    /// Returns the state reached by `action`, if present.
    pub fn get(&self, action: &A) -> Option<&StateVector>
    where
        A: PartialEq,
    {
        self.actions
            .iter()
            .position(|a| a == action)
            .map(|index| &self.states[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&A, &StateVector)> + '_ {
        self.actions.iter().zip(&self.states)
    }
}

impl<A> FromIterator<(A, StateVector)> for NextStates<A>
where
    A: Clone + Eq + Hash,
{
    fn from_iter<T: IntoIterator<Item = (A, StateVector)>>(iter: T) -> Self {
        let mut next = Self::new();
        for (action, state) in iter {
            next.push(action, state);
        }
        next
    }
}
