use serde::{Deserialize, Serialize};

/// Activation of a dense value-network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Linear output, the usual choice for the last layer.
    #[default]
    Identity,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    #[must_use]
    pub fn apply(self, z: f32) -> f32 {
        match self {
            Self::Identity => z,
            Self::Relu => z.max(0.0),
            Self::Sigmoid => 1.0 / (1.0 + (-z).exp()),
            Self::Tanh => z.tanh(),
        }
    }
}

/// Activation of an evolved-network node.
///
/// The squashing functions are steepened and clamped so that large sums
/// saturate instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeActivation {
    /// `1 / (1 + e^(-clamp(5z, ±60)))`
    #[default]
    Sigmoid,
    /// `tanh(clamp(2.5z, ±60))`
    Tanh,
    Relu,
    Identity,
}

impl NodeActivation {
    /// ```
    /// use tetrabot_policy::NodeActivation;
    ///
    /// assert_eq!(NodeActivation::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(NodeActivation::Sigmoid.apply(1e6), 1.0);
    /// assert_eq!(NodeActivation::Relu.apply(-3.0), 0.0);
    /// ```
    #[must_use]
    pub fn apply(self, z: f32) -> f32 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-(5.0 * z).clamp(-60.0, 60.0)).exp()),
            Self::Tanh => (2.5 * z).clamp(-60.0, 60.0).tanh(),
            Self::Relu => z.max(0.0),
            Self::Identity => z,
        }
    }
}
