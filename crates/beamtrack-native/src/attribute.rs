//! The closed attribute vocabulary.

use crate::error::{BridgeError, Result};
use std::fmt;
use std::str::FromStr;

/// Number of attributes in a particle record.
pub const ATTRIBUTE_COUNT: usize = 11;

/// One physical quantity carried per particle.
///
/// Declaration order is the field order of the native record and must not
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Attribute {
    /// Horizontal position
    X,
    /// Horizontal momentum
    Xp,
    /// Vertical position
    Y,
    /// Vertical momentum
    Yp,
    /// Longitudinal position
    Z,
    /// Relative momentum deviation
    Dp,
    /// Reference charge
    Q0,
    /// Reference rest mass
    Mass0,
    /// Reference relativistic beta
    Beta0,
    /// Reference relativistic gamma
    Gamma0,
    /// Reference momentum times c
    P0c,
}

impl Attribute {
    /// Every attribute, in record order.
    pub const ALL: [Attribute; ATTRIBUTE_COUNT] = [
        Attribute::X,
        Attribute::Xp,
        Attribute::Y,
        Attribute::Yp,
        Attribute::Z,
        Attribute::Dp,
        Attribute::Q0,
        Attribute::Mass0,
        Attribute::Beta0,
        Attribute::Gamma0,
        Attribute::P0c,
    ];

    /// Position of this attribute in the record.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Name used in name-keyed input.
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Xp => "xp",
            Self::Y => "y",
            Self::Yp => "yp",
            Self::Z => "z",
            Self::Dp => "dp",
            Self::Q0 => "q0",
            Self::Mass0 => "mass0",
            Self::Beta0 => "beta0",
            Self::Gamma0 => "gamma0",
            Self::P0c => "p0c",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| BridgeError::unknown_attribute(s))
    }
}
