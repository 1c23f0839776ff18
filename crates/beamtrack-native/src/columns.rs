//! Owned particle coordinates.

use crate::attribute::{Attribute, ATTRIBUTE_COUNT};
use crate::error::{BridgeError, Result};
use crate::set::AttributeSet;
use nalgebra::DVector;

/// One host column per attribute, all of the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleColumns {
    columns: [DVector<f64>; ATTRIBUTE_COUNT],
}

impl ParticleColumns {
    /// `n` particles with every attribute zero.
    pub fn zeros(n: usize) -> Self {
        Self {
            columns: std::array::from_fn(|_| DVector::zeros(n)),
        }
    }

    /// Builds columns by evaluating `f(attribute, particle)`.
    pub fn from_fn<F>(n: usize, mut f: F) -> Self
    where
        F: FnMut(Attribute, usize) -> f64,
    {
        Self {
            columns: Attribute::ALL.map(|attr| DVector::from_fn(n, |i, _| f(attr, i))),
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    /// Returns true if there are no particles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column of `attribute`.
    pub fn column(&self, attribute: Attribute) -> &DVector<f64> {
        &self.columns[attribute.index()]
    }

    /// Mutable column of `attribute`. Its length cannot change.
    pub fn column_mut(&mut self, attribute: Attribute) -> &mut [f64] {
        self.columns[attribute.index()].as_mut_slice()
    }

    /// Replaces the column of `attribute`.
    pub fn set_column(&mut self, attribute: Attribute, values: DVector<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(BridgeError::length_mismatch(
                attribute,
                self.len(),
                values.len(),
            ));
        }
        self.columns[attribute.index()] = values;
        Ok(())
    }

    /// Fills `attribute` with one value for every particle.
    pub fn fill(&mut self, attribute: Attribute, value: f64) {
        self.columns[attribute.index()].fill(value);
    }

    /// A complete attribute set borrowing every column.
    pub fn attribute_set(&mut self) -> AttributeSet<'_> {
        let mut set = AttributeSet::new();
        for (attribute, column) in Attribute::ALL.into_iter().zip(self.columns.iter_mut()) {
            set.insert(attribute, column);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamtrack_core::types::Residency;

    #[test]
    fn test_columns_produce_complete_set() {
        let mut columns = ParticleColumns::from_fn(5, |attr, i| (attr.index() * 100 + i) as f64);
        assert_eq!(columns.len(), 5);
        assert_eq!(columns.column(Attribute::Y)[3], 203.0);

        let set = columns.attribute_set();
        assert_eq!(set.validate(5).unwrap(), Residency::Host);
    }

    #[test]
    fn test_set_column_checks_length() {
        let mut columns = ParticleColumns::zeros(3);
        columns.fill(Attribute::Gamma0, 1.5);
        assert!(columns.column(Attribute::Gamma0).iter().all(|&g| g == 1.5));

        let err = columns
            .set_column(Attribute::X, DVector::zeros(2))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::LengthMismatch {
                attribute: Attribute::X,
                expected: 3,
                actual: 2,
            }
        ));
        columns
            .set_column(Attribute::X, DVector::from_element(3, 1.0))
            .unwrap();
        columns.column_mut(Attribute::X)[0] = -1.0;
        assert_eq!(columns.column(Attribute::X).as_slice(), &[-1.0, 1.0, 1.0]);
    }
}
