//! Attribute sets keyed by the closed vocabulary.

use crate::attribute::{Attribute, ATTRIBUTE_COUNT};
use crate::buffer::AttributeBuffer;
use crate::error::{BridgeError, Result};
use crate::record::native_count;
use beamtrack_core::types::Residency;

/// At most one buffer per attribute, stored in record order.
///
/// Iteration always follows [`Attribute::ALL`], whatever order buffers
/// were inserted in.
#[derive(Debug)]
pub struct AttributeSet<'a> {
    slots: [Option<AttributeBuffer<'a>>; ATTRIBUTE_COUNT],
}

impl<'a> AttributeSet<'a> {
    /// An empty set.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Builds a set from name-keyed buffers.
    ///
    /// Unknown or repeated names are rejected. Missing names are not; they
    /// are reported by [`validate`](Self::validate).
    pub fn from_named<I, S, B>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, B)>,
        S: AsRef<str>,
        B: Into<AttributeBuffer<'a>>,
    {
        let mut set = Self::new();
        for (name, buffer) in entries {
            let attribute: Attribute = name.as_ref().parse()?;
            if set.insert(attribute, buffer).is_some() {
                return Err(BridgeError::duplicate_attribute(attribute));
            }
        }
        Ok(set)
    }

    /// Stores `buffer` for `attribute`, returning the buffer it replaces.
    pub fn insert<B: Into<AttributeBuffer<'a>>>(
        &mut self,
        attribute: Attribute,
        buffer: B,
    ) -> Option<AttributeBuffer<'a>> {
        self.slots[attribute.index()].replace(buffer.into())
    }

    /// Like [`insert`](Self::insert), with the attribute given by name.
    pub fn insert_named<B: Into<AttributeBuffer<'a>>>(
        &mut self,
        name: &str,
        buffer: B,
    ) -> Result<Option<AttributeBuffer<'a>>> {
        let attribute = name.parse()?;
        Ok(self.insert(attribute, buffer))
    }

    /// Removes and returns the buffer for `attribute`.
    pub fn remove(&mut self, attribute: Attribute) -> Option<AttributeBuffer<'a>> {
        self.slots[attribute.index()].take()
    }

    /// Buffer stored for `attribute`.
    pub fn get(&self, attribute: Attribute) -> Option<&AttributeBuffer<'a>> {
        self.slots[attribute.index()].as_ref()
    }

    /// Mutable buffer stored for `attribute`.
    pub fn get_mut(&mut self, attribute: Attribute) -> Option<&mut AttributeBuffer<'a>> {
        self.slots[attribute.index()].as_mut()
    }

    /// Returns true if `attribute` has a buffer.
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.slots[attribute.index()].is_some()
    }

    /// Number of attributes present.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns true if no attribute is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attributes without a buffer, in record order.
    pub fn missing(&self) -> Vec<Attribute> {
        Attribute::ALL
            .into_iter()
            .filter(|attr| !self.contains(*attr))
            .collect()
    }

    /// Present buffers in record order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttributeBuffer<'a>)> {
        Attribute::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(attr, slot)| slot.as_ref().map(|buffer| (attr, buffer)))
    }

    /// Checks the set is ready to be packed for `particle_count` particles
    /// and returns the common residency.
    ///
    /// `particle_count` must fit the record's `int`. Every attribute must be
    /// present, every buffer must hold exactly `particle_count` elements,
    /// and all buffers must share one residency.
    pub fn validate(&self, particle_count: usize) -> Result<Residency> {
        native_count(particle_count)?;
        if let Some(attribute) = self.missing().first() {
            return Err(BridgeError::missing_attribute(*attribute));
        }

        let mut residency = None;
        for (attribute, buffer) in self.iter() {
            if buffer.len() != particle_count {
                return Err(BridgeError::length_mismatch(
                    attribute,
                    particle_count,
                    buffer.len(),
                ));
            }
            match residency {
                None => residency = Some(buffer.residency()),
                Some(expected) if expected != buffer.residency() => {
                    return Err(BridgeError::mixed_residency(
                        attribute,
                        expected,
                        buffer.residency(),
                    ));
                }
                Some(_) => {}
            }
        }

        // The vocabulary is non-empty, so a complete set always has a residency.
        residency.ok_or_else(|| BridgeError::missing_attribute(Attribute::ALL[0]))
    }
}

impl Default for AttributeSet<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::DeviceBuffer;

    fn columns(n: usize) -> Vec<Vec<f64>> {
        vec![vec![0.0; n]; ATTRIBUTE_COUNT]
    }

    fn full_set(data: &mut [Vec<f64>]) -> AttributeSet<'_> {
        let mut set = AttributeSet::new();
        for (attr, column) in Attribute::ALL.into_iter().zip(data.iter_mut()) {
            set.insert(attr, column);
        }
        set
    }

    #[test]
    fn test_complete_set_validates() {
        let mut data = columns(4);
        let set = full_set(&mut data);
        assert_eq!(set.len(), ATTRIBUTE_COUNT);
        assert!(set.missing().is_empty());
        assert_eq!(set.validate(4).unwrap(), Residency::Host);
    }

    #[test]
    fn test_missing_attribute() {
        let mut data = columns(4);
        let mut set = full_set(&mut data);
        set.remove(Attribute::P0c);

        assert_eq!(set.missing(), vec![Attribute::P0c]);
        assert!(matches!(
            set.validate(4),
            Err(BridgeError::MissingAttribute {
                attribute: Attribute::P0c
            })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let mut data = columns(11);
        data[0] = vec![0.0; 10];
        let set = full_set(&mut data);

        assert!(matches!(
            set.validate(11),
            Err(BridgeError::LengthMismatch {
                attribute: Attribute::X,
                expected: 11,
                actual: 10,
            })
        ));
    }

    #[test]
    fn test_mixed_residency() {
        let mut data = columns(3);
        let mut set = full_set(&mut data);
        // SAFETY: the address is never dereferenced.
        set.insert(Attribute::Y, unsafe { DeviceBuffer::from_raw(0x1000, 3) });

        assert!(matches!(
            set.validate(3),
            Err(BridgeError::MixedResidency {
                attribute: Attribute::Y,
                expected: Residency::Host,
                actual: Residency::Device,
            })
        ));
    }

    #[test]
    fn test_from_named() {
        let mut data = columns(2);
        let names = Attribute::ALL.map(Attribute::name);
        let set = AttributeSet::from_named(names.into_iter().rev().zip(data.iter_mut())).unwrap();
        let order: Vec<_> = set.iter().map(|(attr, _)| attr).collect();
        assert_eq!(order, Attribute::ALL.to_vec());

        let mut a = vec![0.0];
        let mut b = vec![0.0];
        let err = AttributeSet::from_named([("x", &mut a), ("x", &mut b)]).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateAttribute { .. }));

        let mut c = vec![0.0];
        let err = AttributeSet::from_named([("energy", &mut c)]).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownAttribute { .. }));
    }
}
