//! Sparse right-hand side vector.

use crate::error::{Result, SparseError};
use crate::numeric::Scalar;

/// Handle to an entry of a [`SparseVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VectorElementId(pub(crate) usize);

impl VectorElementId {
    /// The shared sink for index 0.
    pub const TRASH: VectorElementId = VectorElementId(0);

    pub fn is_trash(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    index: usize,
    value: T,
}

/// A vector whose entries are created on first request.
///
/// Entries that exist are "live": they count toward the Markowitz row
/// counts even while their value is zero, because the same location will be
/// stamped again on the next load.
#[derive(Debug, Clone)]
pub struct SparseVector<T> {
    size: usize,
    entries: Vec<Entry<T>>,
    slots: Vec<Option<VectorElementId>>,
}

impl<T: Scalar> SparseVector<T> {
    pub fn new(size: usize) -> Self {
        let mut slots = vec![None; size + 1];
        slots[0] = Some(VectorElementId::TRASH);
        Self {
            size,
            entries: vec![Entry {
                index: 0,
                value: T::zero(),
            }],
            slots,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of live entries, excluding the trash slot.
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the entry at `index`, creating it if needed.
    pub fn get_element(&mut self, index: usize) -> Result<VectorElementId> {
        if index > self.size {
            return Err(SparseError::RhsIndexOutOfRange {
                row: index,
                size: self.size,
            });
        }
        if let Some(id) = self.slots[index] {
            return Ok(id);
        }
        let id = VectorElementId(self.entries.len());
        self.entries.push(Entry {
            index,
            value: T::zero(),
        });
        self.slots[index] = Some(id);
        Ok(id)
    }

    pub fn find_element(&self, index: usize) -> Option<VectorElementId> {
        self.slots.get(index).copied().flatten()
    }

    /// Whether an entry exists at `index`.
    pub fn is_live(&self, index: usize) -> bool {
        index > 0 && self.find_element(index).is_some()
    }

    /// Current index of a handle.
    pub fn index_of(&self, id: VectorElementId) -> usize {
        self.entries[id.0].index
    }

    pub fn value(&self, id: VectorElementId) -> T {
        self.entries[id.0].value
    }

    pub fn value_mut(&mut self, id: VectorElementId) -> &mut T {
        &mut self.entries[id.0].value
    }

    pub fn set_value(&mut self, id: VectorElementId, value: T) {
        self.entries[id.0].value = value;
    }

    /// Value at `index`, zero when no entry exists.
    pub fn value_at(&self, index: usize) -> T {
        match self.find_element(index) {
            Some(id) if index > 0 => self.entries[id.0].value,
            _ => T::zero(),
        }
    }

    /// Exchange the entries at two indices.
    pub(crate) fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let row = a.max(b);
        if row > self.size {
            return Err(SparseError::RhsIndexOutOfRange {
                row,
                size: self.size,
            });
        }
        if a == b {
            return Ok(());
        }
        self.slots.swap(a, b);
        if let Some(id) = self.slots[a] {
            self.entries[id.0].index = a;
        }
        if let Some(id) = self.slots[b] {
            self.entries[id.0].index = b;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.value = T::zero();
        }
    }

    /// Live `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, slot)| slot.map(|id| (index, self.entries[id.0].value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_entries() {
        let mut rhs = SparseVector::<f64>::new(4);
        assert!(rhs.is_empty());
        let id = rhs.get_element(3).unwrap();
        assert_eq!(rhs.get_element(3).unwrap(), id);
        assert!(rhs.is_live(3));
        assert!(!rhs.is_live(2));
        assert_eq!(rhs.value_at(2), 0.0);
        assert_eq!(rhs.len(), 1);
    }

    #[test]
    fn test_swap_moves_handles() {
        let mut rhs = SparseVector::<f64>::new(3);
        let id = rhs.get_element(1).unwrap();
        rhs.set_value(id, 4.0);
        rhs.swap(1, 3).unwrap();
        assert_eq!(rhs.index_of(id), 3);
        assert_eq!(rhs.value_at(3), 4.0);
        assert!(!rhs.is_live(1));
        let pairs: Vec<(usize, f64)> = rhs.iter().collect();
        assert_eq!(pairs, vec![(3, 4.0)]);
    }

    #[test]
    fn test_swap_out_of_range() {
        let mut rhs = SparseVector::<f64>::new(2);
        let id = rhs.get_element(2).unwrap();
        assert!(matches!(
            rhs.swap(2, 3),
            Err(SparseError::RhsIndexOutOfRange { row: 3, size: 2 })
        ));
        assert_eq!(rhs.index_of(id), 2);
    }

    #[test]
    fn test_trash_slot() {
        let mut rhs = SparseVector::<f64>::new(2);
        let trash = rhs.get_element(0).unwrap();
        assert!(trash.is_trash());
        *rhs.value_mut(trash) += 5.0;
        assert_eq!(rhs.value_at(0), 0.0);
        assert!(!rhs.is_live(0));
        assert!(rhs.get_element(3).is_err());
    }
}
