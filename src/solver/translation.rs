//! External/internal index permutations.

/// Row and column of a matrix location.
///
/// Used both as a hashable key and to describe stamp patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatrixLocation {
    pub row: usize,
    pub column: usize,
}

impl MatrixLocation {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl From<(usize, usize)> for MatrixLocation {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

/// A bijection between external indices and internal positions.
///
/// Index 0 always maps to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    to_internal: Vec<usize>,
    to_external: Vec<usize>,
}

impl Translation {
    /// The identity permutation on `0..=size`.
    pub fn new(size: usize) -> Self {
        let identity: Vec<usize> = (0..=size).collect();
        Self {
            to_internal: identity.clone(),
            to_external: identity,
        }
    }

    pub fn size(&self) -> usize {
        self.to_internal.len() - 1
    }

    pub fn to_internal(&self, external: usize) -> usize {
        self.to_internal[external]
    }

    pub fn to_external(&self, internal: usize) -> usize {
        self.to_external[internal]
    }

    /// Exchange two internal positions.
    pub fn swap(&mut self, a: usize, b: usize) {
        let external_a = self.to_external[a];
        let external_b = self.to_external[b];
        self.to_external.swap(a, b);
        self.to_internal[external_a] = b;
        self.to_internal[external_b] = a;
    }

    /// Restore the identity permutation.
    pub fn reset(&mut self) {
        for (index, slot) in self.to_internal.iter_mut().enumerate() {
            *slot = index;
        }
        self.to_external.clone_from(&self.to_internal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijection(translation: &Translation) {
        for external in 0..=translation.size() {
            assert_eq!(
                translation.to_external(translation.to_internal(external)),
                external
            );
        }
    }

    #[test]
    fn test_swap_is_bijective() {
        let mut translation = Translation::new(4);
        translation.swap(1, 3);
        translation.swap(3, 4);
        translation.swap(2, 2);
        assert_bijection(&translation);
        assert_eq!(translation.to_external(1), 3);
        assert_eq!(translation.to_external(3), 4);
        assert_eq!(translation.to_external(4), 1);
        assert_eq!(translation.to_internal(1), 4);
        assert_eq!(translation.to_internal(0), 0);
    }

    #[test]
    fn test_reset() {
        let mut translation = Translation::new(3);
        translation.swap(1, 2);
        translation.reset();
        assert_eq!(translation, Translation::new(3));
    }

    #[test]
    fn test_location_from_tuple() {
        let location: MatrixLocation = (2, 5).into();
        assert_eq!(location, MatrixLocation::new(2, 5));
    }
}
