use crate::errors::FilterError;

/// Row-selection vector over a table. Narrowed by AND, never widened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(Vec<bool>);

impl Mask {
    /// A mask selecting all `len` rows.
    pub fn all(len: usize) -> Self {
        Mask(vec![true; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Intersects `other` into this mask.
    pub fn and(&mut self, other: &Mask) -> Result<(), FilterError> {
        if other.len() != self.len() {
            return Err(FilterError::LengthMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }
        for (keep, next) in self.0.iter_mut().zip(&other.0) {
            *keep &= *next;
        }
        Ok(())
    }
}

impl From<Vec<bool>> for Mask {
    fn from(values: Vec<bool>) -> Self {
        Mask(values)
    }
}

impl FromIterator<bool> for Mask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Mask(iter.into_iter().collect())
    }
}
