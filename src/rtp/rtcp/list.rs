use std::fmt;
use std::ops::Index;

/// Max items under one RTCP header, the 5 bit count field.
pub(crate) const MAX_ITEMS: usize = 31;

/// List containing max 31 items.
#[derive(Clone, PartialEq, Eq)]
pub struct ReportList<T>(Vec<T>);

impl<T> ReportList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        ReportList::default()
    }

    /// Number of elements in the list.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append an element. Returns false, and drops the element, if the list is full.
    pub fn push(&mut self, v: T) -> bool {
        if self.is_full() {
            debug!("ReportList is full, dropping item");
            return false;
        }
        self.0.push(v);
        true
    }

    /// Get element at position.
    pub fn get(&self, i: usize) -> Option<&T> {
        self.0.get(i)
    }

    /// Iterator over the elements in the list.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Tells if the list contains zero elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.0.len() == MAX_ITEMS
    }
}

pub(crate) mod private {
    pub trait WordSized {
        fn word_size(&self) -> usize;
    }
}

impl<T> Index<usize> for ReportList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> Default for ReportList<T> {
    fn default() -> Self {
        ReportList(Vec::with_capacity(1))
    }
}

impl<'a, T> IntoIterator for &'a ReportList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T> IntoIterator for ReportList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> From<T> for ReportList<T> {
    fn from(t: T) -> Self {
        ReportList(vec![t])
    }
}

impl<T: fmt::Debug> fmt::Debug for ReportList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::ReportList;

    #[test]
    fn test_max_length() {
        let mut list = ReportList::new();
        for i in 1..=31_u64 {
            assert!(list.push(i));
        }
        assert!(!list.push(32));
        assert_eq!(list.len(), 31);

        let sum: u64 = list.iter().sum();
        assert_eq!(sum, 496);

        let sum: u64 = list.into_iter().sum();
        assert_eq!(sum, 496);
    }
}
