use crate::error::{DispatchError, Result};

/// Default end index, large enough to mean "the rest of the list".
pub const DEFAULT_END_IDX: i64 = 10_000;

/// Half-open index range `[start, end)` over a sorted job list.
///
/// Bounds past the end of the list clamp to its length, and `start > end`
/// selects nothing. Windows let one directory be split across several runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: usize,
    end: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            start: 0,
            end: DEFAULT_END_IDX as usize,
        }
    }
}

impl Window {
    /// Negative `start` is rejected; negative `end` selects nothing.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start < 0 {
            return Err(DispatchError::InvalidRange { start, end });
        }
        Ok(Self {
            start: usize::try_from(start).unwrap_or(usize::MAX),
            end: usize::try_from(end.max(0)).unwrap_or(usize::MAX),
        })
    }

    pub fn full() -> Self {
        Self {
            start: 0,
            end: usize::MAX,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Clamped `(start, end)` for a list of `len` items.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = self.start.min(len);
        let end = self.end.min(len).max(start);
        (start, end)
    }

    /// Number of items selected from a list of `len` items.
    pub fn len_for(&self, len: usize) -> usize {
        let (start, end) = self.bounds(len);
        end - start
    }

    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let (start, end) = self.bounds(items.len());
        &items[start..end]
    }

    /// Owned variant of [`Window::apply`].
    pub fn select<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let (start, end) = self.bounds(items.len());
        items.truncate(end);
        items.drain(..start);
        items
    }
}
