#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Zero-based position in the current row list; `None` before the first open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavCursor {
    current: Option<usize>,
}

impl NavCursor {
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn set(&mut self, index: usize) {
        self.current = Some(index);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Index reached by one step over `len` rows, wrapping at both ends.
    pub fn step(&self, len: usize, direction: Direction) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let last = len - 1;
        let next = match (direction, self.current) {
            (Direction::Next, Some(index)) if index < last => index + 1,
            (Direction::Next, _) => 0,
            (Direction::Previous, Some(index)) if index > 0 => (index - 1).min(last),
            (Direction::Previous, _) => last,
        };
        Some(next)
    }
}
