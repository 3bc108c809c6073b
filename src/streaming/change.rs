//! Edge detection for values sampled once per tick

/// Remembers the previous sample and reports whether the latest one differs.
///
/// The changed flag stays raised until a later sample equals its predecessor.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector<T> {
    prev: T,
    changed: bool,
}

impl<T: PartialEq + Copy> ChangeDetector<T> {
    pub fn new(initial: T) -> Self {
        Self {
            prev: initial,
            changed: false,
        }
    }

    /// Feed a new sample, returning whether it differs from the previous one
    pub fn update(&mut self, value: T) -> bool {
        self.changed = self.prev != value;
        self.prev = value;
        self.changed
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn current(&self) -> T {
        self.prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_then_settle() {
        let mut detector = ChangeDetector::new(1);
        assert!(!detector.is_changed());
        assert!(detector.update(2));
        assert!(detector.is_changed());
        assert_eq!(detector.current(), 2);
        assert!(!detector.update(2));
        assert!(!detector.is_changed());
    }
}
