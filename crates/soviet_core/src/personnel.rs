//! The chairman's personnel file.
//!
//! Black marks come from missed plans and from inspections by a newly
//! installed paranoid leader. Each commendation cancels one mark. A year
//! without new marks earns an amnesty of one mark. Arrest ends the game.

use serde::{Deserialize, Serialize};

/// Record of the player's standing with the party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PersonnelFile {
    black_marks: u32,
    commendations: u32,
    marks_this_year: u32,
}

impl PersonnelFile {
    /// Clean file.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            black_marks: 0,
            commendations: 0,
            marks_this_year: 0,
        }
    }

    /// Marks on file.
    #[must_use]
    pub const fn black_marks(&self) -> u32 {
        self.black_marks
    }

    /// Commendations on file.
    #[must_use]
    pub const fn commendations(&self) -> u32 {
        self.commendations
    }

    /// Marks not cancelled by commendations.
    #[must_use]
    pub const fn effective_marks(&self) -> u32 {
        self.black_marks.saturating_sub(self.commendations)
    }

    /// Add marks.
    pub fn add_black_marks(&mut self, count: u32) {
        self.black_marks = self.black_marks.saturating_add(count);
        self.marks_this_year = self.marks_this_year.saturating_add(count);
    }

    /// Add a commendation.
    pub fn add_commendation(&mut self) {
        self.commendations = self.commendations.saturating_add(1);
    }

    /// A paranoid new leader reads the file; an already-marked file gains
    /// another mark. Returns whether a mark was added.
    pub fn inspect(&mut self) -> bool {
        if self.effective_marks() == 0 {
            return false;
        }
        self.add_black_marks(1);
        true
    }

    /// Close the year. Clears one mark if none were added during it.
    /// Returns whether amnesty was granted.
    pub fn close_year(&mut self) -> bool {
        let amnesty = self.marks_this_year == 0 && self.black_marks > 0;
        if amnesty {
            self.black_marks -= 1;
        }
        self.marks_this_year = 0;
        amnesty
    }

    /// Whether the file warrants arrest.
    #[must_use]
    pub const fn is_arrested(&self, threshold: u32) -> bool {
        self.effective_marks() >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commendations_offset_marks() {
        let mut file = PersonnelFile::new();
        file.add_black_marks(3);
        file.add_commendation();
        assert_eq!(file.effective_marks(), 2);
        file.add_commendation();
        file.add_commendation();
        file.add_commendation();
        assert_eq!(file.effective_marks(), 0);
    }

    #[test]
    fn test_arrest_threshold() {
        let mut file = PersonnelFile::new();
        file.add_black_marks(6);
        assert!(!file.is_arrested(7));
        file.add_black_marks(1);
        assert!(file.is_arrested(7));
    }

    #[test]
    fn test_amnesty_only_after_clean_year() {
        let mut file = PersonnelFile::new();
        file.add_black_marks(2);
        assert!(!file.close_year());
        assert_eq!(file.black_marks(), 2);
        assert!(file.close_year());
        assert_eq!(file.black_marks(), 1);
        assert!(file.close_year());
        assert!(!file.close_year());
        assert_eq!(file.black_marks(), 0);
    }

    #[test]
    fn test_inspection_needs_existing_marks() {
        let mut file = PersonnelFile::new();
        assert!(!file.inspect());
        file.add_black_marks(1);
        assert!(file.inspect());
        assert_eq!(file.black_marks(), 2);
    }
}
