use std::fmt;

/// Why a play name was not added to the playbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayRejection {
    Empty,
    Duplicate { existing: String },
}

impl PlayRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            PlayRejection::Empty => "empty",
            PlayRejection::Duplicate { .. } => "duplicate",
        }
    }
}

impl fmt::Display for PlayRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayRejection::Empty => write!(f, "play name is empty"),
            PlayRejection::Duplicate { existing } => {
                write!(f, "play already exists: {}", existing)
            }
        }
    }
}

impl std::error::Error for PlayRejection {}

/// Ordered set of play names, unique ignoring case.
#[derive(Debug, Clone, Default)]
pub struct Playbook {
    plays: Vec<String>,
}

impl Playbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trims `name` and appends it unless blank or already present.
    pub fn add(&mut self, name: &str) -> Result<(), PlayRejection> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PlayRejection::Empty);
        }
        if let Some(existing) = self.find(trimmed) {
            return Err(PlayRejection::Duplicate {
                existing: existing.to_string(),
            });
        }
        self.plays.push(trimmed.to_string());
        Ok(())
    }

    /// Case-insensitive lookup, returns the stored spelling.
    pub fn find(&self, name: &str) -> Option<&str> {
        let needle = name.trim().to_lowercase();
        self.plays
            .iter()
            .find(|p| p.to_lowercase() == needle)
            .map(|p| p.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn plays(&self) -> &[String] {
        &self.plays
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_trims_and_keeps_order() {
        let mut book = Playbook::new();
        book.add("  Horns ").unwrap();
        book.add("Pick and Roll").unwrap();
        book.add("Floppy").unwrap();
        assert_eq!(book.plays(), &["Horns", "Pick and Roll", "Floppy"]);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut book = Playbook::new();
        assert_eq!(book.add(""), Err(PlayRejection::Empty));
        assert_eq!(book.add("   \t"), Err(PlayRejection::Empty));
        assert!(book.is_empty());
    }

    #[test]
    fn test_duplicate_is_case_insensitive() {
        let mut book = Playbook::new();
        book.add("Pick and Roll").unwrap();
        let err = book.add("pick and roll").unwrap_err();
        assert_eq!(
            err,
            PlayRejection::Duplicate {
                existing: "Pick and Roll".to_string()
            }
        );
        assert_eq!(err.reason(), "duplicate");
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_duplicate_after_trim() {
        let mut book = Playbook::new();
        book.add("Horns").unwrap();
        assert!(book.add("  HORNS  ").is_err());
        assert!(book.contains("horns"));
        assert_eq!(book.find(" hOrNs"), Some("Horns"));
    }
}
