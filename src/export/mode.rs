use std::fmt;
use std::str::FromStr;

/// How pages that already have a stored hash are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportMode {
    /// Always write, replacing the current file
    Overwrite,

    /// Write a new numbered version when the content changed
    Append,

    /// Never touch a page that already has a stored hash
    Skip,

    /// Replace the current file when the content changed
    Update,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Append => "append",
            Self::Skip => "skip",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            "skip" => Ok(Self::Skip),
            "update" => Ok(Self::Update),
            other => Err(format!("Unknown export mode: {}", other)),
        }
    }
}

/// Result of exporting a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// No prior hash existed; the first version was written
    Created,

    /// A file was (re)written over an existing hash record
    Updated,

    /// Nothing was written
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("append".parse::<ExportMode>(), Ok(ExportMode::Append));
        assert_eq!("UPDATE".parse::<ExportMode>(), Ok(ExportMode::Update));
        assert!("abort".parse::<ExportMode>().is_err());
    }

    #[test]
    fn test_mode_display_roundtrip() {
        for mode in [
            ExportMode::Overwrite,
            ExportMode::Append,
            ExportMode::Skip,
            ExportMode::Update,
        ] {
            assert_eq!(mode.to_string().parse::<ExportMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Created.to_string(), "Created");
        assert_eq!(Outcome::Skipped.to_string(), "Skipped");
    }
}
