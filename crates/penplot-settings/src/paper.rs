//! Paper library: named sheet sizes, unique by name.

use penplot_core::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// Two aspect ratios closer than this are considered the same.
pub const ASPECT_RATIO_TOLERANCE: f64 = 1e-6;

/// A named physical sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaperSize {
    pub name: String,
    /// Width in mm
    pub width: f64,
    /// Height in mm
    pub height: f64,
}

impl PaperSize {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// User-editable list of paper sizes.
///
/// Keeps insertion order for display and enforces unique names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PaperLibrary {
    papers: Vec<PaperSize>,
}

impl PaperLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library seeded with common sheet sizes.
    pub fn stock() -> Self {
        Self {
            papers: vec![
                PaperSize::new("A3", 297.0, 420.0),
                PaperSize::new("A4", 210.0, 297.0),
                PaperSize::new("A5", 148.0, 210.0),
                PaperSize::new("Letter", 215.9, 279.4),
                PaperSize::new("9x12in", 228.6, 304.8),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaperSize> {
        self.papers.iter()
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PaperSize> {
        self.papers.iter().find(|p| p.name == name)
    }

    /// Looks up a paper, failing with a config error when it is absent.
    pub fn require(&self, name: &str) -> Result<&PaperSize> {
        self.get(name).ok_or_else(|| {
            ConfigError::PaperNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn add(&mut self, paper: PaperSize) -> Result<()> {
        validate_paper(&paper)?;
        if self.get(&paper.name).is_some() {
            return Err(ConfigError::DuplicatePaper { name: paper.name }.into());
        }
        tracing::info!("Adding paper size '{}'", paper.name);
        self.papers.push(paper);
        Ok(())
    }

    /// Updates the dimensions of an existing paper; `None` keeps the current value.
    pub fn edit(&mut self, name: &str, width: Option<f64>, height: Option<f64>) -> Result<()> {
        let index = self
            .papers
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ConfigError::PaperNotFound {
                name: name.to_string(),
            })?;

        let current = &self.papers[index];
        let updated = PaperSize::new(
            name,
            width.unwrap_or(current.width),
            height.unwrap_or(current.height),
        );
        validate_paper(&updated)?;
        self.papers[index] = updated;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<PaperSize> {
        let index = self
            .papers
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ConfigError::PaperNotFound {
                name: name.to_string(),
            })?;
        Ok(self.papers.remove(index))
    }

    /// Papers whose aspect ratio equals `ratio` within [`ASPECT_RATIO_TOLERANCE`].
    pub fn matching_aspect(&self, ratio: f64) -> Vec<&PaperSize> {
        self.papers
            .iter()
            .filter(|p| (p.aspect_ratio() - ratio).abs() < ASPECT_RATIO_TOLERANCE)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for (i, paper) in self.papers.iter().enumerate() {
            validate_paper(paper)?;
            if self.papers[..i].iter().any(|p| p.name == paper.name) {
                return Err(ConfigError::DuplicatePaper {
                    name: paper.name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn validate_paper(paper: &PaperSize) -> Result<()> {
    if paper.name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "papers.name".to_string(),
            reason: "paper name must not be empty".to_string(),
        }
        .into());
    }
    for (key, value) in [("width", paper.width), ("height", paper.height)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: format!("papers.{}.{}", paper.name, key),
                reason: format!("must be a positive number (got {})", value),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_duplicates() {
        let mut lib = PaperLibrary::stock();
        let before = lib.len();
        lib.add(PaperSize::new("Postcard", 148.0, 100.0)).unwrap();
        assert_eq!(lib.len(), before + 1);

        let err = lib.add(PaperSize::new("A4", 1.0, 1.0)).unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(err.to_string(), "Paper size already exists: A4");
    }

    #[test]
    fn test_edit_and_remove() {
        let mut lib = PaperLibrary::stock();
        lib.edit("A5", Some(150.0), None).unwrap();
        let a5 = lib.get("A5").unwrap();
        assert_eq!((a5.width, a5.height), (150.0, 210.0));

        assert!(lib.edit("A5", Some(-1.0), None).is_err());
        assert_eq!(lib.get("A5").unwrap().width, 150.0);

        let removed = lib.remove("A5").unwrap();
        assert_eq!(removed.name, "A5");
        assert!(lib.get("A5").is_none());
        assert!(lib.remove("A5").is_err());
        assert!(lib.edit("A5", None, None).is_err());
    }

    #[test]
    fn test_matching_aspect() {
        let lib = PaperLibrary::stock();
        // rounded A-series sizes differ slightly in ratio
        assert!(lib.matching_aspect(420.0 / 594.0).is_empty());

        let matches = lib.matching_aspect(297.0 / 420.0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "A3");
        assert!(lib.matching_aspect(1.0).is_empty());
    }

    #[test]
    fn test_validate_detects_duplicates() {
        let lib: PaperLibrary = serde_json::from_str(
            r#"[{"name": "A", "width": 1, "height": 1}, {"name": "A", "width": 2, "height": 2}]"#,
        )
        .unwrap();
        assert!(lib.validate().is_err());
    }
}
