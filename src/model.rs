use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Category ids in the order the report presents them.
pub const CATEGORY_ORDER: [&str; 8] = [
    "resiliency",
    "workload",
    "pdb",
    "topology",
    "security",
    "network",
    "secrets",
    "observability",
];

/// Finished output of the best-practice analyzer. Read-only input to the export.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AnalysisResult {
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub categories: HashMap<String, Category>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Category {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub checks: Vec<Check>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Check {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Good,
    Warning,
    Critical,
}

/// Score bands used for categories and the overall score.
pub fn score_tone(score: f64) -> Tone {
    if score >= 70.0 {
        Tone::Good
    } else if score >= 40.0 {
        Tone::Warning
    } else {
        Tone::Critical
    }
}

/// First `<digits>%` token in a details string, 0 when there is none.
pub fn extract_percentage(details: &str) -> u32 {
    let bytes = details.as_bytes();
    let mut start = None;
    for (i, &b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            start.get_or_insert(i);
        } else {
            if b == b'%'
                && let Some(s) = start
                && let Ok(n) = details[s..i].parse::<u32>()
            {
                return n;
            }
            start = None;
        }
    }
    0
}

pub fn category_display_name(id: &str) -> String {
    if id == "pdb" {
        return "PodDisruptionBudget".to_string();
    }
    id.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl AnalysisResult {
    pub fn from_json(bytes: &[u8]) -> Result<Self, crate::Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Reads and parses an analysis file. I/O errors name the path.
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let raw = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                crate::Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", e, path.display()),
                ))
            }
            _ => crate::Error::Io(e),
        })?;
        Self::from_json(&raw)
    }

    /// Categories present in this result: declared ones first in declared
    /// order, then any unrecognised ids sorted lexically.
    pub fn ordered_categories(&self) -> Vec<(&str, &Category)> {
        let mut out: Vec<(&str, &Category)> = CATEGORY_ORDER
            .iter()
            .filter_map(|id| self.categories.get_key_value(*id))
            .map(|(id, cat)| (id.as_str(), cat))
            .collect();

        let mut extra: Vec<(&str, &Category)> = self
            .categories
            .iter()
            .filter(|(id, _)| !CATEGORY_ORDER.contains(&id.as_str()))
            .map(|(id, cat)| (id.as_str(), cat))
            .collect();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        out.extend(extra);
        out
    }
}

impl Check {
    /// The plain "Pod anti-affinity" check reports a spread ratio where lower is better.
    fn is_inverted(&self) -> bool {
        self.name.contains("Pod anti-affinity")
            && !self.name.contains("Required")
            && !self.name.contains("Preferred")
    }

    pub fn percentage(&self) -> u32 {
        extract_percentage(&self.details)
    }

    pub fn tone(&self) -> Tone {
        if self.is_inverted() {
            let pct = self.percentage();
            return if pct <= 30 {
                Tone::Good
            } else if pct <= 70 {
                Tone::Warning
            } else {
                Tone::Critical
            };
        }
        if self.passed { Tone::Good } else { Tone::Critical }
    }

    /// Extra line shown for the required/preferred anti-affinity variants.
    pub fn variant_note(&self) -> Option<String> {
        if !self.name.contains("Pod anti-affinity") {
            return None;
        }
        let pct = self.percentage();
        if self.name.contains("Required") {
            Some(format!(
                "Required ({pct}%) - for critical workloads that must be spread across nodes"
            ))
        } else if self.name.contains("Preferred") {
            Some(format!(
                "Preferred ({pct}%) - for non-critical workloads where spreading is beneficial but not essential"
            ))
        } else {
            None
        }
    }
}
