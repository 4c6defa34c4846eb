mod advice;

pub use advice::{Rule, RuleTable, category_summary};

use crate::model::{AnalysisResult, Category, Check, Tone, category_display_name, score_tone};

pub const CHECKS_PER_GROUP: usize = 3;

const REPORT_HEADING: &str = "Kubernetes Best Practices Analysis";
const ALL_PASSING: &str =
    "All checks are passing for this category. Continue maintaining these best practices.";
const NO_CHECKS: &str = "No checks were evaluated for this category.";

#[derive(Clone, Debug, PartialEq)]
pub struct CheckPanel {
    pub name: String,
    pub details: String,
    pub tone: Tone,
    pub variant_note: Option<String>,
    pub recommendation: Option<String>,
    pub reference: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockContent {
    Title {
        cluster_line: Option<String>,
        generated: String,
        overall_score: f64,
    },
    SectionHeader {
        title: String,
        score: f64,
        summary: String,
    },
    Check(CheckPanel),
    Recommendations(Vec<String>),
    AllPassing,
    NoChecks,
    Divider,
}

/// Opaque renderable unit. Width is fixed by the page; height is only known once rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockSpec {
    pub label: String,
    pub content: BlockContent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    Checks,
    Recommendations,
}

/// Keep-together run of blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub kind: GroupKind,
    pub atomic: bool,
    pub blocks: Vec<BlockSpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub category: String,
    pub header: BlockSpec,
    pub groups: Vec<Group>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineRole {
    Heading,
    Emphasis,
    Body,
    Item,
}

/// A line of text as a block would display it, before any wrapping.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub role: LineRole,
    pub text: String,
}

impl TextLine {
    fn new(role: LineRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

impl BlockSpec {
    pub fn tone(&self) -> Option<Tone> {
        match &self.content {
            BlockContent::Title { overall_score, .. } => Some(score_tone(*overall_score)),
            BlockContent::SectionHeader { score, .. } => Some(score_tone(*score)),
            BlockContent::Check(panel) => Some(panel.tone),
            BlockContent::AllPassing => Some(Tone::Good),
            BlockContent::Recommendations(_) | BlockContent::NoChecks | BlockContent::Divider => {
                None
            }
        }
    }

    pub fn lines(&self) -> Vec<TextLine> {
        match &self.content {
            BlockContent::Title {
                cluster_line,
                generated,
                overall_score,
            } => {
                let mut lines = vec![TextLine::new(LineRole::Heading, REPORT_HEADING)];
                if let Some(cluster) = cluster_line {
                    lines.push(TextLine::new(LineRole::Body, cluster.clone()));
                }
                lines.push(TextLine::new(LineRole::Body, format!("Generated: {generated}")));
                lines.push(TextLine::new(
                    LineRole::Heading,
                    format!("{}%", overall_score.round()),
                ));
                lines.push(TextLine::new(LineRole::Body, "Overall Compliance Score"));
                lines
            }
            BlockContent::SectionHeader {
                title,
                score,
                summary,
            } => vec![
                TextLine::new(LineRole::Heading, title.clone()),
                TextLine::new(LineRole::Emphasis, format!("{}%", score.round())),
                TextLine::new(LineRole::Body, summary.clone()),
                TextLine::new(LineRole::Heading, "Check Results"),
            ],
            BlockContent::Check(panel) => {
                let mut lines = vec![
                    TextLine::new(LineRole::Emphasis, panel.name.clone()),
                    TextLine::new(LineRole::Body, panel.details.clone()),
                ];
                if let Some(note) = &panel.variant_note {
                    lines.push(TextLine::new(LineRole::Body, note.clone()));
                }
                if let Some(rec) = &panel.recommendation {
                    lines.push(TextLine::new(
                        LineRole::Item,
                        format!("Recommendation: {rec}"),
                    ));
                }
                if let Some(url) = &panel.reference {
                    lines.push(TextLine::new(LineRole::Body, format!("Reference: {url}")));
                }
                lines
            }
            BlockContent::Recommendations(items) => {
                let mut lines = vec![TextLine::new(LineRole::Heading, "Recommendations")];
                lines.extend(
                    items
                        .iter()
                        .map(|item| TextLine::new(LineRole::Item, item.clone())),
                );
                lines
            }
            BlockContent::AllPassing => vec![TextLine::new(LineRole::Body, ALL_PASSING)],
            BlockContent::NoChecks => vec![TextLine::new(LineRole::Body, NO_CHECKS)],
            BlockContent::Divider => Vec::new(),
        }
    }
}

/// Turns an analysis result into the Section -> Group -> Block tree.
pub struct ContentTreeBuilder {
    rules: RuleTable,
    checks_per_group: usize,
}

impl Default for ContentTreeBuilder {
    fn default() -> Self {
        Self {
            rules: RuleTable::default(),
            checks_per_group: CHECKS_PER_GROUP,
        }
    }
}

impl ContentTreeBuilder {
    pub fn new(rules: RuleTable, checks_per_group: usize) -> Self {
        Self {
            rules,
            checks_per_group: checks_per_group.max(1),
        }
    }

    pub fn build(&self, result: &AnalysisResult) -> Vec<Section> {
        result
            .ordered_categories()
            .into_iter()
            .map(|(id, category)| self.build_section(id, category))
            .collect()
    }

    fn build_section(&self, id: &str, category: &Category) -> Section {
        let title = category_display_name(id);
        let header = BlockSpec {
            label: format!("{id}/header"),
            content: BlockContent::SectionHeader {
                title,
                score: category.score,
                summary: category_summary(id).to_string(),
            },
        };

        let mut groups: Vec<Group> = category
            .checks
            .chunks(self.checks_per_group)
            .enumerate()
            .map(|(gi, chunk)| Group {
                kind: GroupKind::Checks,
                atomic: true,
                blocks: chunk
                    .iter()
                    .enumerate()
                    .map(|(ci, check)| BlockSpec {
                        label: format!("{id}/checks/{}", gi * self.checks_per_group + ci),
                        content: BlockContent::Check(check_panel(check)),
                    })
                    .collect(),
            })
            .collect();

        groups.push(Group {
            kind: GroupKind::Recommendations,
            atomic: true,
            blocks: vec![BlockSpec {
                label: format!("{id}/recommendations"),
                content: self.recommendations(id, &category.checks),
            }],
        });

        Section {
            category: id.to_string(),
            header,
            groups,
        }
    }

    fn recommendations(&self, id: &str, checks: &[Check]) -> BlockContent {
        if checks.is_empty() {
            return BlockContent::NoChecks;
        }
        let items: Vec<String> = checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| match c.recommendation.as_deref() {
                Some(rec) if !rec.trim().is_empty() => rec.to_string(),
                _ => self.rules.resolve(id, &c.name).to_string(),
            })
            .collect();
        if items.is_empty() {
            BlockContent::AllPassing
        } else {
            BlockContent::Recommendations(items)
        }
    }
}

fn check_panel(check: &Check) -> CheckPanel {
    CheckPanel {
        name: check.name.clone(),
        details: check.details.clone(),
        tone: check.tone(),
        variant_note: check.variant_note(),
        recommendation: check.recommendation.clone(),
        reference: check.reference.clone(),
    }
}

pub fn build(result: &AnalysisResult) -> Vec<Section> {
    ContentTreeBuilder::default().build(result)
}

/// Title page block; the timestamp is passed in so the builder stays pure.
pub fn title_block(result: &AnalysisResult, generated: &str) -> BlockSpec {
    let cluster_line = result.cluster_name.as_deref().map(|name| match &result.cluster_id {
        Some(id) => format!("Cluster: {name} ({id})"),
        None => format!("Cluster: {name}"),
    });
    BlockSpec {
        label: "title".to_string(),
        content: BlockContent::Title {
            cluster_line,
            generated: generated.to_string(),
            overall_score: result.overall_score,
        },
    }
}

pub fn divider_block(after_category: &str) -> BlockSpec {
    BlockSpec {
        label: format!("{after_category}/divider"),
        content: BlockContent::Divider,
    }
}
