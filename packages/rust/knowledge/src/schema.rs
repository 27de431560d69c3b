//! Destination database schemas.
//!
//! Documentation-only: these describe the databases the hosted workspace
//! is expected to provide. Nothing in the pipeline enforces them; the CLI
//! prints them as setup reference.

/// Property type in the destination workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Status,
    Date,
    Select,
    Number,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Status => "status",
            Self::Date => "date",
            Self::Select => "select",
            Self::Number => "number",
        }
    }
}

/// One property of a destination database.
#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub description: &'static str,
}

/// Database-level metadata for the destination workspace.
#[derive(Debug, Clone)]
pub struct DatabaseSchema {
    pub name: &'static str,
    pub properties: Vec<PropertySchema>,
    pub suggested_views: Vec<&'static str>,
    pub automation_hooks: Vec<&'static str>,
}

impl DatabaseSchema {
    /// Plain-text rendering for CLI output.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.name);
        for property in &self.properties {
            out.push_str(&format!(
                "  {:<14} {:<10} {}\n",
                property.name,
                property.kind.as_str(),
                property.description
            ));
        }
        if !self.suggested_views.is_empty() {
            out.push_str(&format!("  views: {}\n", self.suggested_views.join(", ")));
        }
        if !self.automation_hooks.is_empty() {
            out.push_str(&format!("  hooks: {}\n", self.automation_hooks.join(", ")));
        }
        out
    }
}

/// Mistake-log database: one record per analyzed error.
pub fn mistake_log() -> DatabaseSchema {
    DatabaseSchema {
        name: "Mistake log",
        properties: vec![
            PropertySchema {
                name: "title",
                kind: PropertyKind::Title,
                description: "mistake title or prompt summary",
            },
            PropertySchema {
                name: "knowledge point",
                kind: PropertyKind::Select,
                description: "curriculum topic the mistake maps to",
            },
            PropertySchema {
                name: "mastery",
                kind: PropertyKind::Status,
                description: "not mastered / reinforcing / mastered",
            },
            PropertySchema {
                name: "next review",
                kind: PropertyKind::Date,
                description: "computed next review date",
            },
            PropertySchema {
                name: "difficulty",
                kind: PropertyKind::Number,
                description: "subjective difficulty, 0-10",
            },
            PropertySchema {
                name: "task link",
                kind: PropertyKind::RichText,
                description: "link to the generated walkthrough page",
            },
        ],
        suggested_views: vec!["group by knowledge point", "sort by next review"],
        automation_hooks: vec![
            "review-due reminder",
            "mastery change triggers the next task",
        ],
    }
}

/// Study-plan database: timeline and completion state per planned task.
pub fn study_plan() -> DatabaseSchema {
    DatabaseSchema {
        name: "Study plan",
        properties: vec![
            PropertySchema {
                name: "task name",
                kind: PropertyKind::Title,
                description: "planned item name",
            },
            PropertySchema {
                name: "task type",
                kind: PropertyKind::Select,
                description: "walkthrough / practice / review / exam",
            },
            PropertySchema {
                name: "status",
                kind: PropertyKind::Status,
                description: "pending / in progress / done",
            },
            PropertySchema {
                name: "priority",
                kind: PropertyKind::Select,
                description: "high / medium / low",
            },
            PropertySchema {
                name: "start date",
                kind: PropertyKind::Date,
                description: "when the task starts",
            },
            PropertySchema {
                name: "due date",
                kind: PropertyKind::Date,
                description: "when the task is due",
            },
            PropertySchema {
                name: "linked mistake",
                kind: PropertyKind::RichText,
                description: "reference into the mistake log",
            },
        ],
        suggested_views: vec!["timeline", "board by status"],
        automation_hooks: vec!["status change posts a comment", "day-before-due reminder"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_carry_expected_fields() {
        let mistakes = mistake_log();
        assert_eq!(mistakes.properties.len(), 6);
        assert_eq!(mistakes.properties[0].kind, PropertyKind::Title);

        let plan = study_plan();
        assert_eq!(plan.properties.len(), 7);
        assert!(plan.properties.iter().any(|p| p.name == "linked mistake"));
    }

    #[test]
    fn render_includes_names_and_views() {
        let text = mistake_log().render();
        assert!(text.contains("Mistake log"));
        assert!(text.contains("knowledge point"));
        assert!(text.contains("views: group by knowledge point"));
    }
}
