//! The static Ansible course shown in the sidebar.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurriculumSection {
    pub title: &'static str,
    pub subtopics: &'static [&'static str],
}

pub const CURRICULUM: &[CurriculumSection] = &[
    CurriculumSection {
        title: "1. Introduction to Ansible",
        subtopics: &[
            "What is Ansible?",
            "Key Concepts: Control Node, Managed Nodes, Inventory",
            "How Ansible Works: SSH & WinRM",
            "Ansible vs. Other Tools (Puppet, Chef)",
        ],
    },
    CurriculumSection {
        title: "2. Setup and Configuration",
        subtopics: &[
            "Installing Ansible on the Control Node",
            "Creating an Inventory File (Static & Dynamic)",
            "Ansible Configuration File (ansible.cfg)",
            "Testing Connectivity with Ad-Hoc Commands",
        ],
    },
    CurriculumSection {
        title: "3. Ansible Playbooks",
        subtopics: &[
            "Introduction to Playbooks",
            "YAML Syntax Basics",
            "Writing Your First Playbook",
            "Common Modules (apt, yum, copy, template)",
            "Running Playbooks",
        ],
    },
    CurriculumSection {
        title: "4. Variables and Facts",
        subtopics: &[
            "Using Variables in Playbooks",
            "Variable Precedence",
            "Ansible Facts",
            "Registered Variables",
        ],
    },
    CurriculumSection {
        title: "5. Organizing Content: Roles",
        subtopics: &[
            "Introduction to Roles",
            "Role Directory Structure",
            "Creating and Using Roles",
            "Finding Roles on Ansible Galaxy",
        ],
    },
    CurriculumSection {
        title: "6. Advanced Topics",
        subtopics: &[
            "Handlers and Templates (Jinja2)",
            "Conditional Execution (when)",
            "Loops (loop, with_items)",
            "Error Handling",
        ],
    },
    CurriculumSection {
        title: "7. Security and Best Practices",
        subtopics: &[
            "Using Ansible Vault for Secrets",
            "Best Practices for Playbook Design",
            "Idempotency in Playbooks",
            "Organizing Your Ansible Project",
        ],
    },
];

pub fn sections() -> &'static [CurriculumSection] {
    CURRICULUM
}

/// All subtopics in course order
pub fn topics() -> impl Iterator<Item = &'static str> {
    CURRICULUM.iter().flat_map(|section| section.subtopics.iter().copied())
}

/// Only subtopic labels are valid topics
pub fn is_topic(topic: &str) -> bool {
    topics().any(|t| t == topic)
}

pub fn section_for(topic: &str) -> Option<&'static CurriculumSection> {
    CURRICULUM
        .iter()
        .find(|section| section.subtopics.iter().any(|t| *t == topic))
}

/// Case-insensitive lookup used by the CLI; exact matches win, then a unique prefix.
pub fn find_topic(query: &str) -> Option<&'static str> {
    let query = query.trim();
    if let Some(exact) = topics().find(|t| *t == query) {
        return Some(exact);
    }

    let lower = query.to_lowercase();
    if let Some(ci) = topics().find(|t| t.to_lowercase() == lower) {
        return Some(ci);
    }

    let mut prefixed = topics().filter(|t| t.to_lowercase().starts_with(&lower));
    match (prefixed.next(), prefixed.next()) {
        (Some(only), None) if !lower.is_empty() => Some(only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_section_titles_are_unique() {
        let titles: HashSet<_> = CURRICULUM.iter().map(|s| s.title).collect();
        assert_eq!(titles.len(), CURRICULUM.len());
    }

    #[test]
    fn test_subtopics_are_unique() {
        let all: Vec<_> = topics().collect();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
        assert_eq!(all.len(), 29);
    }

    #[test]
    fn test_only_subtopics_are_topics() {
        assert!(is_topic("YAML Syntax Basics"));
        assert!(!is_topic("3. Ansible Playbooks"));
        assert!(!is_topic("yaml syntax basics"));
    }

    #[test]
    fn test_section_for() {
        let section = section_for("Ansible Facts").map(|s| s.title);
        assert_eq!(section, Some("4. Variables and Facts"));
        assert!(section_for("Terraform").is_none());
    }

    #[test]
    fn test_find_topic() {
        assert_eq!(find_topic("Error Handling"), Some("Error Handling"));
        assert_eq!(find_topic("error handling"), Some("Error Handling"));
        assert_eq!(find_topic("variable prec"), Some("Variable Precedence"));
        // "Introduction to Playbooks" and "Introduction to Roles" share the prefix
        assert_eq!(find_topic("introduction to"), None);
        assert_eq!(find_topic(""), None);
    }
}
