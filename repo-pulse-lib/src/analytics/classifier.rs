//! Keyword-based descriptive tags for a repository.

use super::inputs::RepositorySnapshot;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

const UNKNOWN_LANGUAGE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize, Deserialize)]
pub enum RepoType {
    Fork,
    Library,
    Template,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize, Deserialize)]
pub enum Framework {
    #[strum(to_string = "React/Next.js")]
    #[serde(rename = "React/Next.js")]
    ReactNext,

    #[strum(to_string = "Vue.js")]
    #[serde(rename = "Vue.js")]
    Vue,

    Angular,

    #[strum(to_string = "Python Web Framework")]
    #[serde(rename = "Python Web Framework")]
    PythonWeb,

    #[strum(to_string = "Node.js")]
    #[serde(rename = "Node.js")]
    Node,

    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, Serialize, Deserialize)]
pub enum Category {
    Backend,
    Frontend,
    Mobile,

    #[strum(to_string = "AI/ML")]
    #[serde(rename = "AI/ML")]
    AiMl,

    Gaming,

    #[strum(to_string = "Tool/Utility")]
    #[serde(rename = "Tool/Utility")]
    ToolUtility,

    Unknown,
}

/// Descriptive tags derived from repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub primary_language: String,

    #[serde(rename = "type")]
    pub repo_type: RepoType,

    pub framework: Framework,
    pub category: Category,
}

// Each table is scanned in order and the first row with a keyword present as a
// lowercase substring wins.

const TYPE_RULES: &[(&[&str], RepoType)] = &[
    (&["library", "package", "npm", "pip"], RepoType::Library),
    (&["template", "boilerplate", "starter"], RepoType::Template),
];

const FRAMEWORK_RULES: &[(&[&str], Framework)] = &[
    (&["react", "nextjs", "next.js"], Framework::ReactNext),
    (&["vue", "vuejs", "nuxt"], Framework::Vue),
    (&["angular"], Framework::Angular),
    (&["django", "flask", "fastapi"], Framework::PythonWeb),
    (&["express", "node"], Framework::Node),
];

const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["api", "backend", "server"], Category::Backend),
    (&["frontend", "ui", "component"], Category::Frontend),
    (&["mobile", "ios", "android"], Category::Mobile),
    (&["ml", "ai", "machine learning", "neural"], Category::AiMl),
    (&["game", "gaming"], Category::Gaming),
    (&["tool", "cli", "utility"], Category::ToolUtility),
];

fn first_match<T: Copy>(rules: &[(&[&str], T)], haystacks: &[&str]) -> Option<T> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| haystacks.iter().any(|h| h.contains(k))))
        .map(|&(_, result)| result)
}

/// Classify a repository from its name, description, language, and fork flag.
#[must_use]
pub fn classify(repo: &RepositorySnapshot) -> Classification {
    let description = repo.description.as_deref().unwrap_or_default().to_lowercase();
    let name = repo.name.to_lowercase();

    let repo_type = if repo.fork {
        RepoType::Fork
    } else {
        first_match(TYPE_RULES, &[description.as_str()]).unwrap_or(RepoType::Project)
    };

    Classification {
        primary_language: repo.language.clone().unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
        repo_type,
        framework: first_match(FRAMEWORK_RULES, &[description.as_str(), name.as_str()]).unwrap_or(Framework::Unknown),
        category: first_match(CATEGORY_RULES, &[description.as_str()]).unwrap_or(Category::Unknown),
    }
}
