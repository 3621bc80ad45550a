use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// The eight strategies the file reference resolver tries, in priority order.
///
/// Priority is used as a tie-breaker when two strategies produce matches with
/// otherwise-equal scores; `EXACT_PATH` additionally short-circuits every
/// other strategy outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResolutionStrategy {
    ExactPath,
    SpecialReference,
    RecentFile,
    FuzzyMatch,
    PatternMatch,
    ProjectStructure,
    FileType,
    SemanticContext,
}

impl ResolutionStrategy {
    /// Lower is tried/weighted first; used only to break score ties.
    pub fn priority(self) -> u8 {
        self as u8
    }
}

/// File-type classification used by the `FILE_TYPE` resolver strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Python,
    JavaScript,
    TypeScript,
    Rust,
    Go,
    Java,
    Markdown,
    Json,
    Yaml,
    Toml,
    Shell,
    Html,
    Css,
    Text,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "py" | "pyi" => FileType::Python,
            "js" | "jsx" | "mjs" | "cjs" => FileType::JavaScript,
            "ts" | "tsx" => FileType::TypeScript,
            "rs" => FileType::Rust,
            "go" => FileType::Go,
            "java" => FileType::Java,
            "md" | "markdown" => FileType::Markdown,
            "json" => FileType::Json,
            "yaml" | "yml" => FileType::Yaml,
            "toml" => FileType::Toml,
            "sh" | "bash" | "zsh" => FileType::Shell,
            "html" | "htm" => FileType::Html,
            "css" | "scss" | "sass" => FileType::Css,
            "txt" => FileType::Text,
            _ => return None,
        })
    }

    /// Extensions considered part of this file type, most-specific first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileType::Python => &["py", "pyi"],
            FileType::JavaScript => &["js", "jsx", "mjs", "cjs"],
            FileType::TypeScript => &["ts", "tsx"],
            FileType::Rust => &["rs"],
            FileType::Go => &["go"],
            FileType::Java => &["java"],
            FileType::Markdown => &["md", "markdown"],
            FileType::Json => &["json"],
            FileType::Yaml => &["yaml", "yml"],
            FileType::Toml => &["toml"],
            FileType::Shell => &["sh", "bash", "zsh"],
            FileType::Html => &["html", "htm"],
            FileType::Css => &["css", "scss", "sass"],
            FileType::Text => &["txt"],
        }
    }

    /// Recognise a file type mentioned in natural language ("python file foo").
    pub fn from_mention(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        let candidates = [
            (FileType::Python, &["python", "py file"][..]),
            (FileType::JavaScript, &["javascript", "js file"][..]),
            (FileType::TypeScript, &["typescript", "ts file"][..]),
            (FileType::Rust, &["rust file", " rs file"][..]),
            (FileType::Go, &["golang", "go file"][..]),
            (FileType::Java, &["java file"][..]),
            (FileType::Markdown, &["markdown", "readme"][..]),
            (FileType::Json, &["json file"][..]),
            (FileType::Yaml, &["yaml file", "yml file"][..]),
            (FileType::Toml, &["toml file"][..]),
            (FileType::Shell, &["shell script", "bash script"][..]),
        ];
        candidates
            .into_iter()
            .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
            .map(|(ft, _)| ft)
    }
}

/// A single candidate produced by a resolver strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverMatch {
    pub path: PathBuf,
    pub score: f32,
    pub strategy: ResolutionStrategy,
    pub metadata: HashMap<String, String>,
}

impl ResolverMatch {
    pub fn new(path: PathBuf, score: f32, strategy: ResolutionStrategy) -> Self {
        Self {
            path,
            score: score.clamp(0.0, 1.0),
            strategy,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
