//! Individual resolver strategies (§4.3). Each returns every candidate it
//! can find; `FileReferenceResolver` combines and ranks them.

use crate::activity::{self, ActivityAction, SessionContext};
use crate::models::{FileType, ResolutionStrategy, ResolverMatch};
use std::path::{Path, PathBuf};

const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "__pycache__", "target", "dist", "build", ".venv"];

fn is_excluded(path: &Path) -> bool {
    path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        EXCLUDED_DIRS.contains(&s.as_ref())
    })
}

/// Strip quoting and common filler words ("the", "file") from a raw
/// reference before strategies see it.
pub fn clean_reference(reference: &str) -> String {
    let trimmed = reference.trim().trim_matches(|c| c == '"' || c == '\'');
    let lower = trimmed.to_ascii_lowercase();
    let stripped = lower
        .split_whitespace()
        .filter(|w| !matches!(*w, "the" | "file" | "a" | "an"))
        .collect::<Vec<_>>()
        .join(" ");
    if stripped.is_empty() {
        trimmed.to_string()
    } else {
        stripped
    }
}

/// EXACT_PATH: reference resolves against {absolute, cwd, project_root}.
pub fn exact_path(reference: &str, cwd: &Path, project_root: Option<&Path>) -> Option<ResolverMatch> {
    let candidate = Path::new(reference);
    if candidate.is_absolute() && candidate.exists() {
        return Some(ResolverMatch::new(candidate.to_path_buf(), 1.0, ResolutionStrategy::ExactPath));
    }
    let in_cwd = cwd.join(reference);
    if in_cwd.exists() {
        return Some(ResolverMatch::new(in_cwd, 1.0, ResolutionStrategy::ExactPath));
    }
    if let Some(root) = project_root {
        let in_root = root.join(reference);
        if in_root.exists() {
            return Some(ResolverMatch::new(in_root, 1.0, ResolutionStrategy::ExactPath));
        }
    }
    None
}

/// SPECIAL_REFERENCE: literal phrases mapped to context slots.
pub fn special_reference(reference: &str, cwd: &Path, session: &SessionContext) -> Option<ResolverMatch> {
    let normalized = reference.to_ascii_lowercase();
    let path = match normalized.as_str() {
        "current file" | "this file" => session.current_file(),
        "last modified" | "last modified file" | "most recently modified file" => {
            session.last_touched(ActivityAction::Modified)
        }
        "home" | "home directory" => dirs::home_dir(),
        "parent directory" | "parent" => cwd.parent().map(Path::to_path_buf),
        _ => None,
    };
    path.map(|p| ResolverMatch::new(p, 1.0, ResolutionStrategy::SpecialReference))
}

/// RECENT_FILE: activity tracker and session entities, exact name = 1.0,
/// fuzzy = 0.9 (activity tracker) / 0.85 (session entity) times similarity.
pub fn recent_file(reference: &str, session: &SessionContext) -> Vec<ResolverMatch> {
    let mut matches = Vec::new();
    for event in session.recent_events() {
        let name = event.path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.eq_ignore_ascii_case(reference) {
            matches.push(ResolverMatch::new(event.path.clone(), 1.0, ResolutionStrategy::RecentFile));
        } else {
            let sim = strsim::jaro_winkler(name, reference) as f32;
            if sim > 0.5 {
                matches.push(ResolverMatch::new(event.path.clone(), sim * 0.9, ResolutionStrategy::RecentFile));
            }
        }
    }
    if let Some(path) = session.get_entity(reference) {
        matches.push(ResolverMatch::new(path, 0.95, ResolutionStrategy::RecentFile));
    }
    matches
}

/// FUZZY_MATCH: directory listing scored by string similarity, with boosts
/// and the exclusion-pattern penalty.
pub fn fuzzy_match(reference: &str, cwd: &Path, threshold: f32) -> Vec<ResolverMatch> {
    let mut matches = Vec::new();
    let walker = walkdir::WalkDir::new(cwd).max_depth(6).into_iter();

    for entry in walker.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_excluded(path) {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let mut score = strsim::jaro_winkler(filename, reference) as f32;
        score = adjust_fuzzy_score(score, path, cwd, reference);

        if score >= threshold {
            matches.push(ResolverMatch::new(path.to_path_buf(), score, ResolutionStrategy::FuzzyMatch));
        }
    }

    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(10);
    matches
}

fn adjust_fuzzy_score(mut score: f32, path: &Path, cwd: &Path, reference: &str) -> f32 {
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default();

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if reference.ends_with(ext) {
            score *= 1.2;
        }
    }
    if path.parent() == Some(cwd) {
        score *= 1.1;
    }
    if stem.eq_ignore_ascii_case(reference) {
        score *= 1.25;
    }
    if is_excluded(path) {
        score *= 0.5;
    }
    if activity::recently_modified_within(path, 86_400) {
        score *= 1.1;
    }
    let _ = filename;
    score.min(1.0)
}

/// PATTERN_MATCH: glob variations ranked by specificity (fewer wildcard
/// matches implies a more specific, higher-confidence hit).
pub fn pattern_match(reference: &str, cwd: &Path) -> Vec<ResolverMatch> {
    let extensions = ["", ".py", ".js", ".ts", ".rs", ".go", ".md", ".json", ".toml"];
    let mut patterns = Vec::new();
    for ext in extensions {
        patterns.push(format!("{reference}{ext}"));
        patterns.push(format!("*{reference}*{ext}"));
        patterns.push(format!("**/{reference}{ext}"));
    }

    let mut matches = Vec::new();
    for (idx, pattern) in patterns.iter().enumerate() {
        let full_pattern = cwd.join(pattern);
        let Some(pattern_str) = full_pattern.to_str() else {
            continue;
        };
        let Ok(paths) = glob::glob(pattern_str) else {
            continue;
        };
        // Earlier, more specific patterns score higher.
        let specificity = 1.0 - (idx as f32 / patterns.len() as f32) * 0.5;
        for path in paths.filter_map(Result::ok) {
            if path.is_file() && !is_excluded(&path) {
                matches.push(ResolverMatch::new(path, specificity, ResolutionStrategy::PatternMatch));
            }
        }
    }
    matches
}

/// PROJECT_STRUCTURE: bias by conventional source/test directories.
pub fn project_structure(reference: &str, cwd: &Path) -> Vec<ResolverMatch> {
    const CONVENTIONS: &[&[&str]] = &[
        &["src", "lib"],
        &["tests", "test", "__tests__", "spec"],
        &["bin", "cmd"],
        &["docs", "doc"],
    ];

    let mut matches = Vec::new();
    for group in CONVENTIONS {
        for dir in *group {
            let candidate_dir = cwd.join(dir);
            if !candidate_dir.is_dir() {
                continue;
            }
            for entry in walkdir::WalkDir::new(&candidate_dir).max_depth(4).into_iter().filter_map(Result::ok) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                let sim = strsim::jaro_winkler(filename, reference) as f32;
                if sim > 0.55 {
                    matches.push(
                        ResolverMatch::new(path.to_path_buf(), sim * 0.95, ResolutionStrategy::ProjectStructure)
                            .with_metadata("convention_dir", *dir),
                    );
                }
            }
        }
    }
    matches
}

/// FILE_TYPE: reference mentions a language, restrict by extension.
pub fn file_type(reference: &str, cwd: &Path) -> Vec<ResolverMatch> {
    let Some(ft) = FileType::from_mention(reference) else {
        return Vec::new();
    };
    let stripped = strip_type_mention(reference);

    let mut matches = Vec::new();
    for entry in walkdir::WalkDir::new(cwd).max_depth(6).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_file() || is_excluded(path) {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !ft.extensions().contains(&ext) {
            continue;
        }
        let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default();
        let sim = if stripped.is_empty() {
            0.6
        } else {
            strsim::jaro_winkler(stem, &stripped) as f32
        };
        if sim > 0.4 {
            matches.push(ResolverMatch::new(path.to_path_buf(), sim, ResolutionStrategy::FileType));
        }
    }
    matches
}

fn strip_type_mention(reference: &str) -> String {
    let lower = reference.to_ascii_lowercase();
    lower
        .split_whitespace()
        .filter(|w| !matches!(*w, "python" | "javascript" | "typescript" | "rust" | "golang" | "go" | "java" | "file" | "script"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// SEMANTIC_CONTEXT: cross-reference recent commands and the current file's
/// directory — weakest-signal strategy, used to break ties among otherwise
/// low-confidence candidates.
pub fn semantic_context(reference: &str, session: &SessionContext) -> Vec<ResolverMatch> {
    let Some(current) = session.current_file() else {
        return Vec::new();
    };
    let Some(dir) = current.parent() else {
        return Vec::new();
    };
    let mut matches = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let sim = strsim::jaro_winkler(filename, reference) as f32;
            if sim > 0.6 {
                matches.push(ResolverMatch::new(path, sim * 0.8, ResolutionStrategy::SemanticContext));
            }
        }
    }
    matches
}
