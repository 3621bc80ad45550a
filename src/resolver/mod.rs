//! File Reference Resolver (C3): maps a textual reference to a concrete
//! path using eight ranked strategies.

mod strategies;

use crate::activity::SessionContext;
use crate::models::{ResolutionStrategy, ResolverMatch};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const CACHE_TTL: Duration = Duration::from_secs(300);
const FUZZY_THRESHOLD: f32 = 0.6;

/// Optional narrowing of the search, e.g. restricting to a sub-tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionScope(pub Option<String>);

impl Default for ResolutionScope {
    fn default() -> Self {
        ResolutionScope(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    reference: String,
    cwd: PathBuf,
    scope: Option<String>,
}

struct CacheEntry {
    inserted_at: Instant,
    result: Option<PathBuf>,
}

/// Resolves natural-language file references against a working directory,
/// an optional project root, and session activity/entity state.
pub struct FileReferenceResolver {
    session: SessionContext,
    cache: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl FileReferenceResolver {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `reference` against `cwd`, returning the best-scoring
    /// candidate across every strategy, or `None` if nothing clears the
    /// fuzzy-match threshold. `EXACT_PATH` hits short-circuit all others.
    pub fn resolve(
        &self,
        reference: &str,
        cwd: &Path,
        project_root: Option<&Path>,
        scope: ResolutionScope,
    ) -> Option<PathBuf> {
        let key = CacheKey {
            reference: reference.to_string(),
            cwd: cwd.to_path_buf(),
            scope: scope.0.clone(),
        };

        {
            let cache = self.cache.lock();
            if let Some(entry) = cache.get(&key) {
                if entry.inserted_at.elapsed() < CACHE_TTL {
                    return entry.result.clone();
                }
            }
        }

        let cleaned = strategies::clean_reference(reference);

        let result = if let Some(m) = strategies::exact_path(&cleaned, cwd, project_root) {
            Some(m.path)
        } else {
            let candidates = self.collect_all_matches(&cleaned, cwd, project_root);
            Self::pick_best_match(candidates)
        };

        if let (Some(path), false) = (&result, reference.trim().is_empty()) {
            self.session.set_entity(reference, path.clone());
        }

        self.cache.lock().insert(
            key,
            CacheEntry {
                inserted_at: Instant::now(),
                result: result.clone(),
            },
        );

        result
    }

    /// Resolve several references at once, e.g. for a multi-file command.
    pub fn resolve_many(
        &self,
        references: &[String],
        cwd: &Path,
        project_root: Option<&Path>,
    ) -> HashMap<String, Option<PathBuf>> {
        references
            .iter()
            .map(|r| (r.clone(), self.resolve(r, cwd, project_root, ResolutionScope::default())))
            .collect()
    }

    fn collect_all_matches(&self, reference: &str, cwd: &Path, project_root: Option<&Path>) -> Vec<ResolverMatch> {
        let mut all = Vec::new();
        if let Some(m) = strategies::special_reference(reference, cwd, &self.session) {
            all.push(m);
        }
        all.extend(strategies::recent_file(reference, &self.session));
        all.extend(strategies::fuzzy_match(reference, cwd, FUZZY_THRESHOLD));
        all.extend(strategies::pattern_match(reference, cwd));
        all.extend(strategies::project_structure(reference, cwd));
        all.extend(strategies::file_type(reference, cwd));
        all.extend(strategies::semantic_context(reference, &self.session));
        let _ = project_root;
        all
    }

    /// Highest score wins; ties broken by strategy priority (lower = more
    /// authoritative, per `ResolutionStrategy`'s declaration order).
    fn pick_best_match(candidates: Vec<ResolverMatch>) -> Option<PathBuf> {
        candidates
            .into_iter()
            .max_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.strategy.priority().cmp(&a.strategy.priority()))
            })
            .map(|m| m.path)
    }

    /// Text extraction helper: recognises quoted paths, extensioned
    /// tokens, and verb+path patterns, while excluding creation targets
    /// ("save as X", "create file X") that must not resolve as existing.
    pub fn extract_references(text: &str) -> Vec<String> {
        static CREATION_VERBS: &[&str] = &["save as", "create file", "create a file", "make a file", "new file"];
        let lower = text.to_ascii_lowercase();
        if CREATION_VERBS.iter().any(|v| lower.contains(v)) {
            return Vec::new();
        }

        let mut refs = Vec::new();
        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '"' || c == '\'' {
                if let Some(end) = text[i + 1..].find(c) {
                    refs.push(text[i + 1..i + 1 + end].to_string());
                }
            }
        }
        for token in text.split_whitespace() {
            let trimmed = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '.' && c != '/' && c != '_' && c != '-');
            if trimmed.contains('.') && trimmed.len() > 2 && !trimmed.contains("..") {
                refs.push(trimmed.to_string());
            }
        }
        refs.sort();
        refs.dedup();
        refs
    }
}

pub use strategies::clean_reference;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileReferenceResolver) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("auth.py"), "").unwrap();
        fs::write(dir.path().join("auth_test.py"), "").unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/auth.js"), "").unwrap();
        (dir, FileReferenceResolver::new(SessionContext::new()))
    }

    #[test]
    fn exact_path_short_circuits() {
        let (dir, resolver) = setup();
        let resolved = resolver
            .resolve("auth.py", dir.path(), None, ResolutionScope::default())
            .unwrap();
        assert_eq!(resolved, dir.path().join("auth.py"));
    }

    #[test]
    fn fuzzy_resolution_prefers_auth_test_for_compound_reference() {
        let (dir, resolver) = setup();
        let resolved = resolver
            .resolve("auth test", dir.path(), None, ResolutionScope::default())
            .unwrap();
        assert_eq!(resolved.file_name().unwrap(), "auth_test.py");
    }

    #[test]
    fn fuzzy_resolution_penalizes_node_modules() {
        let (dir, resolver) = setup();
        let resolved = resolver
            .resolve("auth", dir.path(), None, ResolutionScope::default())
            .unwrap();
        assert_eq!(resolved, dir.path().join("auth.py"));
    }

    #[test]
    fn resolve_is_idempotent_within_ttl() {
        let (dir, resolver) = setup();
        let first = resolver.resolve("auth.py", dir.path(), None, ResolutionScope::default());
        let second = resolver.resolve("auth.py", dir.path(), None, ResolutionScope::default());
        assert_eq!(first, second);
    }

    #[test]
    fn creation_targets_are_not_extracted_as_references() {
        let refs = FileReferenceResolver::extract_references("save as output.txt");
        assert!(refs.is_empty());
    }

    #[test]
    fn extensioned_tokens_are_extracted() {
        let refs = FileReferenceResolver::extract_references("please check auth.py for bugs");
        assert!(refs.contains(&"auth.py".to_string()));
    }
}
