//! Compensating-command table for rolling back `COMMAND` operations whose
//! side effects live outside the filesystem (VCS state, installed packages).
//! Seed set mirrors common version-control and package-manager inverses;
//! extensible at runtime via [`CompensationTable::register`].

use regex::Regex;

struct CompensationRule {
    pattern: Regex,
    template: &'static str,
}

/// Ordered `(pattern, inverse_template)` pairs; first match wins. Templates
/// use `${name}` placeholders filled from the pattern's named captures.
pub struct CompensationTable {
    rules: Vec<CompensationRule>,
}

impl CompensationTable {
    pub fn seed() -> Self {
        let mut table = Self { rules: Vec::new() };
        for (pattern, template) in [
            (r"^git\s+add\s+(?P<target>.+)$", "git reset ${target}"),
            (r"^git\s+commit\b", "git reset --soft HEAD~1"),
            (r"^git\s+push\s+(?P<remote>\S+)\s+(?P<branch>\S+)$", "git push -f ${remote} ${branch}^"),
            (r"^npm\s+install\s+(-g\s+|--global\s+)?(?P<pkg>.+)$", "npm uninstall ${pkg}"),
            (r"^pip[23]?\s+install\s+(?P<pkg>.+)$", "pip uninstall -y ${pkg}"),
            (r"^(apt|apt-get)\s+install\s+(?P<pkg>.+)$", "apt-get remove ${pkg}"),
            (r"^mkdir\s+(-p\s+)?(?P<target>.+)$", "rmdir ${target}"),
            (r"^touch\s+(?P<target>.+)$", "rm ${target}"),
        ] {
            table.register(pattern, template).expect("seed compensation pattern is valid");
        }
        table
    }

    pub fn register(&mut self, pattern: &str, template: &'static str) -> Result<(), regex::Error> {
        self.rules.push(CompensationRule { pattern: Regex::new(pattern)?, template });
        Ok(())
    }

    /// Compute the compensating command for `command`, or `None` if no rule
    /// matches — the rollback is then unrecoverable.
    pub fn compensate(&self, command: &str) -> Option<String> {
        let trimmed = command.trim();
        for rule in &self.rules {
            if let Some(captures) = rule.pattern.captures(trimmed) {
                let mut expanded = String::new();
                captures.expand(rule.template, &mut expanded);
                return Some(expanded);
            }
        }
        None
    }
}

impl Default for CompensationTable {
    fn default() -> Self {
        Self::seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_add_compensates_with_reset() {
        let table = CompensationTable::seed();
        assert_eq!(table.compensate("git add foo.txt"), Some("git reset foo.txt".to_string()));
    }

    #[test]
    fn git_commit_compensates_with_soft_reset() {
        let table = CompensationTable::seed();
        assert_eq!(table.compensate("git commit -m 'msg'"), Some("git reset --soft HEAD~1".to_string()));
    }

    #[test]
    fn mkdir_compensates_with_rmdir() {
        let table = CompensationTable::seed();
        assert_eq!(table.compensate("mkdir -p build"), Some("rmdir build".to_string()));
    }

    #[test]
    fn unknown_command_has_no_compensation() {
        let table = CompensationTable::seed();
        assert_eq!(table.compensate("curl https://example.com"), None);
    }

    #[test]
    fn runtime_registration_extends_the_table() {
        let mut table = CompensationTable::seed();
        table.register(r"^foo\s+(?P<x>.+)$", "unfoo ${x}").unwrap();
        assert_eq!(table.compensate("foo bar"), Some("unfoo bar".to_string()));
    }
}
