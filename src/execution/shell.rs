//! Shell-string inspection the Execution Engine needs before it can decide
//! how to run a command: does it need a real shell, is it a `cd`, can it
//! even run headlessly.

const METACHARACTERS: &[char] = &['|', '&', ';', '$', '`', '(', ')', '<', '>', '*', '?', '[', ']', '{', '}', '~', '#'];

/// True if `command` needs shell interpretation (pipes, redirects,
/// substitution, globs...). Metacharacter-free commands are tokenised with
/// `shell_words` and executed directly, skipping a shell process entirely.
pub fn needs_shell(command: &str) -> bool {
    command.contains(METACHARACTERS)
}

/// Commands that expect a TTY (editors, pagers, REPLs, remote shells) and
/// can't be usefully run with piped stdio.
const INTERACTIVE_COMMANDS: &[&str] = &[
    "vim", "vi", "nvim", "nano", "emacs", "pico", "less", "more", "man", "top", "htop", "ssh",
    "python", "python3", "irb", "node", "psql", "mysql", "sqlite3", "ftp", "sftp", "telnet",
    "screen", "tmux", "watch",
];

pub fn is_interactive(base_command: &str) -> bool {
    INTERACTIVE_COMMANDS.contains(&base_command)
}

/// Commands that stream indefinitely and need a bound on how long a
/// non-interactive caller waits for them (`tail -f`, `docker logs -f`...).
const FOLLOW_FLAGS: &[&str] = &["-f", "--follow", "--tail"];

pub fn is_continuous_follow(base_command: &str, tokens: &[String]) -> bool {
    matches!(base_command, "tail" | "docker" | "kubectl" | "journalctl")
        && tokens.iter().any(|t| FOLLOW_FLAGS.contains(&t.as_str()))
}

/// If `command` is `cd <path>` or `cd <path> && <rest>`, split off the
/// directory change so the Execution Engine can resolve it itself rather
/// than let it evaporate inside a subprocess. Returns `(new_dir, rest)`.
pub fn split_cd_prefix(command: &str) -> Option<(&str, Option<&str>)> {
    let trimmed = command.trim();
    let rest = trimmed.strip_prefix("cd ").or_else(|| trimmed.strip_prefix("cd\t"))?;
    let rest = rest.trim_start();

    if let Some(idx) = rest.find("&&") {
        let dir = rest[..idx].trim();
        let tail = rest[idx + 2..].trim();
        if dir.is_empty() {
            return None;
        }
        Some((dir, if tail.is_empty() { None } else { Some(tail) }))
    } else if rest.is_empty() {
        None
    } else {
        Some((rest, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_metacharacters() {
        assert!(needs_shell("ls | grep foo"));
        assert!(needs_shell("echo hi > out.txt"));
        assert!(!needs_shell("ls -la /tmp"));
    }

    #[test]
    fn recognises_interactive_commands() {
        assert!(is_interactive("vim"));
        assert!(!is_interactive("ls"));
    }

    #[test]
    fn detects_continuous_follow() {
        assert!(is_continuous_follow("tail", &["tail".into(), "-f".into(), "log.txt".into()]));
        assert!(!is_continuous_follow("tail", &["tail".into(), "log.txt".into()]));
    }

    #[test]
    fn splits_bare_cd() {
        assert_eq!(split_cd_prefix("cd /tmp"), Some(("/tmp", None)));
    }

    #[test]
    fn splits_cd_with_continuation() {
        assert_eq!(split_cd_prefix("cd /tmp && ls"), Some(("/tmp", Some("ls"))));
    }

    #[test]
    fn non_cd_command_is_not_split() {
        assert_eq!(split_cd_prefix("ls -la"), None);
    }
}
