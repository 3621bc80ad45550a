//! Syntactic impact analysis: tokenises a command and classifies its
//! arguments as likely files, directories, or both — without ever touching
//! the filesystem.

use crate::models::{ImpactSummary, OperationKind};
use std::path::PathBuf;

const DESTRUCTIVE_COMMANDS: &[&str] = &["rm", "shred", "dd", "mkfs", "fdisk", "gdisk", "parted"];
const CREATOR_COMMANDS: &[&str] = &["touch", "mkdir", "cp", "mv", "wget", "curl"];
const MODIFIER_COMMANDS: &[&str] = &["vim", "nano", "emacs", "sed", "awk", "patch", "truncate"];

/// Commands whose non-option arguments are conventionally directories.
const DIRECTORY_TYPICAL: &[&str] = &["mkdir", "rmdir", "cd", "pushd", "popd"];
/// Commands whose non-option arguments are conventionally files.
const FILE_TYPICAL: &[&str] = &["cat", "less", "more", "touch", "rm", "mv", "cp"];

fn operation_kind_for(base: &str) -> OperationKind {
    match base {
        "ls" | "cat" | "less" | "more" | "head" | "tail" | "grep" => OperationKind::Read,
        "rm" | "rmdir" | "shred" => OperationKind::Delete,
        "mv" => OperationKind::Move,
        "cp" => OperationKind::Copy,
        "touch" | "mkdir" | "mknod" => OperationKind::Create,
        "chmod" | "chown" | "chgrp" | "setfacl" => OperationKind::PermissionChange,
        "wget" | "curl" => OperationKind::NetworkAccess,
        "git" | "svn" | "hg" => OperationKind::VersionControl,
        "apt" | "apt-get" | "yum" | "dnf" | "pacman" | "zypper" => OperationKind::PackageManagement,
        "systemctl" | "service" | "docker" | "podman" | "kubectl" => OperationKind::ProcessControl,
        "ifconfig" | "ip" | "route" | "iptables" | "ufw" => OperationKind::NetworkAccess,
        "passwd" | "useradd" | "usermod" | "groupadd" => OperationKind::Write,
        _ => OperationKind::Read,
    }
}

/// Tokenise `command` with shell-lexing rules and derive what it will touch,
/// purely from argument shape. Never fails: malformed shell syntax that
/// cannot be tokenised just yields an empty summary.
pub fn analyze_impact(command: &str) -> ImpactSummary {
    let mut impact = ImpactSummary::empty();

    let Ok(tokens) = shell_words::split(command) else {
        return impact;
    };
    let Some((base_cmd, args)) = tokens.split_first() else {
        return impact;
    };

    if DESTRUCTIVE_COMMANDS.contains(&base_cmd.as_str()) {
        impact.destructive = true;
    }
    if CREATOR_COMMANDS.contains(&base_cmd.as_str()) {
        impact.creates_files = true;
    }
    if MODIFIER_COMMANDS.contains(&base_cmd.as_str()) {
        impact.modifies_files = true;
    }

    impact.operations.insert(operation_kind_for(base_cmd));

    for arg in args.iter().filter(|a| !a.starts_with('-')) {
        if arg == ">" || arg == ">>" || arg == "<" || arg == "|" || arg == "&" {
            continue;
        }

        if arg.ends_with('/') {
            impact.affected_dirs.insert(PathBuf::from(arg));
        } else if arg.contains('*') || arg.contains('?') {
            impact.affected_files.insert(PathBuf::from(arg));
            impact.affected_dirs.insert(PathBuf::from(arg));
        } else if DIRECTORY_TYPICAL.contains(&base_cmd.as_str()) {
            impact.affected_dirs.insert(PathBuf::from(arg));
        } else if arg.contains('/') {
            let last_component = arg.rsplit('/').next().unwrap_or(arg);
            if last_component.contains('.') {
                impact.affected_files.insert(PathBuf::from(arg));
            } else {
                impact.affected_dirs.insert(PathBuf::from(arg));
            }
        } else if FILE_TYPICAL.contains(&base_cmd.as_str()) {
            impact.affected_files.insert(PathBuf::from(arg));
        } else {
            impact.affected_files.insert(PathBuf::from(arg));
        }
    }

    impact
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkdir_targets_are_directories() {
        let impact = analyze_impact("mkdir -p build/output");
        assert!(impact.affected_dirs.contains(&PathBuf::from("build/output")));
        assert!(impact.creates_files);
    }

    #[test]
    fn rm_is_destructive_and_targets_file() {
        let impact = analyze_impact("rm notes.txt");
        assert!(impact.destructive);
        assert!(impact.affected_files.contains(&PathBuf::from("notes.txt")));
    }

    #[test]
    fn wildcard_is_both_file_and_dir() {
        let impact = analyze_impact("rm *.log");
        assert!(impact.affected_files.contains(&PathBuf::from("*.log")));
        assert!(impact.affected_dirs.contains(&PathBuf::from("*.log")));
    }

    #[test]
    fn unparseable_command_yields_empty_summary() {
        let impact = analyze_impact("echo 'unterminated");
        assert_eq!(impact, ImpactSummary::empty());
    }
}
