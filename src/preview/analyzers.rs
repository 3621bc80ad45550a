//! Hand-written, read-only preview analysers.
//!
//! Each analyser inspects the filesystem (`stat`, glob, count) but never
//! writes to it. One line of output per affected target; destructive
//! operations get a visible marker.

use std::path::Path;

fn has_flag(tokens: &[String], flags: &[&str]) -> bool {
    tokens.iter().any(|t| flags.contains(&t.as_str()))
}

fn non_option_args(tokens: &[String]) -> Vec<&str> {
    tokens[1..]
        .iter()
        .filter(|t| !t.starts_with('-'))
        .map(String::as_str)
        .collect()
}

pub fn preview_mkdir(tokens: &[String]) -> String {
    let recursive = has_flag(tokens, &["-p", "--parents"]);
    let mut lines = Vec::new();
    for path in non_option_args(tokens) {
        let p = Path::new(path);
        if p.exists() {
            lines.push(format!("\u{26a0}\u{fe0f} Already exists: {path}"));
        } else if recursive || p.parent().map(|parent| parent.as_os_str().is_empty() || parent.exists()).unwrap_or(true) {
            lines.push(format!("Will create directory: {path}"));
        } else {
            lines.push(format!("\u{274c} Parent directory missing: {path}"));
        }
    }
    if lines.is_empty() {
        "No directories specified to create.".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn preview_touch(tokens: &[String]) -> String {
    let mut lines = Vec::new();
    for path in non_option_args(tokens) {
        if Path::new(path).exists() {
            lines.push(format!("Will update timestamp: {path}"));
        } else {
            lines.push(format!("Will create empty file: {path}"));
        }
    }
    if lines.is_empty() {
        "No files specified.".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn preview_rm(tokens: &[String]) -> String {
    let recursive = has_flag(tokens, &["-r", "--recursive", "-rf", "-fr", "-R"]);
    let force = has_flag(tokens, &["-f", "--force", "-rf", "-fr"]);

    let mut expanded: Vec<String> = Vec::new();
    for path in non_option_args(tokens) {
        if path.contains('*') || path.contains('?') || path.contains('[') {
            match glob::glob(path) {
                Ok(paths) => {
                    let matches: Vec<String> = paths
                        .filter_map(Result::ok)
                        .map(|p| p.display().to_string())
                        .collect();
                    if matches.is_empty() {
                        expanded.push(format!("{path} (no matches)"));
                    } else {
                        expanded.extend(matches);
                    }
                }
                Err(_) => expanded.push(path.to_string()),
            }
        } else {
            expanded.push(path.to_string());
        }
    }

    let mut lines = Vec::new();
    for path in expanded {
        let p = Path::new(&path);
        if !p.exists() {
            if force {
                continue;
            }
            lines.push(format!("\u{274c} Not found: {path}"));
        } else if p.is_dir() && !recursive {
            lines.push(format!("\u{274c} Cannot remove directory without -r flag: {path}"));
        } else if p.is_dir() {
            let file_count = walkdir::WalkDir::new(p).into_iter().filter_map(Result::ok).count();
            lines.push(format!(
                "\u{26a0}\u{fe0f} Will remove directory containing {file_count} entries: {path}"
            ));
        } else {
            lines.push(format!("Will remove file: {path}"));
        }
    }

    if lines.is_empty() {
        "No files specified to remove or all paths are invalid.".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn preview_cp_or_mv(tokens: &[String], is_move: bool) -> String {
    if tokens.len() < 3 {
        let verb = if is_move { "mv" } else { "cp" };
        return format!("Invalid {verb} command: missing source or destination");
    }

    let non_opts = non_option_args(tokens);
    let Some((destination, sources)) = non_opts.split_last() else {
        return "Missing source or destination".to_string();
    };

    let recursive = has_flag(tokens, &["-r", "--recursive", "-a", "--archive", "-R"]) || is_move;
    let force = has_flag(tokens, &["-f", "--force"]);
    let verb = if is_move { "move" } else { "copy" };

    let mut lines = Vec::new();
    let dest_path = Path::new(destination);

    for source in sources {
        let source_path = Path::new(source);
        if !source_path.exists() {
            lines.push(format!("\u{274c} Source does not exist: {source}"));
            continue;
        }
        if source_path.is_dir() && !recursive {
            lines.push(format!(
                "\u{274c} Cannot {verb} directory without -r flag: {source}"
            ));
            continue;
        }

        if sources.len() > 1 || dest_path.is_dir() {
            if !dest_path.exists() {
                lines.push(format!("Will {verb} {source} to {destination}"));
            } else {
                let dest_file = dest_path.join(source_path.file_name().unwrap_or_default());
                if dest_file.exists() && !force {
                    lines.push(format!("\u{26a0}\u{fe0f} Will overwrite existing file: {}", dest_file.display()));
                } else {
                    lines.push(format!(
                        "Will {verb} {source} to {destination}/{}",
                        source_path.file_name().and_then(|n| n.to_str()).unwrap_or(source)
                    ));
                }
            }
        } else if dest_path.exists() && dest_path.is_file() {
            if force {
                lines.push(format!("Will force overwrite: {destination}"));
            } else {
                lines.push(format!("\u{26a0}\u{fe0f} Will overwrite: {destination}"));
            }
        } else if source_path.is_dir() {
            let file_count = walkdir::WalkDir::new(source_path)
                .into_iter()
                .filter_map(Result::ok)
                .count();
            lines.push(format!(
                "Will {verb} directory containing {file_count} entries to {destination}"
            ));
        } else {
            lines.push(format!("Will {verb} {source} to {destination}"));
        }
    }

    if lines.is_empty() {
        format!("No files specified to {verb}.")
    } else {
        lines.join("\n")
    }
}

/// Shared preview for read-only inspectors (`ls`, `cat`, `grep`, `find`):
/// confirms targets exist and notes nothing will be modified.
pub fn preview_read_only(base_cmd: &str, tokens: &[String]) -> String {
    let targets = non_option_args(tokens);
    if targets.is_empty() {
        return format!("{base_cmd} reads the current directory; no modifications will occur.");
    }
    let mut lines = Vec::new();
    for target in targets {
        if Path::new(target).exists() {
            lines.push(format!("Will read: {target}"));
        } else {
            lines.push(format!("\u{274c} Not found: {target}"));
        }
    }
    lines.join("\n")
}

pub fn preview_chmod_or_chown(base_cmd: &str, tokens: &[String]) -> String {
    let recursive = has_flag(tokens, &["-R", "--recursive"]);
    let non_opts = non_option_args(tokens);
    if non_opts.len() < 2 {
        return format!("Invalid {base_cmd} command: missing mode/owner or target");
    }
    let spec = non_opts[0];
    let mut lines = Vec::new();
    for target in &non_opts[1..] {
        let marker = if recursive { "\u{26a0}\u{fe0f} Recursively " } else { "Will " };
        lines.push(format!("{marker}change {base_cmd} of {target} to {spec}"));
    }
    lines.join("\n")
}
