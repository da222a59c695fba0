//! Working copy status, parsed from `git status --porcelain=v1 --branch`.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    /// Current branch, `None` on a detached HEAD.
    pub current: Option<String>,
    pub tracking: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    /// Paths with staged, unstaged or untracked changes.
    pub files: Vec<String>,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_on(&self, branch: &str) -> bool {
        self.current.as_deref() == Some(branch)
    }

    /// Parses porcelain v1 output with the `##` branch header.
    pub fn parse_porcelain(output: &str) -> GitStatus {
        let mut status = GitStatus::default();

        for line in output.lines() {
            if let Some(header) = line.strip_prefix("## ") {
                parse_branch_header(header, &mut status);
                continue;
            }
            if line.len() < 4 {
                continue;
            }
            let path = &line[3..];
            // Renames are reported as `old -> new`; the new path is what changed.
            let path = path.rsplit(" -> ").next().unwrap_or(path);
            status.files.push(path.trim_matches('"').to_string());
        }

        status
    }
}

fn parse_branch_header(header: &str, status: &mut GitStatus) {
    let (refs, counts) = match header.find(" [") {
        Some(idx) => (&header[..idx], Some(&header[idx + 2..])),
        None => (header, None),
    };

    if let Some(branch) = refs.strip_prefix("No commits yet on ") {
        status.current = Some(branch.to_string());
    } else if refs.starts_with("HEAD (no branch)") {
        status.current = None;
    } else {
        let mut parts = refs.splitn(2, "...");
        status.current = parts.next().map(str::to_string);
        status.tracking = parts.next().map(str::to_string);
    }

    if let Some(counts) = counts {
        for part in counts.trim_end_matches(']').split(", ") {
            if let Some(n) = part.strip_prefix("ahead ") {
                status.ahead = n.parse().unwrap_or(0);
            } else if let Some(n) = part.strip_prefix("behind ") {
                status.behind = n.parse().unwrap_or(0);
            }
        }
    }
}
