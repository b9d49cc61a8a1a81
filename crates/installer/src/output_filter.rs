//! Text heuristics over captured package-manager output.
//!
//! Neither npm nor bun expose a structured error channel, so the failure
//! cause is recovered by substring matching on stderr. The marker list and
//! the warn-exclusion rule are load-bearing: changing them silently changes
//! the diagnostics users see.

/// Case-sensitive substrings that mark a stderr line as a probable failure
/// cause. `ERR!` is npm's error tag, `404` covers missing packages,
/// `ENOENT`/`ENOTEMPTY` cover filesystem races, `code` catches npm's
/// `code E...` lines.
const FAILURE_MARKERS: &[&str] = &["ERR!", "error", "404", "ENOENT", "ENOTEMPTY", "code"];

const MAX_DIAGNOSTIC_LINES: usize = 5;
const FALLBACK_LINES: usize = 3;

/// Extract the most relevant lines from the stderr of a failed install.
///
/// Lines matching [`FAILURE_MARKERS`] are kept, except lines that mention
/// warnings in any case (npm warnings are not fatal and must never be
/// presented as the reason for a failure). When no line matches, the first
/// [`FALLBACK_LINES`] non-empty lines are returned verbatim. The result is
/// truncated to [`MAX_DIAGNOSTIC_LINES`].
pub fn extract_failure_lines(stderr: &str) -> Vec<String> {
    let mut lines: Vec<String> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| FAILURE_MARKERS.iter().any(|marker| line.contains(marker)))
        .filter(|line| !line.to_lowercase().contains("warn"))
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        lines = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(FALLBACK_LINES)
            .map(str::to_string)
            .collect();
    }

    lines.truncate(MAX_DIAGNOSTIC_LINES);
    lines
}

/// Reduce bun's chatty output to the lines worth echoing after a successful
/// install: the version hash and the "N packages installed"/timing summary.
/// Cosmetic only.
pub fn bun_summary_lines(stdout: &str, stderr: &str) -> Vec<String> {
    let mut summary = Vec::new();

    for line in stdout.lines().chain(stderr.lines()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // "bun add v1.3.3 (274e01c7)" carries nothing but the build hash.
        if let Some(rest) = line.strip_prefix("bun add v") {
            if let Some(open) = rest.find('(') {
                if let Some(close) = rest[open..].find(')') {
                    summary.push(format!("[{}]", &rest[open + 1..open + close]));
                }
            }
            continue;
        }

        if line.contains("packages installed") || line.contains("done") {
            summary.push(line.to_string());
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use text_block_macros::text_block_fnl;

    #[test]
    fn keeps_error_lines_and_drops_warnings() {
        let stderr = text_block_fnl! {
            "npm WARN deprecated foo"
            "npm ERR! code ENOENT"
            "npm ERR! enoent no such file"
        };
        assert_eq!(
            extract_failure_lines(stderr),
            ["npm ERR! code ENOENT", "npm ERR! enoent no such file"],
        );
    }

    #[test]
    fn drops_warn_lines_even_when_they_carry_markers() {
        // "warn" in any case wins over every marker.
        let stderr = text_block_fnl! {
            "npm WARN old lockfile error within warning"
            "npm ERR! 404 Not Found"
        };
        assert_eq!(extract_failure_lines(stderr), ["npm ERR! 404 Not Found"]);
    }

    #[test]
    fn matches_http_404_and_fs_markers() {
        let stderr = text_block_fnl! {
            "some preamble without markers at all"
            "404 no-such-package is not in this registry"
            "ENOTEMPTY: directory not empty"
        };
        assert_eq!(
            extract_failure_lines(stderr),
            [
                "404 no-such-package is not in this registry",
                "ENOTEMPTY: directory not empty",
            ],
        );
    }

    #[test]
    fn falls_back_to_first_three_nonempty_lines() {
        let stderr = text_block_fnl! {
            "first line"
            ""
            "second line"
            "third line"
            "fourth line"
        };
        assert_eq!(extract_failure_lines(stderr), ["first line", "second line", "third line"]);
    }

    #[test]
    fn truncates_to_five_lines() {
        let stderr = (0..8).map(|i| format!("npm ERR! line {i}\n")).collect::<String>();
        let lines = extract_failure_lines(&stderr);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "npm ERR! line 4");
    }

    #[test]
    fn empty_stderr_yields_no_lines() {
        assert_eq!(extract_failure_lines(""), [] as [&str; 0]);
        assert_eq!(extract_failure_lines("\n  \n"), [] as [&str; 0]);
    }

    #[test]
    fn markers_are_case_sensitive() {
        // "err!" and "Error" don't match any marker, so the fallback kicks in
        // and returns them verbatim instead.
        let stderr = text_block_fnl! {
            "npm err! lowercase tag"
            "Error: capitalized"
        };
        assert_eq!(
            extract_failure_lines(stderr),
            ["npm err! lowercase tag", "Error: capitalized"],
        );
    }

    #[test]
    fn bun_summary_extracts_hash_and_counts() {
        let stdout = text_block_fnl! {
            "bun add v1.3.3 (274e01c7)"
            ""
            "installed cors@2.8.5"
            "1 packages installed [320.00ms]"
        };
        assert_eq!(bun_summary_lines(stdout, ""), ["[274e01c7]", "1 packages installed [320.00ms]"]);
    }

    #[test]
    fn bun_summary_ignores_unrelated_lines() {
        assert_eq!(bun_summary_lines("installed cors@2.8.5", "Saved lockfile"), [] as [&str; 0]);
    }
}
