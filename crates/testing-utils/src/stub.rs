//! Stub package-manager executables.
//!
//! Install flows are exercised against small shell scripts standing in for
//! npm and bun. The scripts append timestamped records to a log file so
//! tests can reconstruct which tool installed which package and whether
//! their execution intervals overlapped.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Write an executable shell script named `name` into `bin_dir`.
#[cfg(unix)]
pub fn write_stub_tool(bin_dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = bin_dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("mark stub script executable");
    path
}

/// Script body that records `<tool> start|end <package> <nanoseconds>` lines
/// to `log` around a sleep, so executions overlap observably.
///
/// Packages whose name starts with `fail-` exit 1 after printing npm-style
/// error lines to stderr; everything else exits 0.
pub fn recording_script(tool: &str, log: &Path, sleep_seconds: f32) -> String {
    format!(
        r#"for arg in "$@"; do pkg="$arg"; done
echo "{tool} start $pkg $(date +%s%N)" >> "{log}"
sleep {sleep_seconds}
echo "{tool} end $pkg $(date +%s%N)" >> "{log}"
case "$pkg" in
  fail-*)
    echo "npm ERR! code E404" >&2
    echo "npm ERR! 404 Not Found - GET https://registry.npmjs.org/$pkg" >&2
    exit 1
    ;;
esac
exit 0"#,
        log = log.display(),
    )
}

/// One reconstructed subprocess execution interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub tool: String,
    pub package: String,
    pub start: u128,
    pub end: u128,
}

/// Parse the log produced by [`recording_script`] into execution intervals.
/// Duplicate package names produce one interval per execution.
pub fn parse_tool_runs(log: &Path) -> Vec<ToolRun> {
    let content = fs::read_to_string(log).expect("read stub invocation log");
    let mut starts: HashMap<(String, String), Vec<u128>> = HashMap::new();
    let mut ends: HashMap<(String, String), Vec<u128>> = HashMap::new();

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let (Some(tool), Some(event), Some(package), Some(timestamp)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            panic!("malformed log line: {line:?}");
        };
        let timestamp: u128 = timestamp.parse().expect("parse timestamp");
        let key = (tool.to_string(), package.to_string());
        match event {
            "start" => starts.entry(key).or_default().push(timestamp),
            "end" => ends.entry(key).or_default().push(timestamp),
            _ => panic!("unknown event in log line: {line:?}"),
        }
    }

    let mut runs = Vec::new();
    for ((tool, package), mut start_times) in starts {
        let mut end_times = ends.remove(&(tool.clone(), package.clone())).unwrap_or_default();
        assert_eq!(
            start_times.len(),
            end_times.len(),
            "unbalanced start/end records for {tool} {package}",
        );
        start_times.sort_unstable();
        end_times.sort_unstable();
        for (start, end) in start_times.into_iter().zip(end_times) {
            runs.push(ToolRun { tool: tool.clone(), package: package.clone(), start, end });
        }
    }
    runs
}

/// Greatest number of intervals in flight at any instant.
pub fn max_overlap(runs: &[ToolRun]) -> usize {
    let mut events: Vec<(u128, i32)> = runs
        .iter()
        .flat_map(|run| [(run.start, 1), (run.end, -1)])
        .collect();
    // ends sort before starts at equal timestamps, so touching intervals
    // don't count as overlapping
    events.sort_unstable_by_key(|&(timestamp, delta)| (timestamp, delta));

    let mut current = 0i32;
    let mut max = 0i32;
    for (_, delta) in events {
        current += delta;
        max = max.max(current);
    }
    max as usize
}
