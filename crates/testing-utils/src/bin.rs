use assert_cmd::prelude::*;
use command_extra::CommandExtra;
use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use tempfile::{tempdir, TempDir};

/// Create a `nodestrap` command whose working directory is a fresh temporary
/// workspace.
pub fn nodestrap_with_temp_cwd() -> (Command, TempDir, PathBuf) {
    let root = tempdir().expect("create temporary directory");
    let workspace = root.path().join("workspace");
    fs::create_dir(&workspace).expect("create temporary workspace for nodestrap");
    let command = Command::cargo_bin("nodestrap")
        .expect("find the nodestrap binary")
        .with_current_dir(&workspace);
    (command, root, workspace)
}

/// `PATH` value that resolves stub tools from `bin_dir` before anything else,
/// while keeping the shell utilities the stub scripts themselves need.
pub fn path_with_stub_bin(bin_dir: &Path) -> OsString {
    let mut paths = vec![bin_dir.to_path_buf()];
    if let Some(path) = env::var_os("PATH") {
        paths.extend(env::split_paths(&path));
    }
    env::join_paths(paths).expect("join PATH entries")
}
