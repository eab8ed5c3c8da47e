//! Build script for mcf-rec
//!
//! Exports the build id shown in the startup log line:
//! - `BUILD_ID`: `git describe` of the checkout, `-dirty` when the tree has
//!   local changes, `unknown` outside git
//! - `BUILD_TIMESTAMP`: UTC, RFC 3339
//! - `BUILD_PROFILE`: cargo profile

use std::process::Command;

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let id = String::from_utf8(output.stdout).ok()?;
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

fn main() {
    let build_id = git_describe().unwrap_or_else(|| "unknown".to_string());
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    for (key, value) in [
        ("BUILD_ID", build_id.as_str()),
        ("BUILD_TIMESTAMP", timestamp.as_str()),
        ("BUILD_PROFILE", profile.as_str()),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }
}
