//! Build script for vcd-detect
//!
//! Embeds build identification for `GET /health` and the startup banner:
//! `GIT_HASH` (`git describe`, `unknown` outside a checkout), `BUILD_TIMESTAMP`
//! (UTC, RFC 3339) and `BUILD_PROFILE`.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let revision = git_revision().unwrap_or_else(|| "unknown".to_string());
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    emit("GIT_HASH", &revision);
    emit("BUILD_TIMESTAMP", &timestamp);
    emit("BUILD_PROFILE", &profile);
}

/// Abbreviated commit, suffixed `-dirty` when the tree has local changes
fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let revision = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!revision.is_empty()).then_some(revision)
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}
