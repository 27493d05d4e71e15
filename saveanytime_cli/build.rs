use std::process::Command;

fn main() {
    let mut version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();

    if let Some(git_hash) = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
    {
        let git_hash = git_hash.trim();
        let dirty = Command::new("git")
            .args(["diff-index", "--quiet", "HEAD"])
            .status()
            .ok()
            .map(|status| !status.success())
            .unwrap_or(false);

        version.push_str(&format!(
            " ({}{})",
            &git_hash[..10.min(git_hash.len())],
            if dirty { "-dirty" } else { "" }
        ));
    }

    println!("cargo:rustc-env=SAVEANYTIME_VERSION={version}");
}
