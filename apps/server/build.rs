use std::env;
use std::process::Command;

/// Expose the compiler version to the `/version` endpoint.
fn main() {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".into());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|| "rustc unknown".into());

    println!("cargo:rustc-env=JSONMON_RUSTC_VERSION={version}");
    println!("cargo:rerun-if-env-changed=RUSTC");
}
