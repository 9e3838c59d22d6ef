use std::process::Command;
use vergen::EmitBuilder;

fn main() {
    let in_git_checkout = Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);

    // VERGEN_GIT_SHA is only emitted inside a checkout; the crate falls back
    // to "unknown" otherwise.
    let mut builder = EmitBuilder::builder();
    builder.build_timestamp();
    if in_git_checkout {
        builder.git_sha(true);
    }

    builder.emit().expect("Unable to generate build metadata");
}
