// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end smoke tests for the `mcpf` CLI binary.

use assert_cmd::Command;
use predicates::str::contains;

fn mcpf() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("mcpf").expect("binary `mcpf` should be built")
}

#[test]
fn help_flag_prints_usage() {
    mcpf()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("protocol-conformance fuzzer"))
        .stdout(contains("run"))
        .stdout(contains("schema"));
}

#[test]
fn version_flag_prints_version() {
    mcpf().arg("--version").assert().success().stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn schema_subcommand_prints_fuzz_config_schema() {
    mcpf().arg("schema").assert().success().stdout(contains("FuzzConfig")).stdout(contains("runs_per_tool"));
}

#[test]
fn run_with_no_endpoint_fails_with_a_startup_error() {
    mcpf().arg("run").assert().failure().code(2).stderr(contains("non-empty endpoint command"));
}

#[test]
fn run_against_a_missing_stdio_command_fails_with_a_startup_error() {
    mcpf()
        .args(["run", "--protocol", "stdio", "--command", "mcpf-nonexistent-test-binary", "--runs-per-tool", "1"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn debug_flag_is_accepted() {
    mcpf().args(["--debug", "schema"]).assert().success().stdout(contains("FuzzConfig"));
}
