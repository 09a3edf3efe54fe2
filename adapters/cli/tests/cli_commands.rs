use std::process::{Command, Output};

fn digi_defence(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_digi-defence"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run digi-defence")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is utf-8")
}

#[test]
fn encoded_run_decodes_back_to_json() {
    let encoded = digi_defence(&[
        "encode-run",
        "--lives",
        "17",
        "--wave",
        "3",
        "--tower",
        "agumon@4,1",
    ]);
    assert!(encoded.status.success());
    let code = stdout(&encoded);
    let code = code.trim();
    assert!(code.starts_with("dd:v1:"));

    let decoded = digi_defence(&["decode-run", code]);
    assert!(decoded.status.success());
    let json = stdout(&decoded);
    assert!(json.contains("\"lives\": 17"));
    assert!(json.contains("\"wave\": 3"));
    assert!(json.contains("agumon"));
}

#[test]
fn towers_on_the_lane_fail_encoding() {
    let output = digi_defence(&["encode-run", "--tower", "agumon@4,2"]);
    assert!(!output.status.success());
}

#[test]
fn garbage_save_codes_are_reported() {
    let output = digi_defence(&["decode-run", "dd:v2:e30"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not read save code"));
}

#[test]
fn simulate_prints_a_summary() {
    let output = digi_defence(&[
        "simulate",
        "--waves",
        "1",
        "--tower",
        "agumon@1,1",
        "--tower",
        "agumon@1,3",
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("wave 1 (Campaign): 1 cleared, 4 kills"));
    assert!(text.contains("#1 agumon"));
}
