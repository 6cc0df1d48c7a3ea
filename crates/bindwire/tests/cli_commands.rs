#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn bindwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bindwire"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("bindwire should run")
}

fn bindwire_with_stdin(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bindwire"))
        .args(["--log-level", "error"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("bindwire should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin)
        .expect("stdin should accept input");
    child.wait_with_output().expect("bindwire should finish")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const SHORT_FRAME: &str = concat!(
    "\u{2}",
    "\nADIR1 044 )\r",
    "\nADCO 031762120856 @\r",
    "\nIINST1 044 P\r",
    "\nIINST2 002 K\r",
    "\nIINST3 003 M\r",
    "\u{3}",
);

#[test]
fn crc_appends_uppercase_checksum() {
    let output = bindwire(&["--format", "pretty", "crc", "0a0200"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "0A02006D3F");
}

#[test]
fn crc_verify_mismatch_exits_1() {
    let ok = bindwire(&["--format", "pretty", "crc", "0A02006D3F", "--verify"]);
    assert_eq!(ok.status.code(), Some(0));
    assert_eq!(stdout(&ok).trim(), "valid");

    let bad = bindwire(&["--format", "pretty", "crc", "0A02006D3E", "--verify"]);
    assert_eq!(bad.status.code(), Some(1));
    assert_eq!(stdout(&bad).trim(), "invalid");
}

#[test]
fn crc_rejects_non_hex_input() {
    let output = bindwire(&["crc", "zz"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: crc16 failed"));
}

#[test]
fn crc2_json_output() {
    let output = bindwire(&["--format", "json", "crc2", "$10"]);
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be json");
    assert_eq!(value["algorithm"], "crc8");
    assert_eq!(value["output"], "$10B2");
}

#[test]
fn nikobus_builds_and_verifies_command() {
    let built = bindwire(&["--format", "pretty", "nikobus", "$1012", "8E5A"]);
    assert!(built.status.success());
    assert_eq!(stdout(&built).trim(), "$10128E5ADE2752");

    let verified = bindwire(&["nikobus", "$1012", "$10128E5ADE2752", "--verify"]);
    assert_eq!(verified.status.code(), Some(0));

    let wrong_prefix = bindwire(&["nikobus", "$1410", "$10128E5ADE2752", "--verify"]);
    assert_eq!(wrong_prefix.status.code(), Some(64));
}

#[test]
fn teleinfo_short_frame_from_stdin() {
    let output = bindwire_with_stdin(&["--format", "json", "teleinfo"], SHORT_FRAME.as_bytes());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be json");
    assert_eq!(value["frame_type"], "SHORT");
    assert_eq!(value["adco"], "031762120856");
    assert_eq!(value["adir1"], 44);
    assert_eq!(value["iinst1"], 44);
    assert!(value["adir2"].is_null());
}

#[test]
fn teleinfo_bad_checksum_is_data_invalid() {
    let corrupted = SHORT_FRAME.replace("IINST2 002 K", "IINST2 002 L");
    let output = bindwire_with_stdin(&["teleinfo"], corrupted.as_bytes());
    assert_eq!(output.status.code(), Some(60));

    let lenient = bindwire_with_stdin(
        &["--format", "pretty", "teleinfo", "--no-verify"],
        corrupted.as_bytes(),
    );
    assert!(lenient.status.success());
    assert!(stdout(&lenient).contains("IINST2=2"));
}

#[test]
fn teleinfo_missing_file_is_usage_error() {
    let output = bindwire(&["teleinfo", "--file", "/nonexistent/bindwire/frame.txt"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn vbus_encode_packet_hex() {
    let output = bindwire(&[
        "--format", "pretty", "vbus", "encode", "--dst", "0x0010", "--src", "0x7E11", "--command",
        "0x0100", "--payload", "382280ff",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "aa1000117e100001014e3822007f0c1a");
}

#[test]
fn vbus_encode_raw_writes_binary() {
    let output = bindwire(&[
        "--format",
        "raw",
        "vbus",
        "encode",
        "--protocol",
        "datagram",
        "--dst",
        "7E11",
        "--src",
        "0020",
        "--command",
        "0900",
        "--value-id",
        "1234",
        "--value=-2",
    ]);
    assert!(output.status.success());
    assert_eq!(
        output.stdout,
        vec![
            0xAA, 0x11, 0x7E, 0x20, 0x00, 0x20, 0x00, 0x09, 0x34, 0x12, 0x7E, 0x7F, 0x7F, 0x7F,
            0x3C, 0x2A,
        ]
    );
}

#[test]
fn vbus_encode_unrepresentable_address_is_usage_error() {
    let output = bindwire(&[
        "vbus", "encode", "--dst", "0x0080", "--src", "0x7E11", "--command", "0x0100",
    ]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn vbus_decode_hex_json() {
    let output = bindwire(&[
        "--format",
        "json",
        "vbus",
        "decode",
        "aa1000117e100001014e3822007f0c1a aa117e200020000934127e7f7f7f3c2a",
    ]);
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["protocol"], "1.0");
    assert_eq!(lines[0]["source_name"], "DeltaSol BX Plus");
    assert_eq!(lines[0]["payload"], "382280ff");
    assert_eq!(lines[1]["protocol"], "2.0");
    assert_eq!(lines[1]["value"], -2);
}

#[test]
fn vbus_decode_stdin_with_corruption() {
    let mut wire = vec![0x00, 0x01];
    wire.extend([0xAA, 0x10, 0x00, 0x11, 0x7E, 0x10, 0x00, 0x01, 0x00, 0x4E]);
    wire.extend([0xAA, 0x10, 0x00, 0x11, 0x7E, 0x10, 0x00, 0x01, 0x00, 0x4F]);

    let output = bindwire_with_stdin(&["--format", "json", "vbus", "decode"], &wire);
    assert_eq!(output.status.code(), Some(60));
    assert_eq!(stdout(&output).lines().count(), 1);
}

#[test]
fn vbus_decode_empty_input_fails() {
    let output = bindwire_with_stdin(&["vbus", "decode"], &[]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn version_reports_package_version() {
    let output = bindwire(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("bindwire {}", env!("CARGO_PKG_VERSION"))
    );

    let extended = bindwire(&["version", "--extended"]);
    assert!(stdout(&extended).contains("name: bindwire"));
}
