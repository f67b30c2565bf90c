use assert_cmd::Command;
use std::fs;

fn settings_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{
            "referral_bonus": true,
            "fee_basis_points": 100,
            "merchant_phones": {
                "moov": {"229": "22960000001"},
                "orange": {"225": "2250700000001"}
            }
        }"#,
    )
    .expect("write settings");
    path
}

fn icash() -> Command {
    let mut cmd = Command::cargo_bin("icash").expect("icash binary built");
    cmd.env_remove("ICASH_CONFIG").env_remove("ICASH_DEBUG");
    cmd
}

#[test]
fn ussd_preview_for_moov_deducts_fee() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_file(&dir);

    let output = icash()
        .args(["ussd", "--network", "MOOV BENIN", "--country", "229", "--amount", "10000"])
        .arg("--settings")
        .arg(&settings)
        .output()
        .expect("cli runs");

    assert!(output.status.success(), "cli failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("*155*2*1*22960000001*9900#"));
    assert_eq!(lines.next(), Some("tel:*155*2*1*22960000001*9900#"));
}

#[test]
fn ussd_preview_for_orange_keeps_amount() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_file(&dir);

    let output = icash()
        .args(["ussd", "--network", "Orange CI", "--country", "225", "--amount", "5000"])
        .arg("--settings")
        .arg(&settings)
        .output()
        .expect("cli runs");

    assert!(output.status.success(), "cli failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    assert!(stdout.starts_with("*144*2*1*2250700000001*5000#\n"));
}

#[test]
fn ussd_preview_without_merchant_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_file(&dir);

    let output = icash()
        .args(["ussd", "--network", "Moov", "--country", "226", "--amount", "10000"])
        .arg("--settings")
        .arg(&settings)
        .output()
        .expect("cli runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("stderr is utf8");
    assert!(stderr.contains("Aucun code USSD"), "stderr: {}", stderr);
}

#[test]
fn ussd_preview_outside_connect_mode_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_file(&dir);

    icash()
        .args(["ussd", "--network", "Moov", "--country", "229", "--mode", "redirect", "--amount", "10000"])
        .arg("--settings")
        .arg(&settings)
        .assert()
        .failure();
}

#[test]
fn protected_commands_require_login() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = icash()
        .env("ICASH_SESSION_FILE", dir.path().join("session.json"))
        .env("ICASH_API_URL", "http://127.0.0.1:9/")
        .args(["history"])
        .output()
        .expect("cli runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("stderr is utf8");
    assert!(stderr.contains("Veuillez vous connecter"), "stderr: {}", stderr);
}

#[test]
fn logout_without_session_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");

    icash()
        .env("ICASH_SESSION_FILE", dir.path().join("session.json"))
        .arg("logout")
        .assert()
        .success();
}
