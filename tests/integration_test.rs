use assert_cmd::Command;
use mockito::Server;
use predicates::prelude::*;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tempfile::{TempDir, tempdir};
use zip::write::FileOptions;

/// Build a zip archive containing a minimal app bundle.
fn create_app_zip(bundle_name: &str) -> Vec<u8> {
    let options: FileOptions<()> = FileOptions::default();
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .add_directory(format!("{}/Contents", bundle_name), options)
        .unwrap();
    writer
        .start_file(format!("{}/Contents/Info.plist", bundle_name), options)
        .unwrap();
    writer.write_all(b"<plist version=\"1.0\"/>").unwrap();
    writer.finish().unwrap().into_inner()
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

struct Sandbox {
    home: TempDir,
    root: TempDir,
    apps: TempDir,
    manifests: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempdir().unwrap(),
            root: tempdir().unwrap(),
            apps: tempdir().unwrap(),
            manifests: tempdir().unwrap(),
        }
    }

    fn write_manifest(&self, identifier: &str, body: &str) {
        std::fs::write(
            self.manifests.path().join(format!("{}.toml", identifier)),
            body,
        )
        .unwrap();
    }

    fn caskit(&self) -> Command {
        let mut cmd = Command::cargo_bin("caskit").unwrap();
        cmd.env("HOME", self.home.path())
            .env("CASKIT_MACOS_VERSION", "14.5")
            .env("CASKIT_ROOT", self.root.path())
            .env("CASKIT_MANIFESTS", self.manifests.path())
            .env("CASKIT_APPLICATIONS", self.apps.path());
        cmd
    }

    fn app_path(&self, bundle: &str) -> std::path::PathBuf {
        self.apps.path().join(bundle)
    }

    fn receipt_path(&self, identifier: &str) -> std::path::PathBuf {
        self.root
            .path()
            .join("receipts")
            .join(format!("{}.json", identifier))
    }
}

fn demo_manifest(server_url: &str, sha256: &str, extra: &str) -> String {
    format!(
        r#"
identifier = "demo"
version = "2.0.0"
url = "{server}/releases/v{{version}}/Demo_v{{version}}_macOS.zip"
sha256 = "{sha256}"
name = "Demo"
description = "Demo application"
app = "Demo.app"
{extra}
"#,
        server = server_url,
        sha256 = sha256,
        extra = extra
    )
}

#[test]
fn test_end_to_end_install_verify_uninstall() {
    let mut server = Server::new();
    let zip_bytes = create_app_zip("Demo.app");
    let digest = sha256_hex(&zip_bytes);

    let mock = server
        .mock("GET", "/releases/v2.0.0/Demo_v2.0.0_macOS.zip")
        .with_status(200)
        .with_body(&zip_bytes)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest("demo", &demo_manifest(&server.url(), &digest, ""));

    sandbox
        .caskit()
        .args(["install", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed Demo 2.0.0"));

    mock.assert();
    assert!(sandbox.app_path("Demo.app/Contents/Info.plist").is_file());
    assert!(sandbox.receipt_path("demo").is_file());

    // Verified checksum: no warning.
    sandbox
        .caskit()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo 2.0.0"));

    // Second install is a no-op.
    sandbox
        .caskit()
        .args(["install", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already installed"));

    sandbox
        .caskit()
        .args(["uninstall", "demo", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed Demo 2.0.0"));
    assert!(!sandbox.app_path("Demo.app").exists());
    assert!(!sandbox.receipt_path("demo").exists());
}

#[test]
fn test_install_no_check_warns() {
    let mut server = Server::new();
    let zip_bytes = create_app_zip("Demo.app");
    let _mock = server
        .mock("GET", "/releases/v2.0.0/Demo_v2.0.0_macOS.zip")
        .with_status(200)
        .with_body(&zip_bytes)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest("demo", &demo_manifest(&server.url(), "no-check", ""));

    sandbox
        .caskit()
        .args(["install", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("integrity was not verified"));
}

#[test]
fn test_install_checksum_mismatch_aborts() {
    let mut server = Server::new();
    let zip_bytes = create_app_zip("Demo.app");
    let wrong = sha256_hex(b"something else");
    let _mock = server
        .mock("GET", "/releases/v2.0.0/Demo_v2.0.0_macOS.zip")
        .with_status(200)
        .with_body(&zip_bytes)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest("demo", &demo_manifest(&server.url(), &wrong, ""));

    sandbox
        .caskit()
        .args(["install", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Checksum mismatch"));
    assert!(!sandbox.app_path("Demo.app").exists());
    assert!(!sandbox.receipt_path("demo").exists());
}

#[test]
fn test_require_checksum_rejects_no_check_before_download() {
    let mut server = Server::new();
    // Nothing may be fetched.
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest("demo", &demo_manifest(&server.url(), "no-check", ""));

    sandbox
        .caskit()
        .args(["--require-checksum", "install", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--require-checksum"));
    mock.assert();
}

#[test]
fn test_platform_gate_blocks_before_any_network_activity() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest(
        "demo",
        &demo_manifest(&server.url(), "no-check", "macos = \">= sequoia\""),
    );

    sandbox
        .caskit()
        .args(["install", "demo"])
        .env("CASKIT_MACOS_VERSION", "10.13.6")
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires macOS"));
    mock.assert();
}

#[test]
fn test_unresolved_dependency_blocks_install() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest(
        "demo",
        &demo_manifest(&server.url(), "no-check", "depends = [\"runtime-pkg\"]"),
    );

    sandbox
        .caskit()
        .args(["install", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'runtime-pkg' is not installed"));
    mock.assert();
}

#[test]
fn test_plain_uninstall_never_touches_zap_paths() {
    let mut server = Server::new();
    let zip_bytes = create_app_zip("Demo.app");
    let digest = sha256_hex(&zip_bytes);
    let _mock = server
        .mock("GET", "/releases/v2.0.0/Demo_v2.0.0_macOS.zip")
        .with_status(200)
        .with_body(&zip_bytes)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest(
        "demo",
        &demo_manifest(
            &server.url(),
            &digest,
            "zap = [\"~/Library/Preferences/com.example.demo.plist\"]",
        ),
    );

    let plist = sandbox
        .home
        .path()
        .join("Library/Preferences/com.example.demo.plist");
    std::fs::create_dir_all(plist.parent().unwrap()).unwrap();
    std::fs::write(&plist, b"user data").unwrap();

    sandbox.caskit().args(["install", "demo"]).assert().success();
    sandbox
        .caskit()
        .args(["uninstall", "demo", "-y"])
        .assert()
        .success();

    // The preference file survives a plain uninstall.
    assert!(plist.is_file());
    assert!(!sandbox.app_path("Demo.app").exists());
}

#[test]
fn test_purge_deletes_zap_paths_and_tolerates_missing() {
    let mut server = Server::new();
    let zip_bytes = create_app_zip("Demo.app");
    let digest = sha256_hex(&zip_bytes);
    let _mock = server
        .mock("GET", "/releases/v2.0.0/Demo_v2.0.0_macOS.zip")
        .with_status(200)
        .with_body(&zip_bytes)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest(
        "demo",
        &demo_manifest(
            &server.url(),
            &digest,
            r#"zap = [
    "~/Library/Preferences/com.example.demo.plist",
    "~/Library/Application Support/Demo",
    "~/.demo",
]"#,
        ),
    );

    // Only one of the three zap targets exists.
    let plist = sandbox
        .home
        .path()
        .join("Library/Preferences/com.example.demo.plist");
    std::fs::create_dir_all(plist.parent().unwrap()).unwrap();
    std::fs::write(&plist, b"user data").unwrap();

    sandbox.caskit().args(["install", "demo"]).assert().success();
    sandbox
        .caskit()
        .args(["uninstall", "demo", "--purge", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 removed, 2 already clean"));
    assert!(!plist.exists());
}

#[test]
fn test_purge_with_nothing_present_reports_zero_deletions() {
    let sandbox = Sandbox::new();
    sandbox.write_manifest(
        "demo",
        &demo_manifest(
            "https://example.invalid",
            "no-check",
            r#"zap = ["~/.demo-a", "~/.demo-b", "~/.demo-c"]"#,
        ),
    );

    // Not installed and no zap path exists: purge still succeeds.
    sandbox
        .caskit()
        .args(["uninstall", "demo", "--purge", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 removed, 3 already clean"));
}

#[test]
fn test_check_reports_invalid_manifests() {
    let sandbox = Sandbox::new();
    sandbox.write_manifest(
        "good",
        r#"
identifier = "good"
version = "1.0"
url = "https://example.com/good-{version}.zip"
sha256 = "no-check"
name = "Good"
app = "Good.app"
"#,
    );
    sandbox.write_manifest(
        "bad",
        r#"
identifier = "bad"
version = "1.0"
url = "https://example.com/bad.zip"
sha256 = "no-check"
name = "Bad"
app = "Bad.app"
zap = ["/etc/hosts"]
"#,
    );

    sandbox
        .caskit()
        .args(["check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("bad:"))
        .stdout(predicate::str::contains("zap path"))
        .stderr(predicate::str::contains("1 of 2 manifests invalid"));

    std::fs::remove_file(sandbox.manifests.path().join("bad.toml")).unwrap();
    sandbox
        .caskit()
        .args(["check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 manifests OK"));
}

#[test]
fn test_show_resolves_url_and_reports_state() {
    let sandbox = Sandbox::new();
    sandbox.write_manifest(
        "demo",
        &demo_manifest("https://example.com", "no-check", "macos = \">= catalina\""),
    );

    sandbox
        .caskit()
        .args(["show", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://example.com/releases/v2.0.0/Demo_v2.0.0_macOS.zip",
        ))
        .stdout(predicate::str::contains("installed: no"));
}

#[test]
fn test_unknown_package_fails_cleanly() {
    let sandbox = Sandbox::new();
    sandbox
        .caskit()
        .args(["install", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No manifest for 'ghost'"));
}

#[test]
fn test_upgrade_replaces_older_install() {
    let mut server = Server::new();
    let zip_v2 = create_app_zip("Demo.app");
    let digest_v2 = sha256_hex(&zip_v2);
    let _mock = server
        .mock("GET", "/releases/v2.0.0/Demo_v2.0.0_macOS.zip")
        .with_status(200)
        .with_body(&zip_v2)
        .create();

    let sandbox = Sandbox::new();
    sandbox.write_manifest("demo", &demo_manifest(&server.url(), &digest_v2, ""));

    // Fake a 1.0.0 install by writing a receipt and bundle directly.
    let old_bundle = sandbox.app_path("Demo.app");
    std::fs::create_dir_all(&old_bundle).unwrap();
    write_receipt(
        &sandbox.receipt_path("demo"),
        "demo",
        "1.0.0",
        &old_bundle,
    );

    sandbox
        .caskit()
        .args(["upgrade", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Upgrading Demo 1.0.0 -> 2.0.0"));

    sandbox
        .caskit()
        .args(["upgrade", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date (2.0.0)"));
}

fn write_receipt(path: &Path, identifier: &str, version: &str, app_path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let receipt = serde_json::json!({
        "identifier": identifier,
        "name": "Demo",
        "version": version,
        "url": "https://example.com/old.zip",
        "checksum_verified": false,
        "app_path": app_path,
        "installed_at": 0,
    });
    std::fs::write(path, serde_json::to_string_pretty(&receipt).unwrap()).unwrap();
}
