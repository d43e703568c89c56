//! Crate-level pipeline and BDD tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use tempfile::TempDir;
use url::Url;
use zip::ZipWriter;
use zip::write::FileOptions;

use rclone_config::ProvisionConfig;

use crate::error::{ProvisionError, ProvisionErrorKind};
use crate::fetch::{FetchError, MockReleaseFetcher, ReleaseFetcher};
use crate::install::Provisioner;
use crate::manifest::sha256_hex;
use crate::platform::{Arch, Os, PlatformKey};
use crate::release::{ReleaseArtifact, ReleaseSource, ReleaseVersion};
use crate::runner::{provision_with_config, run};


const BASE_URL: &str = "https://downloads.example.test";
const VERSION: &str = "1.72.1";
const PAYLOAD: &[u8] = b"#!/bin/sh\necho rclone v1.72.1\n";

/// In-memory release server keyed by URL.
#[derive(Default)]
struct FakeReleases {
    files: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl FakeReleases {
    fn publish(&mut self, url: &Url, body: Vec<u8>) {
        self.files.insert(url.as_str().to_owned(), body);
    }

    fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ReleaseFetcher for FakeReleases {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(url.as_str().to_owned());
        self.files
            .get(url.as_str())
            .cloned()
            .ok_or(FetchError::Status { status: 404 })
    }
}

/// Builds a zip archive holding the given `(name, contents)` entries.
fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, FileOptions::default())
                .expect("add directory");
            continue;
        }
        writer
            .start_file(*name, FileOptions::default())
            .expect("start entry");
        writer.write_all(contents).expect("write entry");
    }
    writer.finish().expect("finish archive").into_inner()
}

/// Release archive laid out like the official ones.
fn release_archive(platform: PlatformKey, payload: &[u8]) -> Vec<u8> {
    let folder = format!(
        "rclone-v{VERSION}-{}-{}/",
        platform.os().release_id(),
        platform.arch().as_str()
    );
    let binary = format!("{folder}{}", platform.binary_name());
    let readme = format!("{folder}README.txt");
    zip_archive(&[
        (folder.as_str(), b"".as_slice()),
        (readme.as_str(), b"readme".as_slice()),
        (binary.as_str(), payload),
    ])
}

fn source() -> ReleaseSource {
    ReleaseSource::new(BASE_URL).expect("base url")
}

fn version() -> ReleaseVersion {
    ReleaseVersion::parse(VERSION).expect("version")
}

/// Publishes `archive` for `platform` with a manifest listing `digest`.
fn publish_release(
    releases: &mut FakeReleases,
    platform: PlatformKey,
    archive: Vec<u8>,
    digest: Option<&str>,
) {
    let artifact = ReleaseArtifact::new(version(), platform);
    let mut manifest = String::from("-----BEGIN PGP SIGNED MESSAGE-----\nHash: SHA1\n\n");
    manifest.push_str(&format!("{}  rclone-v{VERSION}-unrelated.zip\n", "0".repeat(64)));
    if let Some(hex) = digest {
        manifest.push_str(&format!("{hex}  {}\n", artifact.filename()));
    }
    releases.publish(&artifact.url(&source()).expect("archive url"), archive);
    releases.publish(
        &source().manifest_url(&version()).expect("manifest url"),
        manifest.into_bytes(),
    );
}

fn honest_release(platform: PlatformKey) -> FakeReleases {
    let mut releases = FakeReleases::default();
    let archive = release_archive(platform, PAYLOAD);
    let digest = sha256_hex(&archive);
    publish_release(&mut releases, platform, archive, Some(&digest));
    releases
}

fn directory_entries(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(path)
        .expect("read destination")
        .map(|entry| {
            entry
                .expect("directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

#[fixture]
fn workspace() -> TempDir {
    TempDir::new().expect("temp dir")
}

#[fixture]
fn linux_amd64() -> PlatformKey {
    PlatformKey::new(Os::Linux, Arch::Amd64)
}

#[rstest]
fn installs_verified_executable(workspace: TempDir, linux_amd64: PlatformKey) {
    let releases = honest_release(linux_amd64);
    let destination = workspace.path().join("bin");

    let path = Provisioner::new(&releases, source())
        .provision(linux_amd64, &version(), &destination)
        .expect("provision");

    assert_eq!(path, destination.join("rclone"));
    assert!(path.is_file());
    assert_eq!(fs::read(&path).expect("read binary"), PAYLOAD);
    assert_eq!(directory_entries(&destination), vec!["rclone".to_owned()]);
    assert_eq!(
        releases.requests(),
        vec![
            format!("{BASE_URL}/v{VERSION}/rclone-v{VERSION}-linux-amd64.zip"),
            format!("{BASE_URL}/v{VERSION}/SHA256SUMS"),
        ]
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[rstest]
fn installs_windows_executable_name(workspace: TempDir) {
    let platform = PlatformKey::new(Os::Windows, Arch::Amd64);
    let releases = honest_release(platform);
    let destination = workspace.path().join("bin");

    let path = Provisioner::new(&releases, source())
        .provision(platform, &version(), &destination)
        .expect("provision");

    assert_eq!(path, destination.join("rclone.exe"));
    assert_eq!(fs::read(&path).expect("read binary"), PAYLOAD);
}

#[rstest]
fn replaces_previous_install(workspace: TempDir, linux_amd64: PlatformKey) {
    let destination = workspace.path().join("bin");
    fs::create_dir_all(&destination).expect("create destination");
    fs::write(destination.join("stale"), b"old").expect("write stale file");
    fs::write(destination.join("rclone"), b"old binary").expect("write old binary");
    let releases = honest_release(linux_amd64);

    Provisioner::new(&releases, source())
        .provision(linux_amd64, &version(), &destination)
        .expect("provision");

    assert_eq!(directory_entries(&destination), vec!["rclone".to_owned()]);
    assert_eq!(fs::read(destination.join("rclone")).expect("read"), PAYLOAD);
}

#[rstest]
fn tampered_archive_is_never_written(workspace: TempDir, linux_amd64: PlatformKey) {
    let archive = release_archive(linux_amd64, PAYLOAD);
    let digest = sha256_hex(&archive);
    let mut tampered = archive;
    if let Some(byte) = tampered.last_mut() {
        *byte ^= 0x01;
    }
    let mut releases = FakeReleases::default();
    publish_release(&mut releases, linux_amd64, tampered.clone(), Some(&digest));
    let destination = workspace.path().join("bin");

    let error = Provisioner::new(&releases, source())
        .provision(linux_amd64, &version(), &destination)
        .expect_err("tampered archive must be rejected");

    let ProvisionError::ChecksumMismatch {
        expected, actual, ..
    } = &error
    else {
        panic!("expected checksum mismatch, got {error:?}");
    };
    assert_eq!(expected, &digest);
    assert_eq!(actual, &sha256_hex(&tampered));
    assert!(error.is_integrity_failure());
    assert!(directory_entries(&destination).is_empty());
}

#[rstest]
fn manifest_without_entry_is_an_integrity_failure(workspace: TempDir, linux_amd64: PlatformKey) {
    let mut releases = FakeReleases::default();
    publish_release(
        &mut releases,
        linux_amd64,
        release_archive(linux_amd64, PAYLOAD),
        None,
    );
    let destination = workspace.path().join("bin");

    let error = Provisioner::new(&releases, source())
        .provision(linux_amd64, &version(), &destination)
        .expect_err("unlisted archive must be rejected");

    assert_eq!(error.kind(), ProvisionErrorKind::ManifestIncomplete);
    assert!(error.is_integrity_failure());
    assert!(directory_entries(&destination).is_empty());
}

#[rstest]
fn archive_without_executable_fails_extraction(workspace: TempDir, linux_amd64: PlatformKey) {
    let archive = zip_archive(&[("rclone-v1.72.1-linux-amd64/README.txt", b"readme".as_slice())]);
    let digest = sha256_hex(&archive);
    let mut releases = FakeReleases::default();
    publish_release(&mut releases, linux_amd64, archive, Some(&digest));
    let destination = workspace.path().join("bin");

    let error = Provisioner::new(&releases, source())
        .provision(linux_amd64, &version(), &destination)
        .expect_err("archive lacks the executable");

    assert_eq!(error.kind(), ProvisionErrorKind::Extraction);
    assert!(!error.is_integrity_failure());
    assert!(directory_entries(&destination).is_empty());
}

#[rstest]
fn missing_archive_stops_before_manifest(workspace: TempDir, linux_amd64: PlatformKey) {
    let releases = FakeReleases::default();
    let destination = workspace.path().join("bin");

    let error = Provisioner::new(&releases, source())
        .provision(linux_amd64, &version(), &destination)
        .expect_err("archive is not published");

    assert_eq!(error.kind(), ProvisionErrorKind::Fetch);
    assert!(matches!(
        error,
        ProvisionError::Fetch {
            source: FetchError::Status { status: 404 },
            ..
        }
    ));
    assert_eq!(releases.requests().len(), 1);
}

#[rstest]
#[case(Some("plan9"), Some("amd64"))]
#[case(Some("linux"), Some("riscv64"))]
fn unsupported_platform_never_fetches(
    workspace: TempDir,
    #[case] system: Option<&str>,
    #[case] arch: Option<&str>,
) {
    let mut fetcher = MockReleaseFetcher::new();
    fetcher.expect_fetch().never();
    let config = ProvisionConfig {
        system: system.map(str::to_owned),
        arch: arch.map(str::to_owned),
        out_dir: Some(camino_path(workspace.path())),
        ..ProvisionConfig::default()
    };

    let error = provision_with_config(&config, fetcher).expect_err("platform is unsupported");

    assert_eq!(error.kind(), ProvisionErrorKind::UnsupportedPlatform);
    assert!(!workspace.path().join("bin").exists());
}

#[rstest]
fn invalid_version_never_fetches(workspace: TempDir) {
    let mut fetcher = MockReleaseFetcher::new();
    fetcher.expect_fetch().never();
    let config = ProvisionConfig {
        rclone_version: Some("1.72/../1".to_owned()),
        system: Some("linux".to_owned()),
        arch: Some("x86_64".to_owned()),
        out_dir: Some(camino_path(workspace.path())),
        ..ProvisionConfig::default()
    };

    let error = provision_with_config(&config, fetcher).expect_err("version is invalid");

    assert_eq!(error.kind(), ProvisionErrorKind::InvalidRequest);
}

#[rstest]
fn configuration_overrides_select_the_release(workspace: TempDir) {
    let platform = PlatformKey::new(Os::MacOs, Arch::Arm64);
    let releases = honest_release(platform);
    let config = ProvisionConfig {
        rclone_version: Some(format!("v{VERSION}")),
        system: Some("Darwin".to_owned()),
        arch: Some("aarch64".to_owned()),
        out_dir: Some(camino_path(workspace.path())),
        base_url: Some(format!("{BASE_URL}/")),
        ..ProvisionConfig::default()
    };

    let report = provision_with_config(&config, &releases).expect("provision");

    assert_eq!(report.path(), workspace.path().join("bin").join("rclone"));
    assert_eq!(report.platform_tag(), "osx_arm64");
    assert_eq!(report.version().as_str(), VERSION);
    assert_eq!(
        report.to_string(),
        format!(
            "path={}\nplatform_tag=osx_arm64",
            workspace.path().join("bin").join("rclone").display()
        )
    );
}

/// Log sink shared with a scoped subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log buffer");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[rstest]
fn run_reports_failures_once_on_stderr(workspace: TempDir) {
    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();
    let args = vec![
        OsString::from("rclone-provision"),
        OsString::from("--system"),
        OsString::from("plan9"),
        OsString::from("--out-dir"),
        workspace.path().as_os_str().to_owned(),
    ];
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let exit = tracing::subscriber::with_default(subscriber, || {
        run(args, &mut stdout, &mut stderr)
    });

    assert_eq!(exit, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    let report = String::from_utf8(stderr).expect("stderr is UTF-8");
    assert_eq!(report.lines().count(), 1, "unexpected stderr: {report:?}");
    assert!(report.starts_with("rclone-provision: "));
    assert!(report.contains("plan9"));
    assert!(!logs.contents().contains("ERROR"), "failure was also logged");
    assert!(!workspace.path().join("bin").exists());
}

fn camino_path(path: &Path) -> camino::Utf8PathBuf {
    camino::Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("temp dir path is UTF-8")
}
