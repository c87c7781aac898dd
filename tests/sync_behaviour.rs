//! End-to-end synchroniser scenarios with a stubbed downloader.

use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashMap;
use std::path::Path;

use vendor_sync::cli::Action;
use vendor_sync::error::SyncError;
use vendor_sync::fetch::{DownloadError, Downloader};
use vendor_sync::manifest;
use vendor_sync::sync::{self, SyncContext, SyncOutcome};

/// Serves canned bodies by URL; unknown URLs are 404s.
struct StubDownloader {
    responses: HashMap<String, Vec<u8>>,
}

impl StubDownloader {
    fn new(responses: &[(&str, &[u8])]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(url, body)| ((*url).to_owned(), body.to_vec()))
                .collect(),
        }
    }
}

impl Downloader for StubDownloader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_owned(),
            })
    }
}

struct Scenario {
    _temp: tempfile::TempDir,
    ctx: SyncContext,
}

impl Scenario {
    fn new(action: Action) -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest_root = Utf8PathBuf::from_path_buf(temp.path().join("resources/lib"))
            .expect("utf-8 temp path");
        let ctx = SyncContext {
            action,
            module_filter: "all".to_owned(),
            dest_root,
            scratch_root: temp.path().join("scratch"),
            verbose: false,
        };
        Self { _temp: temp, ctx }
    }

    fn run(
        &self,
        manifest_text: &str,
        downloader: &dyn Downloader,
    ) -> (Result<SyncOutcome, SyncError>, String) {
        let root = manifest::parse(manifest_text).expect("valid manifest");
        let mut out = Vec::new();
        let mut progress = Vec::new();
        let result = sync::run(&self.ctx, &root, downloader, &mut out, &mut progress);
        (result, String::from_utf8(out).expect("utf-8 output"))
    }

    fn vendor_path(&self, relative: &str) -> std::path::PathBuf {
        self.ctx.dest_root.join(relative).into_std_path_buf()
    }
}

/// Build an in-memory gzip tarball from `(path, contents)` entries.
fn gz_tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *contents).expect("append");
    }
    builder
        .into_inner()
        .expect("tar finish")
        .finish()
        .expect("gzip finish")
}

#[test]
fn update_creates_the_vendor_file_from_fetched_bytes() {
    let manifest_text = "mod:\n  type: file\n  src: https://example.test/a.js\n";
    let downloader = StubDownloader::new(&[("https://example.test/a.js", b"fresh")]);
    let scenario = Scenario::new(Action::Update);

    let (result, _) = scenario.run(manifest_text, &downloader);
    assert!(!result.expect("run succeeds").failed);
    assert_eq!(
        std::fs::read(scenario.vendor_path("mod/a.js")).expect("vendored file"),
        b"fresh"
    );
}

#[test]
fn tar_update_remaps_the_extracted_tree() {
    let manifest_text = concat!(
        "icons:\n",
        "  type: tar\n",
        "  src: https://example.test/icons.tar.gz\n",
        "  dest:\n",
        "    package/css/*.{css,map}: css\n",
        "    package/LICENSE:\n",
    );
    let tarball = gz_tarball(&[
        ("package/css/icons.css", b"css"),
        ("package/css/icons.css.map", b"map"),
        ("package/LICENSE", b"mit"),
        ("package/README.md", b"skip me"),
    ]);
    let downloader = StubDownloader::new(&[("https://example.test/icons.tar.gz", &tarball)]);
    let scenario = Scenario::new(Action::Update);

    let (result, _) = scenario.run(manifest_text, &downloader);
    assert!(!result.expect("run succeeds").failed);
    assert!(scenario.vendor_path("icons/css/icons.css").exists());
    assert!(scenario.vendor_path("icons/css/icons.css.map").exists());
    assert!(scenario.vendor_path("icons/LICENSE").exists());
    assert!(!scenario.vendor_path("icons/README.md").exists());
}

#[test]
fn tar_update_without_dest_copies_the_whole_tree() {
    let manifest_text = "lib:\n  type: tar\n  src: https://example.test/lib.tar.gz\n";
    let tarball = gz_tarball(&[("dist/app.js", b"js"), ("dist/app.css", b"css")]);
    let downloader = StubDownloader::new(&[("https://example.test/lib.tar.gz", &tarball)]);
    let scenario = Scenario::new(Action::Update);

    let (result, _) = scenario.run(manifest_text, &downloader);
    assert!(!result.expect("run succeeds").failed);
    assert_eq!(
        std::fs::read(scenario.vendor_path("lib/dist/app.js")).expect("vendored file"),
        b"js"
    );
}

#[test]
fn tar_verify_reports_every_differing_file_and_modifies_nothing() {
    let manifest_text = "lib:\n  type: tar\n  src: https://example.test/lib.tar.gz\n";
    let tarball = gz_tarball(&[("dist/app.js", b"new js"), ("dist/app.css", b"new css")]);
    let downloader = StubDownloader::new(&[("https://example.test/lib.tar.gz", &tarball)]);
    let scenario = Scenario::new(Action::Verify);

    // Seed a stale vendor tree: one changed file, one missing.
    let stale = scenario.vendor_path("lib/dist/app.js");
    std::fs::create_dir_all(stale.parent().expect("parent")).expect("mkdir");
    std::fs::write(&stale, b"old js").expect("seed");

    let (result, report) = scenario.run(manifest_text, &downloader);
    assert!(result.expect("run succeeds").failed);
    assert!(report.contains("mismatch: "));
    assert!(report.contains("app.js"));
    assert!(report.contains("missing: "));
    assert!(report.contains("app.css"));
    // Verify never rewrites the vendor tree.
    assert_eq!(std::fs::read(&stale).expect("still stale"), b"old js");
    assert!(!scenario.vendor_path("lib/dist/app.css").exists());
}

#[test]
fn tar_with_unmatched_pattern_aborts_naming_it() {
    let manifest_text = concat!(
        "lib:\n",
        "  type: tar\n",
        "  src: https://example.test/lib.tar.gz\n",
        "  dest:\n",
        "    no/such/*.js: js\n",
    );
    let tarball = gz_tarball(&[("dist/app.js", b"js")]);
    let downloader = StubDownloader::new(&[("https://example.test/lib.tar.gz", &tarball)]);
    let scenario = Scenario::new(Action::Update);

    let (result, _) = scenario.run(manifest_text, &downloader);
    let err = result.expect_err("pattern matches nothing");
    assert!(matches!(
        err,
        SyncError::PatternNotFound { pattern } if pattern == "no/such/*.js"
    ));
    assert!(!scenario.ctx.scratch_root.exists());
}

#[test]
fn multi_file_update_places_each_file() {
    let manifest_text = concat!(
        "mod:\n",
        "  type: multi-file\n",
        "  files:\n",
        "    js/a.js:\n",
        "      src: https://example.test/a.js\n",
        "    css/a.css:\n",
        "      src: https://example.test/a.css\n",
    );
    let downloader = StubDownloader::new(&[
        ("https://example.test/a.js", b"js".as_slice()),
        ("https://example.test/a.css", b"css".as_slice()),
    ]);
    let scenario = Scenario::new(Action::Update);

    let (result, _) = scenario.run(manifest_text, &downloader);
    assert!(!result.expect("run succeeds").failed);
    assert_eq!(
        std::fs::read(scenario.vendor_path("mod/js/a.js")).expect("vendored file"),
        b"js"
    );
    assert_eq!(
        std::fs::read(scenario.vendor_path("mod/css/a.css")).expect("vendored file"),
        b"css"
    );
}

#[test]
fn make_sri_reports_tarball_integrity_without_extchanges() {
    let manifest_text = "lib:\n  type: tar\n  src: https://example.test/lib.tar.gz\n";
    let tarball = gz_tarball(&[("dist/app.js", b"js")]);
    let downloader = StubDownloader::new(&[("https://example.test/lib.tar.gz", &tarball)]);
    let scenario = Scenario::new(Action::MakeSri);

    let (result, report) = scenario.run(manifest_text, &downloader);
    assert!(!result.expect("run succeeds").failed);
    assert!(report.starts_with("sha384-"));
    assert!(report.trim_end().ends_with("https://example.test/lib.tar.gz"));
    assert!(!Path::new(&scenario.vendor_path("lib")).exists());
}

#[test]
fn download_failure_names_the_url() {
    let manifest_text = "mod:\n  type: file\n  src: https://example.test/gone.js\n";
    let downloader = StubDownloader::new(&[]);
    let scenario = Scenario::new(Action::Update);

    let (result, _) = scenario.run(manifest_text, &downloader);
    let err = result.expect_err("404 is fatal");
    assert!(err.to_string().contains("gone.js"));
}

#[test]
fn verify_keeps_going_across_modules_after_a_difference() {
    let manifest_text = concat!(
        "first:\n  type: file\n  src: https://example.test/a.js\n",
        "second:\n  type: file\n  src: https://example.test/b.js\n",
    );
    let downloader = StubDownloader::new(&[
        ("https://example.test/a.js", b"a".as_slice()),
        ("https://example.test/b.js", b"b".as_slice()),
    ]);
    let scenario = Scenario::new(Action::Verify);

    let (result, report) = scenario.run(manifest_text, &downloader);
    assert!(result.expect("run succeeds").failed);
    assert!(report.contains("first: missing: "));
    assert!(report.contains("second: missing: "));
}
