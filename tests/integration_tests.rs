//! Integration tests for Verguard.
//!
//! These tests verify the end-to-end behaviour of the extraction,
//! classification and reporting pipeline, the command-line binary, and
//! the git integration.

use std::path::{Path, PathBuf};
use verguard::{Config, Detector, FileReport, FindingCategory, Severity};

/// Get the path to the test fixtures directory.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixtures_path().join(relative)).unwrap()
}

/// `terraform { required_providers { ... } }` with one entry per provider.
fn providers(entries: &[(&str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(source, version)| {
            let name = source.rsplit('/').next().unwrap();
            format!("    {name} = {{\n      source  = \"{source}\"\n      version = \"{version}\"\n    }}\n")
        })
        .collect();
    format!("terraform {{\n  required_providers {{\n{body}  }}\n}}\n")
}

fn analyze(config: Config, before: Option<&str>, after: Option<&str>) -> FileReport {
    Detector::new(config)
        .unwrap()
        .analyze_texts(Path::new("versions.tf"), before, after)
        .unwrap()
}

fn no_critical() -> Config {
    let mut config = Config::default();
    config.classification.critical_packages.clear();
    config
}

mod pipeline_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_fixture_pair() {
        let before = read_fixture("before/versions.tf");
        let after = read_fixture("after/versions.tf");

        let report = analyze(Config::default(), Some(&before), Some(&after));

        assert_eq!(report.format, "terraform");
        assert_eq!(report.dependencies_before, 4);
        assert_eq!(report.dependencies_after, 6);

        let summary: Vec<(&str, Severity, FindingCategory, usize)> = report
            .findings
            .iter()
            .map(|f| (f.identifier.as_str(), f.severity, f.category, f.location.line))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("example/foo", Severity::Critical, FindingCategory::NewlyUnbound, 13),
                ("hashicorp/aws", Severity::Critical, FindingCategory::AlreadyUnbound, 5),
                ("hashicorp/random", Severity::Warning, FindingCategory::AlreadyUnbound, 17),
                ("example/bar", Severity::Info, FindingCategory::Informational, 21),
                ("module.vpc", Severity::Info, FindingCategory::MajorVersionJump, 28),
            ]
        );
        assert!(report.findings[4]
            .message
            .contains("module.vpc (terraform-aws-modules/vpc/aws)"));
    }

    #[test]
    fn test_unchanged_unbound_is_reported_each_run() {
        let text = providers(&[("hashicorp/aws", ">= 4.0.0"), ("hashicorp/kubernetes", "~> 2.0")]);

        let report = analyze(Config::default(), Some(&text), Some(&text));

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].identifier, "hashicorp/aws");
        assert_eq!(report.findings[0].category, FindingCategory::AlreadyUnbound);
        assert_eq!(report.findings[0].before_version_satisfied, Some(true));
    }

    #[test]
    fn test_new_wildcard_dependency() {
        let before = providers(&[("hashicorp/aws", "~> 5.0")]);
        let after = providers(&[("hashicorp/aws", "~> 5.0"), ("hashicorp/random", "*")]);

        let report = analyze(Config::default(), Some(&before), Some(&after));

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].identifier, "hashicorp/random");
        assert_eq!(report.findings[0].category, FindingCategory::AlreadyUnbound);
        assert_eq!(report.findings[0].before, None);
    }

    #[test_case(Severity::Info, Severity::Warning ; "info base")]
    #[test_case(Severity::Warning, Severity::Critical ; "warning base")]
    #[test_case(Severity::Critical, Severity::Critical ; "critical base saturates")]
    fn test_newly_unbound_is_one_above_base(base: Severity, expected: Severity) {
        let mut config = no_critical();
        config.classification.base_unbound_severity = base;

        let report = analyze(
            config,
            Some(&providers(&[("example/foo", "~> 1.0")])),
            Some(&providers(&[("example/foo", ">= 1.0")])),
        );

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].category, FindingCategory::NewlyUnbound);
        assert_eq!(report.findings[0].severity, expected);
    }

    #[test]
    fn test_malformed_constraint_does_not_block_others() {
        let before = providers(&[("example/bar", "~> 1.0"), ("example/foo", "~> 1.0")]);
        let after = providers(&[("example/bar", "bananas"), ("example/foo", ">= 1.0")]);

        let report = analyze(no_critical(), Some(&before), Some(&after));

        assert_eq!(report.findings.len(), 2);
        let bar = report.findings.iter().find(|f| f.identifier == "example/bar").unwrap();
        assert_eq!(bar.category, FindingCategory::Informational);
        assert!(bar.message.contains("bananas"));
        let foo = report.findings.iter().find(|f| f.identifier == "example/foo").unwrap();
        assert_eq!(foo.category, FindingCategory::NewlyUnbound);
    }

    #[test]
    fn test_idempotent() {
        let before = read_fixture("before/versions.tf");
        let after = read_fixture("after/versions.tf");

        let first = analyze(Config::default(), Some(&before), Some(&after));
        let second = analyze(Config::default(), Some(&before), Some(&after));
        assert_eq!(first, second);
    }

    #[test_case("~> 1.0", "~> 1.2" ; "bound to bound")]
    #[test_case("~> 1.0", "= 1.4.2" ; "bound to exact")]
    #[test_case(">= 1.0", "~> 1.0" ; "unbound to bound")]
    #[test_case("*", ">= 1.0, < 2.0" ; "wildcard to range")]
    #[test_case("", "<= 3.0" ; "missing to ceiling")]
    fn test_no_newly_unbound_when_boundedness_holds(before: &str, after: &str) {
        let report = analyze(
            Config::default(),
            Some(&providers(&[("example/foo", before)])),
            Some(&providers(&[("example/foo", after)])),
        );

        assert!(report
            .findings
            .iter()
            .all(|f| f.category != FindingCategory::NewlyUnbound));
    }

    #[test_case("~> 1.0", ">= 1.0" ; "newly unbound")]
    #[test_case(">= 1.0", ">= 1.0" ; "already unbound")]
    #[test_case("~> 1.0", "~> 2.0" ; "major jump")]
    #[test_case("~> 1.0", "bananas" ; "malformed")]
    fn test_critical_escalates_exactly_one_level(before: &str, after: &str) {
        let before = providers(&[("example/foo", before)]);
        let after = providers(&[("example/foo", after)]);

        let plain = analyze(no_critical(), Some(&before), Some(&after));

        let mut config = no_critical();
        config.classification.critical_packages = vec!["example/*".to_string()];
        let critical = analyze(config, Some(&before), Some(&after));

        assert_eq!(plain.findings.len(), 1);
        assert_eq!(critical.findings.len(), 1);
        assert_eq!(critical.findings[0].category, plain.findings[0].category);
        assert_eq!(critical.findings[0].severity, plain.findings[0].severity.escalate());
    }

    #[test]
    fn test_override_then_escalate() {
        let mut config = Config::default();
        config
            .classification
            .severity_overrides
            .insert("hashicorp/*".to_string(), Severity::Info);

        let report = analyze(config, None, Some(&providers(&[("hashicorp/aws", ">= 4.0")])));

        // override to info, then critical escalation to warning
        assert_eq!(report.findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_ignored_packages_are_dropped() {
        let mut config = Config::default();
        config.classification.ignore_packages = vec!["hashicorp/null".to_string()];

        let report = analyze(
            config,
            None,
            Some(&providers(&[("hashicorp/null", "*"), ("hashicorp/random", "*")])),
        );

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].identifier, "hashicorp/random");
    }

    #[test]
    fn test_removed_critical_is_opt_in() {
        let before = providers(&[("hashicorp/aws", "~> 5.0")]);
        let after = providers(&[]);

        assert!(analyze(Config::default(), Some(&before), Some(&after))
            .findings
            .is_empty());

        let mut config = Config::default();
        config.classification.report_removed_critical = true;
        let report = analyze(config, Some(&before), Some(&after));

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].category, FindingCategory::RemovedSafetyConstraint);
        assert_eq!(report.findings[0].severity, Severity::Warning);
    }
}

mod adapter_tests {
    use super::*;
    use verguard::parser::{ExtractorRegistry, TERRAFORM, TERRAFORM_JSON};

    #[test]
    fn test_default_selection() {
        let registry = ExtractorRegistry::with_defaults();

        let json = registry.select(Path::new("main.tf.json"), None).unwrap();
        assert_eq!(json.tag(), TERRAFORM_JSON);

        let hcl = registry.select(Path::new("infra/main.tf"), None).unwrap();
        assert_eq!(hcl.tag(), TERRAFORM);

        assert!(registry.select(Path::new("main.tfvars"), None).is_err());
    }

    #[test]
    fn test_json_fixture_pair() {
        let before = read_fixture("before/main.tf.json");
        let after = read_fixture("after/main.tf.json");

        let report = Detector::new(Config::default())
            .unwrap()
            .analyze_texts(Path::new("main.tf.json"), Some(&before), Some(&after))
            .unwrap();

        assert_eq!(report.format, TERRAFORM_JSON);
        assert_eq!(report.dependencies_after, 2);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].identifier, "hashicorp/google");
        assert_eq!(report.findings[0].category, FindingCategory::NewlyUnbound);
        assert_eq!(report.findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_empty_files_yield_nothing() {
        let report = analyze(Config::default(), Some(""), Some(""));
        assert_eq!(report.dependencies_before, 0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_local_modules_are_skipped() {
        let text = read_fixture("before/versions.tf");
        let report = analyze(Config::default(), None, Some(&text));

        assert!(report
            .findings
            .iter()
            .all(|f| !f.identifier.starts_with("./")));
    }
}

mod cli_tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn verguard(dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("verguard").unwrap();
        cmd.current_dir(dir)
            .env_remove("VERGUARD_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    #[test]
    fn test_diff_json_report() {
        let dir = tempfile::tempdir().unwrap();

        verguard(dir.path())
            .arg("diff")
            .arg(fixtures_path().join("before/versions.tf"))
            .arg(fixtures_path().join("after/versions.tf"))
            .args(["--format", "json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"newly-unbound\""))
            .stdout(predicate::str::contains("\"has_blocking_findings\": true"));
    }

    #[test]
    fn test_diff_below_threshold_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.tf"), providers(&[("example/foo", "~> 1.0")])).unwrap();
        std::fs::write(dir.path().join("new.tf"), providers(&[("example/foo", "~> 2.0")])).unwrap();

        verguard(dir.path())
            .args(["diff", "old.tf", "new.tf", "--fail-on", "warning"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[INFO]"))
            .stdout(predicate::str::contains("major-version-jump"))
            .stdout(predicate::str::contains("PASSED"));
    }

    #[test]
    fn test_diff_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("new.tf"), providers(&[("example/foo", ">= 1.0")])).unwrap();

        verguard(dir.path())
            .args([
                "diff",
                "missing.tf",
                "new.tf",
                "--output",
                "report.txt",
                "--fail-on",
                "critical",
            ])
            .assert()
            .success();

        let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.contains("already-unbound"));
        assert!(report.contains("Verguard Analysis"));
    }

    #[test]
    fn test_diff_unsupported_file_exits_2() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        verguard(dir.path())
            .args(["diff", "notes.txt", "notes.txt"])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("unsupported-format"));
    }

    #[test]
    fn test_config_file_is_discovered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("verguard.yaml"), "fail_on: critical\n").unwrap();
        std::fs::write(dir.path().join("new.tf"), providers(&[("example/foo", ">= 1.0")])).unwrap();

        verguard(dir.path())
            .args(["diff", "old.tf", "new.tf"])
            .assert()
            .success();
    }

    #[test]
    fn test_init_and_validate() {
        let dir = tempfile::tempdir().unwrap();

        verguard(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("verguard.yaml"));
        assert!(dir.path().join("verguard.yaml").exists());

        verguard(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));

        verguard(dir.path())
            .arg("validate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bad.yaml"),
            "classification:\n  critical_packages:\n    - \"[\"\n",
        )
        .unwrap();

        verguard(dir.path())
            .args(["validate", "bad.yaml"])
            .assert()
            .code(19)
            .stderr(predicate::str::contains("Configuration error"));
    }

    #[test]
    fn test_broken_local_config_only_affects_analysis() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("verguard.yaml"), "fail_on: [\n").unwrap();
        std::fs::write(dir.path().join("good.yaml"), "fail_on: critical\n").unwrap();
        std::fs::write(dir.path().join("new.tf"), providers(&[("example/foo", ">= 1.0")])).unwrap();

        verguard(dir.path())
            .args(["validate", "good.yaml"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid: good.yaml"));

        verguard(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));

        verguard(dir.path())
            .args(["diff", "old.tf", "new.tf"])
            .assert()
            .code(18);
    }

    #[test]
    fn test_check_outside_repository() {
        let dir = tempfile::tempdir().unwrap();

        verguard(dir.path())
            .arg("check")
            .assert()
            .code(16)
            .stderr(predicate::str::contains("Git error"));
    }
}

mod git_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use verguard::git::GitRepository;

    fn commit_all(repo: &git2::Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = git2::Signature::now("Verguard Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap();
    }

    /// A repository with one commit holding `versions.tf` and `README.md`.
    fn seeded_repo() -> (tempfile::TempDir, git2::Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();

        std::fs::write(
            dir.path().join("versions.tf"),
            providers(&[("hashicorp/aws", "~> 5.0"), ("example/foo", "~> 1.0")]),
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "# infra\n").unwrap();
        commit_all(&repo, "initial");

        (dir, repo)
    }

    #[tokio::test]
    async fn test_changed_files_and_revisions() {
        let (dir, _repo) = seeded_repo();
        std::fs::write(
            dir.path().join("versions.tf"),
            providers(&[("hashicorp/aws", ">= 5.0"), ("example/foo", "~> 1.0")]),
        )
        .unwrap();
        std::fs::write(dir.path().join("new.tf"), providers(&[("example/bar", "*")])).unwrap();

        let repo = GitRepository::discover(dir.path()).await.unwrap();

        let changed = repo.changed_files("HEAD").await.unwrap();
        assert_eq!(changed, vec![PathBuf::from("new.tf"), PathBuf::from("versions.tf")]);

        let before = repo.read_at_ref("HEAD", Path::new("versions.tf")).await.unwrap();
        assert!(before.unwrap().contains("~> 5.0"));
        assert!(repo.read_at_ref("HEAD", Path::new("new.tf")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_changed_files() {
        let (dir, _repo) = seeded_repo();
        std::fs::write(
            dir.path().join("versions.tf"),
            providers(&[("hashicorp/aws", ">= 5.0"), ("example/foo", "~> 1.0")]),
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "# infra\n\nchanged\n").unwrap();

        let repo = GitRepository::discover(dir.path()).await.unwrap();
        let detector = Detector::new(Config::default()).unwrap();
        let report = detector.check_git(&repo, &[], "HEAD").await.unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].file, PathBuf::from("versions.tf"));

        let finding = &report.files[0].findings[0];
        assert_eq!(finding.identifier, "hashicorp/aws");
        assert_eq!(finding.category, FindingCategory::NewlyUnbound);
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(report.exit_code(Severity::Warning), 1);
    }

    #[tokio::test]
    async fn test_check_explicit_and_deleted_files() {
        let (dir, repo) = seeded_repo();
        std::fs::write(
            dir.path().join("extra.tf"),
            providers(&[("example/baz", "~> 3.0")]),
        )
        .unwrap();
        commit_all(&repo, "add extra");
        std::fs::remove_file(dir.path().join("extra.tf")).unwrap();

        let repo = GitRepository::discover(dir.path()).await.unwrap();
        let detector = Detector::new(Config::default()).unwrap();
        let report = detector
            .check_git(
                &repo,
                &[dir.path().join("extra.tf"), dir.path().join("versions.tf")],
                "HEAD",
            )
            .await
            .unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].file, PathBuf::from("extra.tf"));
        assert_eq!(report.files[0].dependencies_after, 0);
        assert!(report.findings().next().is_none());
        assert_eq!(report.exit_code(Severity::Info), 0);
    }

    #[tokio::test]
    async fn test_unknown_base_ref() {
        let (dir, _repo) = seeded_repo();
        let repo = GitRepository::discover(dir.path()).await.unwrap();

        assert!(repo.changed_files("no-such-branch").await.is_err());
    }
}
