//! Loading a YAML override file and validating the result.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use trollkit_config::{ConfigError, PipelineConfig, load_from_path, validate};

#[test]
fn override_file_is_loaded_and_validated() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("trollkit.yaml");
    fs::write(
        &path,
        "work_dir: /tmp/trollkit-work\n\
         source:\n  branch: develop\n\
         endpoints:\n  server_url_template: https://mirror.example.com/bds-{version}.zip\n  connect_timeout_secs: 5\n\
         patch:\n  runner: wine\n",
    )?;

    let config = load_from_path(&path)?;
    validate(&config)?;

    assert_eq!(config.work_dir, PathBuf::from("/tmp/trollkit-work"));
    assert_eq!(config.source.branch, "develop");
    assert_eq!(config.source.repo_url, PipelineConfig::default().source.repo_url);
    assert_eq!(
        config.server_download_url("1.21.0"),
        "https://mirror.example.com/bds-1.21.0.zip"
    );
    assert_eq!(config.endpoints.connect_timeout_secs, 5);
    assert_eq!(config.patch.runner.as_deref(), Some("wine"));
    Ok(())
}

#[test]
fn loaded_values_still_face_validation() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("trollkit.yaml");
    fs::write(&path, "header:\n  source_dir: ../outside\n")?;

    let config = load_from_path(&path)?;
    let err = validate(&config).expect_err("parent traversal must fail");
    assert!(matches!(
        err,
        ConfigError::InvalidField {
            section: "header",
            field: "source_dir",
            reason: "not_relative",
            ..
        }
    ));
    Ok(())
}

#[test]
fn malformed_yaml_reports_path() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("broken.yaml");
    fs::write(&path, "source: [unterminated\n")?;

    let err = load_from_path(&path).expect_err("malformed yaml must fail");
    assert!(matches!(err, ConfigError::Yaml { path: ref reported, .. } if reported == &path));
    Ok(())
}
