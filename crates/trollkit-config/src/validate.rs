//! Validation helpers and path resolution for pipeline configuration.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::defaults::VERSION_PLACEHOLDER;
use crate::error::{ConfigError, ConfigResult};
use crate::model::PipelineConfig;

/// Validate every section of a pipeline configuration.
///
/// # Errors
///
/// Returns the first field that fails validation.
pub fn validate(config: &PipelineConfig) -> ConfigResult<()> {
    if config.work_dir.as_os_str().is_empty() {
        return Err(ConfigError::InvalidField {
            section: "workspace",
            field: "work_dir",
            reason: "empty",
            value: None,
        });
    }

    for command in &config.preflight.required_commands {
        ensure_non_empty("preflight", "required_commands", command)?;
    }

    let source = &config.source;
    ensure_non_empty("source", "repo_url", &source.repo_url)?;
    ensure_non_empty("source", "branch", &source.branch)?;
    ensure_file_name("source", "checkout_dir", &source.checkout_dir)?;
    ensure_relative_path("source", "build_dir", &source.build_dir)?;

    let endpoints = &config.endpoints;
    ensure_url("endpoints", "patch_tool_url", &endpoints.patch_tool_url)?;
    ensure_url("endpoints", "preloader_url", &endpoints.preloader_url)?;
    ensure_url("endpoints", "releases_url", &endpoints.releases_url)?;
    ensure_non_empty("endpoints", "server_tag_suffix", &endpoints.server_tag_suffix)?;
    ensure_non_empty("endpoints", "user_agent", &endpoints.user_agent)?;
    if !endpoints.server_url_template.contains(VERSION_PLACEHOLDER) {
        return Err(ConfigError::invalid(
            "endpoints",
            "server_url_template",
            "missing_version_placeholder",
            endpoints.server_url_template.as_str(),
        ));
    }
    ensure_url(
        "endpoints",
        "server_url_template",
        &config.server_download_url("0.0.0"),
    )?;

    let artifacts = &config.artifacts;
    ensure_file_name("artifacts", "patch_tool", &artifacts.patch_tool)?;
    ensure_file_name("artifacts", "preloader", &artifacts.preloader)?;
    ensure_file_name(
        "artifacts",
        "runtime_data_archive",
        &artifacts.runtime_data_archive,
    )?;
    ensure_file_name("artifacts", "server_archive", &artifacts.server_archive)?;
    ensure_non_empty("artifacts", "server_binary", &artifacts.server_binary)?;

    let header = &config.header;
    ensure_relative_path("header", "source_dir", &header.source_dir)?;
    ensure_relative_path("header", "output", &header.output)?;
    ensure_non_empty("header", "extension", &header.extension)?;
    if header.extension.starts_with('.') {
        return Err(ConfigError::invalid(
            "header",
            "extension",
            "leading_dot",
            header.extension.as_str(),
        ));
    }

    let patch = &config.patch;
    if let Some(runner) = &patch.runner {
        ensure_non_empty("patch", "runner", runner)?;
    }
    ensure_non_empty("patch", "output_dir", &patch.output_dir)?;
    ensure_file_name("patch", "output_name", &patch.output_name)?;

    Ok(())
}

/// Check that the external symbol list exists and return its absolute path.
///
/// # Errors
///
/// Returns [`ConfigError::MissingSymbolList`] when the path is not a file, or an
/// IO error when the absolute path cannot be computed.
pub fn resolve_symbol_list(path: &Path) -> ConfigResult<PathBuf> {
    if !path.is_file() {
        return Err(ConfigError::MissingSymbolList {
            path: path.to_path_buf(),
        });
    }
    std::path::absolute(path).map_err(|source| ConfigError::io("symbol_list.absolute", path, source))
}

fn ensure_non_empty(section: &'static str, field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(section, field, "empty", value));
    }
    Ok(())
}

fn ensure_url(section: &'static str, field: &'static str, value: &str) -> ConfigResult<()> {
    ensure_non_empty(section, field, value)?;
    Url::parse(value).map_err(|_| ConfigError::invalid(section, field, "invalid_url", value))?;
    Ok(())
}

fn ensure_relative_path(section: &'static str, field: &'static str, value: &str) -> ConfigResult<()> {
    ensure_non_empty(section, field, value)?;
    let all_normal = Path::new(value)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !all_normal {
        return Err(ConfigError::invalid(section, field, "not_relative", value));
    }
    Ok(())
}

fn ensure_file_name(section: &'static str, field: &'static str, value: &str) -> ConfigResult<()> {
    ensure_non_empty(section, field, value)?;
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::invalid(section, field, "not_a_file_name", value)),
    }
}
