//! Configuration model handed to the pipeline.
//!
//! # Design
//! - One explicit value carries everything a run needs; nothing is global.
//! - Every section defaults independently so a YAML file may override a single key.
//! - Unknown keys are rejected to surface typos early.

use std::path::PathBuf;

use serde::Deserialize;

use crate::defaults;

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Workspace directory; destroyed and recreated at the start of every run.
    pub work_dir: PathBuf,
    /// Optional external symbol list forwarded to the patch tool.
    pub symbol_list: Option<PathBuf>,
    /// Environment checks performed before anything is mutated.
    pub preflight: PreflightSettings,
    /// Source repository settings.
    pub source: SourceSettings,
    /// Remote endpoints and HTTP client settings.
    pub endpoints: EndpointSettings,
    /// File names used for downloaded artifacts.
    pub artifacts: ArtifactSettings,
    /// Aggregate header generation settings.
    pub header: HeaderSettings,
    /// Patch tool invocation settings.
    pub patch: PatchSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(defaults::DEFAULT_WORK_DIR),
            symbol_list: None,
            preflight: PreflightSettings::default(),
            source: SourceSettings::default(),
            endpoints: EndpointSettings::default(),
            artifacts: ArtifactSettings::default(),
            header: HeaderSettings::default(),
            patch: PatchSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Build the dedicated server download URL for a resolved version.
    #[must_use]
    pub fn server_download_url(&self, version: &str) -> String {
        self.endpoints
            .server_url_template
            .replace(defaults::VERSION_PLACEHOLDER, version)
    }
}

/// Environment checks performed before the workspace is touched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreflightSettings {
    /// Commands that must resolve on `PATH`.
    pub required_commands: Vec<String>,
}

impl Default for PreflightSettings {
    fn default() -> Self {
        Self {
            required_commands: defaults::REQUIRED_COMMANDS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Source repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
    /// Remote repository URL passed to `git clone`.
    pub repo_url: String,
    /// Branch cloned.
    pub branch: String,
    /// Directory name of the checkout inside the workspace.
    pub checkout_dir: String,
    /// Build directory receiving `compile_commands.json`.
    pub build_dir: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            repo_url: defaults::SOURCE_REPO_URL.to_string(),
            branch: defaults::SOURCE_BRANCH.to_string(),
            checkout_dir: defaults::SOURCE_CHECKOUT_DIR.to_string(),
            build_dir: defaults::BUILD_DIR.to_string(),
        }
    }
}

/// Remote endpoints and HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointSettings {
    /// Direct download URL of the patch tool.
    pub patch_tool_url: String,
    /// Direct download URL of the preloader library.
    pub preloader_url: String,
    /// Release listing endpoint for the runtime data project.
    pub releases_url: String,
    /// Tag suffix identifying server runtime data releases.
    pub server_tag_suffix: String,
    /// Server distribution URL containing a `{version}` placeholder.
    pub server_url_template: String,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            patch_tool_url: defaults::PATCH_TOOL_URL.to_string(),
            preloader_url: defaults::PRELOADER_URL.to_string(),
            releases_url: defaults::RELEASES_URL.to_string(),
            server_tag_suffix: defaults::SERVER_TAG_SUFFIX.to_string(),
            server_url_template: defaults::SERVER_URL_TEMPLATE.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
        }
    }
}

/// File names used for downloaded artifacts, relative to the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactSettings {
    /// Patch tool executable.
    pub patch_tool: String,
    /// Preloader library.
    pub preloader: String,
    /// Runtime data archive, extracted in full.
    pub runtime_data_archive: String,
    /// Server distribution archive.
    pub server_archive: String,
    /// Member extracted from the server distribution.
    pub server_binary: String,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            patch_tool: defaults::PATCH_TOOL_FILE.to_string(),
            preloader: defaults::PRELOADER_FILE.to_string(),
            runtime_data_archive: defaults::RUNTIME_DATA_ARCHIVE.to_string(),
            server_archive: defaults::SERVER_ARCHIVE.to_string(),
            server_binary: defaults::SERVER_BINARY.to_string(),
        }
    }
}

/// Aggregate header generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderSettings {
    /// Directory walked for headers, relative to the checkout.
    pub source_dir: String,
    /// Aggregate header path, relative to the checkout.
    pub output: String,
    /// File extension (without the dot) identifying headers.
    pub extension: String,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            source_dir: defaults::HEADER_SOURCE_DIR.to_string(),
            output: defaults::HEADER_OUTPUT.to_string(),
            extension: defaults::HEADER_EXTENSION.to_string(),
        }
    }
}

/// Patch tool invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchSettings {
    /// Optional program the tool is launched through (e.g. `wine`).
    pub runner: Option<String>,
    /// Output directory argument, relative to the checkout.
    pub output_dir: String,
    /// Output artifact name.
    pub output_name: String,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            runner: None,
            output_dir: defaults::PATCH_OUTPUT_DIR.to_string(),
            output_name: defaults::PATCH_OUTPUT_NAME.to_string(),
        }
    }
}
