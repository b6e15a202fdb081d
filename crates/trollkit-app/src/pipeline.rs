//! Pipeline sequencing.
//!
//! # Design
//! - Steps run strictly in order on the calling task; each starts only after
//!   the previous one finished.
//! - Per-run state lives in an explicit [`RunContext`]; the process working
//!   directory is never changed.
//! - Every step publishes started/completed/failed events and logs through
//!   `tracing`; presentation is left to subscribers.

use std::error::Error;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};
use trollkit_config::{PipelineConfig, resolve_symbol_list, validate};
use trollkit_events::{Event, EventBus};
use trollkit_fetch::{DownloadTask, Downloader, ReleaseDescriptor, build_client, resolve_release};
use trollkit_fsops::{
    HeaderAggregation, Workspace, aggregate_headers, extract_all, extract_member, reset_workspace,
};
use trollkit_toolchain::{
    CommandRunner, PatchInvocation, SourceCheckout, SystemRunner, check_required, clone_branch,
    generate_compile_commands, run_patch_tool,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Named steps of a run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Validate configuration and resolve the symbol list.
    ValidateConfig,
    /// Check required commands.
    Preflight,
    /// Reset the workspace directory.
    PrepareWorkspace,
    /// Clone the source repository.
    CloneSource,
    /// Generate compile-command metadata.
    BuildMetadata,
    /// Resolve the newest server runtime data release.
    ResolveRelease,
    /// Download the patch tool.
    DownloadPatchTool,
    /// Download the preloader library.
    DownloadPreloader,
    /// Download the runtime data archive.
    DownloadRuntimeData,
    /// Extract the runtime data archive.
    ExtractRuntimeData,
    /// Download the dedicated server distribution.
    DownloadServer,
    /// Extract the server executable.
    ExtractServer,
    /// Write the aggregate header.
    AggregateHeaders,
    /// Run the patch tool.
    GeneratePdb,
}

impl StepKind {
    const ALL: [Self; 14] = [
        Self::ValidateConfig,
        Self::Preflight,
        Self::PrepareWorkspace,
        Self::CloneSource,
        Self::BuildMetadata,
        Self::ResolveRelease,
        Self::DownloadPatchTool,
        Self::DownloadPreloader,
        Self::DownloadRuntimeData,
        Self::ExtractRuntimeData,
        Self::DownloadServer,
        Self::ExtractServer,
        Self::AggregateHeaders,
        Self::GeneratePdb,
    ];

    /// Stable identifier used in events and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidateConfig => "validate_config",
            Self::Preflight => "preflight",
            Self::PrepareWorkspace => "prepare_workspace",
            Self::CloneSource => "clone_source",
            Self::BuildMetadata => "build_metadata",
            Self::ResolveRelease => "resolve_release",
            Self::DownloadPatchTool => "download_patch_tool",
            Self::DownloadPreloader => "download_preloader",
            Self::DownloadRuntimeData => "download_runtime_data",
            Self::ExtractRuntimeData => "extract_runtime_data",
            Self::DownloadServer => "download_server",
            Self::ExtractServer => "extract_server",
            Self::AggregateHeaders => "aggregate_headers",
            Self::GeneratePdb => "generate_pdb",
        }
    }

    /// Human-readable label for progress output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ValidateConfig => "Validating configuration",
            Self::Preflight => "Checking required tools",
            Self::PrepareWorkspace => "Preparing workspace",
            Self::CloneSource => "Cloning the repository",
            Self::BuildMetadata => "Running xmake project",
            Self::ResolveRelease => "Resolving latest server release",
            Self::DownloadPatchTool => "Downloading patch tool",
            Self::DownloadPreloader => "Downloading preloader",
            Self::DownloadRuntimeData => "Downloading runtime data",
            Self::ExtractRuntimeData => "Extracting runtime data",
            Self::DownloadServer => "Downloading dedicated server",
            Self::ExtractServer => "Extracting server executable",
            Self::AggregateHeaders => "Writing aggregate header",
            Self::GeneratePdb => "Running patch tool",
        }
    }

    /// Look a step up by its identifier.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.as_str() == name)
    }
}

/// Value a step produced, plus an optional note for the completion event.
struct StepOutcome<T> {
    value: T,
    detail: Option<String>,
}

impl<T> StepOutcome<T> {
    const fn new(value: T) -> Self {
        Self {
            value,
            detail: None,
        }
    }

    fn with_detail(value: T, detail: impl Into<String>) -> Self {
        Self {
            value,
            detail: Some(detail.into()),
        }
    }
}

/// Explicit per-run state threaded through the steps.
#[derive(Debug)]
struct RunContext {
    workspace: Workspace,
    repo_dir: Option<PathBuf>,
    release: Option<ReleaseDescriptor>,
    server_binary: Option<PathBuf>,
    header_count: Option<usize>,
}

impl RunContext {
    const fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            repo_dir: None,
            release: None,
            server_binary: None,
            header_count: None,
        }
    }

    fn repo_dir(&self) -> AppResult<&Path> {
        self.repo_dir
            .as_deref()
            .ok_or(AppError::MissingState { field: "repo_dir" })
    }

    fn release(&self) -> AppResult<&ReleaseDescriptor> {
        self.release
            .as_ref()
            .ok_or(AppError::MissingState { field: "release" })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier of the run, as carried by its events.
    pub run_id: Uuid,
    /// Absolute path of the generated symbol file.
    pub artifact: PathBuf,
    /// Server version the artifact was generated for.
    pub version: String,
    /// Workspace root.
    pub workspace: PathBuf,
    /// Number of headers in the aggregate header.
    pub header_count: usize,
}

/// Runs the full clone, build, download and patch sequence.
pub struct Pipeline {
    config: PipelineConfig,
    events: EventBus,
    client: Client,
    runner: Arc<dyn CommandRunner>,
}

impl Pipeline {
    /// Construct a pipeline that launches real processes.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: PipelineConfig, events: EventBus) -> AppResult<Self> {
        let client = build_client(
            &config.endpoints.user_agent,
            Duration::from_secs(config.endpoints.connect_timeout_secs),
        )
        .map_err(|err| AppError::fetch("pipeline.build_client", err))?;
        Ok(Self {
            config,
            events,
            client,
            runner: Arc::new(SystemRunner),
        })
    }

    /// Replace the process runner, e.g. to route tools through a sandbox.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Execute every step in order, stopping at the first failure.
    ///
    /// A terminal `RunCompleted` or `RunFailed` event is always published.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failed step.
    pub async fn run(&self) -> AppResult<RunReport> {
        let run_id = Uuid::new_v4();
        self.events.publish(Event::RunStarted {
            run_id,
            work_dir: self.config.work_dir.display().to_string(),
        });
        info!(%run_id, work_dir = %self.config.work_dir.display(), "pipeline started");

        let result = self.execute(run_id).await;
        match &result {
            Ok(report) => {
                info!(
                    %run_id,
                    artifact = %report.artifact.display(),
                    version = %report.version,
                    "pipeline completed"
                );
                self.events.publish(Event::RunCompleted {
                    run_id,
                    artifact: report.artifact.display().to_string(),
                });
            }
            Err(err) => {
                error!(%run_id, error = %error_chain(err), "pipeline failed");
                self.events.publish(Event::RunFailed {
                    run_id,
                    message: error_chain(err),
                });
            }
        }
        result
    }

    async fn execute(&self, run_id: Uuid) -> AppResult<RunReport> {
        let config = &self.config;
        let runner = self.runner.as_ref();
        let downloader = Downloader::new(self.client.clone()).with_events(self.events.clone());

        let symbol_list = self
            .execute_step(StepKind::ValidateConfig, async {
                validate(config).map_err(|err| AppError::config("config.validate", err))?;
                let symbol_list = config
                    .symbol_list
                    .as_deref()
                    .map(resolve_symbol_list)
                    .transpose()
                    .map_err(|err| AppError::config("config.symbol_list", err))?;
                let detail = symbol_list
                    .as_ref()
                    .map(|path| format!("symbol list {}", path.display()));
                Ok(StepOutcome {
                    value: symbol_list,
                    detail,
                })
            })
            .await?;

        self.execute_step(StepKind::Preflight, async {
            let probes = check_required(&config.preflight.required_commands)
                .map_err(|err| AppError::toolchain("preflight.check_required", err))?;
            let found = probes
                .iter()
                .map(|probe| probe.command.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Ok(StepOutcome::with_detail((), format!("found {found}")))
        })
        .await?;

        let workspace = self
            .execute_step(StepKind::PrepareWorkspace, async {
                let work_dir = config.work_dir.clone();
                let workspace = blocking("workspace.reset", move || {
                    reset_workspace(&work_dir).map_err(|err| AppError::fsops("workspace.reset", err))
                })
                .await?;
                let detail = workspace.root().display().to_string();
                Ok(StepOutcome::with_detail(workspace, detail))
            })
            .await?;
        let mut ctx = RunContext::new(workspace);

        let repo_dir = self
            .execute_step(StepKind::CloneSource, async {
                let checkout = SourceCheckout {
                    repo_url: &config.source.repo_url,
                    branch: &config.source.branch,
                    directory: &config.source.checkout_dir,
                };
                let repo_dir = clone_branch(runner, &checkout, ctx.workspace.root())
                    .await
                    .map_err(|err| AppError::toolchain("source.clone", err))?;
                Ok(StepOutcome::new(repo_dir))
            })
            .await?;
        ctx.repo_dir = Some(repo_dir);
        let repo_dir = ctx.repo_dir()?.to_path_buf();

        self.execute_step(StepKind::BuildMetadata, async {
            generate_compile_commands(runner, &repo_dir, &config.source.build_dir)
                .await
                .map_err(|err| AppError::toolchain("build.compile_commands", err))?;
            Ok(StepOutcome::new(()))
        })
        .await?;

        let release = self
            .execute_step(StepKind::ResolveRelease, async {
                let endpoints = &config.endpoints;
                let release = resolve_release(
                    &self.client,
                    &endpoints.releases_url,
                    &endpoints.server_tag_suffix,
                )
                .await
                .map_err(|err| AppError::fetch("release.resolve", err))?
                .ok_or_else(|| AppError::NoRelease {
                    listing_url: endpoints.releases_url.clone(),
                    suffix: endpoints.server_tag_suffix.clone(),
                })?;
                let detail = format!("server version {}", release.version);
                Ok(StepOutcome::with_detail(release, detail))
            })
            .await?;
        ctx.release = Some(release);

        let artifacts = &config.artifacts;
        self.download(
            &downloader,
            StepKind::DownloadPatchTool,
            &config.endpoints.patch_tool_url,
            repo_dir.join(&artifacts.patch_tool),
        )
        .await?;
        self.download(
            &downloader,
            StepKind::DownloadPreloader,
            &config.endpoints.preloader_url,
            repo_dir.join(&artifacts.preloader),
        )
        .await?;

        let runtime_archive = repo_dir.join(&artifacts.runtime_data_archive);
        let asset_url = ctx.release()?.asset_url.clone();
        self.download(
            &downloader,
            StepKind::DownloadRuntimeData,
            &asset_url,
            runtime_archive.clone(),
        )
        .await?;

        self.execute_step(StepKind::ExtractRuntimeData, async {
            let target = repo_dir.clone();
            let written = blocking("archive.extract_all", move || {
                extract_all(&runtime_archive, &target)
                    .map_err(|err| AppError::fsops("runtime_data.extract", err))
            })
            .await?;
            Ok(StepOutcome::with_detail((), format!("{} files", written.len())))
        })
        .await?;

        let server_archive = repo_dir.join(&artifacts.server_archive);
        let server_url = config.server_download_url(&ctx.release()?.version);
        self.download(
            &downloader,
            StepKind::DownloadServer,
            &server_url,
            server_archive.clone(),
        )
        .await?;

        let server_binary = self
            .execute_step(StepKind::ExtractServer, async {
                let target = repo_dir.clone();
                let member = artifacts.server_binary.clone();
                let binary = blocking("archive.extract_member", move || {
                    extract_member(&server_archive, &member, &target)
                        .map_err(|err| AppError::fsops("server.extract", err))
                })
                .await?;
                Ok(StepOutcome::new(binary))
            })
            .await?;
        ctx.server_binary = Some(server_binary);

        let header_count = self
            .execute_step(StepKind::AggregateHeaders, async {
                let root = repo_dir.clone();
                let header = config.header.clone();
                let summary = blocking("headers.aggregate", move || {
                    aggregate_headers(&HeaderAggregation {
                        root: &root,
                        source_dir: &header.source_dir,
                        output: &header.output,
                        extension: &header.extension,
                    })
                    .map_err(|err| AppError::fsops("headers.aggregate", err))
                })
                .await?;
                let count = summary.includes.len();
                Ok(StepOutcome::with_detail(count, format!("{count} headers")))
            })
            .await?;
        ctx.header_count = Some(header_count);

        let artifact = self
            .execute_step(StepKind::GeneratePdb, async {
                let server_binary = ctx.server_binary.as_deref().ok_or(AppError::MissingState {
                    field: "server_binary",
                })?;
                let server_binary = server_binary
                    .strip_prefix(&repo_dir)
                    .unwrap_or(server_binary)
                    .to_string_lossy()
                    .into_owned();
                let invocation = PatchInvocation {
                    tool: artifacts.patch_tool.clone(),
                    runner: config.patch.runner.clone(),
                    compile_commands_dir: config.source.build_dir.clone(),
                    header: config.header.output.clone(),
                    server_binary,
                    output_dir: config.patch.output_dir.clone(),
                    output_name: config.patch.output_name.clone(),
                    symbol_list,
                };
                let artifact = run_patch_tool(runner, &invocation, &repo_dir)
                    .await
                    .map_err(|err| AppError::toolchain("patch.run", err))?;
                let detail = artifact.display().to_string();
                Ok(StepOutcome::with_detail(artifact, detail))
            })
            .await?;

        let release = ctx.release()?;
        Ok(RunReport {
            run_id,
            artifact,
            version: release.version.clone(),
            workspace: ctx.workspace.root().to_path_buf(),
            header_count: ctx.header_count.unwrap_or_default(),
        })
    }

    async fn download(
        &self,
        downloader: &Downloader,
        step: StepKind,
        url: &str,
        destination: PathBuf,
    ) -> AppResult<()> {
        self.execute_step(step, async {
            let report = downloader
                .download(&DownloadTask::new(url, destination))
                .await
                .map_err(|err| AppError::fetch(step.as_str(), err))?;
            Ok(StepOutcome::with_detail(
                (),
                format!("{} bytes", report.bytes_downloaded),
            ))
        })
        .await
    }

    async fn execute_step<T, F>(&self, step: StepKind, op: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<StepOutcome<T>>>,
    {
        info!(step = step.as_str(), "{}", step.label());
        self.events.publish(Event::StepStarted {
            step: step.as_str().to_string(),
        });

        match op.await {
            Ok(outcome) => {
                info!(
                    step = step.as_str(),
                    detail = outcome.detail.as_deref().unwrap_or_default(),
                    "step completed"
                );
                self.events.publish(Event::StepCompleted {
                    step: step.as_str().to_string(),
                    detail: outcome.detail,
                });
                Ok(outcome.value)
            }
            Err(err) => {
                let message = error_chain(&err);
                error!(step = step.as_str(), error = %message, "step failed");
                self.events.publish(Event::StepFailed {
                    step: step.as_str().to_string(),
                    message,
                });
                Err(err)
            }
        }
    }
}

async fn blocking<T, F>(operation: &'static str, task: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|source| AppError::Join { operation, source })?
}

/// Render an error and its sources on one line.
fn error_chain(err: &AppError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
