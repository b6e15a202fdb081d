//! Default endpoints, file names and tool arguments for a pipeline run.
//!
//! # Design
//! - Centralize every fixed string the pipeline depends on.
//! - Everything here can be overridden through the YAML config file.

/// Workspace directory used when no override is supplied.
pub const DEFAULT_WORK_DIR: &str = "./work";

/// External commands that must resolve on `PATH` before anything runs.
pub const REQUIRED_COMMANDS: &[&str] = &["git", "xmake"];

/// Source repository cloned into the workspace.
pub const SOURCE_REPO_URL: &str = "https://github.com/LiteLDev/LeviLamina.git";
/// Branch carrying the generated headers.
pub const SOURCE_BRANCH: &str = "header";
/// Directory name the clone lands in.
pub const SOURCE_CHECKOUT_DIR: &str = "LeviLamina";
/// Output directory for `compile_commands.json`, also handed to the patch tool.
pub const BUILD_DIR: &str = "build";

/// Direct download for the patch tool.
pub const PATCH_TOOL_URL: &str =
    "https://github.com/bdsmodding/Troll/releases/latest/download/Troll.exe";
/// Direct download for the preloader support library.
pub const PRELOADER_URL: &str =
    "https://github.com/LiteLDev/PreLoader/releases/latest/download/PreLoader.dll";
/// Release listing scanned for the newest server runtime data.
pub const RELEASES_URL: &str =
    "https://api.github.com/repos/LiteLDev/bedrock-runtime-data/releases";
/// Tag suffix marking a dedicated-server runtime data release.
pub const SERVER_TAG_SUFFIX: &str = "-server";
/// Placeholder substituted with the resolved version.
pub const VERSION_PLACEHOLDER: &str = "{version}";
/// Download location of the dedicated server distribution.
pub const SERVER_URL_TEMPLATE: &str =
    "https://www.minecraft.net/bedrockdedicatedserver/bin-win/bedrock-server-{version}.zip";
/// Client identification sent with every request; some hosts reject default agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";
/// Connect timeout for HTTP requests, in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// File name of the downloaded patch tool.
pub const PATCH_TOOL_FILE: &str = "Troll.exe";
/// File name of the downloaded preloader.
pub const PRELOADER_FILE: &str = "PreLoader.dll";
/// File name of the downloaded runtime data archive.
pub const RUNTIME_DATA_ARCHIVE: &str = "bedrock-runtime-data-windows-x64.zip";
/// File name of the downloaded server distribution.
pub const SERVER_ARCHIVE: &str = "bedrock-server.zip";
/// Member extracted from the server distribution.
pub const SERVER_BINARY: &str = "bedrock_server.exe";

/// Directory walked for headers, relative to the checkout.
pub const HEADER_SOURCE_DIR: &str = "src";
/// Aggregate header written by the pipeline, relative to the checkout.
pub const HEADER_OUTPUT: &str = "test/include_all.h";
/// Extension identifying header files.
pub const HEADER_EXTENSION: &str = "h";

/// Output directory argument; the patch tool appends the file name verbatim.
pub const PATCH_OUTPUT_DIR: &str = "./";
/// Name of the symbol file produced by the patch tool.
pub const PATCH_OUTPUT_NAME: &str = "Troll.pdb";
