//! Error types emitted by the Convoy CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::net::SocketAddr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use convoy_core::{EngineError, ValidationError};
use convoy_data::routing::ProviderBuildError;
use convoy_dispatch::{QueueError, StoreError};
use thiserror::Error;

/// Errors emitted by the Convoy CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (pass it on the command line or set {env})")]
    MissingArgument {
        /// Option or argument name.
        field: &'static str,
        /// Environment variable that also sets it.
        env: &'static str,
    },
    /// An option holds a value the command cannot use.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidArgument {
        /// Option or argument name.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        /// Cargo feature to enable.
        feature: &'static str,
        /// What was attempted.
        action: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Option or argument name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Option or argument name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Option or argument name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Opening the problem file failed.
    #[error("failed to open problem at {path:?}: {source}")]
    OpenProblem {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Problem JSON could not be decoded.
    #[error("failed to parse problem JSON at {path:?}: {source}")]
    ParseProblem {
        /// Offending path.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The problem failed validation.
    #[error("problem in {path:?} failed validation: {source}")]
    InvalidProblem {
        /// Offending path.
        path: Utf8PathBuf,
        /// Violated fields.
        #[source]
        source: ValidationError,
    },
    /// The engine rejected the problem.
    #[error("solver failed: {source}")]
    Solve {
        /// Engine failure.
        source: EngineError,
    },
    /// Serialising the solution failed.
    #[error("failed to serialise solution: {0}")]
    SerialiseSolution(#[source] serde_json::Error),
    /// Writing the solution failed.
    #[error("failed to write solution: {0}")]
    WriteSolution(#[source] std::io::Error),
    /// Constructing the distance provider failed.
    #[error("failed to build distance provider for {base_url:?}: {source}")]
    BuildDistanceProvider {
        /// Configured endpoint.
        base_url: String,
        /// Construction failure.
        #[source]
        source: ProviderBuildError,
    },
    /// The job queue backend failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// The result store backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Building the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Binding the HTTP listener failed.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The HTTP server stopped with an error.
    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}
