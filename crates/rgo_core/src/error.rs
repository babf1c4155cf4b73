use camino::Utf8PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the generation pipeline.
///
/// Per-repo and per-binding variants are contained to their item by the
/// orchestrator: they are logged and the next item proceeds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read config file {path}")]
    ConfigIo {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}")]
    ConfigParse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("git {op} failed for repo {repo}")]
    Git {
        op: GitOp,
        repo: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("cannot parse idl file {path}: {message}")]
    IdlParse { path: Utf8PathBuf, message: String },

    #[error("no go namespace declared in {path}")]
    NoGoNamespace { path: Utf8PathBuf },

    #[error("unsupported idl extension: {path}")]
    UnsupportedIdlExtension { path: Utf8PathBuf },

    #[error("cannot render client code")]
    Render(#[from] tera::Error),

    #[error("io error at {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {output}")]
    Toolchain { tool: String, output: String },

    #[error("cannot write package metadata to {path}")]
    MetadataWrite {
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// The git operation that failed, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOp {
    Clone,
    Fetch,
    Checkout,
    Pull,
    Head,
}

impl std::fmt::Display for GitOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GitOp::Clone => "clone",
            GitOp::Fetch => "fetch",
            GitOp::Checkout => "checkout",
            GitOp::Pull => "pull",
            GitOp::Head => "head",
        };
        f.write_str(name)
    }
}
