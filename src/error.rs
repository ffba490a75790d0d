use std::path::PathBuf;

/// Failure to turn a file into a playable song. The previously loaded song
/// stays in place whenever one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file structure: {0}")]
    Format(String),
    #[error("malformed midi data: {0}")]
    Parse(#[from] midly::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no midi output port available")]
    NoPort,
    #[error("no midi output port matching {0:?}")]
    PortNotFound(String),
    #[error("midi init failed: {0}")]
    Init(#[from] midir::InitError),
    #[error("midi port info unavailable: {0}")]
    PortInfo(#[from] midir::PortInfoError),
    #[error("midi connection failed: {0}")]
    Connect(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("expected one sound preset per channel (16), got {0}")]
    PresetCount(usize),
}
