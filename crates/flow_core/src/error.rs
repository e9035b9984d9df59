use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("reminder settings are not loaded yet")]
    DraftNotLoaded,
    #[error("invalid reminder time {hour:02}:{minute:02}")]
    InvalidTime { hour: u8, minute: u8 },
    #[error("prepublishing flow has not been started")]
    NotStarted,
    #[error(transparent)]
    Store(anyhow::Error),
    #[error(transparent)]
    Scheduler(anyhow::Error),
    #[error(transparent)]
    Bundle(#[from] shared::error::BundleError),
}
