use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Relay client is no longer running")]
    ClientClosed,

    #[error("Endpoint error: {0}")]
    Endpoint(#[from] crate::coordinator::CoordinatorError),
}

pub type ClientResult<T> = Result<T, ClientError>;
