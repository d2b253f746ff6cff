use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("connection to device {dpid} lost: {reason}")]
    ConnectionLost { dpid: u64, reason: String },

    #[error("session for device {dpid} is closed")]
    SessionClosed { dpid: u64 },

    #[error("device {dpid} not connected")]
    DeviceNotFound { dpid: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
