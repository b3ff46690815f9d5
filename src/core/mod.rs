pub mod builder;
pub mod chunker;
pub mod codec;
pub mod decoder;
pub mod handler;
pub mod layer;

pub use crate::domain::model::{EncodedMessage, GelfMessage, Level, LogRecord};
pub use crate::domain::ports::{ConfigProvider, Transport};
pub use crate::domain::settings::{
    GelfOptions, OverflowPolicy, TlsSettings, TransportKind, LAN_CHUNK, WAN_CHUNK,
};
pub use crate::utils::error::Result;
