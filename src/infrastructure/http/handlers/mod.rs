//! HTTP Handlers

mod convert;
mod ping;
mod voices;

pub use convert::*;
pub use ping::*;
pub use voices::*;
