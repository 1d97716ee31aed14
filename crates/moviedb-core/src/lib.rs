#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod connection;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{Config, Credentials, Settings};
pub use error::{Error, Result};
pub use traits::{Embedder, VectorSearcher};
pub use types::{Movie, MovieStream, SearchOptions};
