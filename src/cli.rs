//! Helpers shared by the binaries

use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, SourceKind};
use crate::error::Result;
use crate::source::{AnySource, HorizonSource, MemorySource, SqliteSource};

/// Operations in the ledger served by the `memory` source kind.
pub const SAMPLE_LEDGER_SIZE: u64 = 1_000;

/// Initialise the `tracing` subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the record source selected in the config.
pub fn open_source(config: &Config) -> Result<AnySource> {
    let source = &config.source;
    Ok(match source.kind {
        SourceKind::Horizon => AnySource::Horizon(HorizonSource::new(
            source.horizon_url.clone(),
            Duration::from_secs(source.request_timeout_secs),
        )?),
        SourceKind::Sqlite => {
            let path = std::path::Path::new(&source.database_path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            AnySource::Sqlite(SqliteSource::open(&source.database_path)?)
        }
        SourceKind::Memory => AnySource::Memory(MemorySource::sample(SAMPLE_LEDGER_SIZE)),
    })
}
