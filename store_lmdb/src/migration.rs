//! Schema versioning for the LMDB store.
//!
//! The meta database carries the schema version the data was written with.
//! On open, any gap between that version and [`CURRENT_SCHEMA_VERSION`] is
//! closed by applying the numbered steps in order; data written by a newer
//! build is refused rather than reinterpreted.

use std::cmp::Ordering;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

/// The schema version this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Applies pending schema migrations at environment open.
pub struct Migrator;

impl Migrator {
    /// Bring the store's schema up to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// A missing version reads as 0 (a fresh database). Data whose version
    /// is above what this build supports is refused: downgrades are not
    /// supported.
    pub fn run(env: &LmdbEnvironment) -> Result<(), LmdbError> {
        let stored = env.schema_version()?;
        match stored.cmp(&CURRENT_SCHEMA_VERSION) {
            Ordering::Equal => {
                tracing::debug!(version = stored, "schema up to date");
                Ok(())
            }
            Ordering::Greater => Err(LmdbError::Schema(format!(
                "data has schema version {}, this build supports up to {}",
                stored, CURRENT_SCHEMA_VERSION
            ))),
            Ordering::Less => {
                for step in stored..CURRENT_SCHEMA_VERSION {
                    tracing::info!(from = step, to = step + 1, "applying schema migration");
                    apply_step(step)?;
                }
                env.set_schema_version(CURRENT_SCHEMA_VERSION)?;
                tracing::info!(version = CURRENT_SCHEMA_VERSION, "schema migrated");
                Ok(())
            }
        }
    }
}

/// One migration step, from version `from` to `from + 1`.
fn apply_step(from: u32) -> Result<(), LmdbError> {
    match from {
        0 => {
            // Fresh database; every table is created at environment open,
            // so the initial version only needs to be stamped.
            Ok(())
        }
        other => Err(LmdbError::Schema(format!(
            "no migration step from schema version {}",
            other
        ))),
    }
}
