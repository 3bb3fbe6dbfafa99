use teller_types::TellerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("LMDB resource exhausted: {0}")]
    Busy(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        // Map/reader/txn exhaustion clears on retry once pressure drops;
        // everything else is fatal for the call.
        match &e {
            heed::Error::Mdb(heed::MdbError::MapFull)
            | heed::Error::Mdb(heed::MdbError::ReadersFull)
            | heed::Error::Mdb(heed::MdbError::TxnFull) => LmdbError::Busy(e.to_string()),
            _ => LmdbError::Heed(e.to_string()),
        }
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for TellerError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Busy(msg) => TellerError::Busy(msg),
            other => TellerError::Unavailable(other.to_string()),
        }
    }
}
