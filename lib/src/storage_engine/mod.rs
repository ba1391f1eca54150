// lib/src/storage_engine/mod.rs

pub mod storage_engine;
pub mod sled_storage;
pub mod inmemory_storage;
pub mod storage_utils;

pub use storage_engine::{AppointmentStore, BookingLedger, RecordMutation, ReservationOutcome};
pub use sled_storage::{open_sled_db, SledAppointmentStore, SledBookingLedger};
pub use inmemory_storage::{InMemoryAppointmentStore, InMemoryBookingLedger};

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageEngineType};

/// The two storage halves the engine runs on. Both come from the same
/// backend so a sled deployment keeps reservations and records in one db.
#[derive(Clone)]
pub struct StorageHandles {
    pub ledger: Arc<dyn BookingLedger>,
    pub appointments: Arc<dyn AppointmentStore>,
}

/// Creates the ledger and appointment store for the configured engine.
///
/// Sled is the default and needs a data directory; InMemory is meant for
/// tests and throwaway runs.
pub fn create_storage(config: &StorageConfig) -> Result<StorageHandles> {
    let handles = match config.engine_type {
        StorageEngineType::Sled => {
            let path = config
                .data_directory
                .as_ref()
                .context("sled storage requires a data_directory")?;
            let db = open_sled_db(path)?;
            StorageHandles {
                ledger: Arc::new(SledBookingLedger::new(&db)?),
                appointments: Arc::new(SledAppointmentStore::new(&db)?),
            }
        }
        StorageEngineType::InMemory => StorageHandles {
            ledger: Arc::new(InMemoryBookingLedger::new()),
            appointments: Arc::new(InMemoryAppointmentStore::new()),
        },
    };
    info!(
        "Storage ready: ledger={}, appointments={}",
        handles.ledger.get_type(),
        handles.appointments.get_type()
    );
    Ok(handles)
}
