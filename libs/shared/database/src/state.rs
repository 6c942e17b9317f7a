use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StorageBackend};
use shared_utils::clock::{Clock, SystemClock};

use crate::directory::DoctorDirectory;
use crate::error::DatabaseError;
use crate::ledger::ReservationLedger;
use crate::memory::{InMemoryDirectory, InMemoryLedger};
use crate::supabase::{SupabaseDirectory, SupabaseLedger};

/// Storage handles and collaborators shared by every request handler.
///
/// Built once by the process entry point and passed to the routers; the
/// booking components never open storage on their own.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<dyn ReservationLedger>,
    pub directory: Arc<dyn DoctorDirectory>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        ledger: Arc<dyn ReservationLedger>,
        directory: Arc<dyn DoctorDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            ledger,
            directory,
            clock,
        }
    }

    /// Wires the backend selected by `STORAGE_BACKEND`.
    pub fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let (ledger, directory): (Arc<dyn ReservationLedger>, Arc<dyn DoctorDirectory>) =
            match config.storage_backend {
                StorageBackend::Memory => {
                    info!("Using in-memory reservation ledger with seeded directory");
                    (
                        Arc::new(InMemoryLedger::new()),
                        Arc::new(InMemoryDirectory::seeded()),
                    )
                }
                StorageBackend::Supabase => {
                    if config.supabase_url.is_empty() || config.supabase_anon_key.is_empty() {
                        return Err(DatabaseError::NotConfigured(
                            "SUPABASE_URL and SUPABASE_ANON_PUBLIC_KEY are required for the supabase backend"
                                .to_string(),
                        ));
                    }
                    info!("Using Supabase reservation ledger at {}", config.supabase_url);
                    (
                        Arc::new(SupabaseLedger::new(&config)),
                        Arc::new(SupabaseDirectory::new(&config)),
                    )
                }
            };

        Ok(Self::new(config, ledger, directory, Arc::new(SystemClock)))
    }
}
