pub mod directory;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod state;
pub mod supabase;

pub use directory::{DoctorDirectory, DoctorSearchFilters};
pub use error::DatabaseError;
pub use ledger::{InsertOutcome, ReservationLedger};
pub use memory::{InMemoryDirectory, InMemoryLedger};
pub use state::AppState;
pub use supabase::{SupabaseClient, SupabaseDirectory, SupabaseLedger};
