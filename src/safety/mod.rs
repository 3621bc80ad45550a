//! Safety Gate (C4) and its supporting trust store: the single point where
//! risk tier, impact, preview, and trust history combine into an
//! auto-run/prompt/refuse decision.

mod gate;
mod trust;

pub use gate::{ConfirmationRequest, SafetyGate};
pub use trust::{TrustStore, TrustStoreError};
