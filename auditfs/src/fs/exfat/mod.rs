pub mod chain;
pub mod checker;
pub mod constant;
pub mod dirset;
pub mod meta;
pub mod source;
pub mod types;
pub mod upcase;

// === Public Interface ===
pub mod prelude {
    pub use super::chain;
    pub use super::checker::{ExFatAuditOptions, ExFatAuditor, RootCritical};
    pub use super::constant::*;
    pub use super::dirset::{ScanStep, SetState, SetValidator, name_hash, record_checksum};
    pub use super::meta::ExFatMeta;
    pub use super::source::{ClusterRecordSource, RawRecord, RecordSource};
    pub use super::types::*;
    pub use super::upcase::{UpcaseFold, audit_table};
    pub use crate::core::checker::*;
    pub use crate::core::errors::*;
    pub use auditio::prelude::*;
}
