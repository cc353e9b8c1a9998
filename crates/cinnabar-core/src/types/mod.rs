pub mod attribute;
pub mod record;
pub mod transaction;
pub mod value;

pub use attribute::{AgentSignature, Lease, Tag};
pub use record::{DeltaRecord, LeaseRecord, MessageRecord, TagRecord};
pub use transaction::{Transaction, TransactionStep};
pub use value::{Id, Pointer, TimeStamp, VersionNumber};
