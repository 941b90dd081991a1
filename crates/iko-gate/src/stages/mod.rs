//! Built-in gate stages.

pub mod authority;
pub mod linkage;
pub mod ownership;
pub mod signature;

pub use authority::AuthorityStage;
pub use linkage::LinkageStage;
pub use ownership::OwnershipStage;
pub use signature::SignatureStage;
