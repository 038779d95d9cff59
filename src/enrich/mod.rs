pub mod reachability;
pub mod registry;

pub use reachability::{email_confidence, DnsMxLookup, MxLookup, ReachabilityValidator};
pub use registry::{PappersClient, RegistryLookup};
