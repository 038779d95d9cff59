pub mod contact_extractor;
pub mod profile;

pub use contact_extractor::{ContactExtractor, ContactFindings, ExtractedEmail};
pub use profile::ProfileExtractor;
