// Credvault - Service Module
//
// The credential operations exposed to transports.

mod credentials;

pub use credentials::{CredentialService, DEFAULT_PAGE_SIZE};
