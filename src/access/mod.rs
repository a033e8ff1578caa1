// Credvault - Access Module
//
// Who is calling, and whether they may touch a given credential.

mod guard;

pub use guard::{authorize, AccessDenied, AccountKind, Actor};
