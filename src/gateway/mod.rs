// Credvault - Gateway Module
//
// Unix Domain Socket (UDS) server exposing the credential service as
// JSON-RPC 2.0 to local tools.

mod protocol;
mod uds;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use uds::UdsServer;
