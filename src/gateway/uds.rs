// Credvault - Unix Domain Socket Server
//
// Listens on a Unix domain socket for newline-delimited JSON-RPC 2.0
// requests. Each connection is handled in a spawned tokio task; each request
// opens its own database connection and runs one service call.
//
// The socket is owner-only (0600). Callers name the actor they run as;
// authenticating that actor is the job of whatever sits in front of the
// socket.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use uuid::Uuid;

use crate::access::Actor;
use crate::credential::{CredentialError, CredentialInput};
use crate::service::CredentialService;
use crate::store::{Database, PageRequest, SqliteCredentialStore, SqliteSharingLedger};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND,
};

type SqliteService<'a> = CredentialService<SqliteCredentialStore<'a>, SqliteSharingLedger<'a>>;

/// Unix Domain Socket server for Credvault.
pub struct UdsServer {
    db_path: PathBuf,
    socket_path: PathBuf,
    default_page_size: u32,
}

impl UdsServer {
    /// Create a new UDS server.
    pub fn new(db_path: PathBuf, socket_path: PathBuf, default_page_size: u32) -> Self {
        Self {
            db_path,
            socket_path,
            default_page_size,
        }
    }

    /// Start the UDS server. This runs until the process is terminated.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.socket_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Remove stale socket file if it exists
        if self.socket_path.exists() {
            tokio::fs::remove_file(&self.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!(
            socket = %self.socket_path.display(),
            db = %self.db_path.display(),
            "Credvault UDS gateway listening"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.socket_path, perms)?;
        }

        loop {
            let (stream, _addr) = listener.accept().await?;
            let db_path = self.db_path.clone();
            let page_size = self.default_page_size;

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &db_path, page_size).await {
                    tracing::error!("Connection handler error: {}", e);
                }
            });
        }
    }
}

/// Handle a single client connection.
/// Reads newline-delimited JSON-RPC requests and writes responses.
async fn handle_connection(
    stream: tokio::net::UnixStream,
    db_path: &Path,
    default_page_size: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Ok(cred) = stream.peer_cred() {
        tracing::info!(uid = cred.uid(), pid = ?cred.pid(), "Client connected");
    }

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let response = process_request(&line, db_path, default_page_size);
        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Parse and dispatch a single JSON-RPC request.
fn process_request(raw: &str, db_path: &Path, default_page_size: u32) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_str(raw) {
        Ok(req) => req,
        Err(e) => return JsonRpcResponse::parse_error(format!("Parse error: {}", e)),
    };

    if let Err(e) = request.validate() {
        return JsonRpcResponse::error(request.id, INVALID_REQUEST, e);
    }

    let db = match Database::open(db_path) {
        Ok(db) => db,
        Err(e) => {
            return JsonRpcResponse::error(request.id, INTERNAL_ERROR, format!("Database error: {}", e))
        }
    };
    let service = CredentialService::new(SqliteCredentialStore::new(&db), SqliteSharingLedger::new(&db))
        .with_default_page_size(default_page_size);

    dispatch(&service, request)
}

// ─── Method Parameters ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ActorParams {
    actor: Actor,
}

#[derive(Debug, Deserialize)]
struct CreateParams {
    actor: Actor,
    credential: CredentialInput,
}

/// Paging values may arrive as numbers or strings; anything else reads as 0.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    actor: Actor,
    #[serde(default)]
    page_index: Value,
    #[serde(default)]
    page_size: Value,
    #[serde(default)]
    name: String,
    #[serde(default)]
    order: String,
    #[serde(default)]
    field: String,
}

#[derive(Debug, Deserialize)]
struct IdParams {
    actor: Actor,
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    actor: Actor,
    id: Uuid,
    credential: CredentialInput,
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    actor: Actor,
    ids: String,
}

#[derive(Debug, Deserialize)]
struct ChangeOwnerParams {
    actor: Actor,
    id: Uuid,
    owner: String,
}

#[derive(Debug, Deserialize)]
struct ShareParams {
    actor: Actor,
    id: Uuid,
    grantee: String,
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

fn dispatch(service: &SqliteService<'_>, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest {
        method, params, id, ..
    } = request;

    match method.as_str() {
        "credential.list" => call(id, params, |p: ActorParams| service.list_all(&p.actor)),
        "credential.create" => call(id, params, |p: CreateParams| {
            service.create(&p.actor, &p.credential)
        }),
        "credential.page" => call(id, params, |p: PageParams| {
            let request = PageRequest::from_params(
                &param_text(&p.page_index),
                &param_text(&p.page_size),
                &p.name,
                &p.order,
                &p.field,
            );
            service.page(&p.actor, request)
        }),
        "credential.update" => call(id, params, |p: UpdateParams| {
            service
                .update_by_id(&p.actor, &p.id, &p.credential)
                .map(|()| serde_json::json!({ "updated": true, "id": p.id }))
        }),
        "credential.delete" => call(id, params, |p: DeleteParams| {
            service
                .delete_by_ids(&p.actor, &p.ids)
                .map(|deleted| serde_json::json!({ "deleted": deleted }))
        }),
        "credential.get" => call(id, params, |p: IdParams| service.get_by_id(&p.actor, &p.id)),
        "credential.change_owner" => call(id, params, |p: ChangeOwnerParams| {
            service
                .change_owner(&p.actor, &p.id, &p.owner)
                .map(|()| serde_json::json!({ "id": p.id, "owner": p.owner.trim() }))
        }),
        "credential.share" => call(id, params, |p: ShareParams| {
            service
                .share(&p.actor, &p.id, &p.grantee)
                .map(|created| serde_json::json!({ "created": created }))
        }),
        "credential.grants" => call(id, params, |p: IdParams| service.grants(&p.actor, &p.id)),
        _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {}", method)),
    }
}

/// Bind params, run one service call, and wrap its outcome.
fn call<P, T, F>(id: Value, params: Value, op: F) -> JsonRpcResponse
where
    P: DeserializeOwned,
    T: Serialize,
    F: FnOnce(P) -> Result<T, CredentialError>,
{
    let params: P = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
    };

    match op(params) {
        Ok(result) => match serde_json::to_value(result) {
            Ok(json) => JsonRpcResponse::success(id, json),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
        },
        Err(e) => JsonRpcResponse::from_credential_error(id, &e),
    }
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
