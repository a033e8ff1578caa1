// Credvault - CLI Command Handlers
//
// Each function handles one CLI subcommand. They open the database, build a
// credential service for the acting account, and print the outcome. The
// `serve` command starts the UDS gateway.

use std::path::Path;

use uuid::Uuid;

use crate::access::Actor;
use crate::config::Config;
use crate::credential::{Credential, CredentialFields, CredentialInput, SENTINEL};
use crate::error::CredvaultError;
use crate::gateway::UdsServer;
use crate::service::CredentialService;
use crate::store::{Database, PageRequest, SqliteCredentialStore, SqliteSharingLedger};

use super::{Cli, Commands, SecretArgs};

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<(), CredvaultError> {
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    if let Commands::Serve { socket } = cli.command {
        if let Some(socket) = socket {
            config.socket_path = socket;
        }
        return cmd_serve(config).await;
    }

    let actor = resolve_actor(cli.actor, cli.admin)?;
    let db = open_db(&config.db_path)?;
    let service = CredentialService::new(SqliteCredentialStore::new(&db), SqliteSharingLedger::new(&db))
        .with_default_page_size(config.default_page_size);
    tracing::debug!(actor = %actor, db = %config.db_path.display(), "Running command");

    match cli.command {
        Commands::List => cmd_list(&service, &actor),
        Commands::Add { name, secret } => cmd_add(&service, &actor, name, secret),
        Commands::Search {
            name,
            page_index,
            page_size,
            order,
            field,
        } => {
            let request = PageRequest::from_params(&page_index, &page_size, &name, &order, &field);
            cmd_search(&service, &actor, request)
        }
        Commands::Update { id, name, secret } => cmd_update(&service, &actor, &id, name, secret),
        Commands::Delete { ids } => cmd_delete(&service, &actor, &ids),
        Commands::Get { id, reveal } => cmd_get(&service, &actor, &id, reveal),
        Commands::Chown { id, owner } => cmd_chown(&service, &actor, &id, &owner),
        Commands::Share { id, grantee } => cmd_share(&service, &actor, &id, &grantee),
        Commands::Grants { id } => cmd_grants(&service, &actor, &id),
        Commands::Serve { .. } => Ok(()),
    }
}

type Service<'a> = CredentialService<SqliteCredentialStore<'a>, SqliteSharingLedger<'a>>;

// ─── List ────────────────────────────────────────────────────────────────────

fn cmd_list(service: &Service<'_>, actor: &Actor) -> Result<(), CredvaultError> {
    let credentials = service.list_all(actor)?;

    if credentials.is_empty() {
        println!("No credentials visible to {}.", actor);
        println!("Add one with: credvault add <name> --type custom --username <user>");
        return Ok(());
    }

    println!("Credentials ({}):\n", credentials.len());
    for credential in &credentials {
        println!("  {}", credential);
    }

    Ok(())
}

// ─── Add ─────────────────────────────────────────────────────────────────────

fn cmd_add(
    service: &Service<'_>,
    actor: &Actor,
    name: String,
    secret: SecretArgs,
) -> Result<(), CredvaultError> {
    let input = CredentialInput::new(name, read_fields(secret)?);
    let credential = service.create(actor, &input)?;

    println!("✓ Credential stored");
    println!("  ID:    {}", credential.id);
    println!("  Name:  {}", credential.name);
    println!("  Type:  {}", credential.kind());
    println!("  Owner: {}", credential.owner);

    Ok(())
}

// ─── Search ──────────────────────────────────────────────────────────────────

fn cmd_search(service: &Service<'_>, actor: &Actor, request: PageRequest) -> Result<(), CredvaultError> {
    let page = service.page(actor, request)?;

    if page.items.is_empty() {
        println!("No credentials matched ({} total).", page.total);
        return Ok(());
    }

    println!("Showing {} of {} credential(s):\n", page.items.len(), page.total);
    for summary in &page.items {
        println!(
            "  {} │ {:12} │ {:16} │ {:12} │ {}",
            summary.id,
            summary.kind,
            summary.name,
            summary.username,
            summary.owner,
        );
    }

    Ok(())
}

// ─── Update ──────────────────────────────────────────────────────────────────

fn cmd_update(
    service: &Service<'_>,
    actor: &Actor,
    id: &str,
    name: String,
    secret: SecretArgs,
) -> Result<(), CredvaultError> {
    let id = parse_id(id)?;
    let input = CredentialInput::new(name, read_fields(secret)?);
    service.update_by_id(actor, &id, &input)?;

    println!("✓ Credential {} updated", id);
    Ok(())
}

// ─── Delete ──────────────────────────────────────────────────────────────────

fn cmd_delete(service: &Service<'_>, actor: &Actor, ids: &str) -> Result<(), CredvaultError> {
    let deleted = service.delete_by_ids(actor, ids)?;

    if deleted.is_empty() {
        println!("No credential IDs given.");
        return Ok(());
    }

    for id in &deleted {
        println!("✓ Credential {} deleted", id);
    }
    Ok(())
}

// ─── Get ─────────────────────────────────────────────────────────────────────

fn cmd_get(service: &Service<'_>, actor: &Actor, id: &str, reveal: bool) -> Result<(), CredvaultError> {
    let id = parse_id(id)?;
    let credential = service.get_by_id(actor, &id)?;
    print_credential(&credential, reveal);
    Ok(())
}

fn print_credential(credential: &Credential, reveal: bool) {
    let fields = credential.secret.fields();
    let show = |value: &str| -> String {
        if reveal || value == SENTINEL {
            value.to_string()
        } else {
            "[REDACTED]".to_string()
        }
    };

    println!("Credential details:\n");
    println!("  ID:          {}", credential.id);
    println!("  Name:        {}", credential.name);
    println!("  Type:        {}", credential.kind());
    println!("  Owner:       {}", credential.owner);
    println!("  Username:    {}", fields.username);
    println!("  Password:    {}", show(&fields.password));
    println!("  Private key: {}", show(&fields.private_key));
    println!("  Passphrase:  {}", show(&fields.passphrase));
    println!("  Created:     {}", credential.created.format("%Y-%m-%d %H:%M:%S UTC"));
}

// ─── Ownership & Sharing ─────────────────────────────────────────────────────

fn cmd_chown(service: &Service<'_>, actor: &Actor, id: &str, owner: &str) -> Result<(), CredvaultError> {
    let id = parse_id(id)?;
    service.change_owner(actor, &id, owner)?;
    println!("✓ Credential {} now owned by {}", id, owner);
    Ok(())
}

fn cmd_share(service: &Service<'_>, actor: &Actor, id: &str, grantee: &str) -> Result<(), CredvaultError> {
    let id = parse_id(id)?;
    if service.share(actor, &id, grantee)? {
        println!("✓ Credential {} shared with {}", id, grantee);
    } else {
        println!("Credential {} is already shared with {}", id, grantee);
    }
    Ok(())
}

fn cmd_grants(service: &Service<'_>, actor: &Actor, id: &str) -> Result<(), CredvaultError> {
    let id = parse_id(id)?;
    let grants = service.grants(actor, &id)?;

    if grants.is_empty() {
        println!("Credential {} is not shared.", id);
        return Ok(());
    }

    println!("Credential {} is shared with:\n", id);
    for grant in &grants {
        println!(
            "  {:16} │ since {}",
            grant.grantee,
            grant.created.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve(config: Config) -> Result<(), CredvaultError> {
    // Create the schema up front so a bad path fails before binding.
    open_db(&config.db_path)?;

    println!("Starting Credvault UDS gateway at {}...", config.socket_path.display());
    let server = UdsServer::new(config.db_path, config.socket_path, config.default_page_size);
    server
        .run()
        .await
        .map_err(|e| CredvaultError::Other(format!("UDS server error: {}", e)))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The acting account: the flag or env value, else the login user.
fn resolve_actor(explicit: Option<String>, admin: bool) -> Result<Actor, CredvaultError> {
    let id = explicit
        .filter(|id| !id.trim().is_empty())
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("LOGNAME").ok())
        .ok_or_else(|| {
            CredvaultError::Other("No actor given. Pass --actor or set CREDVAULT_ACTOR.".to_string())
        })?;

    Ok(if admin { Actor::admin(id) } else { Actor::user(id) })
}

/// Open (and create if needed) the credential database.
fn open_db(path: &Path) -> Result<Database, CredvaultError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(path)?)
}

fn parse_id(raw: &str) -> Result<Uuid, CredvaultError> {
    Uuid::parse_str(raw.trim()).map_err(|e| CredvaultError::Other(format!("Invalid UUID: {}", e)))
}

/// Turn CLI secret arguments into wire fields, reading the key file if given.
fn read_fields(args: SecretArgs) -> Result<CredentialFields, CredvaultError> {
    let private_key = match &args.private_key_file {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    Ok(CredentialFields {
        kind: args.kind,
        username: args.username,
        password: args.password,
        private_key,
        passphrase: args.passphrase,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn secret_args(kind: &str) -> SecretArgs {
        SecretArgs {
            kind: kind.to_string(),
            username: "deploy".to_string(),
            password: String::new(),
            private_key_file: None,
            passphrase: String::new(),
        }
    }

    #[test]
    fn test_resolve_actor_prefers_explicit() {
        let actor = resolve_actor(Some("alice".into()), true).unwrap();
        assert_eq!(actor, Actor::admin("alice"));

        let actor = resolve_actor(Some("bob".into()), false).unwrap();
        assert_eq!(actor, Actor::user("bob"));
    }

    #[test]
    fn test_read_fields_loads_key_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "-----BEGIN KEY-----").unwrap();

        let mut args = secret_args("private-key");
        args.private_key_file = Some(file.path().to_path_buf());

        let fields = read_fields(args).unwrap();
        assert_eq!(fields.kind, "private-key");
        assert_eq!(fields.private_key, "-----BEGIN KEY-----");
        assert_eq!(fields.username, "deploy");
    }

    #[test]
    fn test_read_fields_missing_key_file_is_io_error() {
        let mut args = secret_args("private-key");
        args.private_key_file = Some("/nonexistent/credvault/key".into());
        assert!(matches!(read_fields(args), Err(CredvaultError::Io(_))));
    }

    #[test]
    fn test_open_db_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vault.db");
        let _db = open_db(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {} ", id)).unwrap(), id);
    }
}
