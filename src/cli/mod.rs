// Credvault - CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: list, add, search, update, delete, get, chown, share, grants, serve.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use commands::execute;

/// Credvault - connection credential vault for remote-access tooling.
#[derive(Parser, Debug)]
#[command(name = "credvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the credential database.
    #[arg(long, global = true, env = "CREDVAULT_DB")]
    pub db: Option<PathBuf>,

    /// Account the command runs as. Defaults to the login user.
    #[arg(long, global = true, env = "CREDVAULT_ACTOR")]
    pub actor: Option<String>,

    /// Run as an administrator account (bypasses ownership checks).
    #[arg(long, global = true, env = "CREDVAULT_ADMIN")]
    pub admin: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Secret material shared by `add` and `update`.
#[derive(Args, Debug)]
pub struct SecretArgs {
    /// Credential type: "custom" or "private-key".
    #[arg(long = "type", default_value = "custom")]
    pub kind: String,

    #[arg(long, default_value = "")]
    pub username: String,

    /// Password (custom credentials). Prefer CREDVAULT_PASSWORD to keep it out of shell history.
    #[arg(long, env = "CREDVAULT_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// File holding the private key (private-key credentials).
    #[arg(long)]
    pub private_key_file: Option<PathBuf>,

    /// Passphrase unlocking the private key.
    #[arg(long, env = "CREDVAULT_PASSPHRASE", default_value = "", hide_env_values = true)]
    pub passphrase: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every credential visible to the actor (secrets redacted).
    List,

    /// Add a new credential owned by the actor.
    Add {
        /// Display name for the credential.
        name: String,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Search credentials page by page, filtered by name.
    Search {
        /// Name substring to filter on.
        #[arg(long, default_value = "")]
        name: String,

        /// 1-based page number.
        #[arg(long, default_value = "1")]
        page_index: String,

        /// Rows per page (0 uses the configured default).
        #[arg(long, default_value = "0")]
        page_size: String,

        /// "ascend" or "descend".
        #[arg(long, default_value = "descend")]
        order: String,

        /// "name" or "created".
        #[arg(long, default_value = "created")]
        field: String,
    },

    /// Replace the secret of a credential, optionally renaming it.
    Update {
        /// The UUID of the credential to update.
        id: String,

        /// New display name. Keeps the current name when omitted.
        #[arg(long, default_value = "")]
        name: String,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Delete credentials by ID (comma-separated for several).
    Delete {
        /// One or more UUIDs, separated by commas.
        ids: String,
    },

    /// Show a single credential.
    Get {
        /// The UUID of the credential to retrieve.
        id: String,

        /// Print secret values instead of redacting them.
        #[arg(long)]
        reveal: bool,
    },

    /// Transfer ownership of a credential to another account.
    Chown {
        /// The UUID of the credential.
        id: String,

        /// The account that becomes the owner.
        owner: String,
    },

    /// Let another account see a credential in list and search results.
    Share {
        /// The UUID of the credential.
        id: String,

        /// The account to share with.
        grantee: String,
    },

    /// Show the accounts a credential is shared with.
    Grants {
        /// The UUID of the credential.
        id: String,
    },

    /// Start the JSON-RPC gateway on a Unix Domain Socket.
    Serve {
        /// Socket path. Defaults to CREDVAULT_SOCKET or the runtime directory.
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}
