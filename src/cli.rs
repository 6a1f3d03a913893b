//! # KVCONSOLE CLI
//!
//! Terminal console for browsing and editing secrets in Azure Key Vault.
//!
//! The vault registry is a local bookmark list; secrets stay in Key Vault.
//! Creating or updating a secret and removing a vault ask for confirmation
//! unless `--yes` is given.
//!
//! ## Usage
//!
//! ```bash
//! # Register a vault (by name or full URL)
//! kvconsole vault add --name "Production" --endpoint prod-kv
//!
//! # List secrets in the first registered vault, filtered by name
//! kvconsole secrets --search database
//!
//! # Create or update a secret in a specific vault
//! kvconsole --credential azure-cli add api-key --value s3cr3t --vault production
//! kvconsole edit api-key --value n3w --yes
//!
//! # Interactive session
//! kvconsole shell
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use keyvault_console::config::{ConsoleConfig, CredentialKind, CredentialSource};
use keyvault_console::console::{ConfirmOutcome, EditDialog, SecretView};
use keyvault_console::provider::{AzureKeyVault, InMemorySecretStore};
use keyvault_console::registry::RegistryFile;
use keyvault_console::{observability, Console, SecretStore, SecretSummary};

/// Azure Key Vault secrets console
#[derive(Parser)]
#[command(name = "kvconsole")]
#[command(about = "Browse and edit Azure Key Vault secrets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the vault registry (overrides KVCONSOLE_CONFIG_DIR)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Azure credential: managed-identity, workload-identity, azure-cli or static
    #[arg(long, global = true)]
    credential: Option<CredentialKind>,

    /// Use an in-memory secret store instead of Azure (nothing leaves the process)
    #[arg(long, global = true)]
    offline: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local vault registry
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },
    /// List secrets in a vault
    Secrets {
        /// Vault id (defaults to the first registered vault)
        #[arg(long)]
        vault: Option<String>,

        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Print a secret's current value
    Show {
        name: String,

        #[arg(long)]
        vault: Option<String>,
    },
    /// Create a new secret
    Add {
        name: String,

        /// Secret value (prompted for when omitted)
        #[arg(long)]
        value: Option<String>,

        #[arg(long)]
        vault: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Store a new version of an existing secret
    Edit {
        name: String,

        /// New value (prompted for when omitted)
        #[arg(long)]
        value: Option<String>,

        #[arg(long)]
        vault: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or toggle the dark mode preference
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// Interactive session
    Shell,
}

#[derive(Subcommand)]
enum VaultCommands {
    /// List registered vaults
    List,
    /// Register a vault
    Add {
        /// Display name; the id is derived from it
        #[arg(short, long)]
        name: String,

        /// Vault name (e.g. `prod-kv`) or full vault URL
        #[arg(short, long)]
        endpoint: String,
    },
    /// Unregister a vault (the vault itself is untouched)
    Remove {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Err only means a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let storage = RegistryFile::new(config.config_dir.clone());
    let store = build_store(&cli, &config, &storage).await?;
    let mut console = Console::open(store, storage)
        .with_context(|| format!("Failed to open registry in {}", config.config_dir.display()))?;

    match cli.command {
        Commands::Vault { command } => vault_command(&mut console, command).await,
        Commands::Secrets { vault, search } => {
            select(&mut console, vault.as_deref()).await?;
            if let Some(search) = search {
                console.set_search(search);
            }
            print_secrets(&console);
            Ok(())
        }
        Commands::Show { name, vault } => {
            select(&mut console, vault.as_deref()).await?;
            show_command(&console, &name).await
        }
        Commands::Add {
            name,
            value,
            vault,
            yes,
        } => {
            select(&mut console, vault.as_deref()).await?;
            let value = value_or_prompt(value, "Secret Value")?;
            add_command(&mut console, name, value, yes).await
        }
        Commands::Edit {
            name,
            value,
            vault,
            yes,
        } => {
            select(&mut console, vault.as_deref()).await?;
            edit_command(&mut console, &name, value, yes).await
        }
        Commands::Theme { toggle } => {
            if toggle {
                console.toggle_dark_mode()?;
            }
            print_theme(&console);
            Ok(())
        }
        Commands::Shell => shell(&mut console).await,
    }
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = ConsoleConfig::from_env().context("Invalid console configuration")?;
    if let Some(dir) = &cli.config_dir {
        config.config_dir.clone_from(dir);
    }
    if let Some(kind) = cli.credential {
        config.credential = CredentialSource::from_parts(
            kind,
            std::env::var("AZURE_CLIENT_ID").ok(),
            std::env::var("KVCONSOLE_STATIC_TOKEN").ok(),
        )?;
    }
    debug!("Using configuration {:?}", config);
    Ok(config)
}

async fn build_store(
    cli: &Cli,
    config: &ConsoleConfig,
    storage: &RegistryFile,
) -> Result<Arc<dyn SecretStore>> {
    if !cli.offline {
        let client = AzureKeyVault::from_config(config)
            .context("Failed to create Azure Key Vault client")?;
        return Ok(Arc::new(client));
    }

    // Every registered vault is reachable (and empty) in offline mode
    let store = InMemorySecretStore::new();
    for vault in storage.load_registry()?.list() {
        store.create_vault(vault.endpoint()).await;
    }
    Ok(Arc::new(store))
}

/// Select `vault` (or keep the default) and fetch its secret list
async fn select(console: &mut Console, vault: Option<&str>) -> Result<()> {
    match vault {
        Some(id) if console.selected_vault().map(|v| v.id.as_str()) != Some(id) => {
            console.select_vault(id).await?;
        }
        _ => console.start().await?,
    }
    if console.selected_vault().is_none() {
        bail!("No Key Vault registered. Add one with `kvconsole vault add --name <NAME> --endpoint <VAULT>`");
    }
    Ok(())
}

async fn vault_command(console: &mut Console, command: VaultCommands) -> Result<()> {
    match command {
        VaultCommands::List => {
            print_vaults(console);
            Ok(())
        }
        VaultCommands::Add { name, endpoint } => {
            let vault = console.add_vault(&name, &endpoint).await?;
            println!("✅ Registered Key Vault '{}' (id: {})", vault.name, vault.id);
            Ok(())
        }
        VaultCommands::Remove { id, yes } => {
            let prompt = console.request_remove_vault(&id)?.prompt();
            confirm_or_decline(console, &prompt, yes).await
        }
    }
}

async fn show_command(console: &Console, name: &str) -> Result<()> {
    let detail = console
        .store()
        .get_secret(endpoint(console)?, name)
        .await
        .with_context(|| format!("Failed to read secret '{name}'"))?;

    println!("Name:    {}", detail.name());
    println!("Status:  {}", status_label(&detail.summary));
    println!("Created: {}", timestamp_label(detail.summary.created));
    println!("Updated: {}", timestamp_label(detail.summary.updated));
    println!("Value:   {}", detail.value.expose());
    Ok(())
}

async fn add_command(console: &mut Console, name: String, value: String, yes: bool) -> Result<()> {
    console.set_add_form(name, value);
    let prompt = console.submit_add_secret()?.prompt();
    confirm_or_decline(console, &prompt, yes).await
}

async fn edit_command(
    console: &mut Console,
    name: &str,
    value: Option<String>,
    yes: bool,
) -> Result<()> {
    console.open_edit(name).await?;
    let value = value_or_prompt(value, "New Value")?;
    console.set_edit_value(value)?;
    let prompt = console.submit_edit()?.prompt();
    confirm_or_decline(console, &prompt, yes).await
}

/// Run the pending action after a y/N prompt (or straight away with `--yes`)
async fn confirm_or_decline(console: &mut Console, prompt: &str, assume_yes: bool) -> Result<()> {
    if assume_yes || ask(prompt)? {
        let outcome = console.confirm().await?;
        print_outcome(&outcome);
    } else {
        console.decline();
        println!("Cancelled.");
    }
    Ok(())
}

fn ask(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {label}"))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn endpoint(console: &Console) -> Result<&str> {
    console
        .selected_vault()
        .map(|v| v.endpoint())
        .context("No Key Vault selected")
}

// ----------------------------------------------------------------------
// Interactive shell
// ----------------------------------------------------------------------

const SHELL_HELP: &str = "\
Commands:
  vaults                     list registered vaults
  use <id>                   switch vault
  add-vault <name> <vault>   register a vault (name may not contain spaces here)
  remove-vault <id>          unregister a vault
  list                       show secrets
  search [text]              filter by name (empty clears)
  refresh                    re-fetch the secret list
  show <name>                print a secret value
  new <name> <value>         create a secret
  edit <name>                open a secret for editing
  set <value>                replace the value being edited
  save                       store the edited value
  close                      close the editor
  yes | no                   answer a confirmation
  theme                      toggle dark mode
  help | quit";

async fn shell(console: &mut Console) -> Result<()> {
    if let Err(e) = console.start().await {
        println!("Error: {e}");
    }
    print_theme(console);
    print_vaults(console);
    print_secrets(console);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", console.selected_vault().map_or("-", |v| v.id.as_str()));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        if let Err(e) = shell_command(console, line).await {
            println!("Error: {e}");
        }
    }
    Ok(())
}

async fn shell_command(console: &mut Console, line: &str) -> Result<()> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "help" => println!("{SHELL_HELP}"),
        "vaults" => print_vaults(console),
        "use" => {
            console.select_vault(rest).await?;
            print_secrets(console);
        }
        "add-vault" => {
            let (name, endpoint) = rest
                .split_once(' ')
                .context("usage: add-vault <name> <vault>")?;
            let vault = console.add_vault(name, endpoint.trim()).await?;
            println!("Registered Key Vault '{}' (id: {})", vault.name, vault.id);
        }
        "remove-vault" => println!("{}", console.request_remove_vault(rest)?.prompt()),
        "list" => print_secrets(console),
        "search" => {
            console.set_search(rest);
            print_secrets(console);
        }
        "refresh" => {
            console.refresh().await?;
            print_secrets(console);
        }
        "show" => show_command(console, rest).await?,
        "new" => {
            let (name, value) = rest
                .split_once(' ')
                .context("usage: new <name> <value>")?;
            console.set_add_form(name, value);
            println!("{}", console.submit_add_secret()?.prompt());
        }
        "edit" => {
            if let EditDialog::Open { name, draft, .. } = console.open_edit(rest).await? {
                println!("Editing '{name}', current value: {}", draft.expose());
                println!("Use 'set <value>' then 'save', or 'close'.");
            }
        }
        "set" => console.set_edit_value(rest)?,
        "save" => println!("{}", console.submit_edit()?.prompt()),
        "close" => {
            console.close_edit().await?;
            print_secrets(console);
        }
        "yes" | "y" => {
            let outcome = console.confirm().await?;
            print_outcome(&outcome);
            print_secrets(console);
        }
        "no" | "n" => {
            if console.decline().is_some() {
                println!("Cancelled.");
            }
        }
        "theme" => {
            console.toggle_dark_mode()?;
            print_theme(console);
        }
        other => println!("Unknown command '{other}'. Type 'help' for commands."),
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Output
// ----------------------------------------------------------------------

fn print_vaults(console: &Console) {
    if console.vaults().is_empty() {
        println!("No Key Vaults registered.");
        return;
    }

    let selected = console.selected_vault().map(|v| v.id.as_str());
    println!("\n{:<3} {:<25} {:<30} {:<40}", "", "ID", "NAME", "VAULT");
    println!("{}", "-".repeat(100));
    for vault in console.vaults() {
        let marker = if Some(vault.id.as_str()) == selected { "*" } else { "" };
        println!(
            "{:<3} {:<25} {:<30} {:<40}",
            marker,
            vault.id,
            vault.name,
            vault.endpoint()
        );
    }
}

fn print_secrets(console: &Console) {
    if let Some(error) = console.last_error() {
        println!("Error: {error}");
    }

    match console.view() {
        SecretView::NoVault => println!(
            "No Key Vault registered. Add one with `kvconsole vault add --name <NAME> --endpoint <VAULT>`"
        ),
        SecretView::Loading => println!("Loading secrets..."),
        SecretView::Empty => println!("No secrets available"),
        SecretView::NoMatches => println!("No secrets found matching your search"),
        SecretView::Matches(secrets) => {
            println!(
                "\n{:<40} {:<10} {:<25} {:<25}",
                "NAME", "STATUS", "CREATED", "UPDATED"
            );
            println!("{}", "-".repeat(100));
            for secret in secrets {
                println!(
                    "{:<40} {:<10} {:<25} {:<25}",
                    secret.name,
                    status_label(secret),
                    timestamp_label(secret.created),
                    timestamp_label(secret.updated)
                );
            }
        }
    }
}

fn print_outcome(outcome: &ConfirmOutcome) {
    match outcome {
        ConfirmOutcome::SecretCreated(secret) => {
            println!("✅ Secret '{}' created", secret.name);
        }
        ConfirmOutcome::SecretUpdated(secret) => {
            println!("✅ Secret '{}' updated", secret.name);
        }
        ConfirmOutcome::VaultRemoved(vault) => {
            println!("✅ Key Vault '{}' removed from the registry", vault.name);
        }
    }
}

fn print_theme(console: &Console) {
    let mode = if console.preferences().dark_mode { "dark" } else { "light" };
    println!("Theme: {mode}");
}

fn status_label(secret: &SecretSummary) -> &'static str {
    if secret.enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn timestamp_label(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_label() {
        let created = DateTime::from_timestamp(1_700_000_000, 0);
        assert_eq!(timestamp_label(created), "2023-11-14 22:13:20 UTC");
        assert_eq!(timestamp_label(None), "-");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kvconsole",
            "add",
            "api-key",
            "--value",
            "v",
            "--offline",
            "--credential",
            "azure-cli",
            "--yes",
        ])
        .unwrap();
        assert!(cli.offline);
        assert_eq!(cli.credential, Some(CredentialKind::AzureCli));
        assert!(matches!(cli.command, Commands::Add { yes: true, .. }));
    }

    #[test]
    fn test_cli_rejects_unknown_credential() {
        assert!(Cli::try_parse_from(["kvconsole", "--credential", "kerberos", "shell"]).is_err());
    }

    #[tokio::test]
    async fn test_shell_commands_drive_console() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemorySecretStore::new();
        store.create_vault("prod-kv").await;
        store.seed("prod-kv", "db", "old", true).await;
        let mut console = Console::open(Arc::new(store.clone()), RegistryFile::new(dir.path())).unwrap();

        shell_command(&mut console, "add-vault Prod prod-kv").await.unwrap();
        shell_command(&mut console, "edit db").await.unwrap();
        shell_command(&mut console, "set new").await.unwrap();
        shell_command(&mut console, "save").await.unwrap();
        assert!(console.pending().is_some());
        shell_command(&mut console, "yes").await.unwrap();

        assert_eq!(store.version_count("prod-kv", "db").await, 2);
        assert!(dir.path().join("key_vaults.json").exists());
    }
}
