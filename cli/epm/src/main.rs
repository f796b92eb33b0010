//! EPM command line

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::style;
use epm_core::{
    read_json, write_json, DeleteOutcome, EpmConfig, FileKeyValueStore, Notice, Notifier,
    ProfileError, ProfileManager, ProfileStore, SharedState, StateCell, ACCESS_KEY,
    APP_CONFIG_KEY, SELECTION_KEY,
};
use epm_protocol::{
    AccessConfig, AppConfig, ExposeSecret, Field, Profile, Provider, SafetyThreshold,
    SAFETY_SETTINGS_KEY,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "epm")]
#[command(about = "Endpoint Profile Manager - save and switch LLM provider settings")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to $EPM_DATA_DIR, then the local data dir)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved profiles
    List,

    /// Show the active configuration
    Show {
        /// Print keys and secrets in plain text
        #[arg(long)]
        reveal: bool,
    },

    /// Select the active provider, clearing every credential field
    SetProvider {
        /// Provider name, e.g. OpenAI or Azure
        provider: Provider,
    },

    /// Set one field of the active provider
    Set {
        /// Field key, e.g. openaiApiKey or googleSafetySettings
        field: String,

        /// New value; an empty string clears the field
        value: String,
    },

    /// Set the comma separated custom model list
    SetModels {
        /// Model list
        models: String,
    },

    /// Save the active configuration as a profile
    Save {
        /// Profile name
        name: String,

        /// Replace the profile with this id instead of creating one
        #[arg(long, value_name = "ID")]
        edit: Option<String>,
    },

    /// Apply a saved profile to the active configuration
    Apply {
        /// Profile id
        id: String,
    },

    /// Copy a saved profile
    Duplicate {
        /// Profile id
        id: String,
    },

    /// Delete a saved profile
    Delete {
        /// Profile id
        id: String,
    },

    /// Reset the active configuration to defaults
    Clear,

    /// Print the JSON schema of the stored profile list
    Schema,
}

/// Prints notices to stdout.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::NameRequired => println!("{} {}", style("✗").red(), notice),
            _ => println!("{} {}", style("✓").green(), notice),
        }
    }
}

/// Manager plus the backend its companion records live in.
struct Workspace {
    backend: FileKeyValueStore,
    manager: ProfileManager<FileKeyValueStore>,
}

impl Workspace {
    fn open(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let dir = data_dir.unwrap_or_else(EpmConfig::data_dir);
        let config = EpmConfig::load(&dir)?;
        let backend = FileKeyValueStore::new(&dir);
        debug!(dir = %backend.dir().display(), "Opened data directory");

        let access: AccessConfig = read_json(&backend, ACCESS_KEY)
            .context("Failed to read active configuration")?
            .unwrap_or_default();
        let app: AppConfig = read_json(&backend, APP_CONFIG_KEY)
            .context("Failed to read app configuration")?
            .unwrap_or_default();
        // A stale selection only loses the marker.
        let selected: Option<String> = read_json(&backend, SELECTION_KEY)
            .ok()
            .flatten()
            .flatten();

        let store = ProfileStore::with_key(backend.clone(), &config.storage_key);
        let manager = ProfileManager::new(store, SharedState::new(access), SharedState::new(app))
            .with_config(&config)
            .with_applied(selected.as_deref());

        Ok(Self { backend, manager })
    }

    /// Write the active configuration, app configuration and selection back.
    fn commit(&self) -> anyhow::Result<()> {
        write_json(&self.backend, ACCESS_KEY, &self.manager.access().snapshot())?;
        write_json(&self.backend, APP_CONFIG_KEY, &self.manager.app().snapshot())?;
        write_json(&self.backend, SELECTION_KEY, &self.manager.applied())?;
        Ok(())
    }

    fn profile(&self, id: &str) -> anyhow::Result<Profile> {
        self.manager
            .get(id)
            .with_context(|| format!("No profile with id {id}. Use 'epm list' to see saved profiles."))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Schema = cli.command {
        let schema = epm_protocol::profile_list_schema();
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let workspace = Workspace::open(cli.data_dir)?;
    let notifier = ConsoleNotifier;

    match cli.command {
        Commands::List => list_profiles(&workspace),
        Commands::Show { reveal } => show_active(&workspace, reveal),
        Commands::SetProvider { provider } => {
            workspace.manager.access().update(|a| {
                a.reset_credentials();
                a.provider = provider;
            });
            workspace.commit()?;
            println!("Active provider: {}", style(provider).bold());
            Ok(())
        }
        Commands::Set { field, value } => set_field(&workspace, &field, value),
        Commands::SetModels { models } => {
            workspace.manager.app().update(|a| a.custom_models = models);
            workspace.commit()
        }
        Commands::Save { name, edit } => {
            match workspace.manager.save_current(&name, edit.as_deref()) {
                Ok(outcome) => {
                    workspace.commit()?;
                    notifier.notify(&Notice::saved(&outcome));
                    println!("  id: {}", style(&outcome.saved.id).dim());
                    Ok(())
                }
                Err(ProfileError::EmptyName) => {
                    notifier.notify(&Notice::NameRequired);
                    bail!("Profile name must not be blank")
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Apply { id } => {
            let Some(profile) = workspace.manager.apply_by_id(&id) else {
                bail!("No profile with id {id}. Use 'epm list' to see saved profiles.");
            };
            workspace.commit()?;
            notifier.notify(&Notice::Applied(profile.name));
            Ok(())
        }
        Commands::Duplicate { id } => {
            let source = workspace.profile(&id)?;
            let copy = workspace.manager.duplicate(&source)?;
            notifier.notify(&Notice::Duplicated(copy.name.clone()));
            println!("  id: {}", style(&copy.id).dim());
            Ok(())
        }
        Commands::Delete { id } => {
            let outcome = workspace.manager.delete(&id)?;
            report_delete(&workspace, &notifier, &outcome)
        }
        Commands::Clear => {
            workspace.manager.clear_active();
            workspace.commit()?;
            notifier.notify(&Notice::Cleared);
            Ok(())
        }
        Commands::Schema => Ok(()),
    }
}

fn list_profiles(workspace: &Workspace) -> anyhow::Result<()> {
    let profiles = workspace.manager.list();
    if profiles.is_empty() {
        println!("No profiles saved. Use 'epm save <NAME>' to create one.");
        return Ok(());
    }

    let applied = workspace.manager.applied();
    println!("{}", style("Saved profiles:").bold());
    for profile in profiles {
        let marker = if applied.as_deref() == Some(profile.id.as_str()) {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {}  {}", marker, profile.label(), style(&profile.id).dim());
    }
    Ok(())
}

fn show_active(workspace: &Workspace, reveal: bool) -> anyhow::Result<()> {
    let access = workspace.manager.access().snapshot();
    let app = workspace.manager.app().snapshot();

    println!("{} {}", style("Provider:").bold(), access.provider);
    for &field in access.provider.fields() {
        let shown = match access.secret(field) {
            Some(secret) if field.is_secret() && !reveal => format!("{secret:?}"),
            Some(secret) => secret.expose_secret().to_string(),
            None => String::new(),
        };
        println!("  {field}: {shown}");
    }
    if access.provider.has_safety_settings() {
        println!("  {SAFETY_SETTINGS_KEY}: {}", access.google_safety_settings);
    }
    println!("{} {}", style("Custom models:").bold(), app.custom_models);
    Ok(())
}

fn set_field(workspace: &Workspace, key: &str, value: String) -> anyhow::Result<()> {
    let access = workspace.manager.access();
    let provider = access.snapshot().provider;

    if key == SAFETY_SETTINGS_KEY {
        if !provider.has_safety_settings() {
            bail!("{key} only applies to {}", Provider::Google);
        }
        let threshold: SafetyThreshold = value.parse()?;
        access.update(|a| a.google_safety_settings = threshold);
        return workspace.commit();
    }

    let field: Field = key.parse()?;
    if field.provider() != provider {
        bail!(
            "{field} belongs to {}, but the active provider is {provider}. Run 'epm set-provider {}' first.",
            field.provider(),
            field.provider()
        );
    }
    access.update(|a| a.set(field, value));
    workspace.commit()
}

fn report_delete(
    workspace: &Workspace,
    notifier: &impl Notifier,
    outcome: &DeleteOutcome,
) -> anyhow::Result<()> {
    let Some(notice) = Notice::deleted(outcome) else {
        println!("Nothing to delete.");
        return Ok(());
    };
    notifier.notify(&notice);
    if outcome.was_applied {
        workspace.commit()?;
        println!(
            "  {}",
            style("This was the applied profile; the active configuration is unchanged.").yellow()
        );
    }
    Ok(())
}
