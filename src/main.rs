use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use admin_guard::models::{MenuDefinition, ResourceList, ResourceType, UserInfo};
use admin_guard::storage::JsonFileStore;
use admin_guard::{EventBus, GuardConfig, PermissionCheck, PermissionEngine, SessionStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "admin console session and permission tool", long_about = None)]
struct Cli {
    /// Session file to operate on (overrides SESSION_FILE)
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every stored session field
    Show,
    /// Store the auth token
    SetToken { token: String },
    /// Store the user profile, given as a JSON object
    SetUser { user: String },
    /// Replace the role list
    SetRole { roles: Vec<String> },
    /// Replace the granted resources with the JSON array in FILE
    SetResources { file: PathBuf },
    /// Remove token, user, role and resources; keep display config
    Clear,
    /// Flip the sidebar collapse preference
    ToggleSidebar,
    /// Check whether the session may use a resource; exits 1 when denied
    Check { kind: CheckKind, name: String },
    /// Print the menu tree visible to the session
    Menu {
        /// Menu definition file (overrides MENU_FILE)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CheckKind {
    Menu,
    Api,
    Action,
}

impl From<CheckKind> for ResourceType {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Menu => ResourceType::Menu,
            CheckKind::Api => ResourceType::Api,
            CheckKind::Action => ResourceType::Action,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    load_env();
    init_tracing();

    let cli = Cli::parse();
    let mut config = GuardConfig::from_env().context("invalid configuration")?;
    if let Some(session) = cli.session {
        config.session_file = session;
    }

    let backend = JsonFileStore::open(&config.session_file)
        .with_context(|| format!("failed to open session file {}", config.session_file.display()))?;

    let bus = Arc::new(EventBus::new());
    bus.subscribe_all(|notification| {
        tracing::info!(topic = %notification.topic, id = %notification.id, "session changed");
    });

    let store = Arc::new(SessionStore::init(Arc::new(backend), config.store_prefix.clone(), bus));
    let status = run(cli.command, &config, &store)?;

    if let Ok(store) = Arc::try_unwrap(store) {
        store.teardown();
    }
    Ok(status)
}

fn run(command: Commands, config: &GuardConfig, store: &Arc<SessionStore>) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Show => {
            let snapshot = json!({
                "config": store.config().get(),
                "token": store.token().get(),
                "user": store.user_info().get(),
                "role": store.role().get(),
                "resource": store.resource().get(),
            });
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::SetToken { token } => store.token().set(token),
        Commands::SetUser { user } => {
            let user: UserInfo = serde_json::from_str(&user).context("user must be a JSON object")?;
            store.user_info().set(user);
        }
        Commands::SetRole { roles } => store.role().set(roles),
        Commands::SetResources { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let resources = ResourceList::from_value(value);
            println!("stored {} resources", resources.len());
            store.resource().set(resources);
        }
        Commands::Clear => store.clear(),
        Commands::ToggleSidebar => {
            let collapsed = store.config().toggle_sidebar_collapse();
            println!("sidebar collapsed: {collapsed}");
        }
        Commands::Check { kind, name } => {
            let engine = PermissionEngine::new(Arc::clone(store), MenuDefinition::default(), config.mode);
            let allowed = engine.can(&kind.into(), &name);
            println!("{}", if allowed { "allowed" } else { "denied" });
            if !allowed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Menu { file } => {
            let path = file.unwrap_or_else(|| config.menu_file.clone());
            let menu = MenuDefinition::from_path(&path)
                .with_context(|| format!("failed to load menu definition {}", path.display()))?;
            let engine = PermissionEngine::new(Arc::clone(store), menu, config.mode);
            println!("{}", serde_json::to_string_pretty(&engine.filtered_menu())?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
