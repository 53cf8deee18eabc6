use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use registro_client::{
    all_municipalities, bootstrap_storage, load_admin_panel, load_config, run_stats_refresh,
    schools_in,
    send_chat_message, send_emergency, submit_registration, AdminGate, ApiClient, ClientEvent,
    Config, FileStorage, Filters, LogSink, NewUser, Photo, SCHOOLS, SECTIONS,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "registro-client")]
#[command(about = "Command-line client for the civic registration backend")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info", value_parser = clap::value_parser!(Level))]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session token
    Login { email: String, password: String },

    /// Drop the session token
    Logout,

    /// Register a new account
    Register {
        #[command(flatten)]
        form: RegistrationArgs,
    },

    /// Create a user record, optionally with a profile photo
    CreateUser {
        #[command(flatten)]
        form: RegistrationArgs,

        /// Path to a profile photo
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// List users
    Users {
        /// Filter as key=value (repeatable)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// List reports
    Reports {
        /// Filter as key=value (repeatable)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// List chat messages
    Messages,

    /// Send a chat message
    SendMessage { text: String },

    /// Send an emergency report
    Emergency { text: String },

    /// Open the admin panel and show registration stats
    Admin {
        password: String,

        /// Keep refreshing the stats until Ctrl+C
        #[arg(long)]
        watch: bool,
    },

    /// List every municipality, sorted
    Municipalities,

    /// List electoral sections
    Sections,

    /// List schools, optionally for one municipality
    Schools { municipality: Option<String> },

    /// Connect the WebSocket and print events
    Listen,
}

#[derive(clap::Args)]
struct RegistrationArgs {
    #[arg(long)]
    nombre: String,
    #[arg(long)]
    apellido: String,
    #[arg(long)]
    dni: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    celular: String,
    #[arg(long)]
    municipio: String,
    /// Defaults to the section the municipality belongs to
    #[arg(long)]
    seccion_electoral: Option<String>,
    #[arg(long, default_value = "")]
    escuela: String,
    #[arg(long, default_value = "")]
    direccion: String,
}

impl From<RegistrationArgs> for NewUser {
    fn from(args: RegistrationArgs) -> Self {
        let seccion_electoral = args.seccion_electoral.unwrap_or_else(|| {
            registro_client::section_of(&args.municipio)
                .map(|s| s.number.to_string())
                .unwrap_or_default()
        });
        NewUser {
            nombre: args.nombre,
            apellido: args.apellido,
            dni: args.dni,
            email: args.email,
            celular: args.celular,
            municipio: args.municipio,
            seccion_electoral,
            escuela: args.escuela,
            direccion: args.direccion,
        }
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn photo_mime_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, log_level={:?}",
        args.config, args.base_url, args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        debug!("Using default configuration");
        Config::default()
    };
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    let storage = Arc::new(FileStorage::open(&config.storage.path)?);
    bootstrap_storage(storage.as_ref())?;
    let client = Arc::new(ApiClient::new(&config, storage)?);
    let sink = LogSink;

    match args.command {
        Commands::Login { email, password } => {
            client.login(&email, &password).await?;
            info!("Session stored in {}", config.storage.path.display());
        }
        Commands::Logout => {
            client.logout().await?;
            info!("Logged out");
        }
        Commands::Register { form } => {
            let response = client.register(&form.into()).await?;
            info!("Registered: {}", response);
        }
        Commands::CreateUser { form, photo } => {
            let photo = match photo {
                Some(path) => Some(Photo {
                    mime_type: photo_mime_type(&path).to_string(),
                    bytes: std::fs::read(&path)?,
                }),
                None => None,
            };
            let outcome =
                submit_registration(&client, &form.into(), photo.as_ref(), &sink).await?;
            info!(
                "User {} created (photo saved: {})",
                outcome.user.id, outcome.photo_saved
            );
        }
        Commands::Users { filters } => {
            let users = client
                .get_users(&filters.into_iter().collect::<Filters>())
                .await?;
            for user in &users {
                info!(
                    "{} - {} {} (DNI {}) {}",
                    user.id, user.nombre, user.apellido, user.dni, user.municipio
                );
            }
            info!("{} users", users.len());
        }
        Commands::Reports { filters } => {
            let reports = client
                .get_reports(&filters.into_iter().collect::<Filters>())
                .await?;
            for report in &reports {
                let id = report.id.as_ref().map(ToString::to_string);
                info!(
                    "{} - [{}/{}] {}",
                    id.as_deref().unwrap_or("-"),
                    report.kind,
                    report.severity,
                    report.description
                );
            }
            info!("{} reports", reports.len());
        }
        Commands::Messages => {
            for message in client.get_messages().await? {
                info!("[{}] {}", message.kind, message.text);
            }
        }
        Commands::SendMessage { text } => {
            send_chat_message(&client, &text, &sink).await?;
        }
        Commands::Emergency { text } => {
            send_emergency(&client, &text, &sink).await?;
        }
        Commands::Admin { password, watch } => {
            if AdminGate::new(&config.admin).unlock(&password, &sink) {
                let (stats, _) = load_admin_panel(&client).await?;
                info!(
                    "Total: {}  With photo: {}  Today: {}",
                    stats.total, stats.with_photo, stats.today
                );
                if watch {
                    let interval = Duration::from_millis(config.admin.stats_refresh_ms);
                    run_admin_watch(client.clone(), interval).await?;
                }
            }
        }
        Commands::Municipalities => {
            for municipality in all_municipalities() {
                info!("{}", municipality);
            }
        }
        Commands::Sections => {
            for section in &SECTIONS {
                info!(
                    "{} - {} municipios",
                    section.name,
                    section.municipalities.len()
                );
            }
        }
        Commands::Schools { municipality } => {
            let schools = match &municipality {
                Some(m) => schools_in(m),
                None => SCHOOLS.iter().collect(),
            };
            for school in schools {
                info!(
                    "{} - {} ({}, {})",
                    school.id, school.name, school.address, school.municipality
                );
            }
        }
        Commands::Listen => {
            run_listen(&client).await?;
        }
    }

    Ok(())
}

async fn run_admin_watch(
    client: Arc<ApiClient>,
    interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let refresh = tokio::spawn(run_stats_refresh(
        client,
        interval,
        cancel.clone(),
        |stats| {
            info!(
                "Total: {}  With photo: {}  Today: {}",
                stats.total, stats.with_photo, stats.today
            )
        },
    ));

    info!(
        "Refreshing stats every {:?} (press Ctrl+C to stop)...",
        interval
    );
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    cancel.cancel();
    refresh.await?;
    Ok(())
}

async fn run_listen(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let mut receiver = client.subscribe();
    if let Err(e) = client.connect_websocket().await {
        info!("Initial connection failed: {}", e);
    }

    info!("Listening for events (press Ctrl+C to stop)...");
    loop {
        tokio::select! {
            event = receiver.recv() => {
                match event {
                    Ok(ClientEvent::Message(payload)) => info!("Message: {}", payload),
                    Ok(ClientEvent::ReconnectFailed { reason }) => {
                        info!("Connection lost: {}", reason);
                        break;
                    }
                    Ok(event) => info!("Event: {:?}", event),
                    Err(e) => {
                        debug!("Event receiver error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    client.disconnect_websocket().await;
    Ok(())
}
