use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fedwatch::data::duration::{format_duration, parse_duration};
use fedwatch::{report, App, ExportDocument, Settings};
use fedwatch_session::SignUpRequest;
use fedwatch_types::{current_timestamp_ms, HealthStatus, NewHospital};

#[derive(Parser, Debug)]
#[command(name = "fedwatch")]
#[command(about = "Health, dashboard metrics and accounts for a federated hospital-learning backend")]
struct Cli {
    /// Configuration file (default: fedwatch.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base address, overriding the configuration
    #[arg(long, global = true, env = "FEDWATCH_API_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the backend once
    Status,

    /// Follow backend health and refresh the dashboard until Ctrl-C
    Watch {
        /// Probe interval (e.g. "30s", "1m"); defaults to the configured interval
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// Fetch and print the dashboard once
    Dashboard {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write the dashboard and health state to a JSON file
    Export {
        /// Output path
        path: PathBuf,
    },

    /// Registered hospitals
    #[command(subcommand)]
    Hospitals(HospitalCommand),

    /// Account operations against the identity provider
    #[command(subcommand)]
    Auth(AuthCommand),
}

#[derive(Subcommand, Debug)]
enum HospitalCommand {
    /// List registered hospitals
    List,

    /// Register a hospital
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        data_points: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    email: String,

    #[arg(long, env = "FEDWATCH_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Create an account
    Signup {
        #[command(flatten)]
        credentials: Credentials,

        /// The password again
        #[arg(long, env = "FEDWATCH_PASSWORD_CONFIRM", hide_env_values = true)]
        confirm: String,

        /// Display name for the new account
        #[arg(long)]
        name: Option<String>,
    },

    /// Sign in and print the session
    Signin {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Request a password-reset email
    Reset {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings
            .set_api_base_url(base_url)
            .context("Invalid --base-url")?;
    }
    init_tracing(&settings.log_level);

    let app = App::new(settings)?;
    match cli.command {
        Command::Status => run_status(&app).await,
        Command::Watch { interval } => run_watch(&app, interval.as_deref()).await,
        Command::Dashboard { json } => run_dashboard(&app, json).await,
        Command::Export { path } => run_export(&app, &path).await,
        Command::Hospitals(command) => run_hospitals(&app, command).await,
        Command::Auth(command) => run_auth(&app, command).await,
    }
}

/// Log to stderr, filtered by `RUST_LOG` or the configured level
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_status(app: &App) -> Result<()> {
    let state = app.probe_health().await;
    println!("{}", report::health_line(&state, current_timestamp_ms()));
    if state.status != HealthStatus::Connected {
        anyhow::bail!("backend at {} is unreachable", app.settings().api_base_url);
    }
    Ok(())
}

async fn run_watch(app: &App, interval: Option<&str>) -> Result<()> {
    let app = match interval {
        Some(text) => {
            let mut settings = app.settings().clone();
            settings
                .set_health_interval(parse_duration(text)?)
                .context("Invalid --interval")?;
            App::with_api(settings, app.api().clone())
        }
        None => app.clone(),
    };

    let activation = app.activate_dashboard();
    let mut health = activation.health_updates();
    info!(
        base_url = %app.settings().api_base_url,
        interval = %format_duration(app.settings().health_interval()),
        "watching backend; press Ctrl-C to stop"
    );

    let mut last_status = HealthStatus::Unknown;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = health.changed() => {
                if changed.is_err() {
                    warn!("health monitor stopped unexpectedly");
                    break;
                }
                let state = *health.borrow_and_update();
                if state.status == HealthStatus::Checking || state.status == last_status {
                    continue;
                }
                last_status = state.status;
                println!("{}", report::health_line(&state, current_timestamp_ms()));

                if state.status == HealthStatus::Connected {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => break,
                        view = activation.refresh() => println!("{}", report::dashboard(&view)),
                    }
                }
            }
        }
    }

    activation.deactivate().await;
    Ok(())
}

async fn run_dashboard(app: &App, json: bool) -> Result<()> {
    let view = app.load_dashboard().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", report::dashboard(&view));
    }
    Ok(())
}

async fn run_export(app: &App, path: &std::path::Path) -> Result<()> {
    let document = ExportDocument::collect(app).await;
    document.write_to(path)?;
    println!("Exported to {}", path.display());
    Ok(())
}

async fn run_hospitals(app: &App, command: HospitalCommand) -> Result<()> {
    match command {
        HospitalCommand::List => {
            let hospitals = app
                .api()
                .hospitals()
                .await
                .context("Failed to list hospitals")?;
            print!("{}", report::hospitals(&hospitals));
        }
        HospitalCommand::Add {
            name,
            location,
            data_points,
        } => {
            let hospital = NewHospital {
                name,
                location,
                data_points,
            };
            let created = app
                .api()
                .create_hospital(&hospital)
                .await
                .context("Failed to register hospital")?;
            println!("Registered {} ({})", created.name, created.id);
        }
    }
    Ok(())
}

async fn run_auth(app: &App, command: AuthCommand) -> Result<()> {
    let manager = app.session_manager()?;
    let _subscription = manager.subscribe(|state| println!("{}", report::session_line(state)));

    match command {
        AuthCommand::Signup {
            credentials,
            confirm,
            name,
        } => {
            let mut request =
                SignUpRequest::new(credentials.email, credentials.password).with_confirmation(confirm);
            request.display_name = name;
            manager.sign_up(&request).await?;
        }
        AuthCommand::Signin { credentials } => {
            manager
                .authenticate(&credentials.email, &credentials.password)
                .await?;
        }
        AuthCommand::Reset { email } => {
            manager.request_password_reset(&email).await?;
            println!("Password reset email requested for {}", email);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch_interval() {
        let cli = Cli::try_parse_from(["fedwatch", "watch", "--interval", "10s"]).unwrap();
        match cli.command {
            Command::Watch { interval } => assert_eq!(interval.as_deref(), Some("10s")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_hospital_add() {
        let cli = Cli::try_parse_from([
            "fedwatch",
            "--base-url",
            "http://fl.local:5000",
            "hospitals",
            "add",
            "--name",
            "General",
            "--data-points",
            "1200",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://fl.local:5000"));
        match cli.command {
            Command::Hospitals(HospitalCommand::Add {
                name, data_points, ..
            }) => {
                assert_eq!(name, "General");
                assert_eq!(data_points, Some(1200));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
