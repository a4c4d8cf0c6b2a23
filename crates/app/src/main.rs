//! Force NPM - command-line entry point
//!
//! Loads the session, wires the reqwest backend into the view-model and
//! runs one user action, printing the resulting view.

mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use forcenpm_application::{ForceNpmBackend, ForceNpmViewModel, SessionLinks, ViewState};
use forcenpm_domain::{Mode, ProvisionedResource, SliceStatus};
use forcenpm_infrastructure::{ReqwestBackendClient, load_session_config};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "forcenpm", version, about = "Manage npm packages provisioned into an org")]
struct Cli {
    /// Session file (JSON). Defaults to FORCENPM_* variables, then the
    /// platform config file.
    #[arg(long, short, global = true, env = "FORCENPM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show org info and provisioned packages.
    Show,
    /// Search npm packages.
    Search { query: String },
    /// List the versions of a package.
    Versions { name: String },
    /// Provision a package version.
    Create { name: String, version: String },
    /// List the files of a provisioned package.
    Files {
        name: String,
        version: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_session_config(cli.config.as_deref()).await?;
    init_tracing(config.mode);
    tracing::debug!(?config, "session loaded");

    let backend = Arc::new(ReqwestBackendClient::new(&config)?);
    let view_model = ForceNpmViewModel::with_links(backend, SessionLinks::from(&config));

    let succeeded = run(&view_model, cli.command.unwrap_or(Command::Show)).await;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// `RUST_LOG` wins; otherwise the mode picks the level.
fn init_tracing(mode: Mode) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(mode.default_log_filter())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Runs one action and prints the view. Returns false if it failed.
async fn run<B: ForceNpmBackend + 'static>(vm: &ForceNpmViewModel<B>, command: Command) -> bool {
    match command {
        Command::Show => {
            vm.initialize().await;
            let state = vm.snapshot().await;
            print!("{}", render::header(&state));
            println!();
            print!("{}", render::resources(&state));
            report(
                &state,
                &[
                    ("user info", &state.user_info_status),
                    ("resources", &state.resources_status),
                ],
            )
        }
        Command::Search { query } => match vm.search_packages(&query).await {
            Ok(suggestions) => {
                for suggestion in suggestions {
                    match suggestion.display_name() {
                        Some(name) => println!("{name}"),
                        None => println!("{}", suggestion.0),
                    }
                }
                true
            }
            Err(e) => {
                let status = SliceStatus::failed(e.kind(), e.to_string());
                eprint!("{}", render::failure("search", &status).unwrap_or_default());
                false
            }
        },
        Command::Versions { name } => {
            vm.on_package_selected(name).await;
            let state = vm.snapshot().await;
            print!("{}", render::versions(&state));
            report(&state, &[("versions", &state.versions_status)])
        }
        Command::Create { name, version } => {
            let handle = vm.on_create_requested(name, version).await;
            if let Err(e) = handle.wait().await {
                tracing::debug!(error = %e, "create did not complete");
            }
            let state = vm.snapshot().await;
            print!("{}", render::resources(&state));
            report(
                &state,
                &[
                    ("create", &state.create_status),
                    ("resources", &state.resources_status),
                ],
            )
        }
        Command::Files { name, version } => {
            vm.on_resource_selected(ProvisionedResource {
                name: Some(name),
                version,
            })
            .await;
            let state = vm.snapshot().await;
            print!("{}", render::files(&state));
            report(&state, &[("files", &state.files_status)])
        }
    }
}

/// Prints failed slices to stderr. Returns true if none failed.
fn report(state: &ViewState, slices: &[(&str, &SliceStatus)]) -> bool {
    let mut ok = true;
    for (label, status) in slices {
        if let Some(block) = render::failure(label, status) {
            eprint!("{block}");
            ok = false;
        }
    }
    if state.session_expired {
        match &state.links.logout_url {
            Some(logout) => eprintln!("Session expired. Sign in again via {logout}."),
            None => eprintln!("Session expired. Sign in again."),
        }
    }
    ok
}
