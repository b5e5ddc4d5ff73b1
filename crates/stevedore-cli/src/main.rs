//! Stevedore - gateway bundle deployer
//!
//! Usage:
//!   stevedore proxy -o org -e test -d ./my-proxy -n my-proxy
//!   stevedore app   -o org -e test -d ./my-app -n my-app -m server.js
//!
//! NOTE: the "default" virtual host listens on HTTP. For an HTTPS-only
//! application, use `-x secure`.

mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stevedore_core::bundle::{RESOURCE_PREFIX, builder, manifest};
use stevedore_core::prelude::{
    Bundle, DeployConfig, DeployPlan, DeploymentOrchestrator, Error, Flavor, HttpGateway,
    RawOptions, render_report,
};

#[derive(Parser)]
#[command(name = "stevedore")]
#[command(about = "Package and deploy proxies and applications to a managed gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy an API proxy directory, preserving its relative layout
    Proxy(Box<DeployArgs>),

    /// Deploy a node application: descriptors plus opaque dependency archives
    App(Box<AppArgs>),
}

#[derive(Args)]
struct DeployArgs {
    /// Path to a JSON config file whose values override the other flags
    /// (with the exception of -p)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gateway organization name
    #[arg(short, long)]
    organization: Option<String>,

    /// Gateway environment name
    #[arg(short, long)]
    environment: Option<String>,

    /// Directory where the proxy or application is stored
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Proxy name
    #[arg(short, long)]
    name: Option<String>,

    /// Gateway user name (prompted when absent)
    #[arg(short, long)]
    username: Option<String>,

    /// Gateway password (prompted when absent; never read from the config file)
    #[arg(short, long)]
    password: Option<String>,

    /// Base path for the deployed proxy
    #[arg(short, long)]
    base_path: Option<String>,

    /// Management API URL
    #[arg(short = 'l', long = "url")]
    management_url: Option<String>,

    /// Also save the bundle archive to this file (optional, for debugging)
    #[arg(short, long)]
    zip_file: Option<PathBuf>,

    /// Virtual host name (default or secure)
    #[arg(short = 'x', long)]
    virtual_host: Option<String>,

    /// Import only, do not activate
    #[arg(short, long)]
    import_only: bool,
}

#[derive(Args)]
struct AppArgs {
    #[command(flatten)]
    common: DeployArgs,

    /// Main script name; should be at the top level of the directory
    #[arg(short, long)]
    main_script: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stevedore=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", style("error:").red().bold(), err);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let (flavor, common, main_script) = match cli.command {
        Commands::Proxy(args) => (Flavor::Proxy, *args, None),
        Commands::App(args) => (Flavor::App, args.common, args.main_script),
    };

    let raw = RawOptions {
        organization: common.organization,
        environment: common.environment,
        directory: common.directory,
        name: common.name,
        main_script,
        username: common.username,
        base_path: common.base_path,
        management_url: common.management_url,
        zip_file: common.zip_file,
        virtual_host: common.virtual_host,
        import_only: common.import_only,
    };
    let config = DeployConfig::resolve(flavor, raw, common.config.as_deref())?;

    let credentials =
        interactive::acquire_credentials(config.username.clone(), common.password)?;

    let bundle = build_bundle(&config)?;
    tracing::info!("Built bundle with {} entries", bundle.len());

    let gateway = HttpGateway::new(config.management_url.clone(), credentials)
        .map_err(|e| Error::Config(format!("failed to set up gateway client: {e:#}")))?;
    let plan = DeployPlan::from_config(&config);
    let report = DeploymentOrchestrator::new(gateway).run(&bundle, &plan).await?;

    match config.flavor {
        Flavor::Proxy => println!("Imported new proxy revision {}", report.revision),
        Flavor::App => println!("Imported new app revision {}", report.revision),
    }
    if report.activated {
        println!(
            "Deployed revision {} to '{}'",
            report.revision, config.environment
        );
    }
    print!("{}", render_report(&report));

    Ok(())
}

/// Build the bundle for the configured flavor.
fn build_bundle(config: &DeployConfig) -> Result<Bundle, Error> {
    match config.flavor {
        Flavor::Proxy => builder::build_flat(&config.directory),
        Flavor::App => {
            // Resolution guarantees a main script for the app flavor.
            let main_script = config
                .main_script
                .as_deref()
                .ok_or_else(|| Error::Usage("-m/--main-script required".to_string()))?;
            let descriptors = manifest::descriptors(
                &config.name,
                &config.base_path,
                config.virtual_host,
                main_script,
            );
            let skip_name = config
                .zip_file
                .as_deref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned());
            builder::build_nested(
                &config.directory,
                descriptors,
                RESOURCE_PREFIX,
                skip_name.as_deref(),
            )
        }
    }
}
