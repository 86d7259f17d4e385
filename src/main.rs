use anyhow::Result;
use caskit::commands;
use caskit::commands::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// caskit - manifest-driven macOS application installer
///
/// Reads declarative TOML manifests (version, download URL template,
/// checksum policy, platform requirement, dependencies, app bundle, zap
/// paths) and installs or removes the described applications.
///
/// Examples:
///   caskit install pi-menu        # Install from manifests/pi-menu.toml
///   caskit uninstall pi-menu --purge
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// State root for receipts and downloads (also via CASKIT_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "CASKIT_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Manifest directory (defaults to <root>/manifests; also via CASKIT_MANIFESTS)
    #[arg(
        long = "manifests",
        env = "CASKIT_MANIFESTS",
        value_name = "PATH",
        global = true
    )]
    pub manifest_dir: Option<PathBuf>,

    /// Applications directory (defaults to ~/Applications; also via CASKIT_APPLICATIONS)
    #[arg(
        long = "applications",
        env = "CASKIT_APPLICATIONS",
        value_name = "PATH",
        global = true
    )]
    pub applications_dir: Option<PathBuf>,

    /// Treat manifests that declare sha256 = "no-check" as an error
    #[arg(long = "require-checksum", global = true)]
    pub require_checksum: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download, verify and install a package
    Install(PackageArgs),

    /// Remove an installed package
    Uninstall(UninstallArgs),

    /// Reinstall a package whose manifest declares a newer version
    Upgrade(PackageArgs),

    /// List installed packages
    List,

    /// Show a manifest and its install state
    Show(PackageArgs),

    /// Validate all manifests in the manifest directory
    Check,
}

#[derive(clap::Args, Debug)]
struct PackageArgs {
    /// The package identifier (manifest file name without .toml)
    #[arg(value_name = "IDENTIFIER")]
    identifier: String,
}

#[derive(clap::Args, Debug)]
struct UninstallArgs {
    /// The package identifier
    #[arg(value_name = "IDENTIFIER")]
    identifier: String,

    /// Also delete the manifest's zap paths (user data, preferences)
    #[arg(long)]
    purge: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y')]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = Config::new(
        caskit::runtime::RealRuntime,
        cli.root,
        cli.manifest_dir,
        cli.applications_dir,
        cli.require_checksum,
    )?;

    match cli.command {
        Commands::Install(args) => commands::install::install(config, &args.identifier).await?,
        Commands::Uninstall(args) => {
            commands::uninstall::uninstall(&config, &args.identifier, args.purge, args.yes)?
        }
        Commands::Upgrade(args) => commands::upgrade::upgrade(config, &args.identifier).await?,
        Commands::List => commands::list::list(&config)?,
        Commands::Show(args) => commands::show::show(&config, &args.identifier)?,
        Commands::Check => commands::check::check(&config)?,
    }
    Ok(())
}
