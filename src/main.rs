use clap::{Args, Parser, Subcommand};
use ibmslapd_exporter::config::{ConfigLoader, ConfigOverrides, ExporterConfig};
use ibmslapd_exporter::exporter::Exporter;
use ibmslapd_exporter::server;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ibmslapd_exporter")]
#[command(version)]
#[command(about = "Prometheus exporter for IBM Security Verify Directory metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: ConfigArgs,
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to a configuration file (JSON/YAML/TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// URI referring to the ldap server, only the protocol/host/port fields are allowed
    #[arg(long = "ldap_uri", alias = "ldap-uri", global = true)]
    ldap_uri: Option<String>,

    /// Binding DN to authenticate the LDAP connections
    #[arg(long = "bind_dn", alias = "bind-dn", global = true)]
    bind_dn: Option<String>,

    /// Password of the Binding DN
    #[arg(long = "bind_pw", alias = "bind-pw", env = "IBMSLAPD_BIND_PW", hide_env_values = true, global = true)]
    bind_pw: Option<String>,

    /// Address on which to expose metrics and the landing page
    #[arg(long = "web.listen-address", global = true)]
    listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long = "telemetry.endpoint", global = true)]
    telemetry_path: Option<String>,

    /// Dial and query timeout in milliseconds
    #[arg(long = "ldap.timeout-ms", global = true)]
    timeout_ms: Option<u64>,
}

impl ConfigArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ldap_uri: self.ldap_uri.clone(),
            bind_dn: self.bind_dn.clone(),
            bind_pw: self.bind_pw.clone(),
            listen_address: self.listen_address.clone(),
            telemetry_path: self.telemetry_path.clone(),
            timeout_ms: self.timeout_ms,
        }
    }

    fn resolve(&self) -> ibmslapd_exporter::Result<ExporterConfig> {
        ConfigLoader::resolve(self.config.as_deref(), self.overrides())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve metrics over HTTP (default)
    Serve,
    /// Scrape the server once and print the metrics to stdout
    Scrape,
    /// Validate the configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = cli.options.resolve()?;
            log::info!("Starting ibmslapd_exporter, version {}", env!("CARGO_PKG_VERSION"));
            log::info!("Collect metrics from {}", config.ldap_uri);

            let exporter = Arc::new(Exporter::from_config(&config));
            server::serve(&config, exporter).await?;
        }
        Commands::Scrape => {
            let config = cli.options.resolve()?;
            let exporter = Exporter::from_config(&config);
            print!("{}", server::render(&exporter).await?);
        }
        Commands::Check => match cli.options.resolve() {
            Ok(cfg) => {
                println!("✅ Config is valid:");
                println!("   LDAP URI: {}", cfg.ldap_uri);
                println!("   Bind DN: {}", cfg.bind_dn);
                println!(
                    "   Bind: {}",
                    if cfg.bind_pw.is_empty() { "anonymous" } else { "simple" }
                );
                println!("   Listen: {}{}", cfg.listen_address, cfg.telemetry_path);
                println!("   Timeout: {}ms", cfg.timeout_ms);
            }
            Err(e) => {
                eprintln!("❌ Config error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
