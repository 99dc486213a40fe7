//! shiftwatch: shift marketplace poller
//!
//! Main binary with subcommands:
//! - `run`: Poll once (the scheduled-trigger entry point)
//! - `daemon`: Poll on a fixed interval until interrupted
//! - `subscribe`: Register a push subscription
//! - `logout` / `reset-login`: Operator actions on the stored session
//! - `show`: Print the stored session

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shiftwatch_core::{
    DEBUG_SESSION_KEY, FilterConfig, Runner, RunnerConfig, SessionSnapshot, operator,
};
use shiftwatch_maps::{DEFAULT_MAPS_URL, MapsClient};
use shiftwatch_marketplace::{Credentials, DEFAULT_OFFERED_PATH, MarketplaceClient};
use shiftwatch_notify::{
    FanOut, HttpPushTransport, Registration, Subscription, SubscriptionRegistry, VapidKey,
};
use shiftwatch_storage::{FsObjectStore, ObjectStore};

mod daemon;
mod trigger;

use trigger::Trigger;

fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>()
        .map_err(|_| format!("unknown timezone '{}', expected an IANA name", s))
}

#[derive(Parser)]
#[command(name = "shiftwatch")]
#[command(about = "Watches a shift marketplace for workable shifts", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand.
#[derive(Args, Debug)]
struct Settings {
    /// Marketplace API base URL
    #[arg(long, env = "SHIFTWATCH_MARKETPLACE_URL", global = true)]
    marketplace_url: Option<String>,

    /// Path of the offered-jobs listing endpoint
    #[arg(long, env = "SHIFTWATCH_OFFERED_PATH", default_value = DEFAULT_OFFERED_PATH, global = true)]
    offered_path: String,

    /// Marketplace account email
    #[arg(long, env = "SHIFTWATCH_EMAIL", global = true)]
    email: Option<String>,

    /// Marketplace account password
    #[arg(long, env = "SHIFTWATCH_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Maps web service API key
    #[arg(long, env = "SHIFTWATCH_MAPS_KEY", hide_env_values = true, global = true)]
    maps_key: Option<String>,

    /// Maps web service base URL
    #[arg(long, env = "SHIFTWATCH_MAPS_URL", default_value = DEFAULT_MAPS_URL, global = true)]
    maps_url: String,

    /// Place identifier of home
    #[arg(long, env = "SHIFTWATCH_HOME_PLACE_ID", global = true)]
    home_place_id: Option<String>,

    /// Directory holding the session and subscription files
    #[arg(long, env = "SHIFTWATCH_STORAGE_DIR", global = true)]
    storage_dir: Option<PathBuf>,

    /// Session file name
    #[arg(long, env = "SHIFTWATCH_SESSION_FILE", default_value = shiftwatch_core::DEFAULT_SESSION_KEY, global = true)]
    session_file: String,

    /// Subscriptions file name
    #[arg(long, env = "SHIFTWATCH_SUBSCRIPTIONS_FILE", default_value = shiftwatch_notify::DEFAULT_SUBSCRIPTIONS_KEY, global = true)]
    subscriptions_file: String,

    /// Longest acceptable journey to a venue, in hours
    #[arg(long, env = "SHIFTWATCH_MAX_OUTBOUND_HOURS", default_value = "2", global = true)]
    max_outbound_hours: f64,

    /// Longest acceptable journey home, in hours
    #[arg(long, env = "SHIFTWATCH_MAX_RETURN_HOURS", default_value = "2", global = true)]
    max_return_hours: f64,

    /// Ignore shifts starting more than this many days ahead
    #[arg(long, env = "SHIFTWATCH_MAX_DAYS", default_value = "12", global = true)]
    max_days: i64,

    /// Venue names to ignore (comma-separated)
    #[arg(long, env = "SHIFTWATCH_BLACKLIST", value_delimiter = ',', global = true)]
    blacklist: Vec<String>,

    /// Timezone of log stamps and notification times
    #[arg(long, env = "SHIFTWATCH_TIMEZONE", default_value = "Europe/London", value_parser = parse_timezone, global = true)]
    timezone: Tz,

    /// Seconds a push service should keep an undelivered notification
    #[arg(long, env = "SHIFTWATCH_PUSH_TTL", default_value = "86400", global = true)]
    push_ttl: u32,

    /// PEM file holding the VAPID private key that signs push messages
    #[arg(long, env = "SHIFTWATCH_VAPID_KEY_FILE", global = true)]
    vapid_key_file: Option<PathBuf>,

    /// Contact given to push services, usually a mailto: URL
    #[arg(long, env = "SHIFTWATCH_VAPID_SUBJECT", global = true)]
    vapid_subject: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll once
    Run {
        /// Return failures instead of notifying subscribers
        #[arg(long)]
        debug: bool,

        /// Use the debug session file
        #[arg(long)]
        debug_file: bool,

        /// Skip the randomized skip and delay
        #[arg(long)]
        no_fuzz: bool,

        /// Trigger message, plain or base64, with DEBUG/DEBUGFILE/NOFUZZ tokens
        #[arg(long, env = "SHIFTWATCH_TRIGGER")]
        trigger: Option<String>,
    },

    /// Poll on a fixed interval until Ctrl-C
    Daemon {
        /// Seconds between runs
        #[arg(long, default_value = "300")]
        interval: u64,

        /// Skip the randomized skip and delay
        #[arg(long)]
        no_fuzz: bool,
    },

    /// Register a push subscription from a JSON file
    Subscribe {
        /// Subscription JSON with `endpoint` and `keys`
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Revoke the access token and store the logged-out session
    Logout {
        /// Use the debug session file
        #[arg(long)]
        debug_file: bool,
    },

    /// Allow login again after the marketplace rejected it
    ResetLogin {
        /// Use the debug session file
        #[arg(long)]
        debug_file: bool,
    },

    /// Print the stored session
    Show {
        /// Use the debug session file
        #[arg(long)]
        debug_file: bool,
    },
}

impl Settings {
    fn session_key(&self, debug_file: bool) -> String {
        if debug_file {
            DEBUG_SESSION_KEY.to_string()
        } else {
            self.session_file.clone()
        }
    }

    fn store(&self) -> Arc<FsObjectStore> {
        let root = self
            .storage_dir
            .clone()
            .unwrap_or_else(FsObjectStore::default_root);
        Arc::new(FsObjectStore::new(root))
    }

    fn registry(&self, store: Arc<dyn ObjectStore>) -> SubscriptionRegistry {
        SubscriptionRegistry::new(store, self.subscriptions_file.clone())
    }

    fn filter(&self) -> FilterConfig {
        FilterConfig {
            max_outbound_hours: self.max_outbound_hours,
            max_return_hours: self.max_return_hours,
            max_days_from_now: self.max_days,
            blacklisted_venues: self
                .blacklist
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
            timezone: self.timezone,
        }
    }

    fn marketplace(&self) -> Result<MarketplaceClient> {
        let marketplace_url = required(&self.marketplace_url, "--marketplace-url")?;
        Ok(MarketplaceClient::new(marketplace_url)
            .map_err(|e| miette::miette!("failed to create marketplace client: {}", e))?
            .with_offered_path(self.offered_path.clone()))
    }

    async fn vapid_key(&self) -> Result<VapidKey> {
        let Some(path) = &self.vapid_key_file else {
            return Err(miette::miette!("missing required setting --vapid-key-file"));
        };
        let pem = tokio::fs::read(path)
            .await
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        Ok(VapidKey::new(
            pem,
            required(&self.vapid_subject, "--vapid-subject")?,
        ))
    }

    async fn runner(&self) -> Result<Runner> {
        let config = RunnerConfig {
            credentials: Credentials {
                email: required(&self.email, "--email")?,
                password: required(&self.password, "--password")?,
            },
            filter: self.filter(),
            home_place_id: required(&self.home_place_id, "--home-place-id")?,
        };

        let marketplace = self.marketplace()?;
        let maps = MapsClient::with_base_url(
            self.maps_url.clone(),
            required(&self.maps_key, "--maps-key")?,
        )
        .map_err(|e| miette::miette!("failed to create maps client: {}", e))?;
        let transport = HttpPushTransport::new(self.vapid_key().await?)
            .map_err(|e| miette::miette!("failed to create push transport: {}", e))?
            .with_ttl(self.push_ttl);

        let store = self.store();
        let notifier = FanOut::new(self.registry(store.clone()), Arc::new(transport));

        Ok(Runner::new(
            config,
            Arc::new(marketplace),
            Arc::new(maps),
            store,
            Arc::new(notifier),
        ))
    }
}

fn required(value: &Option<String>, flag: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| miette::miette!("missing required setting {}", flag))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "shiftwatch=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    match cli.command {
        Commands::Run {
            debug,
            debug_file,
            no_fuzz,
            trigger,
        } => {
            let trigger = trigger
                .as_deref()
                .map(Trigger::parse)
                .unwrap_or_default()
                .merge(debug, debug_file, no_fuzz);
            let runner = settings.runner().await?;
            daemon::run_once(&runner, &settings, trigger).await
        }

        Commands::Daemon { interval, no_fuzz } => {
            let runner = settings.runner().await?;
            daemon::run(&runner, &settings, interval, no_fuzz).await
        }

        Commands::Subscribe { file } => subscribe(&settings, &file).await,

        Commands::Logout { debug_file } => {
            let marketplace = settings.marketplace()?;
            let store = settings.store();
            operator::logout(&*store, &marketplace, &settings.session_key(debug_file))
                .await
                .map_err(|e| miette::miette!("logout failed: {}", e.report()))?;
            println!("Logged out.");
            Ok(())
        }

        Commands::ResetLogin { debug_file } => {
            let cleared = reset_login(&settings, &settings.session_key(debug_file)).await?;
            if cleared {
                println!("Login failure cleared; the next run will log in again.");
            } else {
                println!("Session was not in the login-failed state.");
            }
            Ok(())
        }

        Commands::Show { debug_file } => show(&settings, &settings.session_key(debug_file)).await,
    }
}

async fn reset_login(settings: &Settings, key: &str) -> Result<bool> {
    let store = settings.store();
    operator::reset_login(&*store, key)
        .await
        .map_err(|e| miette::miette!("reset failed: {}", e.report()))
}

async fn subscribe(settings: &Settings, file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .into_diagnostic()?;
    let value: serde_json::Value = serde_json::from_str(&text).into_diagnostic()?;
    let subscription = Subscription::from_json(value).map_err(|e| miette::miette!("{}", e))?;

    let registry = settings.registry(settings.store());
    match registry
        .register(subscription)
        .await
        .map_err(|e| miette::miette!("failed to register subscription: {}", e))?
    {
        Registration::Created => println!("Subscription created."),
        Registration::AlreadyExists => println!("Subscription already exists."),
    }
    Ok(())
}

async fn show(settings: &Settings, key: &str) -> Result<()> {
    let store = settings.store();
    let Some(bytes) = store
        .get(key)
        .await
        .map_err(|e| miette::miette!("failed to read {}: {}", key, e))?
    else {
        println!("No session stored at {}", store.root().join(key).display());
        return Ok(());
    };

    let snapshot: SessionSnapshot = serde_json::from_slice(&bytes).into_diagnostic()?;
    let state = if snapshot.login_failed {
        "login failed"
    } else if snapshot.logged_in {
        "logged in"
    } else {
        "logged out"
    };

    println!("Session:        {}", key);
    println!("Auth state:     {}", state);
    println!("Parsed shifts:  {}", snapshot.parsed_shift_ids.len());
    println!("Cached places:  {}", snapshot.place_cache.len());
    println!("Log records:    {}", snapshot.log.len());
    println!("Workable shifts:");
    if snapshot.workable_shifts.is_empty() {
        println!("  (none)");
    }
    for (id, shift) in &snapshot.workable_shifts {
        println!(
            "  {} {} {} {}-{} ({:.1}h, {:.2} pay, {:.1}h commute)",
            id,
            shift.role,
            shift.date,
            shift.start_time,
            shift.end_time,
            shift.duration,
            shift.total_pay,
            shift.total_commute_time
        );
    }
    Ok(())
}
