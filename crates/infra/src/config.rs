use tracing::warn;

#[derive(Debug, Clone)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// How often the reminder scheduler scans for due reminders, in millis.
    /// Short enough that due-time to delivery latency stays acceptable, long
    /// enough to avoid thrashing the reminders table.
    pub reminder_tick_interval: u64,
    /// A subscription is pruned from the registry when this many consecutive
    /// transient delivery failures have accumulated on it.
    pub subscription_failure_threshold: i64,
    /// Minimum age of a tombstone, in millis, before the purge job may hard
    /// delete it.
    pub tombstone_retention: i64,
    /// OAuth client credentials for the Google Calendar integration. Sync
    /// endpoints answer with a provider error when unset.
    pub google: Option<GoogleOAuthSettings>,
}

impl Config {
    pub fn new() -> Self {
        let default_port = "5000";
        let port = std::env::var("PORT").unwrap_or_else(|_| default_port.into());
        let port = match port.parse::<usize>() {
            Ok(port) => port,
            Err(_) => {
                warn!(
                    "The given PORT: {} is not valid, falling back to the default port: {}.",
                    port, default_port
                );
                default_port.parse::<usize>().unwrap()
            }
        };
        let google = match (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret)) => Some(GoogleOAuthSettings {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        Self {
            port,
            reminder_tick_interval: 1000 * 10,
            subscription_failure_threshold: 3,
            tombstone_retention: 1000 * 60 * 60 * 24 * 30, // 30 days
            google,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
