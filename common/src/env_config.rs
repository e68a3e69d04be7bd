use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything required to initialize and run the backend:
/// database connection details, server host and port, CORS settings,
/// logging preferences, the Firebase service-account credentials used
/// to verify ID tokens and mirror role claims, and the Stripe keys
/// used for checkout sessions and webhook verification.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Base URL of the web application, used for checkout redirect URLs.
    pub app_url: String,
    /// Firebase service-account credentials.
    pub firebase: FirebaseConfig,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Stripe price id of the premium subscription plan.
    pub stripe_premium_price_id: String,
}

#[derive(Clone, Debug)]
/// Credentials of the Firebase service account used for the Admin REST
/// surface (custom claims, account lookup) and for ID-token audience
/// validation.
pub struct FirebaseConfig {
    /// The Firebase project id; also the expected ID-token audience.
    pub project_id: String,
    /// The service-account client email (JWT issuer for token exchange).
    pub client_email: String,
    /// The service-account RSA private key in PEM form.
    pub private_key: String,
}

impl FirebaseConfig {
    /// Creates a new `FirebaseConfig` from environment variables.
    ///
    /// Reads:
    /// - `FIREBASE_PROJECT_ID`: Required.
    /// - `FIREBASE_CLIENT_EMAIL`: Required.
    /// - `FIREBASE_PRIVATE_KEY`: Required. Escaped `\n` sequences are
    ///   unfolded so the key can be passed through a single-line env var.
    ///
    /// # Panics
    ///
    /// Panics if any of the three variables is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        FirebaseConfig {
            project_id: env::var("FIREBASE_PROJECT_ID").expect("FIREBASE_PROJECT_ID must be set"),
            client_email: env::var("FIREBASE_CLIENT_EMAIL")
                .expect("FIREBASE_CLIENT_EMAIL must be set"),
            private_key: env::var("FIREBASE_PRIVATE_KEY")
                .expect("FIREBASE_PRIVATE_KEY must be set")
                .replace("\\n", "\n"),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: "development" or "production"
    /// - `DATABASE_URL`: Connection string for the database
    /// - `FIREBASE_PROJECT_ID` / `FIREBASE_CLIENT_EMAIL` / `FIREBASE_PRIVATE_KEY`
    /// - `STRIPE_PREMIUM_PRICE_ID`: Price id used for checkout sessions
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:5173")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `APP_URL`: Web application base URL (default: "http://localhost:5173")
    /// - `STRIPE_SECRET_KEY` / `STRIPE_WEBHOOK_SECRET`: Default to empty, in
    ///   which case checkout and webhook handling will reject requests
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing
    /// or if numeric values cannot be parsed correctly.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        let stripe_webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            firebase: FirebaseConfig::from_env(),
            stripe_secret_key,
            stripe_webhook_secret,
            stripe_premium_price_id: env::var("STRIPE_PREMIUM_PRICE_ID")
                .expect("STRIPE_PREMIUM_PRICE_ID must be set"),
        })
    }
}
