mod cors;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use api_subs::reconcile::customers::StripeCustomers;
use api_subs::reconcile::driver::Reconciler;
use api_subs::reconcile::resolve::CustomerDirectory;
use common::env_config::Config;
use db::store::{PgProfileStore, ProfileStore};
use identity::firebase::FirebaseIdentity;
use identity::provider::IdentityProvider;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.environment == "production";
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");

    // wire collaborators behind their seams
    let store: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(pool));
    let identity: Arc<dyn IdentityProvider> = Arc::new(FirebaseIdentity::new(&config.firebase));
    let client = common::stripe::create_client(&config.stripe_secret_key);
    let customers: Arc<dyn CustomerDirectory> = Arc::new(StripeCustomers::new(client.clone()));
    let reconciler = Reconciler::new(
        store.clone(),
        identity.clone(),
        customers,
        config.stripe_webhook_secret.clone(),
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(identity.clone()))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(reconciler.clone()))
            .wrap(logger::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(api_subs::mount_webhook())
            .service(
                web::scope("/api")
                    .wrap(api_auth::auth_middleware(identity.clone(), store.clone()))
                    .service(api_auth::mount_user())
                    .service(api_auth::mount_admin())
                    .service(api_subs::mount_pay()),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
