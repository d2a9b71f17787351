use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use safar::config::AppConfig;
use safar::db;
use safar::handlers;
use safar::services::mailer::log::LogMailer;
use safar::services::mailer::relay::RelayMailer;
use safar::services::mailer::Mailer;
use safar::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let mailer: Box<dyn Mailer> = if config.mail_relay_url.is_empty() {
        tracing::info!("no mail relay configured, emails will be logged only");
        Box::new(LogMailer)
    } else {
        tracing::info!("using mail relay at {}", config.mail_relay_url);
        Box::new(RelayMailer::new(
            config.mail_relay_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        ))
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        mailer,
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        // storefront
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/services/:id", get(handlers::catalog::get_service))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/:reference",
            get(handlers::bookings::get_booking),
        )
        .route("/api/promo/validate", post(handlers::bookings::validate_promo))
        // payments
        .route(
            "/api/payments/gateways",
            get(handlers::payments::list_gateways),
        )
        .route(
            "/api/payments/create",
            post(handlers::payments::create_payment),
        )
        .route(
            "/api/payments/confirm",
            post(handlers::payments::confirm_payment),
        )
        .route("/api/payments/fail", post(handlers::payments::fail_payment))
        // admin: bookings
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route(
            "/api/admin/bookings/:id/complete",
            post(handlers::admin::complete_booking),
        )
        .route(
            "/api/admin/bookings/:id/email",
            post(handlers::admin::send_booking_email),
        )
        // admin: promo codes
        .route(
            "/api/admin/promos",
            get(handlers::admin::list_promos).post(handlers::admin::create_promo),
        )
        .route(
            "/api/admin/promos/:id",
            put(handlers::admin::update_promo).delete(handlers::admin::delete_promo),
        )
        // admin: service catalog
        .route(
            "/api/admin/services",
            get(handlers::admin::list_services).post(handlers::admin::create_service),
        )
        .route(
            "/api/admin/services/:id",
            put(handlers::admin::update_service).delete(handlers::admin::delete_service),
        )
        // admin: site settings
        .route(
            "/api/admin/content",
            get(handlers::settings::list_site_content).post(handlers::settings::create_site_content),
        )
        .route(
            "/api/admin/content/:id",
            put(handlers::settings::update_site_content)
                .delete(handlers::settings::delete_site_content),
        )
        .route(
            "/api/admin/menu",
            get(handlers::settings::list_menu_items).post(handlers::settings::create_menu_item),
        )
        .route(
            "/api/admin/menu/:id",
            put(handlers::settings::update_menu_item).delete(handlers::settings::delete_menu_item),
        )
        .route(
            "/api/admin/email-templates",
            get(handlers::settings::list_email_templates)
                .post(handlers::settings::create_email_template),
        )
        .route(
            "/api/admin/email-templates/:id",
            put(handlers::settings::update_email_template)
                .delete(handlers::settings::delete_email_template),
        )
        // admin: payment gateways
        .route(
            "/api/admin/gateways",
            get(handlers::settings::list_gateways).put(handlers::settings::replace_gateways),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
