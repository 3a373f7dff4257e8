use anyhow::Error;
use axum::Server;
use tokio::{
    spawn,
    time::{interval_at, Duration, Instant, MissedTickBehavior},
};
use tower::{
    limit::GlobalConcurrencyLimitLayer, load_shed::LoadShedLayer, make::Shared, ServiceBuilder,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contacts::{
    config::Config,
    server::{router, session::Sessions, AppState},
    store::ContactStore,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = &*Box::leak(Box::new(ContactStore::open(&config.data_path)?));

    let sessions = &*Box::leak(Box::<Sessions>::default());

    spawn(expire_sessions(sessions, config.session_lifetime()));

    let router = router(AppState { store, sessions });

    let make_service = Shared::new(
        ServiceBuilder::new()
            .layer(LoadShedLayer::new())
            .layer(GlobalConcurrencyLimitLayer::new(config.request_limit))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().include_headers(true)),
            )
            .service(router),
    );

    tracing::info!(
        "Serving contacts from {} on {}",
        config.data_path.display(),
        config.bind_addr
    );
    Server::bind(&config.bind_addr).serve(make_service).await?;

    Ok(())
}

async fn expire_sessions(sessions: &'static Sessions, lifetime: Duration) {
    let mut interval = interval_at(
        Instant::now() + Duration::from_secs(60),
        Duration::from_secs(60),
    );
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let expired = sessions.expire(lifetime);

        if expired != 0 {
            tracing::debug!("Expired {} sessions", expired);
        }
    }
}
