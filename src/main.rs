use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use env_logger::Env;
use tokio::io::{AsyncBufRead, BufReader};

use chanfs_sync::config::Config;
use chanfs_sync::db::{connect, initialize_db};
use chanfs_sync::handler::configure;
use chanfs_sync::{FileRepo, JsonLinesSource, Notifier, SyncEngine};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    let pool = connect(&config.db_url)
        .await
        .with_context(|| format!("Unable to open the db at {}", config.db_url))?;
    initialize_db(&pool).await.context("Unable to initialize the db")?;
    log::info!("metadata db ready at {}", config.db_url);

    let repo = FileRepo::new(pool);
    let notifier = Notifier::new(config.notify_capacity);
    let subscriber = web::Data::new(notifier.subscribe());

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &config.events_path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Unable to open event file {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let engine = SyncEngine::new(repo.clone(), notifier).spawn(JsonLinesSource::new(reader));

    let repo = web::Data::new(repo);
    let served = HttpServer::new(move || {
        App::new()
            .app_data(repo.clone())
            .app_data(subscriber.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(actix_web::middleware::Logger::default())
            .configure(configure)
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("Unable to bind {}", config.bind_addr))?
    .run()
    .await;

    log::info!("http server stopped, shutting down sync engine");
    engine.shutdown().await.context("sync engine task failed")?;
    served.context("http server failed")?;
    Ok(())
}
