use dotenv::dotenv;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

mod models;
mod repositories;
pub mod services;
pub mod session;
pub mod settings;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let config = settings::Settings::new().expect("Could not load configuration.");
    let db = sled::open(&config.store.path).expect("Could not open data store.");

    log::info!("Starting services.");
    services::start_services(db, config)
        .await
        .expect("Could not start services.");
}

fn init_logging() {
    // Prefer an operator-supplied log4rs.yaml; fall back to a console logger
    // so a missing file never blocks startup.
    if log4rs::init_file("log4rs.yaml", Default::default()).is_ok() {
        return;
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .expect("Could not build logging config.");
    log4rs::init_config(config).expect("Could not initialize logging.");
}
