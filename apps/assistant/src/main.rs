use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod console;
mod transcript;

use app::{Assistant, Flow};
use appointment_cell::services::AppointmentStore;
use assistant_cell::Collaborators;
use console::Console;
use doctor_cell::services::StaticDoctorDirectory;
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Logs go to stderr so they stay out of the conversation
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting clinic assistant");

    let config = AppConfig::from_env();
    let store = AppointmentStore::load(&config.appointments_file);
    info!("Appointments stored at {}", store.path().display());

    let doctors = match &config.doctors_file {
        Some(path) => StaticDoctorDirectory::from_file(path)
            .with_context(|| format!("loading doctors from {}", path.display()))?,
        None => StaticDoctorDirectory::embedded().context("loading embedded doctor dataset")?,
    };
    info!("Loaded {} doctors", doctors.len());
    let collaborators = Collaborators::from_config(&config);

    let mut assistant = Assistant::new(config, store, collaborators, Arc::new(doctors));
    let mut console = Console::stdin();
    println!("{}", assistant.welcome());

    loop {
        let Some(line) = console.read_line("\nBạn:").await? else {
            println!("\nGoodbye!");
            break;
        };

        match assistant.handle_line(&line, &mut console).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => {
                error!("Error handling input: {:#}", e);
                println!("An error occurred: {}", e);
            }
        }
    }

    Ok(())
}
