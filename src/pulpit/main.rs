use std::sync::{Arc, Mutex};

use chrono::Utc;
use clap::Parser;
use pulpit::api::{self, SermonService};
use pulpit::config::BackendConfig;
use pulpit::error::{PulpitError, Result};
use pulpit::model::{provisional_id, Sermon};
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = BackendConfig::from_env();
    if let Some(store) = cli.store {
        config.store_path = Some(store);
    }
    // The CLI carries no document-collection client; when remote settings are
    // absent this runs in local demo mode, and the service says so.
    let service = SermonService::from_config(&config, None);

    match cli.command {
        Some(Commands::List) | None => handle_list(&service),
        Some(Commands::Add {
            title,
            preacher,
            series,
            date,
            scripture,
            description,
            audio_url,
            tags,
            id,
        }) => {
            let sermon = Sermon {
                id: id.unwrap_or_else(provisional_id),
                title,
                preacher,
                series,
                date: date.unwrap_or_else(|| Utc::now().date_naive().to_string()),
                scripture,
                description,
                audio_url,
                duration: None,
                tags,
            };
            handle_add(&service, sermon)
        }
        Some(Commands::Delete { id }) => handle_delete(&service, &id),
        Some(Commands::Import { file }) => handle_import(&service, &file),
        Some(Commands::Export { out }) => handle_export(&service, out),
    }
}

/// One synchronous snapshot of the active collection.
fn current_snapshot(service: &SermonService) -> Vec<Sermon> {
    let snapshot = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&snapshot);
    let mut sub = service.subscribe_to_sermons(Box::new(move |sermons| {
        *captured.lock().unwrap() = sermons;
    }));
    sub.unsubscribe();
    let sermons = snapshot.lock().unwrap().clone();
    sermons
}

fn handle_list(service: &SermonService) -> Result<()> {
    let mut sermons = current_snapshot(service);
    // Date ordering is a presentation concern on the local path.
    sermons.sort_by(|a, b| b.date.cmp(&a.date));

    if sermons.is_empty() {
        println!("No sermons yet.");
        return Ok(());
    }
    for sermon in &sermons {
        println!(
            "{}  {}  {} — {} [{}]",
            sermon.date,
            sermon.id,
            sermon.title,
            sermon.preacher,
            sermon.tags.join(", ")
        );
    }
    Ok(())
}

fn handle_add(service: &SermonService, sermon: Sermon) -> Result<()> {
    if sermon.title.is_empty() || sermon.audio_url.is_empty() {
        return Err(PulpitError::Store(
            "title and audio URL are required".to_string(),
        ));
    }
    service.save_sermon(&sermon)?;
    println!("Saved: {} ({})", sermon.title, sermon.id);
    Ok(())
}

fn handle_delete(service: &SermonService, id: &str) -> Result<()> {
    service.delete_sermon(id)?;
    println!("Deleted: {}", id);
    Ok(())
}

fn handle_import(service: &SermonService, file: &std::path::Path) -> Result<()> {
    let raw = std::fs::read_to_string(file).map_err(PulpitError::Io)?;
    if service.import_sermons(&raw)? {
        println!("Data restored from {}", file.display());
        Ok(())
    } else {
        Err(PulpitError::Store(
            "invalid backup file: top-level JSON value must be an array".to_string(),
        ))
    }
}

fn handle_export(service: &SermonService, out: Option<std::path::PathBuf>) -> Result<()> {
    let sermons = current_snapshot(service);
    let contents = api::export_json(&sermons)?;
    let path = out.unwrap_or_else(|| {
        std::path::PathBuf::from(api::export_filename(Utc::now().date_naive()))
    });
    std::fs::write(&path, contents).map_err(PulpitError::Io)?;
    println!("Exported {} sermons to {}", sermons.len(), path.display());
    Ok(())
}
