//! Subcommand handlers.

use std::error::Error;
use std::path::Path;

use super::args::{AdminAction, Args, BoothArgs, Command, ConfigAction, RobotAction};
use crate::backend::BackendClient;
use crate::booth::{CaptureLoop, LoopSettings};
use crate::camera::{DirectorySource, FrameSource, HttpSnapshotSource};
use crate::config::{default_path as get_config_path, Config, DEFAULT_CONFIG};
use crate::detect::HttpDetector;

pub type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Run the parsed command against the loaded configuration.
pub async fn dispatch(args: Args, config: &Config) -> CliResult {
    let api_base = config.api_base(args.api_base.as_deref());
    match args.command {
        Command::Booth(booth) => run_booth(&booth, config, api_base).await,
        Command::Gallery { limit, offset } => {
            gallery(&BackendClient::with_base_url(api_base)?, limit, offset).await
        }
        Command::Admin { action } => admin(&BackendClient::with_base_url(api_base)?, action).await,
        Command::Robot { action } => robot(&BackendClient::with_base_url(api_base)?, action).await,
        Command::Config { action } => {
            handle_config_action(action, config, &api_base, args.config.as_deref())
        }
    }
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Run the capture loop until Ctrl+C.
pub async fn run_booth(args: &BoothArgs, config: &Config, api_base: String) -> CliResult {
    let source = args
        .source
        .clone()
        .or_else(|| config.camera.source.clone())
        .ok_or("No camera source configured. Use --source or set [camera] source")?;
    let detector_url = args
        .detector
        .clone()
        .or_else(|| config.detector.url.clone())
        .ok_or("No detector configured. Use --detector or set [detector] url")?;

    let mut camera = config.camera.settings();
    if args.no_mirror {
        camera.mirror = false;
    }
    let detector = HttpDetector::new(detector_url)?;
    let uploader = BackendClient::with_base_url(api_base)?;
    let settings = config.loop_settings(args.overlay.clone());

    if is_url(&source) {
        let source = HttpSnapshotSource::new(source, camera)?;
        run_loop(source, detector, uploader, settings).await
    } else {
        let source = DirectorySource::new(source, camera);
        run_loop(source, detector, uploader, settings).await
    }
}

async fn run_loop<S: FrameSource>(
    source: S,
    detector: HttpDetector,
    uploader: BackendClient,
    settings: LoopSettings,
) -> CliResult {
    println!(
        "Photo booth: {}+ people for {:?} takes a photo, {:?} between photos.",
        settings.policy.min_people, settings.policy.detection_delay, settings.policy.cooldown
    );

    let booth = CaptureLoop::new(source, detector, uploader, settings);
    let stop = booth.stop_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, shutting down...");
        stop.stop();
    })?;

    let mut status_rx = booth.subscribe();
    let printer = tokio::spawn(async move {
        // Ends when the loop drops its status sender.
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            if status.is_error() {
                eprintln!("{}", status);
            } else if !status.message().is_empty() {
                println!("{}", status);
            }
        }
    });

    let result = booth.run().await;
    let _ = printer.await;
    let report = result?;

    println!(
        "Stopped. {} photo(s) uploaded, {} failed upload(s), {} frame(s) analysed.",
        report.captures.len(),
        report.failed_uploads,
        report.frames
    );
    Ok(())
}

pub async fn gallery(client: &BackendClient, limit: u32, offset: u32) -> CliResult {
    let page = client.list_images(limit, offset).await?;
    if page.items.is_empty() {
        println!("No photos yet.");
        return Ok(());
    }
    println!("{} photos", page.items.len());
    for item in &page.items {
        println!(
            "  {}  {}  {}",
            item.name,
            item.created_at.as_deref().unwrap_or("--"),
            item.url
        );
    }
    Ok(())
}

pub async fn admin(client: &BackendClient, action: AdminAction) -> CliResult {
    match action {
        AdminAction::List => {
            let listing = client.admin_photos().await?;
            for item in &listing.items {
                let score = item
                    .score
                    .map(|s| format!("{:.2}", s))
                    .unwrap_or_else(|| "--".to_string());
                let mark = if item.is_approved(listing.threshold) {
                    "approved"
                } else {
                    "hidden"
                };
                println!("  {}  {}  {}  {}", item.id, score, mark, item.storage_path);
            }
            println!();
            println!("Total photos: {}", listing.items.len());
            println!("Approved: {}", listing.approved_count());
            println!("Threshold: {:.2}", listing.threshold);
        }
        AdminAction::Threshold { value } => {
            let updated = client.update_threshold(value).await?;
            println!("Threshold updated: {:.2}", updated.threshold);
        }
        AdminAction::Score { id, value } => {
            let photo = client.update_score(&id, value).await?;
            let score = photo
                .score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "--".to_string());
            println!("Score updated: {} -> {}", photo.id, score);
        }
        AdminAction::Delete { id } => {
            client.delete_photo(&id).await?;
            println!("Photo deleted: {}", id);
        }
    }
    Ok(())
}

pub async fn robot(client: &BackendClient, action: RobotAction) -> CliResult {
    match action {
        RobotAction::Start => println!("Robot: {}", client.robot_start().await?.status),
        RobotAction::Stop => println!("Robot: {}", client.robot_stop().await?.status),
        RobotAction::Status => println!("Robot: {}", client.robot_status().await?.status),
        RobotAction::Capture => {
            client.capture_now().await?;
            println!("Capture requested");
        }
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    api_base: &str,
    path: Option<&Path>,
) -> CliResult {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Backend: {}", api_base);
            println!(
                "  Camera source: {}",
                config.camera.source.as_deref().unwrap_or("(not set)")
            );
            println!("  Mirror: {}", if config.camera.mirror { "yes" } else { "no" });
            println!("  Resolution: {}x{}", config.camera.width, config.camera.height);
            println!(
                "  Detector: {}",
                config.detector.url.as_deref().unwrap_or("(not set)")
            );
            println!("  Min people: {}", config.trigger.min_people);
            println!("  Detection delay: {}ms", config.trigger.detection_delay_ms);
            println!("  Cooldown: {}ms", config.trigger.cooldown_ms);
            println!("  Frame interval: {}ms", config.trigger.frame_interval_ms);
            println!("  Status reset: {}ms", config.trigger.status_reset_ms);
            match &config.overlay.path {
                Some(path) => println!("  Overlay: {}", path.display()),
                None => println!("  Overlay: (off)"),
            }
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(format!(
                    "Config file already exists: {}. Use 'photobooth config show' to view current settings.",
                    config_path.display()
                )
                .into());
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config_path, DEFAULT_CONFIG)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}
