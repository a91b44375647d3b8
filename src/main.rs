use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::info;

use ad_sentry::config::Config;
use ad_sentry::engine::{AdBlocker, NavigationVerdict, RefreshScheduler};
use ad_sentry::init::{init_engine, setup_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config_exists = std::path::Path::new(&config_path).exists();
    let config = if config_exists {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting ad-sentry...");
    if !config_exists {
        info!("Config file not found, using defaults.");
    }

    // 3. Engine: critical rules now, everything else in the background
    let (blocker, _stats) = init_engine(&config)?;

    // 4. Periodic refresh
    let interval = Duration::from_secs(config.updates.interval_hours.max(1) * 3600);
    let scheduler = RefreshScheduler::start(blocker.clone(), interval);

    // 5. Serve decisions on stdin until EOF or Ctrl-C
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_command(&blocker, &scheduler, line.trim()),
                    None => break,
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    scheduler.stop().await;
    Ok(())
}

fn handle_command(blocker: &AdBlocker, scheduler: &RefreshScheduler, line: &str) {
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    match cmd {
        "" => {}
        "nav" => match blocker.classify_navigation(arg) {
            NavigationVerdict::Suppress(reason) => println!("SUPPRESS {} ({:?})", arg, reason),
            NavigationVerdict::Redirect => println!("REDIRECT {}", arg),
        },
        "add" => blocker.add_domain(arg),
        "remove" => blocker.remove_domain(arg),
        "enable" => blocker.set_enabled(true),
        "disable" => blocker.set_enabled(false),
        "refresh" => {
            if !scheduler.trigger() {
                println!("refresh already pending");
            }
        }
        "stats" => match serde_json::to_string_pretty(&blocker.stats()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("failed to render stats: {}", e),
        },
        url => match blocker.check(url) {
            Some(reason) => println!("BLOCK {} ({})", url, reason),
            None => println!("ALLOW {}", url),
        },
    }
}
