use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use maildigest::config::Config;
use maildigest::digest::DigestProcessor;
use maildigest::server::{self, AppState};
use maildigest::slack_notifier::SlackNotifier;

#[derive(Parser)]
#[command(name = "maildigest")]
#[command(about = "Daily AI digest of unread Gmail messages")]
#[command(version = "0.1.0")]
struct Args {
    /// Run a single digest, print the result as JSON and exit
    #[arg(long)]
    once: bool,

    /// Daemon mode: run digests on the SCHEDULER_TIMES schedule
    #[arg(long)]
    daemon: bool,

    /// Use fixture messages instead of the live mailbox
    #[arg(long)]
    demo: bool,

    /// Address for the HTTP server (overrides BIND_ADDR)
    #[arg(short, long)]
    bind: Option<String>,

    /// Check the configuration without connecting
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load the .env file if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    let mut config = Config::new()?;

    // CLI flags override the environment
    if args.demo {
        config.digest.demo = true;
    }
    if let Some(bind) = &args.bind {
        config.server.bind_addr = bind.clone();
    }

    if args.check_config {
        config.check()?;
        println!("✅ Configuration valid!");
        println!("🧪 Demo mode: {}", config.digest.demo);
        println!("🤖 Model: {}", config.openai.model);
        println!("📬 Max messages per run: {}", config.digest.max_results);
        println!(
            "✉️  Mark as read: {} (on failure: {:?})",
            config.digest.mark_as_read, config.digest.mark_read_failure
        );
        println!("🌐 Bind address: {}", config.server.bind_addr);
        println!("🔔 Slack reports: {}", config.slack.is_some());
        return Ok(());
    }

    if let Err(e) = config.check() {
        warn!("⚠️  {}", e);
    }

    let http = reqwest::Client::builder()
        .build()
        .context("Unable to build HTTP client")?;

    let slack = match &config.slack {
        Some(slack_config) => match SlackNotifier::new(slack_config) {
            Ok(notifier) => {
                info!("✅ Slack reports enabled");
                Some(Arc::new(notifier))
            }
            Err(e) => {
                warn!("⚠️  Unable to initialize Slack notifier: {} - reports disabled", e);
                None
            }
        },
        None => {
            info!("ℹ️  Slack reports not configured");
            None
        }
    };

    let state = Arc::new(AppState { config, http, slack });

    if args.once {
        return run_once(&state).await;
    }

    if args.daemon {
        info!("🔄 Starting in daemon mode");
        return run_daemon_mode(state).await;
    }

    server::serve(state).await
}

async fn run_once(state: &AppState) -> Result<()> {
    let processor = DigestProcessor::from_config(&state.config, state.http.clone())?
        .with_slack(state.slack.clone());

    let result = processor
        .run_and_report(chrono::Local::now().date_naive())
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

async fn run_daemon_mode(state: Arc<AppState>) -> Result<()> {
    use chrono::{Local, Timelike};
    use tokio_cron_scheduler::{Job, JobScheduler};

    let scheduler_config = &state.config.scheduler;

    if !scheduler_config.enabled {
        error!("❌ Daemon mode requires SCHEDULER_ENABLED=true");
        anyhow::bail!("Scheduler not enabled in configuration");
    }

    if scheduler_config.schedule_times.is_empty() {
        error!("❌ No schedule defined (SCHEDULER_TIMES)");
        anyhow::bail!("No schedule defined");
    }

    info!("📅 Configured digest times: {:?}", scheduler_config.schedule_times);

    let scheduler = JobScheduler::new().await?;

    for schedule_time in &scheduler_config.schedule_times {
        let Some((hour, minute)) = parse_schedule_time(schedule_time) else {
            error!("❌ Invalid schedule time: {}. Use the HH:MM format", schedule_time);
            continue;
        };

        // Cron format: "sec minute hour * * *" (every day)
        let cron_expr = format!("0 {} {} * * *", minute, hour);
        info!("📆 Adding scheduled job: {} (cron: {})", schedule_time, cron_expr);

        let state = state.clone();
        let schedule_time = schedule_time.clone();

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
            let state = state.clone();
            let schedule_time = schedule_time.clone();

            Box::pin(async move {
                info!("⏰ Scheduled run at {} - building digest...", schedule_time);

                let processor = match DigestProcessor::from_config(&state.config, state.http.clone()) {
                    Ok(p) => p.with_slack(state.slack.clone()),
                    Err(e) => {
                        error!("❌ Unable to start digest run: {}", e);
                        return;
                    }
                };

                match processor.run_and_report(Local::now().date_naive()).await {
                    Ok(result) => {
                        info!(
                            "✅ Scheduled digest done at {}: {} message(s), {} bullet(s)",
                            schedule_time,
                            result.unread_count,
                            result.digest.bullets.len()
                        );
                    }
                    Err(e) => {
                        error!("❌ Scheduled digest failed at {}: {}", schedule_time, e);
                    }
                }
            })
        })?;

        scheduler.add(job).await?;
    }

    scheduler.start().await?;

    info!("✅ Daemon started. Waiting for scheduled times...");
    info!("⏸️  Press Ctrl+C to stop the daemon");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping daemon");
                return Ok(());
            }
            _ = tokio::time::sleep(tokio::time::Duration::from_secs(60)) => {
                // Periodic heartbeat to show the daemon is alive
                let now = Local::now();
                if now.minute() == 0 {
                    info!("💓 Daemon alive - {}", now.format("%Y-%m-%d %H:%M"));
                }
            }
        }
    }
}

/// Parse "HH:MM" into hour and minute
fn parse_schedule_time(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;

    (hour < 24 && minute < 60).then_some((hour, minute))
}
