use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use price_tracker::PriceTracker;
use price_tracker::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting price tracker");

    let config = Config::from_env()?;
    let tracker = PriceTracker::new(&config).await?;

    // Run once immediately so a fresh start has current prices
    if let Err(e) = tracker.check_all_prices().await {
        error!("Error during initial price check: {}", e);
    }

    let sched = JobScheduler::new().await?;

    let job_tracker = tracker.clone();
    sched
        .add(Job::new_async(config.check_schedule.as_str(), move |_uuid, _l| {
            let tracker = job_tracker.clone();
            Box::pin(async move {
                if let Err(e) = tracker.check_all_prices().await {
                    error!("Error checking prices: {}", e);
                }
            })
        })?)
        .await?;

    info!("Scheduler started - checking prices on \"{}\"", config.check_schedule);
    sched.start().await?;

    // Keep the program running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}
