use std::sync::Arc;

use anyhow::Result;
use campus_db::Database;
use campus_notify::{Mailer, SubscriberStore, reminders};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Runs the daily reminder job on a cron schedule in local time.
pub struct ReminderScheduler {
    scheduler: JobScheduler,
}

impl ReminderScheduler {
    pub async fn start(
        cron_expr: &str,
        db: Arc<Database>,
        mailer: Arc<Mailer>,
        subscribers: Arc<SubscriberStore>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async_tz(cron_expr, chrono::Local, move |_uuid, _l| {
            let db = db.clone();
            let mailer = mailer.clone();
            let subscribers = subscribers.clone();
            Box::pin(async move {
                let today = chrono::Local::now().date_naive();
                info!("Running event reminders for {}", today);
                match reminders::send_due_reminders(&db, &mailer, &subscribers, today).await {
                    Ok(report) => info!(
                        "Reminders done: {} events, {} sent, {} failed",
                        report.events, report.sent, report.failed
                    ),
                    Err(e) => error!("Reminder job failed: {:#}", e),
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;
        info!("Reminder scheduler started ({})", cron_expr);

        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        info!("Reminder scheduler shut down");
        Ok(())
    }
}
