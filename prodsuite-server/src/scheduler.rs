//! Background loop that fires due note reminders.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use prodsuite_core::note::Note;
use prodsuite_core::push::NotificationPayload;
use prodsuite_core::reminder::next_reminder;
use prodsuite_core::{Storage, SuiteResult};

use crate::push::{PushSender, notify_user};

/// Check for due reminders every `every` until the task is dropped.
pub async fn run(storage: Arc<Storage>, sender: Arc<dyn PushSender>, tz: Tz, every: Duration) {
    tracing::info!(interval = ?every, timezone = %tz, "Reminder scheduler started");

    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;

        match tick(&storage, sender.as_ref(), &tz, Utc::now()).await {
            Ok(0) => {}
            Ok(fired) => tracing::info!(fired, "Sent reminder notifications"),
            Err(e) => tracing::error!(error = %e, "Reminder check failed"),
        }
    }
}

/// Fire every reminder due at `now`. Each fired reminder is completed; a
/// recurring one gets its successor appended to the note.
///
/// A note that fails is logged and skipped so the others still fire.
pub async fn tick(
    storage: &Storage,
    sender: &dyn PushSender,
    tz: &Tz,
    now: DateTime<Utc>,
) -> SuiteResult<usize> {
    let mut fired = 0;

    for note in storage.notes_with_enabled_reminders()? {
        match fire_due(storage, sender, tz, &note, now).await {
            Ok(count) => fired += count,
            Err(e) => tracing::error!(note_id = %note.id, error = %e, "Failed to fire reminders"),
        }
    }

    Ok(fired)
}

async fn fire_due(
    storage: &Storage,
    sender: &dyn PushSender,
    tz: &Tz,
    note: &Note,
    now: DateTime<Utc>,
) -> SuiteResult<usize> {
    let mut fired = 0;

    for reminder in note.reminders.iter().filter(|r| r.is_due(now)) {
        let payload = NotificationPayload::for_reminder(note, reminder).to_json();
        notify_user(storage, sender, &note.user_id, &payload).await?;

        // The note may have changed while the push was in flight.
        let successor = next_reminder(reminder, now, tz);
        if storage.complete_reminder(note.id, reminder, now, successor.as_ref())? {
            tracing::debug!(note_id = %note.id, reminder_id = %reminder.id, "Reminder fired");
            fired += 1;
        }
    }

    Ok(fired)
}
