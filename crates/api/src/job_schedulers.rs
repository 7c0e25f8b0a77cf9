use crate::event::purge_tombstones::PurgeTombstonesUseCase;
use crate::reminder::send_due_reminders::SendDueRemindersUseCase;
use crate::shared::usecase::execute;
use actix_web::rt::time::interval;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempo_infra::TempoContext;

const TOMBSTONE_PURGE_INTERVAL_SECS: u64 = 60 * 60;

/// Fixed-interval reminder delivery tick. An in-progress flag skips a tick
/// while the previous one is still running, so a slow tick can never lead to
/// overlapping runs that double-attempt delivery.
pub fn start_send_reminders_job(ctx: TempoContext) {
    actix_web::rt::spawn(async move {
        let mut tick = interval(Duration::from_millis(ctx.config.reminder_tick_interval));
        let in_flight = Arc::new(AtomicBool::new(false));
        loop {
            tick.tick().await;
            if in_flight.swap(true, Ordering::SeqCst) {
                continue;
            }
            let context = ctx.clone();
            let guard = in_flight.clone();
            actix_web::rt::spawn(async move {
                let usecase = SendDueRemindersUseCase {};
                let _ = execute(usecase, &context).await;
                guard.store(false, Ordering::SeqCst);
            });
        }
    });
}

pub fn start_tombstone_purge_job(ctx: TempoContext) {
    actix_web::rt::spawn(async move {
        let mut tick = interval(Duration::from_secs(TOMBSTONE_PURGE_INTERVAL_SECS));
        loop {
            tick.tick().await;
            let usecase = PurgeTombstonesUseCase {};
            let _ = execute(usecase, &ctx).await;
        }
    });
}
