mod connect_google_account;
mod delete_google_event;
mod fallback;
mod fetch_google_events;
mod get_event_changes;
mod register_device;
mod sync_google_events;
mod upsert_apple_events;

use actix_web::web;
use connect_google_account::connect_google_account_controller;
use delete_google_event::delete_google_event_controller;
use fetch_google_events::fetch_google_events_controller;
use get_event_changes::get_event_changes_controller;
use register_device::register_device_controller;
use sync_google_events::sync_google_events_controller;
use upsert_apple_events::upsert_apple_events_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/sync/google-calendar",
        web::post().to(sync_google_events_controller),
    );
    cfg.route(
        "/sync/google-calendar/fetch",
        web::get().to(fetch_google_events_controller),
    );
    cfg.route(
        "/sync/google-calendar/delete",
        web::post().to(delete_google_event_controller),
    );
    cfg.route(
        "/sync/google-calendar/connect",
        web::post().to(connect_google_account_controller),
    );
    cfg.route(
        "/sync/apple/events/upsert",
        web::post().to(upsert_apple_events_controller),
    );
    cfg.route(
        "/sync/apple/events/changes",
        web::get().to(get_event_changes_controller),
    );
    cfg.route(
        "/sync/events/changes",
        web::get().to(get_event_changes_controller),
    );
    cfg.route(
        "/sync/devices/register",
        web::post().to(register_device_controller),
    );
}
