mod subscribe;
mod unsubscribe;

use actix_web::web;
use subscribe::subscribe_controller;
use unsubscribe::unsubscribe_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/subscribe", web::post().to(subscribe_controller));
    cfg.route("/unsubscribe", web::post().to(unsubscribe_controller));
}
