use actix_web::web;

pub mod auth;
pub mod contacts;
pub mod health;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes)
        .service(
            web::scope("/api")
                .configure(auth::configure_routes)
                .configure(users::configure_routes)
                .configure(contacts::configure_routes),
        );
}
