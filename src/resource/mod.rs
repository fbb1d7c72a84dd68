pub mod login;
pub mod register;

pub use login::login;
pub use register::register;

use actix_web::web;

/// Routes
/// - /register
///     - POST { username, email, type, password }: create an account
/// - /login
///     - POST { username, password }: check credentials, return the account
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/register").route(web::post().to(register)))
        .service(web::resource("/login").route(web::post().to(login)));
}
