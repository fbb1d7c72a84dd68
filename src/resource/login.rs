use crate::{error::ApiError, models::AccountView, registry::AccountRegistry};
use actix_web::web;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginParams {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    message: &'static str,
    data: AccountView,
}

/// `POST /login`
pub async fn login(
    params: web::Json<LoginParams>,
    registry: web::Data<AccountRegistry>,
) -> Result<web::Json<LoginResponse>, ApiError> {
    let LoginParams { username, password } = params.into_inner();
    let data = web::block(move || registry.login(&username, &password)).await??;

    Ok(web::Json(LoginResponse { message: "OK", data }))
}
