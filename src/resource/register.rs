use crate::{
    error::ApiError,
    models::{AccountView, NewAccount},
    registry::AccountRegistry,
};
use actix_web::{body::BoxBody, web, HttpRequest, HttpResponse, Responder};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterParams {
    username: Option<String>,
    email: Option<String>,
    #[serde(rename = "type")]
    role: Option<String>,
    password: Option<String>,
}

impl From<RegisterParams> for NewAccount {
    fn from(params: RegisterParams) -> Self {
        NewAccount {
            username: params.username,
            email: params.email,
            role: params.role,
            password: params.password,
        }
    }
}

#[derive(Serialize)]
pub struct RegisterResponse {
    message: &'static str,
    data: AccountView,
}

impl Responder for RegisterResponse {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::Created().json(self)
    }
}

/// `POST /register`
pub async fn register(
    params: web::Json<RegisterParams>,
    registry: web::Data<AccountRegistry>,
) -> Result<RegisterResponse, ApiError> {
    let candidate = NewAccount::from(params.into_inner());
    debug!("register request for {:?}", candidate.username);

    let data = web::block(move || registry.register(candidate)).await??;

    Ok(RegisterResponse {
        message: "Created",
        data,
    })
}
