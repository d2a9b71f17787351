use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Service, ServiceType};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ServiceView {
    pub id: String,
    pub service_type: String,
    pub title: String,
    pub description: Option<String>,
    pub price_adult: f64,
    pub price_child: f64,
    pub price_infant: f64,
    pub currency: String,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub featured: bool,
}

impl From<Service> for ServiceView {
    fn from(s: Service) -> Self {
        ServiceView {
            id: s.id,
            service_type: s.service_type.as_str().to_string(),
            title: s.title,
            description: s.description,
            price_adult: s.price_adult,
            price_child: s.price_child,
            price_infant: s.price_infant,
            currency: s.currency,
            duration: s.duration,
            image_url: s.image_url,
            featured: s.featured,
        }
    }
}

// GET /api/services
#[derive(Deserialize)]
pub struct ServicesQuery {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub featured: Option<bool>,
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ServicesQuery>,
) -> Result<Json<Vec<ServiceView>>, AppError> {
    let type_filter = match query.service_type.as_deref() {
        Some(raw) => Some(
            ServiceType::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown service type: {raw}")))?,
        ),
        None => None,
    };
    let featured_only = query.featured.unwrap_or(false);

    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db, type_filter, featured_only, false)?
    };

    Ok(Json(services.into_iter().map(ServiceView::from).collect()))
}

// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceView>, AppError> {
    let service = {
        let db = state.db.lock().unwrap();
        queries::get_service(&db, &id)?
    };

    match service {
        Some(s) if s.active => Ok(Json(ServiceView::from(s))),
        _ => Err(AppError::NotFound("service not found".to_string())),
    }
}
