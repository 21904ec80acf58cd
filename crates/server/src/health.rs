use api_types::health::Health;
use axum::Json;

pub async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}
