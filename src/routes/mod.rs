pub mod catalog;
pub mod estimates;
pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Estimates
        .route("/estimates/calculate", post(estimates::calculate_estimate))
        .route(
            "/estimates",
            post(estimates::save_estimate).get(estimates::list_estimates),
        )
        .route(
            "/estimates/:estimate_id",
            get(estimates::get_estimate).delete(estimates::delete_estimate),
        )
        // Reference data
        .route("/catalog/materials", get(catalog::list_materials))
        .route("/catalog/materials/:name", put(catalog::upsert_material))
        .route("/catalog/labor-rates", get(catalog::list_labor_rates))
        .route("/catalog/labor-rates/:role", put(catalog::set_labor_rate))
        .route("/catalog/project-types", get(catalog::list_project_types))
        .route("/catalog/risk-factors", get(catalog::get_risk_factors))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::app::{create_app, AppState};
    use crate::config::Settings;
    use crate::domain::ReferenceData;
    use crate::services::CatalogStore;

    /// App with a pool that never connects and no cache; enough for
    /// every route that does not touch the database.
    fn test_app() -> Router {
        let settings = Settings::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/serralheria_test".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.database_url)
            .unwrap();
        let state = AppState::new(
            pool,
            settings,
            CatalogStore::new(ReferenceData::default()),
            None,
        );
        create_app(state)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn gate_body() -> Value {
        json!({
            "project_type": "gate",
            "name": "Portão Residencial",
            "client_name": "João Silva",
            "width": 3.0,
            "height": 2.0,
            "complexity": "medium"
        })
    }

    #[tokio::test]
    async fn calculate_returns_estimate() {
        let (status, body) =
            send(test_app(), "POST", "/estimates/calculate", Some(gate_body())).await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["engine"], "v2");
        assert_eq!(data["project_type"], "gate");
        assert_eq!(data["dimensions"]["area"], 6.0);
        assert!(data["final_price"].as_f64().unwrap() > 0.0);
        assert!(data["materials"]["lines"].as_array().unwrap().len() >= 3);
    }

    #[tokio::test]
    async fn calculate_honours_engine_and_legacy_names() {
        let body = json!({
            "engine": "v1",
            "project_type": "portao",
            "name": "Portão",
            "width": 3.0,
            "height": 2.0,
            "complexity": "media"
        });
        let (status, body) = send(test_app(), "POST", "/estimates/calculate", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["engine"], "v1");
        let margin = body["data"]["profit_margin"].as_f64().unwrap();
        assert!((0.30..=0.32).contains(&margin));
    }

    #[tokio::test]
    async fn zero_width_is_a_validation_error() {
        let mut body = gate_body();
        body["width"] = json!(0.0);
        let (status, body) = send(test_app(), "POST", "/estimates/calculate", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("width"));
    }

    #[tokio::test]
    async fn missing_length_for_roof_is_reported() {
        let body = json!({
            "project_type": "roof",
            "name": "Cobertura",
            "width": 10.0,
            "height": 4.0
        });
        let (status, body) = send(test_app(), "POST", "/estimates/calculate", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "missing field: length");
    }

    #[tokio::test]
    async fn microscopic_truss_spacing_is_a_validation_error() {
        let body = json!({
            "project_type": "roof",
            "name": "Cobertura",
            "width": 10.0,
            "height": 4.0,
            "length": 20.0,
            "advanced": { "truss_spacing": 1e-9 }
        });
        let (status, body) = send(test_app(), "POST", "/estimates/calculate", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("truss_spacing"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/estimates/calculate")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn catalog_endpoints_list_reference_data() {
        let (status, body) = send(test_app(), "GET", "/catalog/materials", None).await;
        assert_eq!(status, StatusCode::OK);
        let materials = body["data"].as_array().unwrap();
        assert!(materials.iter().any(|m| m["name"] == "Metalon 30x30"));

        let (status, body) = send(test_app(), "GET", "/catalog/project-types", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 8);

        let (status, body) = send(test_app(), "GET", "/catalog/labor-rates", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);

        let (status, body) = send(test_app(), "GET", "/catalog/risk-factors", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["complexity"]["very_high"]["factor"], 2.0);
    }

    #[tokio::test]
    async fn catalog_updates_are_validated_before_storage() {
        let (status, body) = send(
            test_app(),
            "PUT",
            "/catalog/labor-rates/astronaut",
            Some(json!({ "hourly_rate": 100.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) = send(
            test_app(),
            "PUT",
            "/catalog/labor-rates/welder",
            Some(json!({ "hourly_rate": -1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            test_app(),
            "PUT",
            "/catalog/materials/Novo%20Perfil",
            Some(json!({ "unit_price": 10.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let request = Request::builder()
            .uri("/catalog/risk-factors")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
