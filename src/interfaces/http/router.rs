//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::locks::KeyedLocks;
use crate::application::services::{
    AccountService, PackageService, PaymentManager, SessionManager, SpotService,
};
use crate::domain::{ParkingRate, RepositoryProvider};
use crate::infrastructure::crypto::JwtConfig;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::shared::RetryConfig;

use super::modules::{
    health, metrics, packages, payments, sessions, spots, users,
};

/// State shared by every route. Handlers extract their own slice of it
/// through `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionManager>,
    pub payments: Arc<PaymentManager>,
    pub accounts: Arc<AccountService>,
    pub spots: Arc<SpotService>,
    pub packages: Arc<PackageService>,
    pub auth: AuthState,
    pub health: health::HealthState,
}

impl ApiState {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        rate: ParkingRate,
        retry: RetryConfig,
        jwt_config: JwtConfig,
        db: Option<DatabaseConnection>,
    ) -> Self {
        let currency = rate.currency.clone();
        let locks = KeyedLocks::shared();
        Self {
            sessions: Arc::new(
                SessionManager::new(repos.clone(), rate)
                    .with_retry(retry.clone())
                    .with_locks(locks.clone()),
            ),
            payments: Arc::new(
                PaymentManager::new(repos.clone(), currency.as_str())
                    .with_retry(retry)
                    .with_locks(locks),
            ),
            accounts: Arc::new(AccountService::new(repos.clone())),
            spots: Arc::new(SpotService::new(repos.clone())),
            packages: Arc::new(PackageService::new(repos, currency)),
            auth: AuthState::new(jwt_config),
            health: health::HealthState {
                db,
                started_at: Arc::new(Instant::now()),
            },
        }
    }
}

impl FromRef<ApiState> for sessions::SessionHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            sessions: Arc::clone(&s.sessions),
        }
    }
}

impl FromRef<ApiState> for payments::PaymentHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            payments: Arc::clone(&s.payments),
        }
    }
}

impl FromRef<ApiState> for users::UserHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            accounts: Arc::clone(&s.accounts),
        }
    }
}

impl FromRef<ApiState> for spots::SpotHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            spots: Arc::clone(&s.spots),
        }
    }
}

impl FromRef<ApiState> for packages::PackageHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            packages: Arc::clone(&s.packages),
        }
    }
}

impl FromRef<ApiState> for AuthState {
    fn from_ref(s: &ApiState) -> Self {
        s.auth.clone()
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT issued by the identity provider"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        // Sessions
        sessions::start_session,
        sessions::end_session,
        sessions::cancel_session,
        sessions::scan,
        sessions::get_session,
        sessions::get_session_by_qr,
        sessions::cost_preview,
        sessions::active_sessions,
        sessions::user_sessions,
        sessions::user_active_session,
        // Transactions
        payments::purchase,
        payments::confirm,
        payments::cancel,
        payments::get_transaction,
        payments::pending,
        payments::user_transactions,
        payments::create_card_payment,
        payments::complete_card_payment,
        payments::fail_card_payment,
        payments::grant_refund,
        // Users
        users::create_user,
        users::list_users,
        users::get_user,
        users::get_user_by_phone,
        users::get_balance,
        users::set_active,
        // Spots
        spots::create_spot,
        spots::list_spots,
        spots::available_spots,
        spots::get_spot,
        spots::set_spot_status,
        // Packages
        packages::list_packages,
        packages::get_package,
        packages::create_package,
        packages::deactivate_package,
    ),
    components(schemas(
        health::HealthResponse,
        sessions::SessionDto,
        sessions::StartSessionRequest,
        sessions::ScanRequest,
        sessions::ScanResponse,
        sessions::CostPreviewDto,
        payments::TransactionDto,
        payments::PurchaseRequestDto,
        payments::CardPaymentRequestDto,
        payments::RefundRequest,
        users::UserDto,
        users::CreateUserRequest,
        spots::SpotDto,
        spots::CreateSpotRequest,
        packages::PackageDto,
        packages::CreatePackageRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Sessions", description = "Parking session lifecycle"),
        (name = "Transactions", description = "Minute purchases, card payments and refunds"),
        (name = "Users", description = "Accounts and balances"),
        (name = "Spots", description = "Parking spots"),
        (name = "Packages", description = "Minute packages")
    ),
    info(title = "Parking Service API", description = "Parking sessions and prepaid minute billing")
)]
pub struct ApiDoc;

fn api_routes(state: ApiState) -> Router {
    Router::new()
        // Sessions
        .route("/sessions", post(sessions::start_session))
        .route("/sessions/active", get(sessions::active_sessions))
        .route("/sessions/scan", post(sessions::scan))
        .route("/sessions/qr/{code}", get(sessions::get_session_by_qr))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/sessions/{id}/end", post(sessions::end_session))
        .route("/sessions/{id}/cancel", post(sessions::cancel_session))
        .route("/sessions/{id}/cost-preview", get(sessions::cost_preview))
        // Transactions
        .route("/transactions/purchase", post(payments::purchase))
        .route("/transactions/pending", get(payments::pending))
        .route("/transactions/card", post(payments::create_card_payment))
        .route(
            "/transactions/card/{intent_id}/complete",
            post(payments::complete_card_payment),
        )
        .route(
            "/transactions/card/{intent_id}/fail",
            post(payments::fail_card_payment),
        )
        .route("/transactions/{id}", get(payments::get_transaction))
        .route("/transactions/{id}/confirm", post(payments::confirm))
        .route("/transactions/{id}/cancel", post(payments::cancel))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/phone/{phone}", get(users::get_user_by_phone))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/active", put(users::set_active))
        .route("/users/{id}/balance", get(users::get_balance))
        .route("/users/{id}/sessions", get(sessions::user_sessions))
        .route("/users/{id}/sessions/active", get(sessions::user_active_session))
        .route("/users/{id}/transactions", get(payments::user_transactions))
        .route("/users/{id}/refunds", post(payments::grant_refund))
        // Spots
        .route("/spots", get(spots::list_spots).post(spots::create_spot))
        .route("/spots/available", get(spots::available_spots))
        .route("/spots/{id}", get(spots::get_spot))
        .route("/spots/{id}/status", put(spots::set_spot_status))
        // Packages
        .route(
            "/packages",
            get(packages::list_packages).post(packages::create_package),
        )
        .route(
            "/packages/{id}",
            get(packages::get_package).delete(packages::deactivate_package),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Full application router. `/metrics` is mounted only when a Prometheus
/// recorder handle is supplied.
pub fn create_api_router(state: ApiState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(state.health.clone());

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(health_routes)
        .nest("/api/v1", api_routes(state));

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    router
        .route_layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{CreateUserDto, UserRole};
    use crate::infrastructure::crypto::create_token;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    struct TestApp {
        router: Router,
        state: ApiState,
        jwt: JwtConfig,
    }

    fn test_app() -> TestApp {
        let jwt = JwtConfig {
            secret: "router-test".into(),
            expiration_hours: 1,
            issuer: "parkhub-test".into(),
        };
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let state = ApiState::new(
            repos,
            ParkingRate::default(),
            RetryConfig::none(),
            jwt.clone(),
            None,
        );
        TestApp {
            router: create_api_router(state.clone(), None),
            state,
            jwt,
        }
    }

    impl TestApp {
        async fn user(&self, phone: &str, role: UserRole, balance: i64) -> (String, String) {
            let user = self
                .state
                .accounts
                .register_user(CreateUserDto {
                    phone: phone.into(),
                    name: "Test".into(),
                    email: None,
                    role: Some(role),
                    initial_balance_minutes: balance,
                })
                .await
                .unwrap();
            let token = create_token(&user.id, &user.name, role, &self.jwt).unwrap();
            (user.id, token)
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(b) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(b.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let (status, body) = app.call("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"]["backend"], "memory");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = test_app();
        let (status, body) = app.call("GET", "/api-docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/sessions/scan"].is_object());
    }

    #[tokio::test]
    async fn api_requires_a_token() {
        let app = test_app();
        let (status, body) = app.call("GET", "/api/v1/spots", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = app.call("GET", "/api/v1/spots", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn client_starts_one_session_for_itself() {
        let app = test_app();
        let (user_id, token) = app.user("+50499887766", UserRole::Client, 60).await;

        let (status, body) = app
            .call("POST", "/api/v1/sessions", Some(&token), Some(json!({"location": "Mall North"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["user_id"], user_id.as_str());
        assert_eq!(body["data"]["status"], "active");

        let (status, body) = app
            .call("POST", "/api/v1/sessions", Some(&token), Some(json!({"location": "Mall North"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn client_cannot_act_for_another_user() {
        let app = test_app();
        let (_, token) = app.user("+50499887766", UserRole::Client, 60).await;
        let (other_id, _) = app.user("+50499887755", UserRole::Client, 60).await;

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/sessions",
                Some(&token),
                Some(json!({"user_id": other_id.as_str(), "location": "Gate"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call("GET", &format!("/api/v1/users/{}/transactions", other_id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn guard_ends_session_and_client_cannot() {
        let app = test_app();
        let (_, client) = app.user("+50499887766", UserRole::Client, 60).await;
        let (guard_id, guard) = app.user("+50499887700", UserRole::Guard, 0).await;

        let (_, body) = app
            .call("POST", "/api/v1/sessions", Some(&client), Some(json!({"location": "Gate"})))
            .await;
        let session_id = body["data"]["id"].as_str().unwrap().to_string();
        let end = format!("/api/v1/sessions/{}/end", session_id);

        let (status, _) = app.call("POST", &end, Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .call("POST", &end, Some(&guard), Some(json!({"payment_method": "cash"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["payment_method"], "cash");
        assert_eq!(body["data"]["guard_id"], guard_id.as_str());

        let (status, _) = app.call("POST", &end, Some(&guard), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn scan_toggles_session() {
        let app = test_app();
        let (user_id, _) = app.user("+50499887766", UserRole::Client, 60).await;
        let (_, guard) = app.user("+50499887700", UserRole::Guard, 0).await;
        let scan = json!({"qr_code": "PARKING_USER_+50499887766", "location": "Gate A"});

        let (status, body) = app
            .call("POST", "/api/v1/sessions/scan", Some(&guard), Some(scan.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["action"], "started");

        let (_, body) = app
            .call("POST", "/api/v1/sessions/scan", Some(&guard), Some(scan))
            .await;
        assert_eq!(body["data"]["action"], "ended");

        let (_, body) = app
            .call(
                "GET",
                &format!("/api/v1/users/{}/sessions/active", user_id),
                Some(&guard),
                None,
            )
            .await;
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn malformed_scan_payload_is_unprocessable() {
        let app = test_app();
        let (_, guard) = app.user("+50499887700", UserRole::Guard, 0).await;
        let (status, _) = app
            .call(
                "POST",
                "/api/v1/sessions/scan",
                Some(&guard),
                Some(json!({"qr_code": "PARKING_u1_1700000000000", "location": "Gate"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn transfer_purchase_is_credited_on_confirmation() {
        let app = test_app();
        let (user_id, client) = app.user("+50499887766", UserRole::Client, 0).await;
        let (_, admin) = app.user("+50499880000", UserRole::Admin, 0).await;
        let package = app
            .state
            .packages
            .create_package("1 hour", 60, 5000, None)
            .await
            .unwrap();

        let (status, body) = app
            .call(
                "POST",
                "/api/v1/transactions/purchase",
                Some(&client),
                Some(json!({"package_id": package.id, "method": "transfer", "reference": "R-1"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "pending");
        let tx_id = body["data"]["id"].as_str().unwrap().to_string();

        let confirm = format!("/api/v1/transactions/{}/confirm", tx_id);
        let (status, _) = app.call("POST", &confirm, Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        for _ in 0..2 {
            let (status, body) = app.call("POST", &confirm, Some(&admin), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["status"], "completed");
        }

        let (_, body) = app
            .call("GET", &format!("/api/v1/users/{}/balance", user_id), Some(&client), None)
            .await;
        assert_eq!(body["data"]["balance_minutes"], 60);

        let (status, _) = app
            .call("POST", &format!("/api/v1/transactions/{}/cancel", tx_id), Some(&client), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn clients_cannot_record_cash() {
        let app = test_app();
        let (_, client) = app.user("+50499887766", UserRole::Client, 0).await;
        let package = app
            .state
            .packages
            .create_package("30 min", 30, 2500, None)
            .await
            .unwrap();

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/transactions/purchase",
                Some(&client),
                Some(json!({"package_id": package.id, "method": "cash"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_manages_catalog() {
        let app = test_app();
        let (_, admin) = app.user("+50499880000", UserRole::Admin, 0).await;
        let (_, client) = app.user("+50499887766", UserRole::Client, 0).await;

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/spots",
                Some(&client),
                Some(json!({"number": "A1", "location": "Level 1"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .call(
                "POST",
                "/api/v1/spots",
                Some(&admin),
                Some(json!({"number": "A1", "location": "Level 1", "spot_type": "electric"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["spot_type"], "electric");

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/packages",
                Some(&admin),
                Some(json!({"name": "Free", "minutes": 0, "price_cents": 0})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = app.call("GET", "/api/v1/spots/available", Some(&client), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let app = test_app();
        let (_, guard) = app.user("+50499887700", UserRole::Guard, 0).await;
        let (status, body) = app
            .call("GET", "/api/v1/sessions/does-not-exist", Some(&guard), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
