// REST client for the Roam backend
// The backend owns all durable state; this client ships plain values to
// it and decodes what comes back. Session cookies are carried by the
// underlying cookie store, standing in for the browser's
// `credentials: "include"`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::account::{FieldError, LoginForm, RegistrationForm};
use crate::booking::{StayBookingRequest, TicketBookingRequest};
use crate::catalog::{Accommodation, Event, Review, UserProfile};
use crate::reviews::NewReview;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("backend returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        is_retryable: bool,
    },

    #[error("not signed in")]
    Unauthorized,

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Timeout(_)
                | ApiError::Api {
                    is_retryable: true,
                    ..
                }
        )
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

// Exponential backoff with jitter to avoid thundering-herd retries.
pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
    let base_backoff_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powf(retry_attempt as f64))
    .min(config.max_backoff_ms as f64);

    let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
    let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

    Duration::from_millis(backoff_ms as u64)
}

#[derive(Debug, Default, Clone)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_retried: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<&LoginForm> for LoginRequest {
    fn from(form: &LoginForm) -> Self {
        Self {
            email: form.email.clone(),
            password: form.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    // The backend unmarshals this into a timestamp, so the date of birth
    // goes out as RFC3339 midnight UTC.
    pub dob: DateTime<Utc>,
}

impl RegisterRequest {
    pub fn from_form(form: &RegistrationForm) -> Result<Self, Vec<FieldError>> {
        form.validate()?;
        let dob = form
            .date_of_birth
            .ok_or_else(|| {
                vec![FieldError {
                    field: "dob",
                    message: "Date of Birth is required",
                }]
            })?
            .and_time(NaiveTime::MIN)
            .and_utc();
        Ok(Self {
            name: form.name.clone(),
            username: form.username.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
            dob,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user_id: u32,
}

#[derive(Debug, Deserialize)]
struct CreatedBooking {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct RegisteredUser {
    #[serde(alias = "user_id")]
    id: u32,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

// The one payload the live API wants in PascalCase.
#[derive(Debug, Serialize)]
struct ReviewPayload<'a> {
    #[serde(rename = "Rating")]
    rating: f32,
    #[serde(rename = "Comment")]
    comment: &'a str,
}

// Everything the booking and profile views need from the backend. The
// widgets and tests talk to this seam, not to a concrete transport.
#[async_trait]
pub trait BackendApi: Send + Sync + 'static {
    async fn accommodations(&self, location: Option<&str>) -> Result<Vec<Accommodation>, ApiError>;
    async fn accommodation(&self, id: u32) -> Result<Accommodation, ApiError>;
    async fn events(&self, location: Option<&str>) -> Result<Vec<Event>, ApiError>;

    async fn book_stay(&self, request: &StayBookingRequest) -> Result<u32, ApiError>;
    async fn book_tickets(&self, request: &TicketBookingRequest) -> Result<u32, ApiError>;
    async fn cancel_stay_booking(&self, booking_id: u32) -> Result<(), ApiError>;
    async fn cancel_ticket_booking(&self, booking_id: u32) -> Result<(), ApiError>;

    async fn submit_review(
        &self,
        accommodation_id: u32,
        review: &NewReview,
    ) -> Result<Review, ApiError>;

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<u32, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn profile(&self) -> Result<UserProfile, ApiError>;
}

pub struct RestBackendClient {
    http: reqwest::Client,
    config: ClientConfig,
    stats: Mutex<ClientStats>,
}

impl RestBackendClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.base_url.is_empty() {
            return Err(ClientError::ConfigError("base_url is required".to_string()));
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            stats: Mutex::new(ClientStats::default()),
        })
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else {
            ApiError::Network(err.to_string())
        }
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 401 {
            return Err(ApiError::Unauthorized);
        }
        // Error bodies are usually {"message": "..."}; fall back to the
        // status line when they are not.
        let message = match response.json::<MessageBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
            is_retryable: status.is_server_error(),
        })
    }

    // Sends one request and keeps the counters honest.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        self.stats.lock().requests_sent += 1;
        let outcome = match request.send().await {
            Ok(response) => Self::ensure_success(response).await,
            Err(err) => Err(self.transport_error(err)),
        };
        match &outcome {
            Ok(_) => self.stats.lock().requests_succeeded += 1,
            Err(err) => {
                self.stats.lock().requests_failed += 1;
                warn!(error = %err, "backend request failed");
            }
        }
        outcome
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    // GETs are idempotent and retried with backoff. Mutations go through
    // execute() exactly once: a booking PUT that times out may still have
    // landed, and retrying it could double-book.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            debug!(path, attempt, "GET");
            let request = self.http.get(self.url(path)).query(query);
            match self.execute(request).await {
                Ok(response) => return Self::decode(response).await,
                Err(err) if err.is_retryable() && attempt < self.config.retry.max_retries => {
                    let backoff = calculate_backoff(attempt, &self.config.retry);
                    warn!(
                        path,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying after failure"
                    );
                    self.stats.lock().requests_retried += 1;
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn put_booking(&self, path: &str, query: &[(&str, String)]) -> Result<u32, ApiError> {
        debug!(path, "PUT");
        let request = self.http.put(self.url(path)).query(query);
        let response = self.execute(request).await?;
        let created: CreatedBooking = Self::decode(response).await?;
        Ok(created.id)
    }

    async fn delete_booking(&self, path: &str, booking_id: u32) -> Result<(), ApiError> {
        debug!(path, booking_id, "DELETE");
        let request = self
            .http
            .delete(self.url(path))
            .query(&[("booking_id", booking_id.to_string())]);
        self.execute(request).await?;
        Ok(())
    }
}

#[async_trait]
impl BackendApi for RestBackendClient {
    async fn accommodations(&self, location: Option<&str>) -> Result<Vec<Accommodation>, ApiError> {
        // An empty location means "All Locations"; the parameter is always
        // present, matching what the backend expects.
        let query = [("location", location.unwrap_or("").to_string())];
        self.get_json("/accommodations", &query).await
    }

    async fn accommodation(&self, id: u32) -> Result<Accommodation, ApiError> {
        self.get_json(&format!("/accommodations/{id}"), &[]).await
    }

    async fn events(&self, location: Option<&str>) -> Result<Vec<Event>, ApiError> {
        let query = [("location", location.unwrap_or("").to_string())];
        self.get_json("/events", &query).await
    }

    async fn book_stay(&self, request: &StayBookingRequest) -> Result<u32, ApiError> {
        let query = [
            ("accommodation_id", request.accommodation_id.to_string()),
            ("check_in_date", request.check_in.format("%Y-%m-%d").to_string()),
            (
                "check_out_date",
                request.check_out.format("%Y-%m-%d").to_string(),
            ),
            ("guests", request.guests.to_string()),
            ("total_cost", request.total_cost.wire_value()),
        ];
        self.put_booking("/accommodations", &query).await
    }

    async fn book_tickets(&self, request: &TicketBookingRequest) -> Result<u32, ApiError> {
        let query = [
            ("event_id", request.event_id.to_string()),
            ("guests", request.tickets.to_string()),
            ("total_cost", request.total_cost.wire_value()),
        ];
        self.put_booking("/events", &query).await
    }

    async fn cancel_stay_booking(&self, booking_id: u32) -> Result<(), ApiError> {
        self.delete_booking("/accommodations", booking_id).await
    }

    async fn cancel_ticket_booking(&self, booking_id: u32) -> Result<(), ApiError> {
        self.delete_booking("/events", booking_id).await
    }

    async fn submit_review(
        &self,
        accommodation_id: u32,
        review: &NewReview,
    ) -> Result<Review, ApiError> {
        review.validate().map_err(|e| ApiError::Api {
            status: 400,
            message: e.to_string(),
            is_retryable: false,
        })?;

        let path = format!("/accommodations/{accommodation_id}/reviews");
        debug!(%path, "POST");
        let request = self.http.post(self.url(&path)).json(&ReviewPayload {
            rating: review.rating,
            comment: &review.comment,
        });
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!("POST /users/login");
        let builder = self.http.post(self.url("/users/login")).json(request);
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<u32, ApiError> {
        debug!("POST /users/register");
        let builder = self.http.post(self.url("/users/register")).json(request);
        let response = self.execute(builder).await?;
        let created: RegisteredUser = Self::decode(response).await?;
        Ok(created.id)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        debug!("POST /users/logout");
        let builder = self.http.post(self.url("/users/logout"));
        self.execute(builder).await?;
        Ok(())
    }

    async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.get_json("/users/profile", &[]).await
    }
}


#[cfg(test)]
mod tests {
    use super::mock_backend::MockBackend;
    use super::*;
    use crate::booking::{StayBookingWidget, SubmissionFailed, SubmitPhase, TicketBookingWidget};
    use crate::catalog::Organizer;
    use crate::money::Money;
    use crate::reviews::ReviewBoard;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn miami_listing() -> Accommodation {
        Accommodation {
            id: 1,
            name: "Ocean View Apartment".to_string(),
            location: "Miami, FL".to_string(),
            image_urls: vec![],
            description: String::new(),
            facilities: vec![],
            price_per_night: Money::from_dollars(249),
            rating: 4.8,
            reviews: vec![],
            owner: None,
        }
    }

    fn tech_conference() -> Event {
        Event {
            id: 1,
            name: "Annual Tech Conference".to_string(),
            organizer: Some(Organizer {
                name: "TechCorp Inc.".to_string(),
                email: "events@techcorp.com".to_string(),
                phone: "+1 (555) 123-4567".to_string(),
            }),
            location: "San Francisco, CA".to_string(),
            coordinates: "37.7749,-122.4194".to_string(),
            date: date(2025, 6, 15),
            time: "09:00 AM - 05:00 PM".to_string(),
            images: vec![],
            description: String::new(),
            price_per_ticket: Money::from_dollars(299),
            available_seats: 128,
            total_seats: 500,
            official_link: String::new(),
        }
    }

    #[test]
    fn test_backoff_grows_and_respects_cap() {
        let config = RetryConfig {
            jitter_factor: 0.0,
            ..Default::default()
        };

        let first = calculate_backoff(0, &config);
        let second = calculate_backoff(1, &config);
        let third = calculate_backoff(2, &config);
        assert!(first < second && second < third);

        // Deep attempts land on the cap, not past it.
        let deep = calculate_backoff(20, &config);
        assert_eq!(deep, Duration::from_millis(config.max_backoff_ms));
    }

    #[test]
    fn test_client_config_is_validated() {
        let bad = ClientConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            RestBackendClient::new(bad),
            Err(ClientError::ConfigError(_))
        ));

        assert!(RestBackendClient::new(ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_register_request_serializes_dob_as_timestamp() {
        let form = crate::account::RegistrationForm {
            name: "John Doe".to_string(),
            username: "johndoe".to_string(),
            email: "john@example.com".to_string(),
            password: "password123".to_string(),
            date_of_birth: Some(date(1990, 4, 12)),
        };
        let request = RegisterRequest::from_form(&form).unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["dob"], "1990-04-12T00:00:00Z");

        let invalid = crate::account::RegistrationForm::default();
        assert!(RegisterRequest::from_form(&invalid).is_err());
    }

    #[tokio::test]
    async fn test_location_query_filters_listings() {
        let backend = MockBackend::new();
        let mut other = miami_listing();
        other.id = 2;
        other.location = "Aspen, CO".to_string();
        backend.seed_accommodations(vec![miami_listing(), other]);

        let all = backend.accommodations(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let miami = backend.accommodations(Some("Miami, FL")).await.unwrap();
        assert_eq!(miami.len(), 1);
        assert_eq!(miami[0].id, 1);

        // Empty string is "All Locations".
        let all_again = backend.accommodations(Some("")).await.unwrap();
        assert_eq!(all_again.len(), 2);

        backend.seed_events(vec![tech_conference()]);
        let events = backend.events(Some("San Francisco, CA")).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(backend.events(Some("Austin, TX")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stay_booking_flow_end_to_end() {
        let backend = MockBackend::new();
        backend.seed_accommodations(vec![miami_listing()]);

        let listing = backend.accommodation(1).await.unwrap();
        let mut widget = StayBookingWidget::new(&listing, 6, date(2025, 5, 1));
        widget.set_check_in(date(2025, 6, 1));
        widget.set_check_out(date(2025, 6, 4));
        widget.set_guests(2);

        let request = widget.begin_submit().unwrap();
        match backend.book_stay(&request).await {
            Ok(id) => widget.resolve_success(id),
            Err(err) => widget.resolve_failure(SubmissionFailed(err.to_string())),
        }

        assert_eq!(widget.phase(), SubmitPhase::Confirmed);
        let recorded = backend.stay_bookings.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].total_cost, Money::from_dollars(827));
        assert_eq!(recorded[0].guests, 2);
    }

    #[tokio::test]
    async fn test_failed_booking_surfaces_and_allows_retry() {
        let backend = MockBackend::new();
        let mut widget = TicketBookingWidget::new(&tech_conference());
        widget.set_tickets(2);
        backend.fail_next_requests(1);

        let request = widget.begin_submit().unwrap();
        let outcome = backend.book_tickets(&request).await;
        assert!(outcome.is_err());
        widget.resolve_failure(SubmissionFailed(outcome.unwrap_err().to_string()));

        assert_eq!(widget.phase(), SubmitPhase::Idle);
        assert!(widget.last_failure().is_some());

        // Inputs are intact; the retry succeeds.
        let retry = widget.begin_submit().unwrap();
        let id = backend.book_tickets(&retry).await.unwrap();
        widget.resolve_success(id);
        assert_eq!(widget.phase(), SubmitPhase::Confirmed);
        assert_eq!(backend.ticket_bookings.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_optimistic_review_confirms_against_backend() {
        let backend = MockBackend::new();
        let mut board = ReviewBoard::new(vec![]);

        let review = NewReview {
            rating: 4.5,
            comment: "Very clean and great location.".to_string(),
        };
        let pending = board.stage("johndoe", "May 2, 2025", review.clone()).unwrap();
        assert_eq!(board.len(), 1);

        let accepted = backend.submit_review(1, &review).await.unwrap();
        assert!(board.confirm(pending, accepted));
        assert_eq!(board.pending_count(), 0);
        assert_eq!(board.average_rating(), Some(4.5));
    }

    #[tokio::test]
    async fn test_optimistic_review_rolls_back_on_failure() {
        let backend = MockBackend::new();
        let mut board = ReviewBoard::new(vec![]);
        backend.fail_next_requests(1);

        let review = NewReview {
            rating: 2.0,
            comment: "Noisy at night.".to_string(),
        };
        let pending = board.stage("johndoe", "May 2, 2025", review.clone()).unwrap();
        assert_eq!(board.average_rating(), Some(2.0));

        let outcome = backend.submit_review(1, &review).await;
        assert!(outcome.is_err());
        assert!(board.roll_back(pending));
        assert!(board.is_empty());
        assert_eq!(board.average_rating(), None);
    }

    #[tokio::test]
    async fn test_profile_requires_session() {
        let backend = MockBackend::new();
        let err = backend.profile().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }
}
