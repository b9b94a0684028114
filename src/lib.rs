// Client-side core for the Roam travel booking service

pub mod account;
pub mod api;
pub mod booking;
pub mod catalog;
pub mod money;
pub mod reviews;

// Re-export key types for convenience
pub use account::{FieldError, LoginForm, RegistrationForm};
pub use api::{
    ApiError, BackendApi, ClientConfig, ClientError, ClientStats, LoginRequest, LoginResponse,
    RegisterRequest, RestBackendClient, RetryConfig,
};
pub use booking::{
    quote_stay, quote_tickets, selector_options, validate_date_range, validate_quantity,
    DateRangeError, FeeLine, PriceBreakdown, QuantityError, StayBookingRequest, StayBookingWidget,
    SubmissionFailed, SubmitError, SubmitPhase, TicketBookingRequest, TicketBookingWidget,
    ValidStay,
};
pub use catalog::{
    filter_accommodations, filter_events, locations, seat_fill_ratio, Accommodation,
    BookingSummary, Event, EventBookingSummary, EventSummary, ListingFilter, Organizer, Owner,
    Review, StaySummary, UserProfile,
};
pub use money::{Money, CLEANING_FEE, SERVICE_FEE, TICKET_BOOKING_FEE};
pub use reviews::{NewReview, PendingReview, ReviewBoard, ReviewError};
