// Booking eligibility and pricing engine
// Pure validators and derived price state shared by the accommodation and
// event booking widgets. Nothing here performs I/O; the embedding view
// renders errors and the api module ships the resulting requests.

use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::{Accommodation, Event};
use crate::money::{Money, CLEANING_FEE, SERVICE_FEE, TICKET_BOOKING_FEE};

// Most tickets or guests the selector ever offers; availability past this
// is still bookable, the dropdown just stops listing it.
pub const SELECTOR_DISPLAY_CAP: u32 = 10;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Please select check-in and check-out dates")]
    Incomplete,

    #[error("Check-In Date cannot be in the past")]
    CheckInInPast,

    #[error("Check-In Date must be before Check-Out Date")]
    CheckOutNotAfterCheckIn,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("invalid quantity: requested {requested} with {available} available")]
    InvalidQuantity { requested: u32, available: u32 },
}

// A validated stay. `nights` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidStay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
}

// Date pickers constrain their own minimums, but the validator re-checks
// everything rather than trusting the UI.
pub fn validate_date_range(
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<ValidStay, DateRangeError> {
    let check_in = check_in.ok_or(DateRangeError::Incomplete)?;
    if check_in < today {
        return Err(DateRangeError::CheckInInPast);
    }

    let check_out = check_out.ok_or(DateRangeError::Incomplete)?;
    if check_out <= check_in {
        return Err(DateRangeError::CheckOutNotAfterCheckIn);
    }

    let nights = (check_out - check_in).num_days() as u32;
    Ok(ValidStay {
        check_in,
        check_out,
        nights,
    })
}

pub fn validate_quantity(requested: u32, available: u32) -> Result<u32, QuantityError> {
    if requested == 0 || requested > available {
        return Err(QuantityError::InvalidQuantity {
            requested,
            available,
        });
    }
    Ok(requested)
}

// Options the quantity dropdown presents: 1 through min(10, available).
// Deliberately narrower than what validate_quantity accepts.
pub fn selector_options(available: u32) -> std::ops::RangeInclusive<u32> {
    1..=available.min(SELECTOR_DISPLAY_CAP)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeLine {
    pub label: &'static str,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub unit_price: Money,
    pub units: u32,
    pub subtotal: Money,
    pub fees: Vec<FeeLine>,
    pub total: Money,
}

impl PriceBreakdown {
    pub fn fee_total(&self) -> Money {
        self.fees
            .iter()
            .fold(Money::ZERO, |sum, fee| {
                sum.checked_add(fee.amount).unwrap_or(sum)
            })
    }
}

// Stay pricing: nightly rate times nights, plus flat cleaning and service
// fees charged once per stay regardless of length or party size.
pub fn quote_stay(price_per_night: Money, stay: &ValidStay) -> Option<PriceBreakdown> {
    if price_per_night.is_negative() {
        return None;
    }
    let subtotal = price_per_night.checked_mul(stay.nights)?;
    let total = subtotal.checked_add(CLEANING_FEE)?.checked_add(SERVICE_FEE)?;
    Some(PriceBreakdown {
        unit_price: price_per_night,
        units: stay.nights,
        subtotal,
        fees: vec![
            FeeLine {
                label: "Cleaning fee",
                amount: CLEANING_FEE,
            },
            FeeLine {
                label: "Service fee",
                amount: SERVICE_FEE,
            },
        ],
        total,
    })
}

// Ticket pricing: the booking fee is charged per ticket, not per order.
pub fn quote_tickets(price_per_ticket: Money, tickets: u32) -> Option<PriceBreakdown> {
    if tickets == 0 || price_per_ticket.is_negative() {
        return None;
    }
    let subtotal = price_per_ticket.checked_mul(tickets)?;
    let booking_fees = TICKET_BOOKING_FEE.checked_mul(tickets)?;
    let total = subtotal.checked_add(booking_fees)?;
    Some(PriceBreakdown {
        unit_price: price_per_ticket,
        units: tickets,
        subtotal,
        fees: vec![FeeLine {
            label: "Booking fee",
            amount: booking_fees,
        }],
        total,
    })
}

// Outbound booking requests handed to the api module on submit. The
// backend owns booking state from here on; the engine never tracks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayBookingRequest {
    pub accommodation_id: u32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketBookingRequest {
    pub event_id: u32,
    pub tickets: u32,
    pub total_cost: Money,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("booking submission failed: {0}")]
pub struct SubmissionFailed(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,

    #[error("this booking is already confirmed")]
    AlreadyConfirmed,

    #[error(transparent)]
    InvalidDates(#[from] DateRangeError),

    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),
}

// Lifecycle of one booking widget instance. Failed is not a resting
// state: a failed submission drops back to Idle with the error retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Submitting,
    Confirmed,
}

// Booking panel state for one accommodation detail view. Inputs are
// revalidated on every change; submission is single-flight.
#[derive(Debug)]
pub struct StayBookingWidget {
    accommodation_id: u32,
    price_per_night: Money,
    max_guests: u32,
    today: NaiveDate,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    guests: u32,
    date_error: Option<DateRangeError>,
    phase: SubmitPhase,
    confirmed_booking: Option<u32>,
    last_failure: Option<SubmissionFailed>,
}

impl StayBookingWidget {
    pub fn new(listing: &Accommodation, max_guests: u32, today: NaiveDate) -> Self {
        Self {
            accommodation_id: listing.id,
            price_per_night: listing.price_per_night,
            max_guests,
            today,
            check_in: None,
            check_out: None,
            guests: 1,
            date_error: None,
            phase: SubmitPhase::Idle,
            confirmed_booking: None,
            last_failure: None,
        }
    }

    // Changing check-in past the stored check-out clears the check-out and
    // raises the inline error, matching the date-picker behavior.
    pub fn set_check_in(&mut self, date: NaiveDate) {
        self.check_in = Some(date);
        match self.check_out {
            Some(check_out) if check_out <= date => {
                self.check_out = None;
                self.date_error = Some(DateRangeError::CheckOutNotAfterCheckIn);
            }
            _ => self.refresh_date_error(),
        }
    }

    pub fn set_check_out(&mut self, date: NaiveDate) {
        self.check_out = Some(date);
        self.refresh_date_error();
    }

    pub fn set_guests(&mut self, guests: u32) {
        self.guests = guests;
    }

    fn refresh_date_error(&mut self) {
        self.date_error = match validate_date_range(self.check_in, self.check_out, self.today) {
            Ok(_) => None,
            // Incomplete just keeps the gate closed; only real conflicts
            // surface as an inline message.
            Err(DateRangeError::Incomplete) => None,
            Err(err) => Some(err),
        };
    }

    pub fn date_error(&self) -> Option<DateRangeError> {
        self.date_error
    }

    pub fn guest_options(&self) -> std::ops::RangeInclusive<u32> {
        selector_options(self.max_guests)
    }

    fn validated_stay(&self) -> Result<ValidStay, SubmitError> {
        let stay = validate_date_range(self.check_in, self.check_out, self.today)?;
        validate_quantity(self.guests, self.max_guests)?;
        Ok(stay)
    }

    // No breakdown while any input is invalid; never a zero total.
    pub fn quote(&self) -> Option<PriceBreakdown> {
        let stay = self.validated_stay().ok()?;
        quote_stay(self.price_per_night, &stay)
    }

    pub fn can_submit(&self) -> bool {
        self.phase == SubmitPhase::Idle && self.validated_stay().is_ok()
    }

    // Moves to Submitting and yields the outbound request. Refuses while a
    // submission is in flight so a double click cannot double-book.
    pub fn begin_submit(&mut self) -> Result<StayBookingRequest, SubmitError> {
        match self.phase {
            SubmitPhase::Submitting => return Err(SubmitError::InFlight),
            SubmitPhase::Confirmed => return Err(SubmitError::AlreadyConfirmed),
            SubmitPhase::Idle => {}
        }

        let stay = self.validated_stay()?;
        let breakdown =
            quote_stay(self.price_per_night, &stay).ok_or(DateRangeError::Incomplete)?;

        self.phase = SubmitPhase::Submitting;
        self.last_failure = None;
        Ok(StayBookingRequest {
            accommodation_id: self.accommodation_id,
            check_in: stay.check_in,
            check_out: stay.check_out,
            guests: self.guests,
            total_cost: breakdown.total,
        })
    }

    pub fn resolve_success(&mut self, booking_id: u32) {
        self.phase = SubmitPhase::Confirmed;
        self.confirmed_booking = Some(booking_id);
    }

    // Failure returns to Idle with inputs intact so the user can retry.
    pub fn resolve_failure(&mut self, failure: SubmissionFailed) {
        self.phase = SubmitPhase::Idle;
        self.last_failure = Some(failure);
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn confirmed_booking(&self) -> Option<u32> {
        self.confirmed_booking
    }

    pub fn last_failure(&self) -> Option<&SubmissionFailed> {
        self.last_failure.as_ref()
    }
}

// Booking panel state for one event card.
#[derive(Debug)]
pub struct TicketBookingWidget {
    event_id: u32,
    price_per_ticket: Money,
    available_seats: u32,
    tickets: u32,
    phase: SubmitPhase,
    confirmed_booking: Option<u32>,
    last_failure: Option<SubmissionFailed>,
}

impl TicketBookingWidget {
    pub fn new(event: &Event) -> Self {
        Self {
            event_id: event.id,
            price_per_ticket: event.price_per_ticket,
            available_seats: event.available_seats,
            tickets: 1,
            phase: SubmitPhase::Idle,
            confirmed_booking: None,
            last_failure: None,
        }
    }

    pub fn set_tickets(&mut self, tickets: u32) {
        self.tickets = tickets;
    }

    pub fn ticket_options(&self) -> std::ops::RangeInclusive<u32> {
        selector_options(self.available_seats)
    }

    pub fn quote(&self) -> Option<PriceBreakdown> {
        validate_quantity(self.tickets, self.available_seats).ok()?;
        quote_tickets(self.price_per_ticket, self.tickets)
    }

    pub fn can_submit(&self) -> bool {
        self.phase == SubmitPhase::Idle
            && validate_quantity(self.tickets, self.available_seats).is_ok()
    }

    pub fn begin_submit(&mut self) -> Result<TicketBookingRequest, SubmitError> {
        match self.phase {
            SubmitPhase::Submitting => return Err(SubmitError::InFlight),
            SubmitPhase::Confirmed => return Err(SubmitError::AlreadyConfirmed),
            SubmitPhase::Idle => {}
        }

        let tickets = validate_quantity(self.tickets, self.available_seats)?;
        let breakdown = quote_tickets(self.price_per_ticket, tickets).ok_or(
            QuantityError::InvalidQuantity {
                requested: tickets,
                available: self.available_seats,
            },
        )?;

        self.phase = SubmitPhase::Submitting;
        self.last_failure = None;
        Ok(TicketBookingRequest {
            event_id: self.event_id,
            tickets,
            total_cost: breakdown.total,
        })
    }

    pub fn resolve_success(&mut self, booking_id: u32) {
        self.phase = SubmitPhase::Confirmed;
        self.confirmed_booking = Some(booking_id);
    }

    pub fn resolve_failure(&mut self, failure: SubmissionFailed) {
        self.phase = SubmitPhase::Idle;
        self.last_failure = Some(failure);
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn confirmed_booking(&self) -> Option<u32> {
        self.confirmed_booking
    }

    pub fn last_failure(&self) -> Option<&SubmissionFailed> {
        self.last_failure.as_ref()
    }
}
