// Canonical data-transfer shapes for the Roam backend
// The live API answers in PascalCase while older fixtures use camelCase;
// every shape here is one snake_case struct with serde aliases covering
// both, so the casing drift is absorbed at this boundary and nowhere else.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accommodation {
    #[serde(alias = "ID", alias = "Id")]
    pub id: u32,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Location")]
    pub location: String,
    #[serde(default, alias = "ImageUrls", alias = "imageUrls", alias = "Images")]
    pub image_urls: Vec<String>,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Facilities")]
    pub facilities: Vec<String>,
    #[serde(alias = "PricePerNight", alias = "pricePerNight")]
    pub price_per_night: Money,
    #[serde(default, alias = "Rating")]
    pub rating: f32,
    #[serde(default, alias = "UserReviews", alias = "reviews")]
    pub reviews: Vec<Review>,
    #[serde(default, alias = "Owner")]
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Email")]
    pub email: String,
    #[serde(default, alias = "Phone")]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, alias = "ID", alias = "Id")]
    pub id: u32,
    #[serde(default, alias = "UserName", alias = "userName")]
    pub user_name: String,
    #[serde(alias = "Rating")]
    pub rating: f32,
    #[serde(default, alias = "Date")]
    pub date: String,
    #[serde(alias = "Comment")]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(alias = "ID", alias = "Id")]
    pub id: u32,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Organizer")]
    pub organizer: Option<Organizer>,
    #[serde(alias = "Location")]
    pub location: String,
    #[serde(default, alias = "Coordinates")]
    pub coordinates: String,
    #[serde(alias = "Date")]
    pub date: NaiveDate,
    #[serde(default, alias = "Time")]
    pub time: String,
    #[serde(default, alias = "Images")]
    pub images: Vec<String>,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(alias = "Price", alias = "price")]
    pub price_per_ticket: Money,
    #[serde(alias = "AvailableSeats", alias = "availableSeats")]
    pub available_seats: u32,
    #[serde(alias = "TotalSeats", alias = "totalSeats")]
    pub total_seats: u32,
    #[serde(default, alias = "OfficialLink", alias = "officialLink")]
    pub official_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organizer {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Email")]
    pub email: String,
    #[serde(default, alias = "Phone")]
    pub phone: String,
}

// Profile payload from GET /users/profile. Booking timestamps come back
// RFC3339 from the backend, hence full date-times rather than plain dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_id: String,
    #[serde(default)]
    pub bookings: Vec<BookingSummary>,
    #[serde(default)]
    pub event_bookings: Vec<EventBookingSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSummary {
    pub id: u32,
    pub checkin_date: DateTime<Utc>,
    pub checkout_date: DateTime<Utc>,
    pub guests: u32,
    pub accommodation: StaySummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaySummary {
    pub id: u32,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBookingSummary {
    pub id: u32,
    pub guests: u32,
    pub event: EventSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: u32,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub image: String,
}

// Client-side search criteria over listings already in memory.
// Location filtering is normally the backend's job (the query parameter),
// but an explicit location here also narrows an already-fetched list.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub text: String,
    pub location: Option<String>,
    pub max_price: Option<Money>,
}

impl ListingFilter {
    // Accommodation search matches on name only, case-insensitive.
    pub fn matches_accommodation(&self, listing: &Accommodation) -> bool {
        if !self.text.is_empty()
            && !listing
                .name
                .to_lowercase()
                .contains(&self.text.to_lowercase())
        {
            return false;
        }

        if !self.matches_location(&listing.location) {
            return false;
        }

        if !self
            .max_price
            .map_or(true, |max| listing.price_per_night <= max)
        {
            return false;
        }

        true
    }

    // Event search matches on name or description.
    pub fn matches_event(&self, event: &Event) -> bool {
        if !self.text.is_empty() {
            let needle = self.text.to_lowercase();
            let in_name = event.name.to_lowercase().contains(&needle);
            let in_description = event.description.to_lowercase().contains(&needle);
            if !in_name && !in_description {
                return false;
            }
        }

        if !self.matches_location(&event.location) {
            return false;
        }

        if !self
            .max_price
            .map_or(true, |max| event.price_per_ticket <= max)
        {
            return false;
        }

        true
    }

    // Empty or missing location means "All Locations".
    fn matches_location(&self, location: &str) -> bool {
        match self.location.as_deref() {
            None | Some("") => true,
            Some(wanted) => wanted == location,
        }
    }
}

pub fn filter_accommodations(
    listings: &[Accommodation],
    filter: &ListingFilter,
) -> Vec<Accommodation> {
    let mut filtered = Vec::new();
    for listing in listings {
        if !filter.matches_accommodation(listing) {
            continue;
        }
        filtered.push(listing.clone());
    }
    filtered
}

pub fn filter_events(events: &[Event], filter: &ListingFilter) -> Vec<Event> {
    let mut filtered = Vec::new();
    for event in events {
        if !filter.matches_event(event) {
            continue;
        }
        filtered.push(event.clone());
    }
    filtered
}

// Deduplicated location list for the filter dropdown, first-seen order.
pub fn locations<'a, I>(locations: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<String> = Vec::new();
    for location in locations {
        if !seen.iter().any(|known| known == location) {
            seen.push(location.to_string());
        }
    }
    seen
}

// Fill ratio for the availability meter, clamped to [0, 1].
pub fn seat_fill_ratio(event: &Event) -> f32 {
    if event.total_seats == 0 {
        return 0.0;
    }
    (event.available_seats as f32 / event.total_seats as f32).clamp(0.0, 1.0)
}
