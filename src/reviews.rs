// Optimistic review handling for the accommodation detail view
// A submitted review is shown immediately and the average rating updated,
// then reconciled once the backend answers: confirmed entries take the
// server's copy, failed ones are rolled back rather than silently kept.

use thiserror::Error;
use tracing::debug;

use crate::catalog::Review;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(f32),

    #[error("a review comment is required")]
    EmptyComment,
}

// A review the user just wrote, not yet accepted by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub rating: f32,
    pub comment: String,
}

impl NewReview {
    // Mirrors the backend's acceptance rules so a rejected review never
    // leaves the client in the first place.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if !(1.0..=5.0).contains(&self.rating) {
            return Err(ReviewError::RatingOutOfRange(self.rating));
        }
        if self.comment.trim().is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        Ok(())
    }
}

// Handle to one staged (optimistically applied) review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReview(u64);

enum Entry {
    Confirmed(Review),
    Staged { ticket: u64, review: Review },
}

impl Entry {
    fn review(&self) -> &Review {
        match self {
            Entry::Confirmed(review) => review,
            Entry::Staged { review, .. } => review,
        }
    }
}

// Review list for one listing, staged entries included in display order.
pub struct ReviewBoard {
    entries: Vec<Entry>,
    next_ticket: u64,
}

impl ReviewBoard {
    pub fn new(reviews: Vec<Review>) -> Self {
        Self {
            entries: reviews.into_iter().map(Entry::Confirmed).collect(),
            next_ticket: 0,
        }
    }

    // Applies the review locally and returns the ticket to reconcile with.
    pub fn stage(
        &mut self,
        user_name: &str,
        date: &str,
        review: NewReview,
    ) -> Result<PendingReview, ReviewError> {
        review.validate()?;

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.entries.push(Entry::Staged {
            ticket,
            review: Review {
                id: 0,
                user_name: user_name.to_string(),
                rating: review.rating,
                date: date.to_string(),
                comment: review.comment,
            },
        });
        Ok(PendingReview(ticket))
    }

    // The backend accepted the review: keep the server's copy (it carries
    // the real id and canonical author name).
    pub fn confirm(&mut self, pending: PendingReview, accepted: Review) -> bool {
        for entry in &mut self.entries {
            if matches!(entry, Entry::Staged { ticket, .. } if *ticket == pending.0) {
                debug!(review_id = accepted.id, "review confirmed by backend");
                *entry = Entry::Confirmed(accepted);
                return true;
            }
        }
        false
    }

    // The backend rejected the review: undo the local mutation.
    pub fn roll_back(&mut self, pending: PendingReview) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !matches!(entry, Entry::Staged { ticket, .. } if *ticket == pending.0));
        let removed = self.entries.len() < before;
        if removed {
            debug!("staged review rolled back after backend failure");
        }
        removed
    }

    pub fn reviews(&self) -> impl Iterator<Item = &Review> {
        self.entries.iter().map(Entry::review)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Staged { .. }))
            .count()
    }

    // Average over confirmed and staged entries alike; None with no
    // reviews rather than a misleading zero.
    pub fn average_rating(&self) -> Option<f32> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f32 = self.entries.iter().map(|entry| entry.review().rating).sum();
        Some(sum / self.entries.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_board() -> ReviewBoard {
        ReviewBoard::new(vec![
            Review {
                id: 101,
                user_name: "Sarah J.".to_string(),
                rating: 5.0,
                date: "August 15, 2023".to_string(),
                comment: "Absolutely spectacular views!".to_string(),
            },
            Review {
                id: 102,
                user_name: "Michael T.".to_string(),
                rating: 4.0,
                date: "July 22, 2023".to_string(),
                comment: "Great location, steps from the beach.".to_string(),
            },
        ])
    }

    #[test]
    fn test_validation_matches_backend_rules() {
        let ok = NewReview {
            rating: 4.5,
            comment: "Very clean and great location.".to_string(),
        };
        assert!(ok.validate().is_ok());

        let low = NewReview {
            rating: 0.5,
            comment: "meh".to_string(),
        };
        assert_eq!(low.validate(), Err(ReviewError::RatingOutOfRange(0.5)));

        let high = NewReview {
            rating: 5.5,
            comment: "amazing".to_string(),
        };
        assert_eq!(high.validate(), Err(ReviewError::RatingOutOfRange(5.5)));

        let blank = NewReview {
            rating: 4.0,
            comment: "   ".to_string(),
        };
        assert_eq!(blank.validate(), Err(ReviewError::EmptyComment));
    }

    #[test]
    fn test_stage_updates_average_immediately() {
        let mut board = seeded_board();
        assert_eq!(board.average_rating(), Some(4.5));

        board
            .stage(
                "johndoe",
                "May 2, 2025",
                NewReview {
                    rating: 3.0,
                    comment: "Decent stay.".to_string(),
                },
            )
            .unwrap();

        assert_eq!(board.len(), 3);
        assert_eq!(board.pending_count(), 1);
        assert_eq!(board.average_rating(), Some(4.0));
    }

    #[test]
    fn test_confirm_replaces_staged_entry_with_server_copy() {
        let mut board = seeded_board();
        let pending = board
            .stage(
                "johndoe",
                "May 2, 2025",
                NewReview {
                    rating: 3.0,
                    comment: "Decent stay.".to_string(),
                },
            )
            .unwrap();

        let accepted = Review {
            id: 103,
            user_name: "johndoe".to_string(),
            rating: 3.0,
            date: "May 2, 2025".to_string(),
            comment: "Decent stay.".to_string(),
        };
        assert!(board.confirm(pending, accepted));
        assert_eq!(board.pending_count(), 0);
        assert_eq!(board.len(), 3);
        assert!(board.reviews().any(|r| r.id == 103));

        // Reconciling the same ticket twice is a no-op.
        assert!(!board.roll_back(pending));
    }

    #[test]
    fn test_roll_back_restores_previous_state() {
        let mut board = seeded_board();
        let before = board.average_rating();

        let pending = board
            .stage(
                "johndoe",
                "May 2, 2025",
                NewReview {
                    rating: 1.0,
                    comment: "Never mind.".to_string(),
                },
            )
            .unwrap();
        assert_ne!(board.average_rating(), before);

        assert!(board.roll_back(pending));
        assert_eq!(board.len(), 2);
        assert_eq!(board.average_rating(), before);
    }

    #[test]
    fn test_empty_board_has_no_average() {
        let board = ReviewBoard::new(vec![]);
        assert!(board.is_empty());
        assert_eq!(board.average_rating(), None);
    }

    #[test]
    fn test_invalid_review_is_not_staged() {
        let mut board = seeded_board();
        let result = board.stage(
            "johndoe",
            "May 2, 2025",
            NewReview {
                rating: 0.0,
                comment: "bad".to_string(),
            },
        );
        assert!(result.is_err());
        assert_eq!(board.len(), 2);
    }
}
