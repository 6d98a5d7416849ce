use wayfare_core::activity::{Activity, Review};

use crate::CatalogError;

/// Arithmetic mean of the ratings that are present. Missing ratings count in
/// neither the numerator nor the denominator; no ratings at all gives 0.
pub fn average_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = Option<u8>>,
{
    let (sum, count) = ratings
        .into_iter()
        .flatten()
        .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r), count + 1));

    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

pub fn validate_rating(rating: Option<u8>) -> Result<(), CatalogError> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(CatalogError::InvalidRating(r)),
        _ => Ok(()),
    }
}

/// Recompute `rating` and `review_count` from the review list.
pub fn refresh_rating(activity: &mut Activity) {
    activity.rating = average_rating(activity.reviews.iter().map(|r| r.rating));
    activity.review_count = activity.reviews.len() as u32;
}

pub fn apply_review(activity: &mut Activity, review: Review) {
    activity.reviews.push(review);
    refresh_rating(activity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wayfare_core::{ActivityId, ReviewId, UserId};
    use wayfare_shared::Money;

    fn activity() -> Activity {
        Activity {
            id: ActivityId::new(),
            destination_id: None,
            title: "Tram 28 tour".to_string(),
            category: "sightseeing".to_string(),
            description: String::new(),
            price: Money::new(2_500, "EUR"),
            rating: 0.0,
            review_count: 0,
            reviews: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn review(rating: Option<u8>) -> Review {
        Review {
            id: ReviewId::new(),
            user_id: UserId::new(),
            author_name: "Ada".to_string(),
            rating,
            comment: "ok".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mean_skips_missing_ratings() {
        assert_eq!(average_rating([Some(5), Some(3), None, Some(4)]), 4.0);
    }

    #[test]
    fn test_no_ratings_means_zero() {
        assert_eq!(average_rating(std::iter::empty()), 0.0);
        assert_eq!(average_rating([None, None]), 0.0);
    }

    #[test]
    fn test_apply_reviews_in_sequence() {
        let mut a = activity();
        for r in [Some(5), Some(3), None, Some(4)] {
            apply_review(&mut a, review(r));
        }
        assert_eq!(a.rating, 4.0);
        assert_eq!(a.review_count, 4);
    }

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(None).is_ok());
        assert!(validate_rating(Some(1)).is_ok());
        assert!(validate_rating(Some(5)).is_ok());
        assert!(validate_rating(Some(0)).is_err());
        assert!(validate_rating(Some(6)).is_err());
    }
}
