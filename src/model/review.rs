// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Product reviews.

use chrono::{DateTime, Utc};
use haven_core::catalog::{MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::product::non_blank;

/// Stored review. One per (product, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id:         Uuid,
    pub product_id: Uuid,
    pub user_id:    Uuid,
    /// 1 to 5.
    pub rating:     i32,
    pub text:       Option<String>,
    pub created_at: DateTime<Utc>
}

/// Reviewer shown next to a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Reviewer {
    pub id:   Uuid,
    pub name: String
}

/// Review with its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReviewWithUser {
    #[serde(flatten)]
    pub review: Review,
    pub user:   Reviewer
}

/// `POST /api/reviews` body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: Option<Uuid>,
    #[validate(range(min = MIN_RATING, max = MAX_RATING))]
    pub rating:     Option<i32>,
    pub text:       Option<String>
}

impl CreateReviewRequest {
    /// Require a product and an in-range rating.
    pub fn into_new(self, user_id: Uuid) -> Result<NewReview, &'static str> {
        const INVALID: &str = "Invalid product ID or rating";
        self.validate().map_err(|_| INVALID)?;
        let (Some(product_id), Some(rating)) = (self.product_id, self.rating) else {
            return Err(INVALID);
        };
        Ok(NewReview {
            product_id,
            user_id,
            rating,
            text: non_blank(self.text)
        })
    }
}

/// Validated review input.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: Uuid,
    pub user_id:    Uuid,
    pub rating:     i32,
    pub text:       Option<String>
}

/// `GET /api/reviews` query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewListParams {
    /// Product whose reviews to list.
    pub product_id: Option<Uuid>
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: Option<i32>) -> CreateReviewRequest {
        CreateReviewRequest {
            product_id: Some(Uuid::now_v7()),
            rating,
            text: Some("  ".into())
        }
    }

    #[test]
    fn rating_must_be_in_range() {
        let user = Uuid::now_v7();
        assert!(request(Some(0)).into_new(user).is_err());
        assert!(request(Some(6)).into_new(user).is_err());
        assert!(request(None).into_new(user).is_err());
        let review = request(Some(5)).into_new(user).unwrap();
        assert_eq!(review.rating, 5);
        assert_eq!(review.text, None);
    }

    #[test]
    fn product_is_required() {
        let err = CreateReviewRequest {
            rating: Some(4),
            ..Default::default()
        }
        .into_new(Uuid::now_v7())
        .unwrap_err();
        assert_eq!(err, "Invalid product ID or rating");
    }
}
