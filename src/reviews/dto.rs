use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{ReviewFilter, ReviewWithUser};
use crate::pagination::{PageInfo, PageQuery};

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    10
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReviewRequest {
    pub status: String,
    pub admin_response: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviewsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page", alias = "limit")]
    pub per_page: i64,
    pub rating: Option<i32>,
    pub sort: Option<String>,
}

impl ProductReviewsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .clamped()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReviewsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page", alias = "limit")]
    pub per_page: i64,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl AdminReviewsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .clamped()
    }

    pub fn filter(&self) -> ReviewFilter {
        ReviewFilter {
            status: self.status.clone(),
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucket {
    pub rating: i32,
    pub count: i64,
}

/// Turns sparse (rating, count) rows into five buckets, 1 through 5 stars.
pub fn fill_distribution(rows: &[(i32, i64)]) -> Vec<RatingBucket> {
    (1..=5)
        .map(|rating| RatingBucket {
            rating,
            count: rows
                .iter()
                .find(|(r, _)| *r == rating)
                .map(|(_, c)| *c)
                .unwrap_or(0),
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviews {
    pub reviews: Vec<ReviewWithUser>,
    pub rating_distribution: Vec<RatingBucket>,
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl ProductReviews {
    pub fn new(
        reviews: Vec<ReviewWithUser>,
        distribution: Vec<RatingBucket>,
        info: PageInfo,
    ) -> Self {
        Self {
            reviews,
            rating_distribution: distribution,
            current_page: info.current_page,
            per_page: info.per_page,
            total_pages: info.total_pages,
            total_items: info.total_items,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewList {
    pub reviews: Vec<ReviewWithUser>,
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl ReviewList {
    pub fn new(reviews: Vec<ReviewWithUser>, info: PageInfo) -> Self {
        Self {
            reviews,
            current_page: info.current_page,
            per_page: info.per_page,
            total_pages: info.total_pages,
            total_items: info.total_items,
        }
    }
}

/// Body of a helpful vote; omitting the flag counts as a helpful vote.
#[derive(Debug, Deserialize)]
pub struct HelpfulVoteRequest {
    #[serde(default = "default_true")]
    pub helpful: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulResponse {
    pub helpful_count: i64,
}

pub fn rating_in_range(rating: i32) -> bool {
    (1..=5).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_fills_missing_buckets() {
        let buckets = fill_distribution(&[(5, 7), (3, 2)]);
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[0].rating, 1);
        assert_eq!(buckets[0].count, 0);
        assert_eq!(buckets[2].count, 2);
        assert_eq!(buckets[4].count, 7);
    }

    #[test]
    fn rating_bounds() {
        assert!(rating_in_range(1));
        assert!(rating_in_range(5));
        assert!(!rating_in_range(0));
        assert!(!rating_in_range(6));
    }
}
