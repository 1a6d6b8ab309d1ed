// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Catalog rules: product ordering, category slugs and rating math.

use crate::SortDirection;

/// Lowest accepted review rating.
pub const MIN_RATING: i32 = 1;

/// Highest accepted review rating.
pub const MAX_RATING: i32 = 5;

/// Ordering applied to the public product listing.
///
/// | Query value | Order |
/// |-------------|-------|
/// | `newest` (default) | `created_at DESC` |
/// | `price-low` | `price ASC` |
/// | `price-high` | `price DESC` |
/// | `rating` | review count `DESC` |
///
/// Unknown values fall back to [`ProductSort::Newest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
    /// Most reviewed first.
    Rating
}

impl ProductSort {
    /// Interpret a `sort` query value.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price-low") => Self::PriceLow,
            Some("price-high") => Self::PriceHigh,
            Some("rating") => Self::Rating,
            _ => Self::Newest
        }
    }

    /// Query-string spelling.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating"
        }
    }

    /// Direction of the primary sort key.
    pub const fn direction(&self) -> SortDirection {
        match self {
            Self::PriceLow => SortDirection::Asc,
            Self::Newest | Self::PriceHigh | Self::Rating => SortDirection::Desc
        }
    }
}

/// Derive a category slug: lower-cased, whitespace runs become `-`.
///
/// ```rust
/// use haven_core::catalog::slugify;
///
/// assert_eq!(slugify("Home Decor"), "home-decor");
/// ```
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Round a mean rating to one decimal place.
pub fn round_rating(mean: f64) -> f64 {
    (mean * 10.0).round() / 10.0
}

/// Mean of `ratings` rounded to one decimal, or `0.0` when empty.
pub fn average_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = i32>
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), r| (sum + i64::from(r), count + 1));
    if count == 0 {
        return 0.0;
    }
    round_rating(sum as f64 / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_known_values() {
        assert_eq!(ProductSort::parse(Some("price-low")), ProductSort::PriceLow);
        assert_eq!(ProductSort::parse(Some("price-high")), ProductSort::PriceHigh);
        assert_eq!(ProductSort::parse(Some("rating")), ProductSort::Rating);
        assert_eq!(ProductSort::parse(Some("newest")), ProductSort::Newest);
    }

    #[test]
    fn sort_falls_back_to_newest() {
        assert_eq!(ProductSort::parse(None), ProductSort::Newest);
        assert_eq!(ProductSort::parse(Some("alphabetical")), ProductSort::Newest);
    }

    #[test]
    fn sort_direction_matches_key() {
        assert_eq!(ProductSort::PriceLow.direction(), SortDirection::Asc);
        assert_eq!(ProductSort::PriceHigh.direction(), SortDirection::Desc);
        assert_eq!(ProductSort::Newest.direction(), SortDirection::Desc);
    }

    #[test]
    fn slug_collapses_whitespace() {
        assert_eq!(slugify("Home Decor"), "home-decor");
        assert_eq!(slugify("  Hand   Blown Glass "), "hand-blown-glass");
        assert_eq!(slugify("Jewelry"), "jewelry");
    }

    #[test]
    fn average_of_five_three_four_is_four() {
        assert_eq!(average_rating([5, 3, 4]), 4.0);
    }

    #[test]
    fn average_without_reviews_is_zero() {
        assert_eq!(average_rating(Vec::<i32>::new()), 0.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(average_rating([5, 4, 4]), 4.3);
        assert_eq!(average_rating([5, 5, 4]), 4.7);
        assert_eq!(round_rating(3.25), 3.3);
    }
}
