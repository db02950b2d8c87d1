//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide stable insert/read entry points for core callers.
//! - Derive catalog summary statistics from stored rows.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Summary statistics skip NULL values instead of treating them as zero.

use crate::model::book::{Book, BookId, Money, NewBook};
use crate::repo::book_repo::{BookListQuery, BookRepository, RepoError, RepoResult};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate figures over the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total_books: u64,
    pub average_price: Option<Money>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Sum of `Availability` over rows where it is set.
    pub total_available: i64,
    pub average_rating: Option<f64>,
    /// Row count per rating value; rows without a rating are not counted.
    pub rating_distribution: BTreeMap<i64, u64>,
    /// Mean price per rating value, over rows with both set.
    pub average_price_by_rating: BTreeMap<i64, Money>,
}

/// Use-case service wrapper for catalog operations.
pub struct CatalogService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> CatalogService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts one book and returns its store-assigned id.
    pub fn add_book(&self, book: &NewBook) -> RepoResult<BookId> {
        self.repo.insert_book(book)
    }

    /// Inserts a batch atomically.
    pub fn add_books(&self, books: &[NewBook]) -> RepoResult<Vec<BookId>> {
        let ids = self.repo.insert_books(books)?;
        info!("event=catalog_add module=service status=ok count={}", ids.len());
        Ok(ids)
    }

    pub fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        self.repo.get_book(id)
    }

    /// Gets one book, mapping absence to `RepoError::NotFound`.
    pub fn require_book(&self, id: BookId) -> RepoResult<Book> {
        self.repo.get_book(id)?.ok_or(RepoError::NotFound(id))
    }

    /// Runs the read-all query.
    pub fn all_books(&self) -> RepoResult<Vec<Book>> {
        self.repo.list_all_books()
    }

    /// Browses the catalog with explorer filters.
    pub fn explore(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        self.repo.search_books(query)
    }

    /// Computes summary statistics over every stored row.
    pub fn summary(&self) -> RepoResult<CatalogSummary> {
        let books = self.repo.list_all_books()?;
        Ok(summarize(&books))
    }
}

/// Computes summary statistics for `books`.
pub fn summarize(books: &[Book]) -> CatalogSummary {
    let mut summary = CatalogSummary {
        total_books: books.len() as u64,
        ..CatalogSummary::default()
    };

    let mut price_total: i128 = 0;
    let mut price_count: i128 = 0;
    let mut rating_total: i64 = 0;
    let mut rating_count: u64 = 0;
    let mut price_by_rating: BTreeMap<i64, (i128, i128)> = BTreeMap::new();

    for book in books {
        if let Some(price) = book.price {
            price_total += i128::from(price.minor_units());
            price_count += 1;
            summary.min_price = Some(summary.min_price.map_or(price, |min| min.min(price)));
            summary.max_price = Some(summary.max_price.map_or(price, |max| max.max(price)));
        }

        if let Some(available) = book.availability {
            summary.total_available = summary.total_available.saturating_add(available);
        }

        if let Some(rating) = book.rating {
            rating_total = rating_total.saturating_add(rating);
            rating_count += 1;
            *summary.rating_distribution.entry(rating).or_insert(0) += 1;

            if let Some(price) = book.price {
                let entry = price_by_rating.entry(rating).or_insert((0, 0));
                entry.0 += i128::from(price.minor_units());
                entry.1 += 1;
            }
        }
    }

    summary.average_price = mean_money(price_total, price_count);
    if rating_count > 0 {
        summary.average_rating = Some(rating_total as f64 / rating_count as f64);
    }
    summary.average_price_by_rating = price_by_rating
        .into_iter()
        .filter_map(|(rating, (total, count))| mean_money(total, count).map(|mean| (rating, mean)))
        .collect();

    summary
}

/// Mean in minor units, rounded half away from zero.
fn mean_money(total: i128, count: i128) -> Option<Money> {
    if count == 0 {
        return None;
    }
    let doubled = total * 2;
    let rounded = if doubled >= 0 {
        (doubled + count) / (2 * count)
    } else {
        (doubled - count) / (2 * count)
    };
    i64::try_from(rounded).ok().map(Money::from_minor_units)
}
