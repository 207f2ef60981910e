//! Folio (work order number) allocation.
//!
//! Folios look like `SRV-2501-007`: a year-month bucket followed by a
//! zero-padded sequence. The next folio follows the greatest numeric sequence
//! already in the bucket; the unique index on `service_orders.folio` turns a
//! concurrent collision into a retryable conflict (see [`crate::services::orders`]).

use chrono::{Datelike, NaiveDate};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::entity::service_order;
use crate::error::{AppError, AppResult};

const PREFIX: &str = "SRV";
const SEQUENCE_WIDTH: usize = 3;

/// Bucket prefix for a date, e.g. `SRV-2501-` for January 2025.
pub fn folio_prefix(date: NaiveDate) -> String {
    format!("{}-{:02}{:02}-", PREFIX, date.year() % 100, date.month())
}

/// Sequence number of `folio` within `prefix`.
///
/// Only all-digit suffixes count; hand-entered folios such as `SRV-2501-ZZZ`
/// are ignored. Digit runs too long for `u64` saturate so they exhaust the
/// bucket instead of being skipped.
pub fn sequence_of(prefix: &str, folio: &str) -> Option<u64> {
    let suffix = folio.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(suffix.parse::<u64>().unwrap_or(u64::MAX))
}

/// Folio following sequence `last` within `prefix`, starting at 1.
///
/// Sequences past 999 simply grow wider.
pub fn next_folio_after(prefix: &str, last: Option<u64>) -> AppResult<String> {
    let next = match last {
        Some(n) => n.checked_add(1).ok_or_else(|| {
            AppError::Conflict(format!("Folio sequence exhausted for '{}'", prefix))
        })?,
        None => 1,
    };

    Ok(format!("{}{:0width$}", prefix, next, width = SEQUENCE_WIDTH))
}

/// Allocate the next folio for the bucket containing `today`.
///
/// Runs on whatever connection it is given so the read shares the caller's
/// transaction. Read failures propagate as database errors.
pub async fn allocate_folio<C: ConnectionTrait>(conn: &C, today: NaiveDate) -> AppResult<String> {
    let prefix = folio_prefix(today);

    let folios: Vec<String> = service_order::Entity::find()
        .select_only()
        .column(service_order::Column::Folio)
        .filter(service_order::Column::Folio.starts_with(&prefix))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to read folios: {}", e)))?;

    let last = folios
        .iter()
        .filter_map(|folio| sequence_of(&prefix, folio))
        .max();

    next_folio_after(&prefix, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_prefix_uses_two_digit_year_and_padded_month() {
        assert_eq!(folio_prefix(date(2025, 1, 15)), "SRV-2501-");
        assert_eq!(folio_prefix(date(2025, 12, 31)), "SRV-2512-");
        assert_eq!(folio_prefix(date(2100, 3, 1)), "SRV-0003-");
    }

    #[test]
    fn test_first_folio_in_bucket() {
        assert_eq!(next_folio_after("SRV-2501-", None).unwrap(), "SRV-2501-001");
    }

    #[test]
    fn test_increments_last_sequence() {
        assert_eq!(next_folio_after("SRV-2501-", Some(1)).unwrap(), "SRV-2501-002");
        assert_eq!(next_folio_after("SRV-2501-", Some(99)).unwrap(), "SRV-2501-100");
        assert_eq!(next_folio_after("SRV-2501-", Some(999)).unwrap(), "SRV-2501-1000");
    }

    #[test]
    fn test_exhausted_sequence_is_an_error() {
        let err = next_folio_after("SRV-2501-", Some(u64::MAX)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let huge = format!("SRV-2501-{}", u64::MAX);
        assert_eq!(sequence_of("SRV-2501-", &huge), Some(u64::MAX));
        assert_eq!(
            sequence_of("SRV-2501-", "SRV-2501-99999999999999999999999"),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_only_numeric_suffixes_have_a_sequence() {
        assert_eq!(sequence_of("SRV-2501-", "SRV-2501-007"), Some(7));
        assert_eq!(sequence_of("SRV-2501-", "SRV-2501-1000"), Some(1000));
        assert_eq!(sequence_of("SRV-2501-", "SRV-2501-ZZZ"), None);
        assert_eq!(sequence_of("SRV-2501-", "SRV-2501-12a"), None);
        assert_eq!(sequence_of("SRV-2501-", "SRV-2501-+5"), None);
        assert_eq!(sequence_of("SRV-2501-", "SRV-2501-"), None);
        assert_eq!(sequence_of("SRV-2501-", "SRV-2502-001"), None);
    }

    #[test]
    fn test_sequential_allocation_is_strictly_increasing() {
        let prefix = folio_prefix(date(2025, 1, 3));
        let mut last: Option<u64> = None;
        let mut issued = Vec::new();
        for _ in 0..5 {
            let next = next_folio_after(&prefix, last).unwrap();
            last = sequence_of(&prefix, &next);
            issued.push(next);
        }
        assert_eq!(
            issued,
            vec![
                "SRV-2501-001",
                "SRV-2501-002",
                "SRV-2501-003",
                "SRV-2501-004",
                "SRV-2501-005"
            ]
        );
    }
}
