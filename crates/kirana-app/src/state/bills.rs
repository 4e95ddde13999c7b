//! # Bill History State
//!
//! Observable state for the bill-history screen: the live bill list with a
//! client-side date filter and stats computed over the filtered view.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   live bill list (newest first) ──┐                                 │
//! │                                   ├──► visible_bills()              │
//! │   DateFilter ─────────────────────┘        │                        │
//! │                                            ▼                        │
//! │                              filtered_stats() (count, total)        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use kirana_core::{Bill, BillStatus, Money};

use crate::error::AppResult;
use crate::live::{LiveQuery, Subscription};
use crate::services::billing::BillingService;

// =============================================================================
// Date Filter
// =============================================================================

/// Client-side date filter over the bill history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    /// One specific calendar date.
    Custom(NaiveDate),
}

impl DateFilter {
    /// The label shown on the filter chip.
    pub fn display_name(&self) -> &'static str {
        match self {
            DateFilter::All => "All",
            DateFilter::Today => "Today",
            DateFilter::Yesterday => "Yesterday",
            DateFilter::ThisWeek => "This Week",
            DateFilter::ThisMonth => "This Month",
            DateFilter::Custom(_) => "Custom Date",
        }
    }

    /// Whether a bill created at `created_at` passes the filter, relative
    /// to `now`. Weeks start on Monday.
    pub fn matches(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let date = created_at.date_naive();
        let today = now.date_naive();

        match self {
            DateFilter::All => true,
            DateFilter::Today => date == today,
            DateFilter::Yesterday => match today.checked_sub_days(Days::new(1)) {
                Some(yesterday) => date == yesterday,
                None => false,
            },
            DateFilter::ThisWeek => {
                let week_start = today.week(Weekday::Mon).first_day();
                date >= week_start && date <= today
            }
            DateFilter::ThisMonth => date.year() == today.year() && date.month() == today.month(),
            DateFilter::Custom(day) => date == *day,
        }
    }
}

/// Stats over the currently visible (filtered) bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BillStats {
    pub bill_count: usize,
    /// Σ total over the visible bills, voided excluded.
    pub total_cents: i64,
}

impl BillStats {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Bill History State
// =============================================================================

struct Inner {
    service: BillingService,
    bills: LiveQuery<Vec<Bill>>,
    filter: watch::Sender<DateFilter>,
    error: watch::Sender<Option<String>>,
}

/// Observable bill-history state for one signed-in user.
#[derive(Clone)]
pub struct BillHistoryState {
    inner: Arc<Inner>,
}

impl BillHistoryState {
    /// Builds the state for a signed-in user.
    pub async fn for_user(service: BillingService, user_id: &str) -> AppResult<Self> {
        let bills = service.watch_bills(user_id).await?;

        let (filter, _) = watch::channel(DateFilter::All);
        let (error, _) = watch::channel(None);

        Ok(BillHistoryState {
            inner: Arc::new(Inner {
                service,
                bills,
                filter,
                error,
            }),
        })
    }

    /// Applies a date filter; `visible_bills` re-filters immediately.
    pub fn set_filter(&self, filter: DateFilter) {
        self.inner.filter.send_replace(filter);
    }

    /// The active filter.
    pub fn filter(&self) -> DateFilter {
        *self.inner.filter.borrow()
    }

    /// The current snapshot with the date filter applied, newest first.
    pub fn visible_bills(&self) -> Vec<Bill> {
        let filter = *self.inner.filter.borrow();
        let now = Utc::now();

        self.inner
            .bills
            .snapshot()
            .into_iter()
            .filter(|b| filter.matches(b.created_at, now))
            .collect()
    }

    /// Count and total over the filtered view.
    pub fn filtered_stats(&self) -> BillStats {
        let visible = self.visible_bills();
        BillStats {
            bill_count: visible.len(),
            total_cents: visible
                .iter()
                .filter(|b| b.status != BillStatus::Voided)
                .map(|b| b.total_cents)
                .sum(),
        }
    }

    /// A subscription onto the unfiltered live list.
    pub fn subscribe_bills(&self) -> Subscription<Vec<Bill>> {
        self.inner.bills.subscribe()
    }

    /// The current error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.inner.error.borrow().clone()
    }

    /// Deletes a bill (and its items) as a fire-and-forget task; failure
    /// surfaces as an error message.
    pub fn delete_bill(&self, bill_id: String) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            match inner.service.delete_bill(&bill_id).await {
                Ok(()) => {
                    inner.error.send_replace(None);
                }
                Err(err) => {
                    inner.error.send_replace(Some(err.user_message()));
                }
            }
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
