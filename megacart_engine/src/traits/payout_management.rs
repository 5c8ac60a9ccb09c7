use thiserror::Error;

use crate::db_types::{PaymentDetails, Payout, PayoutStatus, Vendor, VendorBalance};

#[derive(Debug, Clone, Error)]
pub enum PayoutError {
    #[error("There is no balance available for payout")]
    NoBalance,
    #[error("Vendor {0} already has a payout request pending")]
    PayoutAlreadyPending(i64),
    #[error("Add bank account or UPI details before requesting a payout")]
    NoPaymentMethod,
    #[error("Payout {0} has already been resolved as {1}")]
    NotPending(i64, PayoutStatus),
    #[error("{0} is not a valid payout decision. Use Completed or Rejected")]
    InvalidDecision(PayoutStatus),
    #[error("Payout {0} does not exist")]
    PayoutNotFound(i64),
    #[error("Vendor {0} does not exist")]
    VendorNotFound(i64),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for PayoutError {
    fn from(e: sqlx::Error) -> Self {
        PayoutError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait PayoutManagement {
    /// With the vendor row write-locked: checks the balance, the absence of a pending payout and the payment details,
    /// then creates a `Pending` payout for the whole available balance and zeroes the balance.
    async fn request_payout(&self, vendor_id: i64) -> Result<Payout, PayoutError>;

    /// Resolves a `Pending` payout. `Rejected` restores the amount to the vendor's available balance in the same
    /// transaction. Returns the updated payout and vendor.
    async fn resolve_payout(
        &self,
        payout_id: i64,
        decision: PayoutStatus,
        transaction_ref: Option<String>,
    ) -> Result<(Payout, Vendor), PayoutError>;

    async fn update_payment_details(&self, vendor_id: i64, details: PaymentDetails) -> Result<Vendor, PayoutError>;

    async fn fetch_vendor_balance(&self, vendor_id: i64) -> Result<Option<VendorBalance>, PayoutError>;

    /// Newest first.
    async fn fetch_payouts_for_vendor(&self, vendor_id: i64) -> Result<Vec<Payout>, PayoutError>;

    /// Newest first.
    async fn search_payouts(&self, status: Option<PayoutStatus>) -> Result<Vec<Payout>, PayoutError>;
}
