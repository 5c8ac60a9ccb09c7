use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{PaymentDetails, Payout, PayoutStatus, Principal, Role, Vendor, VendorBalance},
    events::{EventProducers, PayoutEvent},
    notifier,
    traits::{CatalogManagement, PayoutError, PayoutManagement},
};

/// `PayoutApi` covers vendor withdrawals: requesting the available balance, admin approval or rejection, and the
/// supporting balance and payment detail queries.
pub struct PayoutApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PayoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi")
    }
}

impl<B> PayoutApi<B>
where B: PayoutManagement + CatalogManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Requests a payout of the vendor's entire available balance. The balance drops to zero until the request is
    /// resolved.
    pub async fn request_payout(&self, principal: &Principal) -> Result<Payout, PayoutError> {
        principal.require_role(Role::Vendor).map_err(PayoutError::PermissionDenied)?;
        let payout = self.db.request_payout(principal.id).await?;
        info!("🏦️ {principal} requested payout #{} for {}", payout.id, payout.amount);
        match self.db.fetch_vendor(principal.id).await {
            Ok(Some(vendor)) => self.notify_vendor(&vendor, &payout).await,
            Ok(None) => warn!("🏦️ Vendor #{} vanished after requesting a payout", principal.id),
            Err(e) => warn!("🏦️ Could not look up vendor #{}. {e}", principal.id),
        }
        self.producers.publish_payout(PayoutEvent::new(payout.clone())).await;
        Ok(payout)
    }

    /// Marks a pending payout as `Completed` or `Rejected`. A rejected payout's amount goes back into the vendor's
    /// available balance.
    pub async fn resolve_payout(
        &self,
        principal: &Principal,
        payout_id: i64,
        decision: PayoutStatus,
        transaction_ref: Option<String>,
    ) -> Result<Payout, PayoutError> {
        principal.require_role(Role::Admin).map_err(PayoutError::PermissionDenied)?;
        let transaction_ref = transaction_ref.filter(|r| !r.trim().is_empty());
        let (payout, vendor) = self.db.resolve_payout(payout_id, decision, transaction_ref).await?;
        info!("🏦️ {principal} resolved payout #{payout_id} for vendor #{} as {decision}", payout.vendor_id);
        self.notify_vendor(&vendor, &payout).await;
        self.producers.publish_payout(PayoutEvent::new(payout.clone())).await;
        Ok(payout)
    }

    pub async fn update_payment_details(
        &self,
        principal: &Principal,
        details: PaymentDetails,
    ) -> Result<Vendor, PayoutError> {
        principal.require_role(Role::Vendor).map_err(PayoutError::PermissionDenied)?;
        let vendor = self.db.update_payment_details(principal.id, details).await?;
        debug!("🏦️ Payment details updated for {principal}");
        Ok(vendor)
    }

    pub async fn vendor_balance(&self, principal: &Principal) -> Result<VendorBalance, PayoutError> {
        principal.require_role(Role::Vendor).map_err(PayoutError::PermissionDenied)?;
        self.db.fetch_vendor_balance(principal.id).await?.ok_or(PayoutError::VendorNotFound(principal.id))
    }

    pub async fn payout_history(&self, principal: &Principal) -> Result<Vec<Payout>, PayoutError> {
        principal.require_role(Role::Vendor).map_err(PayoutError::PermissionDenied)?;
        self.db.fetch_payouts_for_vendor(principal.id).await
    }

    /// Admin listing of payouts, optionally restricted to one status.
    pub async fn list_payouts(
        &self,
        principal: &Principal,
        status: Option<PayoutStatus>,
    ) -> Result<Vec<Payout>, PayoutError> {
        principal.require_role(Role::Admin).map_err(PayoutError::PermissionDenied)?;
        self.db.search_payouts(status).await
    }

    async fn notify_vendor(&self, vendor: &Vendor, payout: &Payout) {
        self.producers.notify(notifier::vendor_payout_update(&vendor.email, payout)).await;
    }
}
