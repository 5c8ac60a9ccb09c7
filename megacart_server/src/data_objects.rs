use std::fmt::Display;

use chrono::{DateTime, Utc};
use megacart_engine::{
    db_types::{OrderStatusType, PayoutStatus},
    order_objects::OrderQueryFilter,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// A vendor moving one of their orders along the fulfilment path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// An admin's decision on a pending payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutDecisionRequest {
    pub status: PayoutStatus,
    #[serde(default)]
    pub transaction_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutQuery {
    #[serde(default)]
    pub status: Option<PayoutStatus>,
}

/// Query string form of [`OrderQueryFilter`]. Query strings cannot carry lists, so `status` is comma separated,
/// e.g. `?status=Paid,Shipped`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub buyer_id: Option<i64>,
    pub vendor_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl TryFrom<OrderSearchParams> for OrderQueryFilter {
    type Error = String;

    fn try_from(params: OrderSearchParams) -> Result<Self, Self::Error> {
        let status = params
            .status
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<OrderStatusType>().map_err(|e| e.to_string()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        Ok(OrderQueryFilter {
            buyer_id: params.buyer_id,
            vendor_id: params.vendor_id,
            since: params.since,
            until: params.until,
            status,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestTokenResponse {
    pub guest_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCartRequest {
    pub guest_token: String,
}
