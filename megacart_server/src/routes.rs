//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler that acts on behalf of someone takes a [`Caller`], which is only available once the identity
//! middleware has checked the `x-principal` header. The engine APIs do the role checks themselves, so the handlers
//! just pass the principal through.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (database calls, the payment gateway) must be awaited, never
//! blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use megacart_engine::{
    db_types::PaymentDetails,
    gateway::PaymentGateway,
    helpers::new_guest_token,
    order_objects::{NewOrderRequest, OrderQueryFilter, PaymentConfirmation},
    traits::{AccountManagement, CartManagement, MarketDatabase},
    AccountApi,
    CartApi,
    CheckoutApi,
    FulfilmentApi,
    PayoutApi,
    SettlementApi,
};

use crate::{
    auth::{CartCaller, Caller},
    data_objects::{
        CartItemRequest,
        GuestTokenResponse,
        JsonResponse,
        MergeCartRequest,
        OrderSearchParams,
        PayoutDecisionRequest,
        PayoutQuery,
        StatusUpdateRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(create_order => Post "/checkout" impl MarketDatabase, PaymentGateway);
/// Buyers check out with a list of products, a shipping address and the total they expect to pay.
///
/// Stock is reserved and a gateway order is created. The response carries the gateway order id the client needs to
/// open the payment form. Nothing is charged yet.
pub async fn create_order<B, G>(
    caller: Caller,
    body: web::Json<NewOrderRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST checkout for {}", *caller);
    let result = api.create_order(&caller, body.into_inner()).await.map_err(|e| {
        debug!("💻️ Checkout failed for {}. {e}", *caller);
        e
    })?;
    Ok(HttpResponse::Created().json(result))
}

route!(verify_payment => Post "/payment/verify" impl MarketDatabase, PaymentGateway);
/// The client relays the gateway's payment callback here. On success the order is `Paid` and every vendor in it has
/// been credited (or queued for credit).
pub async fn verify_payment<B, G>(
    caller: Caller,
    body: web::Json<PaymentConfirmation>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketDatabase,
    G: PaymentGateway,
{
    let confirmation = body.into_inner();
    debug!("💻️ POST verify payment {} for {}", confirmation.gateway_payment_id, *caller);
    let result = api.verify_and_settle(&caller, confirmation).await.map_err(|e| {
        info!("💻️ Payment verification failed for {}. {e}", *caller);
        e
    })?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl AccountManagement);
/// Buyers fetch their own orders, newest first.
pub async fn my_orders<B: AccountManagement>(
    caller: Caller,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", *caller);
    let orders = api.buyer_orders(&caller).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(vendor_orders => Get "/vendor/orders" impl AccountManagement);
/// Vendors fetch every order they sold into. Each order only lists the vendor's own items.
pub async fn vendor_orders<B: AccountManagement>(
    caller: Caller,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET vendor_orders for {}", *caller);
    let orders = api.vendor_orders(&caller).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(orders_search => Get "/search/orders" impl AccountManagement);
pub async fn orders_search<B: AccountManagement>(
    caller: Caller,
    query: web::Query<OrderSearchParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = OrderQueryFilter::try_from(query.into_inner()).map_err(ServerError::InvalidRequestBody)?;
    debug!("💻️ GET orders search for [{query}]");
    let orders = api.all_orders(&caller, query).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/order/{order_id}" impl AccountManagement);
/// One order with its items and status history.
///
/// Buyers can only fetch their own orders, vendors only see their own items, and admins see everything.
pub async fn order_by_id<B: AccountManagement>(
    caller: Caller,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id}) for {}", *caller);
    let detail = api.order_detail(&caller, order_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

route!(update_order_status => Post "/order/{order_id}/status" impl MarketDatabase);
/// Vendors mark an order `Shipped` (with a tracking number) or `Delivered`.
pub async fn update_order_status<B: MarketDatabase>(
    caller: Caller,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<FulfilmentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let StatusUpdateRequest { status, tracking_number } = body.into_inner();
    debug!("💻️ POST update_order_status({order_id} -> {status}) for {}", *caller);
    let order = api.update_order_status(&caller, order_id, status, tracking_number).await.map_err(|e| {
        debug!("💻️ Could not update order #{order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payouts  ----------------------------------------------------
route!(request_payout => Post "/payouts" impl MarketDatabase);
/// Vendors request a payout of their whole available balance.
pub async fn request_payout<B: MarketDatabase>(
    caller: Caller,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST request_payout for {}", *caller);
    let payout = api.request_payout(&caller).await.map_err(|e| {
        debug!("💻️ Payout request refused for {}. {e}", *caller);
        e
    })?;
    Ok(HttpResponse::Created().json(payout))
}

route!(payout_history => Get "/payouts" impl MarketDatabase);
pub async fn payout_history<B: MarketDatabase>(
    caller: Caller,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET payout_history for {}", *caller);
    let payouts = api.payout_history(&caller).await?;
    Ok(HttpResponse::Ok().json(payouts))
}

route!(resolve_payout => Post "/payouts/{payout_id}/resolve" impl MarketDatabase);
/// Admins complete or reject a pending payout.
pub async fn resolve_payout<B: MarketDatabase>(
    caller: Caller,
    path: web::Path<i64>,
    body: web::Json<PayoutDecisionRequest>,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payout_id = path.into_inner();
    let PayoutDecisionRequest { status, transaction_ref } = body.into_inner();
    info!("💻️ POST resolve_payout({payout_id} -> {status}) by {}", *caller);
    let payout = api.resolve_payout(&caller, payout_id, status, transaction_ref).await?;
    Ok(HttpResponse::Ok().json(payout))
}

route!(list_payouts => Get "/admin/payouts" impl MarketDatabase);
pub async fn list_payouts<B: MarketDatabase>(
    caller: Caller,
    query: web::Query<PayoutQuery>,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let status = query.into_inner().status;
    debug!("💻️ GET list_payouts({status:?})");
    let payouts = api.list_payouts(&caller, status).await?;
    Ok(HttpResponse::Ok().json(payouts))
}

route!(vendor_balance => Get "/balance" impl MarketDatabase);
pub async fn vendor_balance<B: MarketDatabase>(
    caller: Caller,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET vendor_balance for {}", *caller);
    let balance = api.vendor_balance(&caller).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(update_payment_details => Put "/payment_details" impl MarketDatabase);
pub async fn update_payment_details<B: MarketDatabase>(
    caller: Caller,
    body: web::Json<PaymentDetails>,
    api: web::Data<PayoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT payment_details for {}", *caller);
    api.update_payment_details(&caller, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment details updated.")))
}

//----------------------------------------------   Carts  ----------------------------------------------------
#[get("/guest_token")]
pub async fn guest_token() -> impl Responder {
    trace!("💻️ Issuing a new guest token");
    HttpResponse::Ok().json(GuestTokenResponse { guest_token: new_guest_token() })
}

route!(get_cart => Get "/cart" impl CartManagement);
pub async fn get_cart<B: CartManagement>(
    caller: CartCaller,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for {}", caller.0);
    let cart = api.cart(&caller.0).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_cart_item => Post "/cart/items" impl CartManagement);
pub async fn add_cart_item<B: CartManagement>(
    caller: CartCaller,
    body: web::Json<CartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CartItemRequest { product_id, quantity } = body.into_inner();
    debug!("💻️ POST cart item {product_id} x{quantity} for {}", caller.0);
    let item = api.add_item(&caller.0, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(set_cart_item => Put "/cart/items" impl CartManagement);
/// Sets the quantity of a product in the cart. A quantity of zero removes it.
pub async fn set_cart_item<B: CartManagement>(
    caller: CartCaller,
    body: web::Json<CartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CartItemRequest { product_id, quantity } = body.into_inner();
    debug!("💻️ PUT cart item {product_id} x{quantity} for {}", caller.0);
    let item = api.set_quantity(&caller.0, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(remove_cart_item => Delete "/cart/items/{product_id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    caller: CartCaller,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ DELETE cart item {product_id} for {}", caller.0);
    let removed = api.remove_item(&caller.0, product_id).await?;
    let result = if removed {
        JsonResponse::success(format!("Product {product_id} removed from the cart."))
    } else {
        JsonResponse::failure(format!("Product {product_id} was not in the cart."))
    };
    Ok(HttpResponse::Ok().json(result))
}

route!(merge_cart => Post "/cart/merge" impl CartManagement);
/// Called right after a guest signs in, to carry their guest cart over to their account.
pub async fn merge_cart<B: CartManagement>(
    caller: Caller,
    body: web::Json<MergeCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST merge guest cart for {}", *caller);
    let cart = api.merge_guest_cart(&caller, &body.guest_token).await?;
    Ok(HttpResponse::Ok().json(cart))
}
