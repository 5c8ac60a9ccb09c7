use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use megacart_engine::{
    events::EventProducers,
    gateway::RazorpayGateway,
    AccountApi,
    CartApi,
    CheckoutApi,
    FulfilmentApi,
    PayoutApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    credit_worker::start_credit_retry_worker,
    errors::ServerError,
    hooks::create_event_handlers,
    middleware::IdentityMiddlewareFactory,
    routes::{
        guest_token,
        health,
        AddCartItemRoute,
        CreateOrderRoute,
        GetCartRoute,
        ListPayoutsRoute,
        MergeCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrdersSearchRoute,
        PayoutHistoryRoute,
        RemoveCartItemRoute,
        RequestPayoutRoute,
        ResolvePayoutRoute,
        SetCartItemRoute,
        UpdateOrderStatusRoute,
        UpdatePaymentDetailsRoute,
        VendorBalanceRoute,
        VendorOrdersRoute,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    info!("🗃️ Database ready at {}", config.database_url);
    let gateway = RazorpayGateway::new(config.razorpay.razorpay_config())
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let retry_api = SettlementApi::new(db.clone(), gateway.clone(), config.market.clone(), producers.clone());
    let _worker = start_credit_retry_worker(retry_api, config.credit_retry_interval);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), config.market.clone());
        let settlement_api =
            SettlementApi::new(db.clone(), gateway.clone(), config.market.clone(), producers.clone());
        let fulfilment_api = FulfilmentApi::new(db.clone(), producers.clone());
        let payout_api = PayoutApi::new(db.clone(), producers.clone());
        let accounts_api = AccountApi::new(db.clone());
        let cart_api = CartApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mcs::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(fulfilment_api))
            .app_data(web::Data::new(payout_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(cart_api));
        // Every route under /api sees the caller's principal, if one was sent
        let api_scope = web::scope("/api")
            .wrap(IdentityMiddlewareFactory::new(config.identity.clone()))
            .service(CreateOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(VendorOrdersRoute::<SqliteDatabase>::new())
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(RequestPayoutRoute::<SqliteDatabase>::new())
            .service(PayoutHistoryRoute::<SqliteDatabase>::new())
            .service(ResolvePayoutRoute::<SqliteDatabase>::new())
            .service(ListPayoutsRoute::<SqliteDatabase>::new())
            .service(VendorBalanceRoute::<SqliteDatabase>::new())
            .service(UpdatePaymentDetailsRoute::<SqliteDatabase>::new())
            .service(GetCartRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(SetCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(MergeCartRoute::<SqliteDatabase>::new())
            .service(guest_token);
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
