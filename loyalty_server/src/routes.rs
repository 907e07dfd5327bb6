//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a few lines belong in the engine's API
//! layer, not here.
//!
//! Every handler is async and only awaits on the ledger, so a slow database never blocks an actix worker thread.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use loyalty_engine::{AccrualOracle, AuthApi, BalanceApi, LedgerRepository, OrderApi, OrderSubmission};

use crate::{
    auth::{AuthenticatedUser, TokenIssuer},
    data_objects::{Credentials, OrderResult, WithdrawalRequest, WithdrawalResult},
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

//----------------------------------------------   Users  ----------------------------------------------------
route!(register => Post "/user/register" impl LedgerRepository);
/// Creates a new account and logs the user straight in.
///
/// The access token is returned in the `Authorization` header.
pub async fn register<B: LedgerRepository>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let creds = body.into_inner();
    debug!("💻️ POST register for {}", creds.login);
    let user = api.register(&creds.login, &creds.password).await?;
    let header = signer.bearer_header(user.id, &user.login)?;
    Ok(HttpResponse::Ok().insert_header(header).finish())
}

route!(login => Post "/user/login" impl LedgerRepository);
pub async fn login<B: LedgerRepository>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let creds = body.into_inner();
    debug!("💻️ POST login for {}", creds.login);
    let user = api.login(&creds.login, &creds.password).await?;
    let header = signer.bearer_header(user.id, &user.login)?;
    Ok(HttpResponse::Ok().insert_header(header).finish())
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(upload_order => Post "/user/orders" impl LedgerRepository);
/// Uploads an order number, sent as the plain-text request body.
///
/// * `202` - the number is new and has been queued for processing.
/// * `200` - the caller uploaded this number before.
/// * `409` - another user owns this number.
/// * `422` - the number failed the format check.
pub async fn upload_order<B: LedgerRepository>(
    user: AuthenticatedUser,
    body: String,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("The order number is missing".into()));
    }
    debug!("💻️ POST order {number} for user #{}", user.user_id);
    match api.register_order_number(user.user_id, number).await {
        OrderSubmission::Accepted => Ok(HttpResponse::Accepted().finish()),
        OrderSubmission::SubmittedByThisUser => Ok(HttpResponse::Ok().finish()),
        OrderSubmission::SubmittedByAnotherUser => Err(ServerError::OrderOwnedByAnotherUser),
        OrderSubmission::InvalidFormat => Err(ServerError::InvalidOrderNumber),
        OrderSubmission::InternalError => Err(ServerError::BackendError(format!("Could not register order {number}"))),
    }
}

route!(my_orders => Get "/user/orders" impl LedgerRepository);
/// The caller's orders, newest first. `204` if there are none.
pub async fn my_orders<B: LedgerRepository>(
    user: AuthenticatedUser,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user #{}", user.user_id);
    let orders = api.order_list(user.user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/user/balance" impl LedgerRepository, AccrualOracle);
pub async fn my_balance<B: LedgerRepository, O: AccrualOracle>(
    user: AuthenticatedUser,
    api: web::Data<BalanceApi<B, O>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET balance for user #{}", user.user_id);
    let balance = api.balance(user.user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(withdraw => Post "/user/balance/withdraw" impl LedgerRepository, AccrualOracle);
/// Spends points against an order number.
///
/// * `402` - not enough points.
/// * `422` - the order number failed the format check.
pub async fn withdraw<B: LedgerRepository, O: AccrualOracle>(
    user: AuthenticatedUser,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<BalanceApi<B, O>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawalRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against {order} for user #{}", user.user_id);
    api.withdraw(user.user_id, &order, sum).await?;
    Ok(HttpResponse::Ok().finish())
}

route!(my_withdrawals => Get "/user/withdrawals" impl LedgerRepository, AccrualOracle);
pub async fn my_withdrawals<B: LedgerRepository, O: AccrualOracle>(
    user: AuthenticatedUser,
    api: web::Data<BalanceApi<B, O>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET withdrawals for user #{}", user.user_id);
    let withdrawals = api.withdrawals(user.user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}
