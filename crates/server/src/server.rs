use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::{balances, funds, members, transactions};
use engine::{Engine, MemberId, QuickParser};

static MEMBER_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-member-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub parser: Arc<QuickParser>,
}

impl ServerState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
            parser: Arc::new(QuickParser),
        }
    }
}

/// `TypedHeader` for the acting member.
///
/// Every request must carry an "x-member-id" entry. It names the caller,
/// authentication happens upstream.
#[derive(Debug)]
struct MemberHeader(MemberId);

impl Header for MemberHeader {
    fn name() -> &'static axum::http::HeaderName {
        &MEMBER_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(member_id) = MemberId::parse(value) else {
            return Err(AxumError::invalid());
        };

        Ok(MemberHeader(member_id))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(self.0.as_str()) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-member-id header"),
        }
    }
}

async fn identify(
    TypedHeader(MemberHeader(member_id)): TypedHeader<MemberHeader>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(member_id);
    next.run(request).await
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/funds", post(funds::fund_new).get(funds::list))
        .route("/funds/{fund_id}", get(funds::get).delete(funds::remove))
        .route(
            "/funds/{fund_id}/members",
            get(members::list).post(members::add),
        )
        .route(
            "/funds/{fund_id}/members/{member_id}",
            delete(members::remove),
        )
        .route(
            "/funds/{fund_id}/transactions",
            get(transactions::list).post(transactions::append),
        )
        .route(
            "/funds/{fund_id}/transactions/preview",
            post(transactions::preview),
        )
        .route(
            "/funds/{fund_id}/transactions/parse",
            post(transactions::parse),
        )
        .route(
            "/funds/{fund_id}/transactions/{tx_id}",
            get(transactions::get),
        )
        .route(
            "/funds/{fund_id}/transactions/{tx_id}/void",
            post(transactions::void_tx),
        )
        .route("/funds/{fund_id}/balances", get(balances::get))
        .route("/funds/{fund_id}/settlement", get(balances::settlement))
        .route_layer(middleware::from_fn(identify))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState::new(engine))).await
}
