//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every successful toggle answers with the refreshed button fragment plus
//! an `HX-Trigger: cart-updated` header, and the same change is pushed to
//! any other open page over the `/cart/events` SSE stream.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{
        AppendHeaders, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::instrument;

use bodega_core::ProductId;

use crate::cart::CartChanged;
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: u64,
}

/// Cart toggle button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/toggle_button.html")]
pub struct ToggleButtonTemplate {
    pub product_id: u64,
    pub in_cart: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

/// Toggle cart membership of one product (HTMX).
///
/// Returns the refreshed toggle button with an HTMX trigger so listening
/// elements (the count badge) update themselves.
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    Form(form): Form<ToggleForm>,
) -> crate::error::Result<impl IntoResponse> {
    let in_cart = state.cart().toggle(ProductId::new(form.product_id))?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        ToggleButtonTemplate {
            product_id: form.product_id,
            in_cart,
        },
    ))
}

/// Get the cart count badge (HTMX).
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> impl IntoResponse {
    CartCountTemplate {
        count: state.cart().count(),
    }
}

/// Stream cart change notifications (SSE).
///
/// Pages subscribe on load and unsubscribe by disconnecting. A subscriber
/// that lags skips the missed notifications; since every event carries the
/// same "re-read the cart" meaning, skipping is harmless.
#[instrument(skip(state))]
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.cart().subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(CartChanged) => {
                    yield Ok(Event::default().event("cart-updated").data("cart-updated"));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Cart event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
