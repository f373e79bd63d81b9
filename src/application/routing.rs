use crate::domain::event::{Channel, Currency, PaymentEvent, Route};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// `qr-pct` payments in ARS strictly above this amount are deferred.
pub const ASYNC_AMOUNT_THRESHOLD: Decimal = dec!(1000);

/// Picks the processing route for an event. First matching rule wins.
pub fn select_flow(event: &PaymentEvent) -> Route {
    match event.channel() {
        Channel::QrPct
            if event.amount() > ASYNC_AMOUNT_THRESHOLD && event.currency() == Currency::Ars =>
        {
            Route::Async
        }
        Channel::QrTctd => Route::SyncDirect,
        Channel::Link => Route::SyncDelayed,
        // Everything else is processed directly.
        _ => Route::SyncDirect,
    }
}
