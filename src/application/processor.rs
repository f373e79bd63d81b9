use crate::domain::event::{PaymentEvent, ProcessedEvent, ProcessingOutcome, ProcessingStatus};

/// Applies the business rules to a validated event.
///
/// Pure and total: no clock, no I/O, never fails.
pub fn process(event: &PaymentEvent) -> ProcessedEvent {
    ProcessedEvent {
        event: event.clone(),
        outcome: ProcessingOutcome {
            processed_amount: event.amount(),
            processed_currency: event.currency(),
            processing_status: ProcessingStatus::Completed,
            business_rules_applied: true,
        },
    }
}
