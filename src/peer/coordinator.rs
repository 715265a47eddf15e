//! Offer/answer exchange decision.
//!
//! A produced local description is always applied locally and forwarded to
//! the paired peer exactly once. Only the initiator goes on to ask for an
//! answer, so the answer direction ends the exchange.

use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStep {
    /// Forward the description; nothing follows.
    Forward,
    /// Forward the description, then ask the paired peer for an answer.
    ForwardAndRequestAnswer,
}

impl ExchangeStep {
    pub fn requests_answer(&self) -> bool {
        matches!(self, ExchangeStep::ForwardAndRequestAnswer)
    }
}

pub fn next_step(role: Role) -> ExchangeStep {
    match role {
        Role::Initiator => ExchangeStep::ForwardAndRequestAnswer,
        Role::Responder => ExchangeStep::Forward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiator_requests_answer() {
        assert_eq!(
            next_step(Role::Initiator),
            ExchangeStep::ForwardAndRequestAnswer
        );
        assert!(next_step(Role::Initiator).requests_answer());
    }

    #[test]
    fn test_responder_terminates_exchange() {
        assert_eq!(next_step(Role::Responder), ExchangeStep::Forward);
        assert!(!next_step(Role::Responder).requests_answer());
    }
}
