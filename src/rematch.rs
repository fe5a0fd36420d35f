//! Rematch handshake.
//!
//! Tracks one offer between a finished game and either a new game or the
//! menu. The coordinator decides what to say on the wire; the session
//! machine turns its steps into frames and phase changes.

use derive_more::Display;
use tracing::{debug, instrument};

/// Which side opened the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Initiator {
    /// We asked first.
    Local,
    /// The opponent asked first.
    Remote,
}

/// One side's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Decision {
    /// Not answered yet.
    Pending,
    /// Agreed to play again.
    Accepted,
    /// Refused.
    Declined,
}

/// An open rematch offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RematchOffer {
    /// Who asked first.
    pub initiated_by: Initiator,
    /// Our answer.
    pub local: Decision,
    /// The opponent's answer.
    pub remote: Decision,
}

impl RematchOffer {
    /// Both ends agreed.
    pub fn agreed(&self) -> bool {
        self.local == Decision::Accepted && self.remote == Decision::Accepted
    }

    /// Either end refused.
    pub fn declined(&self) -> bool {
        self.local == Decision::Declined || self.remote == Decision::Declined
    }

    /// The opponent asked and we have not answered.
    pub fn awaiting_local_answer(&self) -> bool {
        self.local == Decision::Pending && self.remote == Decision::Accepted
    }
}

/// What the coordinator wants done after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RematchStep {
    /// Send `rematch_request`.
    SendRequest,
    /// Send `rematch_response{accepted}`.
    SendResponse(bool),
    /// Ask the user to accept or decline.
    Prompt,
    /// Send `start_rematch`.
    StartRematch,
    /// The offer is dead; both ends go back to the menu.
    Declined,
}

/// Drives a single rematch offer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RematchCoordinator {
    offer: Option<RematchOffer>,
    start_sent: bool,
}

impl RematchCoordinator {
    /// A coordinator with no offer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The open offer, if any.
    pub fn offer(&self) -> Option<&RematchOffer> {
        self.offer.as_ref()
    }

    /// Whether `start_rematch` has gone out for this offer.
    pub fn start_sent(&self) -> bool {
        self.start_sent
    }

    /// The local user asked to play again.
    ///
    /// If the opponent had already asked, this counts as accepting.
    #[instrument(skip(self))]
    pub fn request_local(&mut self) -> Vec<RematchStep> {
        match self.offer {
            None => {
                self.offer = Some(RematchOffer {
                    initiated_by: Initiator::Local,
                    local: Decision::Accepted,
                    remote: Decision::Pending,
                });
                vec![RematchStep::SendRequest]
            }
            Some(offer) if offer.awaiting_local_answer() => self.accept_local(),
            Some(_) => {
                debug!("Rematch already requested");
                Vec::new()
            }
        }
    }

    /// The opponent sent `rematch_request`.
    #[instrument(skip(self))]
    pub fn remote_request(&mut self) -> Vec<RematchStep> {
        match self.offer {
            None => {
                self.offer = Some(RematchOffer {
                    initiated_by: Initiator::Remote,
                    local: Decision::Pending,
                    remote: Decision::Accepted,
                });
                vec![RematchStep::Prompt]
            }
            Some(mut offer) if offer.remote == Decision::Pending && !offer.declined() => {
                debug!("Requests crossed, treating both as accepted");
                offer.remote = Decision::Accepted;
                self.offer = Some(offer);
                self.start_if_agreed()
            }
            Some(_) => Vec::new(),
        }
    }

    /// The local user accepted a prompt.
    #[instrument(skip(self))]
    pub fn accept_local(&mut self) -> Vec<RematchStep> {
        let Some(offer) = self.offer.as_mut() else {
            return Vec::new();
        };
        if offer.local != Decision::Pending {
            return Vec::new();
        }
        offer.local = Decision::Accepted;
        let mut steps = vec![RematchStep::SendResponse(true)];
        steps.extend(self.start_if_agreed());
        steps
    }

    /// The local user declined, or the offer expired.
    #[instrument(skip(self))]
    pub fn decline_local(&mut self) -> Vec<RematchStep> {
        let Some(offer) = self.offer.as_mut() else {
            return Vec::new();
        };
        if offer.declined() {
            return Vec::new();
        }
        offer.local = Decision::Declined;
        vec![RematchStep::SendResponse(false), RematchStep::Declined]
    }

    /// The opponent sent `rematch_response`.
    #[instrument(skip(self))]
    pub fn remote_response(&mut self, accepted: bool) -> Vec<RematchStep> {
        let Some(offer) = self.offer.as_mut() else {
            debug!("Response without an offer");
            return Vec::new();
        };
        if offer.declined() {
            return Vec::new();
        }
        if accepted {
            offer.remote = Decision::Accepted;
            self.start_if_agreed()
        } else {
            offer.remote = Decision::Declined;
            vec![RematchStep::Declined]
        }
    }

    fn start_if_agreed(&mut self) -> Vec<RematchStep> {
        match self.offer {
            Some(offer) if offer.agreed() && !self.start_sent => {
                self.start_sent = true;
                vec![RematchStep::StartRematch]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_request_then_acceptance() {
        let mut rematch = RematchCoordinator::new();
        assert_eq!(rematch.request_local(), vec![RematchStep::SendRequest]);
        assert_eq!(rematch.request_local(), vec![]);
        assert_eq!(rematch.remote_response(true), vec![RematchStep::StartRematch]);
        assert!(rematch.offer().unwrap().agreed());
        assert_eq!(rematch.remote_response(true), vec![]);
    }

    #[test]
    fn test_remote_request_prompts_then_accept() {
        let mut rematch = RematchCoordinator::new();
        assert_eq!(rematch.remote_request(), vec![RematchStep::Prompt]);
        assert!(rematch.offer().unwrap().awaiting_local_answer());
        assert_eq!(
            rematch.accept_local(),
            vec![RematchStep::SendResponse(true), RematchStep::StartRematch]
        );
        assert!(rematch.start_sent());
    }

    #[test]
    fn test_crossed_requests_count_as_acceptance() {
        let mut rematch = RematchCoordinator::new();
        rematch.request_local();
        assert_eq!(rematch.remote_request(), vec![RematchStep::StartRematch]);
        assert_eq!(rematch.remote_request(), vec![]);
    }

    #[test]
    fn test_request_after_prompt_accepts() {
        let mut rematch = RematchCoordinator::new();
        rematch.remote_request();
        assert_eq!(
            rematch.request_local(),
            vec![RematchStep::SendResponse(true), RematchStep::StartRematch]
        );
    }

    #[test]
    fn test_decline_paths() {
        let mut rematch = RematchCoordinator::new();
        rematch.remote_request();
        assert_eq!(
            rematch.decline_local(),
            vec![RematchStep::SendResponse(false), RematchStep::Declined]
        );
        assert_eq!(rematch.decline_local(), vec![]);

        let mut rematch = RematchCoordinator::new();
        rematch.request_local();
        assert_eq!(rematch.remote_response(false), vec![RematchStep::Declined]);
        assert!(rematch.offer().unwrap().declined());
    }
}
