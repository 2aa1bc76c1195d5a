//! Request and event counters.

use std::ops::AddAssign;

/// Counters kept by each socket manager.
///
/// `req_pending` is a gauge (requests in flight when the snapshot was
/// taken); everything else only grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatCounters {
    /// Requests handed to the transport.
    pub req_sent: u64,
    /// Requests resolved successfully.
    pub req_success: u64,
    /// Requests resolved with a kernel, handler, send or teardown error.
    pub req_failed: u64,
    /// Requests resolved by timeout.
    pub req_expired: u64,
    pub req_pending: u64,
    /// Unsolicited messages received.
    pub evt_received: u64,
    /// Events at least one listener handler ran for.
    pub evt_handled: u64,
    pub evt_unhandled: u64,
}

impl StatCounters {
    /// Requests resolved one way or another.
    pub fn req_resolved(&self) -> u64 {
        self.req_success + self.req_failed + self.req_expired
    }
}

impl AddAssign for StatCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.req_sent += rhs.req_sent;
        self.req_success += rhs.req_success;
        self.req_failed += rhs.req_failed;
        self.req_expired += rhs.req_expired;
        self.req_pending += rhs.req_pending;
        self.evt_received += rhs.evt_received;
        self.evt_handled += rhs.evt_handled;
        self.evt_unhandled += rhs.evt_unhandled;
    }
}

impl std::iter::Sum for StatCounters {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut total = Self::default();
        for stats in iter {
            total += stats;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        let a = StatCounters {
            req_sent: 3,
            req_success: 2,
            req_expired: 1,
            evt_received: 4,
            ..Default::default()
        };
        let b = StatCounters {
            req_sent: 1,
            req_failed: 1,
            evt_unhandled: 2,
            ..Default::default()
        };
        let total: StatCounters = [a, b].into_iter().sum();
        assert_eq!(total.req_sent, 4);
        assert_eq!(total.req_resolved(), 4);
        assert_eq!(total.evt_received, 4);
        assert_eq!(total.evt_unhandled, 2);
    }
}
