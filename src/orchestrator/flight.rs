use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// At most one holder at a time. Acquiring while held fails instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

/// Proof of holding a [`SingleFlight`]; released on drop
#[derive(Debug)]
pub struct FlightToken {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<FlightToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightToken {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for FlightToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let flight = SingleFlight::new();
        let token = flight.try_acquire();
        assert!(token.is_some());
        assert!(flight.is_busy());
        assert!(flight.try_acquire().is_none());

        drop(token);
        assert!(!flight.is_busy());
        assert!(flight.try_acquire().is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let flight = SingleFlight::new();
        let other = flight.clone();
        let _token = flight.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }

    #[tokio::test]
    async fn test_token_released_when_task_ends() {
        let flight = SingleFlight::new();
        let token = flight.try_acquire().unwrap();
        let handle = tokio::spawn(async move {
            let _held = token;
        });
        handle.await.unwrap();
        assert!(flight.try_acquire().is_some());
    }
}
