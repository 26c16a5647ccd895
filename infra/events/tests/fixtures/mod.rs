use std::sync::Arc;
use tokio::sync::mpsc;
use toggle_event_bus::ListenerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent(pub usize);

/// Listener that forwards every event to a channel so tests can observe delivery.
pub fn recording_listener(
    tx: mpsc::UnboundedSender<usize>,
) -> impl Fn(&TestEvent) -> Result<(), ListenerError> + Send + Sync + 'static {
    move |event: &TestEvent| {
        tx.send(event.0).map_err(|e| ListenerError::from(e.to_string()))?;
        Ok(())
    }
}

pub async fn collect(rx: &mut mpsc::UnboundedReceiver<usize>, n: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        match tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv()).await {
            Ok(Some(value)) => out.push(value),
            _ => break,
        }
    }
    out
}

pub fn shared(value: usize) -> Arc<TestEvent> {
    Arc::new(TestEvent(value))
}
