//! Events flowing out of the detection loop and the timer registry

use crate::template::TemplateId;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use tracing::trace;

/// A gated recognition of one cooldown template in one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    pub template_id: TemplateId,
    pub observed_at: Instant,
}

impl RecognitionEvent {
    pub fn now(template_id: TemplateId) -> Self {
        Self {
            template_id,
            observed_at: Instant::now(),
        }
    }
}

/// Everything the detection loop publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionEvent {
    Recognized(RecognitionEvent),
    /// Frame capture has failed this many times in a row
    Degraded { consecutive_failures: u32 },
    /// First successful capture after a degraded notice
    Recovered,
}

/// Everything the timer registry publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Entry created or decayed; `label` is ready to display
    Updated {
        template_id: TemplateId,
        label: String,
        remaining: Duration,
    },
    Removed { template_id: TemplateId },
}

impl TimerEvent {
    pub fn template_id(&self) -> &TemplateId {
        match self {
            TimerEvent::Updated { template_id, .. } | TimerEvent::Removed { template_id } => {
                template_id
            }
        }
    }
}

/// Receiving end of an event stream.
///
/// Publishing never fails from the publisher's point of view: a sink whose
/// consumer has gone away drops the event.
pub trait EventSink<E>: Send + Sync {
    fn publish(&self, event: E);
}

impl<E: Send> EventSink<E> for Sender<E> {
    fn publish(&self, event: E) {
        if self.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }
}

impl<E, S: EventSink<E> + ?Sized> EventSink<E> for Arc<S> {
    fn publish(&self, event: E) {
        (**self).publish(event)
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<E, F> EventSink<E> for FnSink<F>
where
    F: Fn(E) + Send + Sync,
{
    fn publish(&self, event: E) {
        (self.0)(event)
    }
}

/// Delivers every event to each of its sinks, in insertion order.
pub struct Fanout<E> {
    sinks: Vec<Arc<dyn EventSink<E>>>,
}

impl<E> Fanout<E> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: Arc<dyn EventSink<E>>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<E> Default for Fanout<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send> EventSink<E> for Fanout<E> {
    fn publish(&self, event: E) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.publish(event.clone());
            }
            last.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_fanout_delivers_to_every_sink() {
        let (first_tx, first_rx) = mpsc::channel::<DetectionEvent>();
        let (second_tx, second_rx) = mpsc::channel::<DetectionEvent>();
        let fanout = Fanout::<DetectionEvent>::new()
            .with(Arc::new(first_tx))
            .with(Arc::new(second_tx));
        assert_eq!(fanout.len(), 2);

        fanout.publish(DetectionEvent::Recovered);

        assert_eq!(first_rx.try_recv().ok(), Some(DetectionEvent::Recovered));
        assert_eq!(second_rx.try_recv().ok(), Some(DetectionEvent::Recovered));
    }

    #[test]
    fn test_empty_fanout_drops_events() {
        let fanout = Fanout::<DetectionEvent>::default();
        assert!(fanout.is_empty());
        fanout.publish(DetectionEvent::Recovered);
        assert_eq!(fanout.with(Arc::new(FnSink(|_: DetectionEvent| {}))).len(), 1);
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel::<TimerEvent>();
        drop(rx);
        tx.publish(TimerEvent::Removed {
            template_id: TemplateId::new("a.png"),
        });
    }

    #[test]
    fn test_fn_sink() {
        let seen = parking_lot::Mutex::new(Vec::new());
        let sink = FnSink(|id: TemplateId| seen.lock().push(id));
        sink.publish(TemplateId::new("x.png"));
        assert_eq!(seen.lock().as_slice(), &[TemplateId::new("x.png")]);
    }
}
