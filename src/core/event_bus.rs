use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::terrain::chunk::ChunkPosition;
use crate::terrain::mesh_generator::MeshPayload;

/// EventBus
///
/// Carries chunk lifecycle signals from the streaming manager to whatever owns
/// the scene graph (placeholders, render instances, debug overlays).
/// Handlers run synchronously on the publishing thread, which for chunk events
/// is always the consumer thread.

// Boxed event handler type
type BoxedHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

// Generic event bus for type-safe event handling
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<TypeId, Vec<BoxedHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    // Subscribe to a specific event type
    pub fn subscribe<T, F>(&self, handler: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        // Create a type-erased handler
        let boxed_handler: BoxedHandler = Arc::new(move |event: &dyn Any| {
            if let Some(specific_event) = event.downcast_ref::<T>() {
                handler(specific_event);
            }
        });

        self.lock()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(boxed_handler);
    }

    // Publish an event to all relevant handlers
    pub fn publish<T>(&self, event: T)
    where
        T: Send + Sync + 'static,
    {
        // Clone the handler list so a handler may subscribe without deadlocking.
        let handlers = self.lock().get(&TypeId::of::<T>()).cloned();

        if let Some(event_handlers) = handlers {
            for handler in event_handlers {
                handler(&event);
            }
        }
    }

    pub fn subscriber_count<T: 'static>(&self) -> usize {
        self.lock().get(&TypeId::of::<T>()).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, Vec<BoxedHandler>>> {
        self.handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// --- Chunk events ---

/// A chunk was shown or hidden this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkVisibilityChanged {
    pub position: ChunkPosition,
    pub visible: bool,
}

/// A chunk received its mesh and can be displayed from now on.
#[derive(Debug, Clone)]
pub struct ChunkMeshReady {
    pub position: ChunkPosition,
    pub mesh: Arc<MeshPayload>,
    pub visible: bool,
}

/// A chunk record was dropped by the retention policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEvicted {
    pub position: ChunkPosition,
}

#[cfg(test)]
mod event_bus_tests {
    use super::*;

    #[derive(Debug)]
    struct TestEvent;

    #[derive(Debug)]
    struct DataEvent {
        data: String,
    }

    // Basic event publication and subscription
    #[test]
    fn test_simple_event_subscription() {
        let event_bus = EventBus::new();
        let received = Arc::new(Mutex::new(false));
        let test_received = Arc::clone(&received);

        event_bus.subscribe(move |_: &TestEvent| {
            *test_received.lock().unwrap() = true;
        });

        event_bus.publish(TestEvent);

        assert!(*received.lock().unwrap());
    }

    // Multiple subscribers test
    #[test]
    fn test_multiple_subscribers() {
        let event_bus = EventBus::new();
        let received_count = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let count_clone = Arc::clone(&received_count);
            event_bus.subscribe(move |_: &TestEvent| {
                *count_clone.lock().unwrap() += 1;
            });
        }

        event_bus.publish(TestEvent);

        assert_eq!(*received_count.lock().unwrap(), 3);
        assert_eq!(event_bus.subscriber_count::<TestEvent>(), 3);
    }

    // Event data passing test
    #[test]
    fn test_event_data_passing() {
        let event_bus = EventBus::new();
        let received_data = Arc::new(Mutex::new(None));
        let data_clone = Arc::clone(&received_data);

        event_bus.subscribe(move |event: &DataEvent| {
            *data_clone.lock().unwrap() = Some(event.data.clone());
        });

        event_bus.publish(DataEvent {
            data: "Test Data".to_string(),
        });

        assert_eq!(*received_data.lock().unwrap(), Some("Test Data".to_string()));
    }

    // Events of other types do not reach the handler
    #[test]
    fn test_type_isolation() {
        let event_bus = EventBus::new();
        let received = Arc::new(Mutex::new(0));
        let received_clone = Arc::clone(&received);

        event_bus.subscribe(move |_: &ChunkEvicted| {
            *received_clone.lock().unwrap() += 1;
        });

        event_bus.publish(TestEvent);
        event_bus.publish(ChunkVisibilityChanged {
            position: ChunkPosition::new(0, 0),
            visible: true,
        });

        assert_eq!(*received.lock().unwrap(), 0);
    }
}
