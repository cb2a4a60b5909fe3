/// Configuration for the controller actor.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Capacity of the submission queue.
    ///
    /// When full, `submit()` will wait and `try_submit()` will return `Full` error.
    pub queue_capacity: usize,

    /// Capacity of each slot worker's queue.
    pub slot_queue_capacity: usize,

    /// Capacity of the event bus (clamped to at least 1).
    pub bus_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            slot_queue_capacity: 100,
            bus_capacity: 1024,
        }
    }
}
