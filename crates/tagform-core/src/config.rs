/// Default number of registry slots created at init.
pub const DEFAULT_INITIAL_CAPACITY: usize = 8;

/// Default registry growth step.
pub const DEFAULT_REGISTRY_STEP: usize = 8;

/// Default number of tracking slots in a fresh scoped allocator.
pub const DEFAULT_ALLOCATOR_CAPACITY: usize = 16;

/// Default scoped allocator growth step.
pub const DEFAULT_ALLOCATOR_STEP: usize = 8;

/// Sizing of the engine's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Registry slots allocated by `Engine::init`.
    pub initial_capacity: usize,
    /// Slots added when the registry is full.
    pub registry_step: usize,
    /// Tracking slots in each handler's scoped allocator.
    pub allocator_capacity: usize,
    /// Tracking slots added when an allocator is full.
    pub allocator_step: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            registry_step: DEFAULT_REGISTRY_STEP,
            allocator_capacity: DEFAULT_ALLOCATOR_CAPACITY,
            allocator_step: DEFAULT_ALLOCATOR_STEP,
        }
    }
}
