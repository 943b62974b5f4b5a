/*!
 * Sliding-window subtitle translation.
 *
 * This module contains the translation pipeline. It is split into several
 * submodules:
 *
 * - `codec`: Joining lines into one request and splitting the reply
 * - `engine`: The engine trait and the stateful chat engine
 * - `memory`: Bounded conversation memory for chat engines
 * - `throttle`: Token-bucket pacing of requests
 * - `batch`: Window planning, dispatch and reconciliation
 * - `core`: Engine selection and service definition
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOptions, SlidingWindowBatcher};
pub use self::core::{TranslationService, TranslationStats};
pub use self::engine::{ChatCompletion, ChatEngine, EngineMode, TranslationEngine};
pub use self::memory::ContextMemory;
pub use self::throttle::Throttle;

// Submodules
pub mod batch;
pub mod codec;
pub mod core;
pub mod engine;
pub mod memory;
pub mod throttle;
