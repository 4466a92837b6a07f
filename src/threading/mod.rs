pub mod thread_pool;
pub mod completion_queue;
pub mod task;

pub use thread_pool::ThreadPool;
pub use completion_queue::CompletionQueue;
pub use task::TaskHandle;
