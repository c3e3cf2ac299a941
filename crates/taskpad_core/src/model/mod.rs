mod task;

pub use task::{Subtask, Task};
