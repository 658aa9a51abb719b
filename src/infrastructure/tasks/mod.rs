mod memory_task_repository;

pub use memory_task_repository::MemoryTaskRepository;
