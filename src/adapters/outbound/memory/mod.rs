/// In-memory adapters for process-local state
mod in_memory_repository;

pub use in_memory_repository::InMemoryRepository;
