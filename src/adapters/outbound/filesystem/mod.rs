/// Filesystem adapters for file I/O operations
mod file_reader;
mod file_writer;
mod json_file_repository;

pub use file_reader::FileSystemReader;
pub use file_writer::{FileSystemWriter, StdoutPresenter};
pub use json_file_repository::JsonFileRepository;
