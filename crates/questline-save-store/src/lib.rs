//! File-backed persistence for questline save snapshots.

pub mod json_file_repository;

pub use json_file_repository::JsonFileSaveRepository;
