pub mod console_notifier;
pub mod discord_notifier;
pub mod document_state;
pub mod fake_github;
pub mod github_client;
pub mod json_file_store;
pub mod memory_store;
pub mod multi_notifier;
pub mod sqlite_store;
pub mod tokio_timer;
