pub mod batch_report;
pub mod batch_reporter;
pub mod infrastructure;
pub mod transcribe_folder_use_case;
