// Upload module - sequential batch uploads to the transfer server
//
// Files are sent one at a time; each gets its own outcome and the batch gets
// a summary once the last one finishes.

pub mod progress_tracker;
pub mod upload_queue;

pub use progress_tracker::UploadBatchResult;
pub use upload_queue::{process_upload_batch, UploadTask};
