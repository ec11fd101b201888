// Chat module - message polling, incremental rendering and sending

pub mod composer;
pub mod cursor;
pub mod reconcile;
pub mod render;
pub mod sync_loop;

pub use composer::{MessageComposer, SendOutcome};
pub use cursor::SyncCursor;
pub use reconcile::{ChatState, ViewUpdate};
pub use render::{transcript_html, RenderedMessage};
pub use sync_loop::{SyncHandle, SyncLoop};
