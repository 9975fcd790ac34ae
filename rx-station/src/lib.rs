//! Rx Station - pharmacy prescription numbering and label rendering
//!
//! # Architecture
//!
//! - **Numbering** (`sequence`): standard and controlled prescription counters
//!   in an embedded redb database, one atomic increment per prescription
//! - **Rendering** (`render`): medidose grid sheets and 2.25" x 4" die-cut
//!   prescription labels
//! - **Output** (`output`): PDF files, the system print dialog, or label
//!   descriptors sent to the label printer web service
//! - **Service** (`service`): the operations the UI shell calls
//!
//! # Module layout
//!
//! ```text
//! rx-station/src/
//! ├── core/       # configuration
//! ├── sequence/   # counter store + allocator
//! ├── render/     # geometry, grid sheet, prescription label
//! ├── output/     # encoding and delivery
//! ├── service.rs  # LabelService
//! └── utils/      # logging
//! ```

pub mod core;
pub mod output;
pub mod render;
pub mod sequence;
pub mod service;
pub mod utils;

pub use core::Config;
pub use output::{OutputAdapter, OutputMode};
pub use sequence::{CounterStore, RedbCounterStore, SequenceAllocator};
pub use service::{GridReport, IssueReport, LabelService, ServiceError, ServiceResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
