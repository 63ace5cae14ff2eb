pub mod config;
pub mod error;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod model;

pub use config::GalleryConfig;
pub use error::{GalleryError, HostError};
pub use geometry::{
    DropZone, classify_drop_zone, insertion_index_from_item_list, insertion_index_from_pointer,
};
pub use id::BlockId;
pub use layout::{ImageWidth, bucket_into_columns, image_widths, width_share};
pub use model::*;
