mod distro;
mod settings;

pub use distro::{DistroDescriptor, DistroRegistry};
pub use settings::{APP_NAME, CONFIG_FILENAME, Settings, TagStyle};
