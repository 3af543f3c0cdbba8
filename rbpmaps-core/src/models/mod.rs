pub mod event;
pub mod feature;
pub mod interval;
pub mod strand;
pub mod window;

// re-export for cleaner imports
pub use self::event::EventType;
pub use self::feature::{Feature, FeatureRecord};
pub use self::interval::GenomicInterval;
pub use self::strand::Strand;
pub use self::window::WindowSpec;
