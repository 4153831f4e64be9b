pub mod nasdaq;
pub mod reference;

pub use nasdaq::NasdaqDataLinkProvider;
pub use reference::ReferenceFile;
