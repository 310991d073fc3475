pub mod cdp_page;
pub mod page;

pub use cdp_page::{CdpElement, CdpPage};
pub use page::{DriverLauncher, ElementRef, PageDriver, PageQuery, ParentInfo};
