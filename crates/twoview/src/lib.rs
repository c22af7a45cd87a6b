#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use twoview_image as image;

#[doc(inline)]
pub use twoview_imgproc as imgproc;

#[doc(inline)]
pub use twoview_3d as k3d;

#[doc(inline)]
pub use twoview_stereo as stereo;
