pub mod cascade_face_detector;
pub mod haar_cascade;
pub mod integral_image;
pub mod math;
pub mod rect_grouper;
