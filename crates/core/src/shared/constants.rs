pub const CASCADE_NAME: &str = "haarcascade_frontalface_alt.xml";
pub const CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_alt.xml";

/// Application directory under the platform cache root.
pub const APP_CACHE_DIR: &str = "FeelVision";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
