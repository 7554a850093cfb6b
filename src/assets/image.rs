use std::path::Path;

use crate::{
    compositor::traits::ImageSource,
    foundation::core::Size,
    foundation::error::{SceneError, SceneResult},
};

/// Read the pixel size of the image at `path` without decoding its pixels.
pub fn probe_image(path: &Path) -> SceneResult<ImageSource> {
    let (width, height) = image::image_dimensions(path).map_err(|e| {
        SceneError::acquisition(path.display().to_string(), format!("probe image: {e}"))
    })?;
    Ok(ImageSource {
        path: path.to_path_buf(),
        natural_size: Size::new(f64::from(width), f64::from(height)),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image.rs"]
mod tests;
