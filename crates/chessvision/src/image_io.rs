use crate::{board, core};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the image-backed helpers.
#[derive(thiserror::Error, Debug)]
pub enum ImageIoError {
    #[error(transparent)]
    Decode(#[from] ::image::ImageError),

    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidGrayDimensions { width: usize, height: usize },

    #[error(transparent)]
    Board(#[from] board::BoardError),
}

/// Borrow an `image::GrayImage` as the lightweight core view type.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy an `image::GrayImage` into the owned core raster.
pub fn gray_from_image(img: &::image::GrayImage) -> core::GrayImage {
    core::GrayImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Convert the core raster back into an `image::GrayImage`.
pub fn gray_to_image(gray: &core::GrayImage) -> Result<::image::GrayImage, ImageIoError> {
    let invalid = ImageIoError::InvalidGrayDimensions {
        width: gray.width,
        height: gray.height,
    };
    let (Ok(w), Ok(h)) = (u32::try_from(gray.width), u32::try_from(gray.height)) else {
        return Err(invalid);
    };
    ::image::GrayImage::from_raw(w, h, gray.data.clone()).ok_or(invalid)
}

/// Decode any supported image file and convert it to 8-bit luma.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn load_gray_image(path: impl AsRef<Path>) -> Result<core::GrayImage, ImageIoError> {
    let path = path.as_ref();
    let img = ::image::open(path)?.to_luma8();
    log::debug!(
        "loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(gray_from_image(&img))
}

/// Load the config's image and build a board from its correspondences.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn board_from_config(cfg: &board::BoardCreateConfig) -> Result<board::Board, ImageIoError> {
    let image = load_gray_image(&cfg.image_path)?;
    let source = cfg.board_source(image)?;
    Ok(board::Board::with_options(
        source,
        &board::DltEstimator,
        &cfg.features,
    )?)
}
