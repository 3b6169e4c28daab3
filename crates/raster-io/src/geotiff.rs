//! Minimal GeoTIFF writer and reader for single-band float rasters.
//!
//! Only what the pipeline needs is supported: one `f32` sample per pixel,
//! geographic (EPSG:4326) coordinates, georeferencing through
//! ModelPixelScale + ModelTiepoint, and the GDAL no-data tag.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use aq_common::{AqError, AqResult, GeoGrid};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

use crate::Raster;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// GeoKey directory: version 1.1.0, 3 keys.
/// GTModelType = geographic, GTRasterType = pixel is area, GeographicType = WGS 84.
const GEO_KEYS_WGS84: [u16; 16] = [
    1, 1, 0, 3, //
    1024, 0, 1, 2, //
    1025, 0, 1, 1, //
    2048, 0, 1, 4326,
];

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn tiff_err(path: &Path, e: impl std::fmt::Display) -> AqError {
    AqError::Raster(format!("{}: {}", path.display(), e))
}

/// Write a raster to `path` as a single-band `f32` GeoTIFF.
///
/// NaN pixels are replaced by the raster's no-data value when it has one.
pub fn export_geotiff(raster: &Raster, path: impl AsRef<Path>) -> AqResult<()> {
    let path = path.as_ref();
    if raster.grid.is_empty() {
        return Err(AqError::Raster(format!(
            "refusing to export an empty raster to {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let values: Vec<f32> = match raster.nodata {
        Some(nodata) => raster
            .values
            .iter()
            .map(|v| if v.is_nan() { nodata } else { *v })
            .collect(),
        None => raster.values.clone(),
    };

    let grid = &raster.grid;
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(|e| tiff_err(path, e))?;
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(grid.nx as u32, grid.ny as u32)
        .map_err(|e| tiff_err(path, e))?;

    let scale = [grid.dx, grid.dy, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, grid.origin_x, grid.origin_y, 0.0];
    let dir = image.encoder();
    dir.write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(|e| tiff_err(path, e))?;
    dir.write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(|e| tiff_err(path, e))?;
    dir.write_tag(tag(GEO_KEY_DIRECTORY), &GEO_KEYS_WGS84[..])
        .map_err(|e| tiff_err(path, e))?;
    if let Some(nodata) = raster.nodata {
        dir.write_tag(tag(GDAL_NODATA), format!("{}", nodata).as_str())
            .map_err(|e| tiff_err(path, e))?;
    }

    image.write_data(&values).map_err(|e| tiff_err(path, e))?;

    debug!(
        path = %path.display(),
        width = grid.nx,
        height = grid.ny,
        "Exported GeoTIFF"
    );
    Ok(())
}

/// Read a single-band `f32` GeoTIFF written by [`export_geotiff`] (or any
/// north-up GeoTIFF georeferenced by pixel scale and tie point).
///
/// No-data pixels keep their on-disk value; use [`Raster::is_valid`].
pub fn read_geotiff(path: impl AsRef<Path>) -> AqResult<Raster> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| tiff_err(path, e))?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| tiff_err(path, e))?;

    let (width, height) = decoder.dimensions().map_err(|e| tiff_err(path, e))?;
    let scale = decoder
        .get_tag_f64_vec(tag(MODEL_PIXEL_SCALE))
        .map_err(|e| tiff_err(path, format!("missing pixel scale: {}", e)))?;
    let tiepoint = decoder
        .get_tag_f64_vec(tag(MODEL_TIEPOINT))
        .map_err(|e| tiff_err(path, format!("missing tie point: {}", e)))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(tiff_err(path, "malformed georeferencing tags"));
    }

    // Tie point maps raster (i, j) to model (x, y)
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    let grid = GeoGrid::new(
        x - i * scale[0],
        y + j * scale[1],
        scale[0],
        scale[1],
        width as usize,
        height as usize,
    );

    let nodata = match decoder
        .find_tag(tag(GDAL_NODATA))
        .map_err(|e| tiff_err(path, e))?
    {
        Some(value) => {
            let text = value.into_string().map_err(|e| tiff_err(path, e))?;
            let text = text.trim_end_matches('\0').trim();
            Some(
                text.parse::<f32>()
                    .map_err(|e| tiff_err(path, format!("bad no-data value '{}': {}", text, e)))?,
            )
        }
        None => None,
    };

    let values = match decoder.read_image().map_err(|e| tiff_err(path, e))? {
        DecodingResult::F32(values) => values,
        DecodingResult::F64(values) => values.into_iter().map(|v| v as f32).collect(),
        _ => return Err(tiff_err(path, "expected floating point samples")),
    };

    Raster::new(grid, values, nodata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/pm25.tif");
        let raster = Raster::new(GeoGrid::new(9.0, 54.0, 0.5, 0.5, 2, 1), vec![1.0, 2.0], None)
            .unwrap();

        export_geotiff(&raster, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_raster_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let raster = Raster::new(GeoGrid::empty(), vec![], None).unwrap();
        let err = export_geotiff(&raster, dir.path().join("empty.tif")).unwrap_err();
        assert!(matches!(err, AqError::Raster(_)));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_geotiff("/definitely/not/here.tif").unwrap_err();
        assert!(err.to_string().contains("here.tif"));
    }
}
