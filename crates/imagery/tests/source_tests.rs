//! Scene source tests against on-disk and in-memory catalogs.

use aq_common::{BoundingBox, DateWindow};
use imagery::{CollectionQuery, DirectorySceneSource, Image, MemorySceneSource, SceneSource};
use raster_io::{export_geotiff, Raster};
use test_utils::{constant_band, date, grid::SQUARE_REGION_GRID, masked_band};

const NO2: &str = "COPERNICUS/S5P/OFFL/L3_NO2";
const NO2_BAND: &str = "NO2_column_number_density";

fn hamburg() -> BoundingBox {
    SQUARE_REGION_GRID.bbox()
}

fn scene(y: i32, m: u32, d: u32, value: f32) -> Image {
    Image::new(format!("{}-{}-{}", y, m, d), Some(date(y, m, d)), SQUARE_REGION_GRID)
        .with_band(NO2_BAND, constant_band(&SQUARE_REGION_GRID, value))
        .unwrap()
}

// ============================================================================
// MemorySceneSource
// ============================================================================

#[tokio::test]
async fn test_memory_source_filters_window_and_band() {
    let source = MemorySceneSource::new().with_images(
        NO2,
        vec![scene(2025, 1, 1, 1.0), scene(2025, 1, 20, 2.0), scene(2025, 3, 1, 3.0)],
    );

    let january = CollectionQuery::new(
        NO2,
        NO2_BAND,
        hamburg(),
        DateWindow::parse("2025-01-01", "2025-02-01").unwrap(),
    );
    let collection = source.fetch(&january).await.unwrap();
    assert_eq!(collection.len(), 2);

    let wrong_band = CollectionQuery::new(NO2, "other", hamburg(), january.window);
    assert!(source.fetch(&wrong_band).await.unwrap().is_empty());
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_memory_source_filters_bounds() {
    let source = MemorySceneSource::new().with_images(NO2, vec![scene(2025, 1, 1, 1.0)]);
    let far = CollectionQuery::new(
        NO2,
        NO2_BAND,
        BoundingBox::new(-80.0, 30.0, -79.0, 31.0),
        DateWindow::year(2025).unwrap(),
    );
    assert!(source.fetch(&far).await.unwrap().is_empty());
}

// ============================================================================
// DirectorySceneSource
// ============================================================================

#[tokio::test]
async fn test_directory_source_reads_dated_geotiffs() {
    let dir = tempfile::tempdir().unwrap();
    let source = DirectorySceneSource::new(dir.path());

    let values = masked_band(&SQUARE_REGION_GRID, 4.0, &[(0, 0)]);
    let raster = Raster::new(SQUARE_REGION_GRID, values, Some(-9999.0)).unwrap();
    export_geotiff(&raster, source.scene_path(NO2, date(2025, 2, 3))).unwrap();
    export_geotiff(&raster, source.scene_path(NO2, date(2025, 5, 1))).unwrap();

    let query = CollectionQuery::new(
        NO2,
        NO2_BAND,
        hamburg(),
        DateWindow::parse("2025-02-01", "2025-03-01").unwrap(),
    );
    let collection = source.fetch(&query).await.unwrap();
    assert_eq!(collection.len(), 1);

    let image = collection.iter().next().unwrap();
    assert_eq!(image.acquired, Some(date(2025, 2, 3)));
    let data = image.band_data(NO2_BAND).unwrap();
    assert!(data[0].is_nan());
    assert_eq!(data[1], 4.0);
}
