//! PM2.5 computations over a scene source.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use aq_common::{AqError, AqResult, BoundingBox, DateWindow, GeoGrid};
use chrono::{NaiveDate, Utc};
use imagery::{CalendarProperty, CollectionQuery, Image, ImageCollection, SceneSource};
use raster_io::{export_geotiff, points_to_features, vectorize};
use region::{Coordinate, Region, RegionGeometry, Regional};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::convert::{add_pm25_band, convert_no2_image, AAI_BAND, NO2_BAND, PM25_BAND};
use crate::documents::{
    AveragesDocument, AveragesRow, IndicatorDocument, IndicatorRow, MapDocument,
};
use crate::query::AveragesQuery;
use crate::settings::{PipelineSettings, Product};

/// The three air-quality computations.
///
/// Point queries outside the region yield [`Regional::OutOfBounds`];
/// errors are computation failures.
#[async_trait]
pub trait AirQualityEngine: Send + Sync {
    /// Current day, week and year means with their yearly comparison.
    async fn indicator(&self, point: Option<Coordinate>) -> AqResult<Regional<IndicatorDocument>>;

    /// Week, month and year means of the archive.
    async fn averages(&self, query: &AveragesQuery) -> AqResult<Regional<AveragesDocument>>;

    /// Region-wide point map over `[start, end)`.
    async fn map(&self, window: &DateWindow) -> AqResult<MapDocument>;
}

/// Source collections of one computation: AAI and NO2 in µg/m³.
struct SourcePair {
    aai: ImageCollection,
    no2: ImageCollection,
}

impl SourcePair {
    fn filter_tag(&self, property: CalendarProperty, value: u32) -> SourcePair {
        SourcePair {
            aai: self.aai.clone().filter_tag(property, value),
            no2: self.no2.clone().filter_tag(property, value),
        }
    }

    fn filter_iso_week(&self, year: i32, week: u32) -> SourcePair {
        SourcePair {
            aai: self.aai.clone().filter_iso_week(year, week),
            no2: self.no2.clone().filter_iso_week(year, week),
        }
    }

    /// Temporal means stacked into one image, AAI first.
    ///
    /// NO2 is resampled onto the AAI grid when the streams differ.
    fn combined_mean(&self) -> AqResult<Image> {
        let aai = self.aai.mean()?;
        let mut no2 = self.no2.mean()?;
        if aai.band_count() > 0 && no2.band_count() > 0 && !aai.grid.aligned_with(&no2.grid) {
            no2 = no2.resample(&aai.grid);
        }
        aai.add_bands(no2)
    }

    /// Mean PM2.5 over `aoi`.
    ///
    /// A period missing either source band counts as exactly 0; `None`
    /// means no selected pixel carried data.
    fn period_mean(&self, aoi: &RegionGeometry) -> AqResult<Option<f64>> {
        let combined = self.combined_mean()?;
        if combined.band_count() < 2 {
            return Ok(Some(0.0));
        }
        add_pm25_band(combined)?.reduce_region_mean(PM25_BAND, aoi)
    }
}

/// [`AirQualityEngine`] backed by a [`SceneSource`].
pub struct Pm25Engine {
    source: Arc<dyn SceneSource>,
    region: Arc<Region>,
    settings: PipelineSettings,
    /// Serializes map exports, which share output files.
    export_lock: Mutex<()>,
}

impl Pm25Engine {
    pub fn new(source: Arc<dyn SceneSource>, region: Arc<Region>, settings: PipelineSettings) -> Self {
        Self {
            source,
            region,
            settings,
            export_lock: Mutex::new(()),
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    async fn fetch_sources(
        &self,
        product: Product,
        bounds: BoundingBox,
        window: DateWindow,
    ) -> AqResult<SourcePair> {
        let collections = &self.settings.collections;
        let aai_query = CollectionQuery::new(collections.aai(product), AAI_BAND, bounds, window);
        let no2_query = CollectionQuery::new(collections.no2(product), NO2_BAND, bounds, window);

        let (aai, no2) = tokio::try_join!(
            self.source.fetch(&aai_query),
            self.source.fetch(&no2_query)
        )?;
        debug!(
            source = self.source.name(),
            aai_scenes = aai.len(),
            no2_scenes = no2.len(),
            "Fetched source collections"
        );

        let conversion = &self.settings.no2;
        let no2 = no2
            .into_images()
            .into_iter()
            .map(|img| convert_no2_image(img, conversion))
            .collect::<AqResult<Vec<_>>>()?;

        Ok(SourcePair {
            aai,
            no2: ImageCollection::from(no2),
        })
    }

    /// Indicator as of `today`, before lag correction.
    #[instrument(skip(self))]
    pub async fn indicator_on(
        &self,
        point: Option<Coordinate>,
        today: NaiveDate,
    ) -> AqResult<Regional<IndicatorDocument>> {
        let aoi = match self.region.resolve(point) {
            Regional::InRegion(aoi) => aoi,
            Regional::OutOfBounds => return Ok(Regional::OutOfBounds),
        };

        let current = self.settings.lag.apply(today);
        let window = DateWindow::year(current.year)?;
        let sources = self
            .fetch_sources(Product::Realtime, aoi.bounding_box(), window)
            .await?;

        let day = sources
            .filter_tag(CalendarProperty::Day, current.day)
            .period_mean(&aoi)?;
        let week = sources
            .filter_iso_week(current.year, current.week)
            .period_mean(&aoi)?;
        let year = sources.period_mean(&aoi)?;

        let day = day.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0);
        let week = week.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0);
        let year = year.filter(|v| v.is_finite()).unwrap_or(0.0);

        let ratio = |value: f64| {
            if year == 0.0 {
                0.0
            } else {
                value / year * 100.0
            }
        };

        info!(
            day = current.day,
            week = current.week,
            year = current.year,
            "PM2.5 indicator computed"
        );

        Ok(Regional::InRegion(IndicatorDocument(vec![
            IndicatorRow {
                period: current.day as i32,
                average_pm25: day,
                yearly_comparison: ratio(day),
            },
            IndicatorRow {
                period: current.week as i32,
                average_pm25: week,
                yearly_comparison: ratio(week),
            },
            IndicatorRow {
                period: current.year,
                average_pm25: year,
                yearly_comparison: 0.0,
            },
        ])))
    }

    fn export_grid(&self) -> GeoGrid {
        GeoGrid::covering(&self.region.bounding_box(), self.settings.export.resolution_deg())
    }
}

/// Run a blocking closure on the blocking pool.
async fn blocking<T, F>(f: F) -> AqResult<T>
where
    F: FnOnce() -> AqResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AqError::Internal(format!("raster task failed: {}", e)))?
}

#[async_trait]
impl AirQualityEngine for Pm25Engine {
    async fn indicator(&self, point: Option<Coordinate>) -> AqResult<Regional<IndicatorDocument>> {
        self.indicator_on(point, Utc::now().date_naive()).await
    }

    #[instrument(skip(self))]
    async fn averages(&self, query: &AveragesQuery) -> AqResult<Regional<AveragesDocument>> {
        let window = query.validate()?;
        let aoi = match self.region.resolve(query.point) {
            Regional::InRegion(aoi) => aoi,
            Regional::OutOfBounds => return Ok(Regional::OutOfBounds),
        };

        let sources = self
            .fetch_sources(Product::Archive, aoi.bounding_box(), window)
            .await?;

        let week = sources
            .filter_iso_week(query.year, query.week as u32)
            .period_mean(&aoi)?;
        let month = sources
            .filter_tag(CalendarProperty::Month, query.month as u32)
            .period_mean(&aoi)?;
        let year = sources.period_mean(&aoi)?;

        info!(
            week = query.week,
            month = query.month,
            year = query.year,
            "PM2.5 averages computed"
        );

        Ok(Regional::InRegion(AveragesDocument(vec![
            AveragesRow {
                period: query.week,
                average_pm2: week,
            },
            AveragesRow {
                period: query.month,
                average_pm2: month,
            },
            AveragesRow {
                period: query.year,
                average_pm2: year,
            },
        ])))
    }

    #[instrument(skip(self))]
    async fn map(&self, window: &DateWindow) -> AqResult<MapDocument> {
        let geometry = self.region.geometry().clone();
        let sources = self
            .fetch_sources(Product::Archive, self.region.bounding_box(), *window)
            .await?;

        let combined = sources.combined_mean()?;
        if combined.band_count() < 2 {
            return Err(AqError::DataNotAvailable(format!(
                "no NO2 and aerosol index scenes between {} and {}",
                window.start, window.end
            )));
        }

        let pm25 = add_pm25_band(combined)?
            .select(&[PM25_BAND])
            .clip(&geometry)
            .resample(&self.export_grid());

        let export = &self.settings.export;
        let raster = pm25.band_raster(PM25_BAND, Some(export.nodata))?;
        let raster_path = PathBuf::from(&export.raster_path);
        let vector_path = PathBuf::from(&export.vector_path);

        let _guard = self.export_lock.lock().await;
        let points = blocking(move || {
            export_geotiff(&raster, &raster_path)?;
            vectorize(&raster_path, &vector_path)
        })
        .await?;

        info!(
            start = %window.start,
            end = %window.end,
            points = points.len(),
            "PM2.5 map computed"
        );

        Ok(MapDocument(points_to_features(
            &points,
            raster_io::DEFAULT_PROPERTY,
        )))
    }
}
