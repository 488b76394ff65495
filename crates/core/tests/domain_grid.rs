//! Domain sizing, time grid construction and index consistency

mod common;

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use fireground_core::grid::{time_grid, Domain, DEFAULT_RESOLUTION};
use fireground_core::{FiregroundError, GeoPoint, Sector};

#[ctor::ctor]
fn init() {
    common::init_tracing();
}

fn domain() -> Domain {
    Domain::with_resolution(Sector::new(34.0, -120.0, 35.0, -118.0), common::start(), 2, 0.25)
        .unwrap()
}

#[test]
fn test_grid_sizing_follows_resolution() {
    let d = domain();
    assert_eq!(d.nrows(), 4);
    assert_eq!(d.ncols(), 8);
    assert_eq!(d.spatial_length(), 32);
    assert_relative_eq!(d.geometry().lat_step(), 1.0 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(d.geometry().lon_step(), 2.0 / 7.0, epsilon = 1e-12);
}

#[test]
fn test_default_resolution_sizing() {
    let sector = Sector::new(0.0, 0.0, 0.01, 0.02);
    let d = Domain::new(sector, common::start(), 2).unwrap();
    assert_eq!(d.resolution(), DEFAULT_RESOLUTION);
    assert_eq!(d.nrows(), 37);
    assert_eq!(d.ncols(), 74);
}

#[test]
fn test_single_row_has_zero_latitude_step() {
    let d = Domain::with_resolution(Sector::new(0.0, 0.0, 0.3, 1.0), common::start(), 1, 0.25)
        .unwrap();
    assert_eq!(d.nrows(), 1);
    assert_eq!(d.geometry().lat_step(), 0.0);
    assert_eq!(d.geo_point_at(0).unwrap(), GeoPoint::new(0.0, 0.0));
}

#[test]
fn test_sector_smaller_than_a_step_is_rejected() {
    let err = Domain::with_resolution(Sector::new(0.0, 0.0, 0.1, 1.0), common::start(), 1, 0.25)
        .unwrap_err();
    assert!(matches!(err, FiregroundError::InvalidSector { .. }));
}

#[test]
fn test_time_grid_has_48_hours_from_1400() {
    let times = time_grid(common::start(), 2, 14).unwrap();
    let first = NaiveDate::from_ymd_opt(2024, 7, 15)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap();
    assert_eq!(times.len(), 48);
    assert_eq!(times[0], first);
    assert_eq!(times[47], first + Duration::hours(47));
    assert!(times.windows(2).all(|w| w[1] - w[0] == Duration::hours(1)));

    let d = domain();
    assert_eq!(d.timestamps(), times.as_slice());
    assert_eq!(d.start_date(), first);
    assert_eq!(d.nearest_time_index(first + Duration::minutes(29)), Some(0));
    assert_eq!(d.nearest_time_index(first + Duration::minutes(31)), Some(1));
}

#[test]
fn test_time_grid_rejects_zero_cycles() {
    assert!(time_grid(common::start(), 0, 14).is_err());
    assert!(time_grid(common::start(), 1, 24).is_err());
}

#[test]
fn test_index_consistency_over_every_cell() {
    let d = domain();
    for i in 0..d.spatial_length() {
        let (row, col) = d.cell_of(i).unwrap();
        assert_eq!(d.index_of(row, col).unwrap(), i);
        let p = d.geo_point_at(i).unwrap();
        assert_eq!(p, d.geo_point_at_cell(row, col).unwrap());
        assert_eq!(d.nearest_index(p), Some(i));
    }
}

#[test]
fn test_column_major_layout_and_corners() {
    let d = domain();
    assert_eq!(d.index_of(1, 0).unwrap(), 1);
    assert_eq!(d.index_of(0, 1).unwrap(), d.nrows());
    assert_eq!(d.geo_point_at(0).unwrap(), GeoPoint::new(34.0, -120.0));
    let last = d.geo_point_at(d.spatial_length() - 1).unwrap();
    assert_relative_eq!(last.latitude, 35.0, epsilon = 1e-9);
    assert_relative_eq!(last.longitude, -118.0, epsilon = 1e-9);
}

#[test]
fn test_out_of_range_queries() {
    let d = domain();
    assert!(matches!(
        d.geo_point_at(d.spatial_length()),
        Err(FiregroundError::IndexOutOfRange { .. })
    ));
    assert!(d.index_of(4, 0).is_err());
    assert!(d.timestamp_at(48).is_err());
    assert_eq!(d.nearest_index(GeoPoint::new(33.9, -119.0)), None);
}
