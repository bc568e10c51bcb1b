mod common;

use cerrado_cover_wasm::{
    AnalysisConfig, FieldContext, Physiognomy, SpatialGridMapper, classify, decode, map_bytes,
};
use common::synthetic_scene::{canopy_over_soil, outcrop, png_bytes, uniform};

#[test]
fn grid_cells_tile_without_overlap() {
    let img = canopy_over_soil(97, 61, 40);
    for n in 1..=12u32 {
        let grid = SpatialGridMapper::new(n, FieldContext::default(), None).map(&img).unwrap();
        assert!(grid.cells.len() as u32 <= n * n);

        let mut covered = vec![0u8; 97 * 61];
        for c in &grid.cells {
            assert!(c.x + c.w <= 97 && c.y + c.h <= 61, "cell out of bounds: {c:?}");
            for y in c.y..c.y + c.h {
                for x in c.x..c.x + c.w {
                    covered[(y * 97 + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&v| v <= 1), "overlapping cells at n={n}");
    }
}

#[test]
fn dichotomous_key_reference_cases() {
    let wet = FieldContext { wet: true, rock_override: false };
    let dry = FieldContext::default();
    assert_eq!(classify(95.0, 0.0, wet).label(), "Gallery Forest");
    assert_eq!(classify(3.0, 10.0, dry).label(), "Rocky Grassland");
    assert_eq!(classify(30.0, 0.0, dry).label(), "Typical Savanna");
}

#[test]
fn outcrop_maps_to_rocky_grassland() {
    let bytes = png_bytes(&outcrop(64, 64));
    let config = AnalysisConfig { grid_size: 4, ..Default::default() };
    let (grid, overlay) = map_bytes(&bytes, &config).unwrap();
    assert_eq!(grid.cells.len(), 16);
    assert!(grid.cells.iter().all(|c| c.physiognomy == Physiognomy::RockyGrassland));
    assert!(grid.cells.iter().all(|c| c.mineral_fraction > 7.0));
    assert_eq!(grid.legend.len(), 1);

    let decoded = decode(&overlay).unwrap();
    assert_eq!(decoded.dimensions(), (64, 64));
}

#[test]
fn wet_context_splits_canopy_and_open_ground() {
    let bytes = png_bytes(&canopy_over_soil(40, 40, 20));
    let config = AnalysisConfig { grid_size: 2, wet_context: true, ..Default::default() };
    let (grid, _) = map_bytes(&bytes, &config).unwrap();
    assert_eq!(grid.cell(0, 0).unwrap().physiognomy, Physiognomy::GalleryForest);
    assert_eq!(grid.cell(1, 1).unwrap().physiognomy, Physiognomy::WetGrassland);

    let mut labels: Vec<_> = grid.legend.iter().map(|e| e.label.as_str()).collect();
    labels.sort();
    assert_eq!(labels, vec!["Gallery Forest", "Wet Grassland"]);
}

#[test]
fn rock_override_forces_rocky_branch() {
    let img = uniform(30, 30, [35, 150, 45]);
    let ctx = FieldContext { wet: false, rock_override: true };
    let grid = SpatialGridMapper::new(3, ctx, None).map(&img).unwrap();
    assert!(grid.cells.iter().all(|c| c.physiognomy == Physiognomy::DryForest));
    assert!(grid.cells.iter().all(|c| c.mineral_fraction == 0.0));
}

#[test]
fn downscaled_grid_reports_analysis_size() {
    let bytes = png_bytes(&uniform(900, 300, [35, 150, 45]));
    let config = AnalysisConfig { max_side: 300, grid_size: 5, ..Default::default() };
    let (grid, overlay) = map_bytes(&bytes, &config).unwrap();
    assert_eq!((grid.width, grid.height), (300, 100));
    assert_eq!((grid.cell_width, grid.cell_height), (60, 20));
    assert_eq!(decode(&overlay).unwrap().dimensions(), (300, 100));
}

#[test]
fn zero_grid_size_is_rejected() {
    let bytes = png_bytes(&uniform(10, 10, [0, 255, 0]));
    let config = AnalysisConfig { grid_size: 0, ..Default::default() };
    assert!(map_bytes(&bytes, &config).is_err());
}
