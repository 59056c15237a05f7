//! End-to-end stacking, sampling and reassembly against a catalog

use approx::assert_relative_eq;
use std::sync::Arc;
use tilestack_algorithms::prelude::*;
use tilestack_catalog::MemoryStore;

const ZOOM: u32 = 5;

fn handle() -> CatalogHandle {
    CatalogHandle::with_store(Arc::new(MemoryStore::new()), CatalogConfig::default()).unwrap()
}

fn metadata(cell_type: CellType) -> TileLayerMetadata {
    TileLayerMetadata::with_grid(cell_type, 32, 32)
}

fn keys() -> Vec<SpatialKey> {
    vec![SpatialKey::new(10, 4), SpatialKey::new(11, 4)]
}

/// Single-band UInt8 class labels
fn label_layer() -> TileLayer {
    let size = DEFAULT_TILE_SIZE;
    let tiles = keys()
        .into_iter()
        .map(|key| {
            let data = (0..size * size).map(|i| ((i / size + key.col as usize) % 3) as u8).collect();
            let tile = TypedTile::<u8>::from_vec(data, size, size).unwrap();
            (key, Tile::from(tile))
        })
        .collect();
    TileLayer::new(metadata(CellType::UInt8), tiles)
}

/// Four Int16 reflectance bands; band 0 of tile (10, 4) holds zeros
fn sat_layer() -> MultibandTileLayer {
    let size = DEFAULT_TILE_SIZE;
    let tiles = keys()
        .into_iter()
        .map(|key| {
            let bands = (0..4)
                .map(|b| {
                    let data = (0..size * size)
                        .map(|i| (b * 1000 + (i % 997) as i32 + key.col as i32 - 10) as i16)
                        .collect();
                    Tile::from(TypedTile::<i16>::from_vec(data, size, size).unwrap())
                })
                .collect();
            (key, MultibandTile::new(bands).unwrap())
        })
        .collect();
    MultibandTileLayer::new(metadata(CellType::Int16), tiles)
}

fn constant_layer(keys: &[(u32, u32)], values: &[f64]) -> MultibandTileLayer {
    let mut md = metadata(CellType::Float64);
    md.layout.tile_cols = 4;
    md.layout.tile_rows = 4;
    let tiles = keys
        .iter()
        .map(|&(c, r)| {
            let bands = values
                .iter()
                .map(|&v| Tile::from(TypedTile::<f64>::filled(4, 4, v)))
                .collect();
            (SpatialKey::new(c, r), MultibandTile::new(bands).unwrap())
        })
        .collect();
    MultibandTileLayer::new(md, tiles)
}

fn first_cells(tile: &MultibandTile) -> Vec<f64> {
    tile.bands().iter().map(|b| b.get_f64(0, 0).unwrap()).collect()
}

#[test]
fn test_label_and_satellite_stack_to_samples() {
    let handle = handle();
    handle.catalog.write(&LayerId::new("label", ZOOM), &label_layer()).unwrap();
    handle.catalog.write(&LayerId::new("sat", ZOOM), &sat_layer()).unwrap();
    handle.catalog.write(&LayerId::new("sat", 3), &sat_layer()).unwrap();

    let (stacked, zoom) = build_stack(&handle, &["label", "sat"]).unwrap();
    assert_eq!(zoom, ZOOM);
    assert_eq!(stacked.len(), 2);
    assert_eq!(stacked.metadata().cell_type, CellType::Float64);

    for (key, tile) in stacked.iter() {
        assert_eq!(tile.band_count(), 5);
        assert_eq!(tile.shape(), (DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE));
        let label = label_layer().get(key).unwrap().get_f64(7, 9).unwrap();
        assert_eq!(tile.band(0).unwrap().get_f64(7, 9).unwrap(), label);
    }

    let samples: Vec<Sample> = to_samples(&stacked, 0).unwrap().collect();
    assert_eq!(samples.len(), 2 * DEFAULT_TILE_SIZE * DEFAULT_TILE_SIZE);
    assert!(samples.iter().all(|s| s.features.len() == 4));

    let per_tile = samples.iter().filter(|s| s.key == keys()[0]).count();
    assert_eq!(per_tile, DEFAULT_TILE_SIZE * DEFAULT_TILE_SIZE);
}

#[test]
fn test_scatter_gather_roundtrip_of_every_band() {
    let handle = handle();
    handle.catalog.write(&LayerId::new("label", ZOOM), &label_layer()).unwrap();
    handle.catalog.write(&LayerId::new("sat", ZOOM), &sat_layer()).unwrap();
    let (stacked, _) = build_stack(&handle, &["label", "sat"]).unwrap();
    let bands = 5;

    // Integer zeros must come through as values, not no-data.
    let zeros = |band: usize| {
        stacked
            .iter()
            .flat_map(|(_, t)| t.band(band).unwrap().to_f64_vec())
            .filter(|&v| v == 0.0)
            .count()
    };
    assert!(zeros(0) > 0);
    assert!(zeros(1) > 0);

    for label_band in [0, 2, 4] {
        for feature in 0..bands - 1 {
            let band = if feature < label_band { feature } else { feature + 1 };
            let values: Vec<PixelValue> = to_samples(&stacked, label_band)
                .unwrap()
                .filter_map(|s| PixelValue::feature_of(&s, feature))
                .collect();
            let rebuilt = from_samples(&handle.engine, values, stacked.metadata()).unwrap();

            assert_eq!(rebuilt.len(), stacked.len());
            for (key, tile) in rebuilt.iter() {
                let expected = stacked.get(key).unwrap().band(band).unwrap();
                assert_eq!(
                    tile.to_f64_vec(),
                    expected.to_f64_vec(),
                    "label band {label_band}, feature {feature}"
                );
            }
        }

        let labels: Vec<PixelValue> = to_samples(&stacked, label_band)
            .unwrap()
            .map(|s| PixelValue::label_of(&s))
            .collect();
        let rebuilt = from_samples(&handle.engine, labels, stacked.metadata()).unwrap();
        for (key, tile) in rebuilt.iter() {
            let expected = stacked.get(key).unwrap().band(label_band).unwrap();
            assert_eq!(tile.to_f64_vec(), expected.to_f64_vec());
        }
    }
}

#[test]
fn test_nested_stack_band_order() {
    let engine = Engine::default();
    let a = constant_layer(&[(0, 0), (1, 1)], &[1.0, 2.0]);
    let b = constant_layer(&[(0, 0), (1, 1)], &[3.0]);
    let c = constant_layer(&[(0, 0), (1, 1)], &[4.0, 5.0, 6.0]);

    let abc = stack(&engine, &stack(&engine, &a, &b).unwrap(), &c).unwrap();
    for (_, tile) in abc.iter() {
        assert_eq!(first_cells(tile), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}

#[test]
fn test_stack_keeps_only_common_keys() {
    let handle = handle();
    let a = constant_layer(&[(0, 0), (1, 0), (2, 0)], &[1.0]);
    let b = constant_layer(&[(2, 0), (3, 0)], &[2.0]);
    handle.catalog.write(&LayerId::new("a", 2), &a).unwrap();
    handle.catalog.write(&LayerId::new("b", 2), &b).unwrap();

    let id = build_and_write(&handle, &["a", "b"], "ab").unwrap();
    assert_eq!(id, LayerId::new("ab", 2));

    let ab: MultibandTileLayer = handle.catalog.read(&id).unwrap();
    let keys: Vec<SpatialKey> = ab.keys().copied().collect();
    assert_eq!(keys, vec![SpatialKey::new(2, 0)]);
}

#[test]
fn test_missing_layer_aborts_stack() {
    let handle = handle();
    handle
        .catalog
        .write(&LayerId::new("a", 2), &constant_layer(&[(0, 0)], &[1.0]))
        .unwrap();
    handle
        .catalog
        .write(&LayerId::new("b", 4), &constant_layer(&[(0, 0)], &[2.0]))
        .unwrap();

    // Resolves to zoom 4, where "a" does not exist.
    let err = build_stack(&handle, &["a", "b"]).unwrap_err();
    assert!(err.is_not_found());
    assert!(build_stack(&handle, &["a", "ghost"]).unwrap_err().is_not_found());
    assert_eq!(handle.catalog.layer_ids().unwrap().len(), 2);
}

#[test]
fn test_predictions_reassemble_into_tiles() {
    let handle = handle();
    let metadata = constant_layer(&[], &[]).metadata().clone();
    let csv = "col,row,x,y,value\n0,0,0,0,0.25\n0,0,3,3,0.75\n2,1,1,2,1\n";
    let values = read_predictions(csv.as_bytes()).unwrap();
    let layer = from_samples(&handle.engine, values, &metadata).unwrap();

    assert_eq!(layer.len(), 2);
    let tile = layer.get(&SpatialKey::new(0, 0)).unwrap();
    assert_relative_eq!(tile.get_f64(3, 3).unwrap(), 0.75);
    assert!(tile.get_f64(1, 1).unwrap().is_nan());

    handle.catalog.write(&LayerId::new("pred", 1), &layer).unwrap();
    let histogram = handle.catalog.histogram("pred").unwrap();
    assert_eq!(histogram.total, 3);
}
