// Checkpoint scenarios through the public API:
//   missing keys, grouping objects reloading as raw assignments,
//   geometry tables surviving a process restart, corrupt entries.

use std::fs;

use geo::{MultiPolygon, Rect};
use polars::prelude::*;
use popmap::{
    Cache, CacheConfig, Checkpointed, Checkpointer, Crs, Error, GeoTable, GroupAssignment,
    Partition, Payload, aggregate, assign,
};

fn squares(ids: &[&str]) -> GeoTable {
    let shapes = (0..ids.len())
        .map(|i| MultiPolygon(vec![Rect::new((i as f64, 0.0), (i as f64 + 1.0, 1.0)).to_polygon()]))
        .collect();
    GeoTable::new(ids.iter().map(|id| id.to_string()).collect(), shapes, Some(Crs::Epsg(26910))).unwrap()
}

#[test]
fn missing_key_loads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::new(dir.path());
    assert_eq!(cache.load("missing_key").unwrap(), None);
}

#[test]
fn grouping_object_reloads_as_its_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("cache.json");
    fs::write(&config_path, format!(r#"{{"dir": {:?}, "compress": false}}"#, dir.path().join("ckpt"))).unwrap();
    let config = CacheConfig::from_json_file(&config_path).unwrap();
    assert!(!config.compress);

    let precincts = squares(&["1", "2", "3"])
        .with_data(DataFrame::new(vec![Column::new("POP".into(), [30i64, 5, 7])]).unwrap())
        .unwrap();
    let groups: GroupAssignment = [("1", "A"), ("2", "A"), ("3", "B")].into_iter().collect();

    let build = || Partition::with_totals(groups.clone(), &precincts, &["POP"]);
    let first = Checkpointer::new(Cache::with_config(config.clone()))
        .checkpoint("districts", build)
        .unwrap();
    let Checkpointed::Computed(partition) = first else { panic!("expected a fresh computation") };
    assert_eq!(partition.total("POP", "A"), Some(35.0));

    let second = Checkpointer::new(Cache::with_config(config))
        .checkpoint("districts", build)
        .unwrap();
    assert!(second.is_restored());

    let restored = second.into_view();
    assert_eq!(restored.get("1"), Some("A"));
    assert_eq!(restored.get("2"), Some("A"));
    assert_eq!(restored.get("3"), Some("B"));
    assert_eq!(restored.len(), 3);

    let rehydrated = Partition::with_totals(restored, &precincts, &["POP"]).unwrap();
    assert_eq!(rehydrated.members("A"), ["1", "2"]);
    assert_eq!(rehydrated.total("POP", "B"), Some(7.0));
}

#[test]
fn geotable_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let table = squares(&["060014001001", "060014001002"])
        .with_data(DataFrame::new(vec![
            Column::new("POP".into(), [Some(3i64), None]),
            Column::new("NAME".into(), ["north", "south"]),
            Column::new("AREA".into(), [0.5f64, 1.25]),
            Column::new("VAP".into(), [Some(2i32), Some(-1)]),
            Column::new("HOUSEHOLDS".into(), [Some(1u32), None]),
            Column::new("LAND".into(), [u64::MAX - 1, 9]),
            Column::new("SHARE".into(), [Some(0.1f32), None]),
        ]).unwrap())
        .unwrap();

    Checkpointer::in_dir(dir.path())
        .checkpoint("blocks", || Ok::<_, Error>(table.clone()))
        .unwrap();
    let restored = Checkpointer::in_dir(dir.path())
        .checkpoint::<GeoTable, Error, _>("blocks", || panic!("must not recompute"))
        .unwrap()
        .into_inner();

    assert_eq!(restored.ids(), table.ids());
    assert_eq!(restored.shapes(), table.shapes());
    assert_eq!(restored.crs(), table.crs());
    assert_eq!(restored.data().dtypes(), table.data().dtypes());
    assert!(restored.data().equals_missing(table.data()));

    let land = restored.data().column("LAND").unwrap().u64().unwrap();
    assert_eq!(land.get(0), Some(u64::MAX - 1));
}

#[test]
fn restored_assignment_aggregates_like_a_fresh_one() {
    let dir = tempfile::tempdir().unwrap();
    let blocks = squares(&["b1", "b2", "b3", "b4"])
        .with_data(DataFrame::new(vec![Column::new("POP".into(), [10i64, 20, 5, 0])]).unwrap())
        .unwrap();
    let precincts = GeoTable::new(
        vec!["A".into(), "B".into()],
        vec![
            MultiPolygon(vec![Rect::new((0.0, 0.0), (2.0, 1.0)).to_polygon()]),
            MultiPolygon(vec![Rect::new((2.0, 0.0), (4.0, 1.0)).to_polygon()]),
        ],
        Some(Crs::Epsg(26910)),
    ).unwrap();

    let mut totals = Vec::new();
    for _ in 0..2 {
        let assignment = Checkpointer::in_dir(dir.path())
            .checkpoint("blocks_to_precincts", || assign(&blocks, &precincts))
            .unwrap()
            .into_inner();
        let out = aggregate(&precincts, &assignment, &blocks, &["POP"]).unwrap();
        totals.push(out.data().column("POP").unwrap().i64().unwrap().into_no_null_iter().collect::<Vec<_>>());
    }

    assert_eq!(totals[0], vec![30, 5]);
    assert_eq!(totals[0], totals[1]);
}

#[test]
fn corrupt_entry_is_never_recomputed_silently() {
    let dir = tempfile::tempdir().unwrap();
    let checkpointer = Checkpointer::in_dir(dir.path());
    checkpointer.cache().store("plan", &Payload::Groups(GroupAssignment::new())).unwrap();

    let path = checkpointer.cache().entry_path("plan");
    let mut bytes = fs::read(&path).unwrap();
    bytes.truncate(bytes.len() / 2);
    fs::write(&path, bytes).unwrap();

    let result = checkpointer.checkpoint::<GroupAssignment, Error, _>("plan", || panic!("must not recompute"));
    assert!(matches!(result, Err(Error::Corrupt { .. })));
}
