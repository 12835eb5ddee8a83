use std::fs;
use tempfile::NamedTempFile;
use uuid::Uuid;
use voxelkv::{
    CodecId, Data, DatasetId, Datatype, Engine, InMemoryStore, Point3, Region, RoiSpanStore, Shape,
    Span, VersionId,
};

fn setup() -> (Engine<InMemoryStore>, DatasetId, Data, Datatype, VersionId) {
    let engine = Engine::new(InMemoryStore::new(), 4);
    let dataset = DatasetId(Uuid::nil());
    let datatype = Datatype::new(7, 1, 1).unwrap();
    let data = Data::new("grayscale", datatype.id);
    let version = VersionId(Uuid::new_v4());
    (engine, dataset, data, datatype, version)
}

#[test]
fn put_then_get_volume_roundtrip() {
    let (engine, dataset, data, datatype, version) = setup();
    let region = Region::new_vol(Point3::new(0, 0, 0), 16, 16, 16);
    let src: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();

    engine
        .put_region(&dataset, &data, &datatype, &version, &region, &src, CodecId::Zstd)
        .unwrap();

    let mut dst = vec![0u8; 4096];
    engine
        .get_region(&dataset, &data, &datatype, &version, &region, &mut dst)
        .unwrap();
    assert_eq!(dst, src);
}

#[test]
fn put_spanning_multiple_blocks_in_x_and_y() {
    let (engine, dataset, data, datatype, version) = setup();
    // 32x32 XY slice spans 4 blocks: (0,0,0), (1,0,0), (0,1,0), (1,1,0).
    let region = Region::new_slice(Shape::Xy, Point3::new(0, 0, 0), 32, 32, 32);
    let src = vec![7u8; 32 * 32];

    engine
        .put_region(&dataset, &data, &datatype, &version, &region, &src, CodecId::None)
        .unwrap();

    let mut dst = vec![0u8; 32 * 32];
    engine
        .get_region(&dataset, &data, &datatype, &version, &region, &mut dst)
        .unwrap();
    assert_eq!(dst, src);

    // A neighboring plane in the same blocks must remain untouched.
    let other_plane = Region::new_slice(Shape::Xy, Point3::new(0, 0, 1), 32, 32, 32);
    let mut other_dst = vec![0xFFu8; 32 * 32];
    engine
        .get_region(&dataset, &data, &datatype, &version, &other_plane, &mut other_dst)
        .unwrap();
    assert!(other_dst.iter().all(|&b| b == 0));
}

#[test]
fn independent_versions_do_not_share_data() {
    let (engine, dataset, data, datatype, _version) = setup();
    let v1 = VersionId(Uuid::from_u128(1));
    let v2 = VersionId(Uuid::from_u128(2));
    let region = Region::new_slice(Shape::Xy, Point3::new(0, 0, 0), 16, 16, 16);

    engine
        .put_region(&dataset, &data, &datatype, &v1, &region, &vec![1u8; 256], CodecId::None)
        .unwrap();

    let mut dst = vec![0u8; 256];
    engine
        .get_region(&dataset, &data, &datatype, &v2, &region, &mut dst)
        .unwrap();
    assert!(dst.iter().all(|&b| b == 0), "version 2 must not see version 1's write");
}

#[test]
fn roi_span_store_persists_to_and_reloads_from_disk() {
    let store = RoiSpanStore::new(vec![
        Span { z: 0, y: 0, x0: 0, x1: 3 },
        Span { z: 1, y: 2, x0: 5, x1: 5 },
    ]);

    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), store.to_bytes().unwrap()).unwrap();

    let reloaded_bytes = fs::read(file.path()).unwrap();
    let reloaded = RoiSpanStore::from_bytes(&reloaded_bytes).unwrap();
    assert_eq!(reloaded.spans, store.spans);
}

#[test]
fn roi_membership_matches_loaded_spans() {
    let store = RoiSpanStore::new(vec![
        Span { z: 0, y: 0, x0: 0, x1: 1 },
        Span { z: 0, y: 1, x0: 2, x1: 2 },
    ]);
    let bytes = store.to_bytes().unwrap();
    let reloaded = RoiSpanStore::from_bytes(&bytes).unwrap();

    let mut it = reloaded.iter();
    assert!(it.inside(voxelkv::BlockIndex::new(0, 0, 0)));
    assert!(it.inside(voxelkv::BlockIndex::new(1, 0, 0)));
    assert!(!it.inside(voxelkv::BlockIndex::new(2, 0, 0)));
    assert!(it.inside(voxelkv::BlockIndex::new(2, 1, 0)));
}
