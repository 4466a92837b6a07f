use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use endless_terrain::config::ConfigurationManager;
use endless_terrain::core::{ChunkMeshReady, ChunkVisibilityChanged, EventBus};
use endless_terrain::terrain::{
    ChunkManager, ChunkPosition, ChunkState, Color, MapGenerator, NoiseParameters, RegionTable,
    TerrainType, generate_noise_map,
};
use glam::Vec2;

const CONFIG: &str = r#"
[noise]
scale = 25.0
octaves = 4
persistence = 0.5
lacunarity = 2.0
seed = 1

[mesh]
height_multiplier = 12.0
level_of_detail = 2

[streaming]
map_chunk_size = 17
max_view_distance = 32.0

[workers]
max_threads = 3
"#;

fn chunk_manager(events: Arc<EventBus>) -> ChunkManager {
    let config = ConfigurationManager::from_toml_str(CONFIG)
        .unwrap()
        .validated()
        .unwrap();
    ChunkManager::from_config(&config, events).unwrap()
}

fn tick_until_idle(manager: &mut ChunkManager, viewer: Vec2) {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        manager.update(viewer);
        if manager.is_idle() {
            manager.update(viewer);
            return;
        }
        assert!(Instant::now() < deadline, "streaming did not settle");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn walking_viewer_streams_ready_chunks() {
    let events = Arc::new(EventBus::new());
    let mut manager = chunk_manager(Arc::clone(&events));

    // chunk size 16, view distance 32 -> 2 chunks each way
    assert_eq!(manager.chunks_visible_in_view_distance(), 2);

    tick_until_idle(&mut manager, Vec2::ZERO);
    assert_eq!(manager.chunk_count(), 25);
    assert_eq!(manager.ready_count(), 25);

    // Walk one chunk east: one new column of five.
    tick_until_idle(&mut manager, Vec2::new(16.0, 0.0));
    assert_eq!(manager.chunk_count(), 30);
    assert!(manager.chunks().all(|c| c.state() == ChunkState::Ready));

    // The column left behind is still stored, just hidden.
    let behind = manager.chunk(ChunkPosition::new(-2, 0)).unwrap();
    assert!(!behind.is_visible());
}

#[test]
fn meshes_use_configured_level_of_detail() {
    let events = Arc::new(EventBus::new());
    let meshes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&meshes);
    events.subscribe(move |event: &ChunkMeshReady| {
        sink.lock().unwrap().push(Arc::clone(&event.mesh));
    });

    let mut manager = chunk_manager(events);
    tick_until_idle(&mut manager, Vec2::ZERO);

    let meshes = meshes.lock().unwrap();
    assert_eq!(meshes.len(), 25);
    // 17 samples at stride 4 -> 5 per line
    for mesh in meshes.iter() {
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        assert!(mesh.vertices.iter().all(|v| (0.0..=12.0).contains(&v.y)));
    }
}

#[test]
fn chunk_meshes_are_deterministic_across_managers() {
    let mut first = chunk_manager(Arc::new(EventBus::new()));
    let mut second = chunk_manager(Arc::new(EventBus::new()));
    tick_until_idle(&mut first, Vec2::ZERO);
    tick_until_idle(&mut second, Vec2::ZERO);

    for chunk in first.chunks() {
        let other = second.chunk(chunk.position).unwrap();
        assert_eq!(chunk.mesh().unwrap().as_ref(), other.mesh().unwrap().as_ref());
    }
}

#[test]
fn visibility_signals_track_the_viewer() {
    let events = Arc::new(EventBus::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    events.subscribe(move |event: &ChunkVisibilityChanged| {
        sink.lock().unwrap().push(event.clone());
    });

    let mut manager = chunk_manager(events);
    manager.update_visible_chunks(Vec2::ZERO);
    manager.update_visible_chunks(Vec2::ZERO);
    let shown = log.lock().unwrap().len();
    assert_eq!(shown, manager.visible_chunks().len());

    // Far jump: everything visible before is hidden.
    manager.update_visible_chunks(Vec2::new(1000.0, 1000.0));
    let log = log.lock().unwrap();
    let hidden = log[shown..].iter().filter(|e| !e.visible).count();
    assert_eq!(hidden, shown);
}

#[test]
fn reference_example_is_deterministic_and_seed_sensitive() {
    let params = NoiseParameters {
        scale: 50.0,
        octaves: 4,
        persistence: 0.5,
        lacunarity: 2.0,
        seed: 1,
        offset: Vec2::ZERO,
        ..Default::default()
    };
    let a = generate_noise_map(241, 241, &params);
    let b = generate_noise_map(241, 241, &params);
    let c = generate_noise_map(241, 241, &NoiseParameters { seed: 2, ..params.clone() });

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.values().iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn reference_region_example() {
    let water = Color::rgb(0.0, 0.0, 1.0);
    let grass = Color::rgb(0.0, 1.0, 0.0);
    let rock = Color::rgb(0.5, 0.5, 0.5);
    let table = RegionTable::new(vec![
        TerrainType::new("water", 0.3, water),
        TerrainType::new("grass", 0.6, grass),
        TerrainType::new("rock", 1.0, rock),
    ]);
    let generator = MapGenerator {
        regions: table.clone(),
        ..Default::default()
    };

    assert_eq!(table.classify(0.3), Some(water));
    assert_eq!(table.classify(0.31), Some(grass));
    assert_eq!(table.classify(1.0), Some(rock));

    let data = generator.generate_map_data(Vec2::ZERO);
    assert!(data.color_map.iter().all(|c| [water, grass, rock].contains(c)));
}
