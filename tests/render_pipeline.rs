use matviz::{
    CacheParams, Dims, FrameIndex, MatrixId, MemoryModel, SimConfig, Traversal, Variant,
};

fn small_cfg(variant: Variant) -> SimConfig {
    let mut cfg = SimConfig::new("pipeline test", Dims::square(4).unwrap(), variant);
    cfg.scale = 1;
    cfg
}

#[test]
fn scene_documents_parse_as_svg_with_the_expected_canvas() {
    let cfg = small_cfg(Variant::Blocked {
        block1: 2,
        l1: Some(1),
    });
    let svg = matviz::scene_svg(&cfg, FrameIndex(10)).unwrap();

    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts).unwrap();
    assert_eq!(tree.size().width(), 380.0);
    assert_eq!(tree.size().height(), 200.0);
}

#[test]
fn rendered_frames_have_the_configured_geometry() {
    let cfg = small_cfg(Variant::Naive);
    let frame = matviz::render_frame(&cfg, FrameIndex(0)).unwrap();
    assert_eq!((frame.width, frame.height), (380, 200));
    assert_eq!(frame.data.len(), 380 * 200 * 4);
    // The scene paints an opaque white background.
    assert_eq!(frame.data[3], 255);
}

#[test]
fn frame_rendering_is_deterministic() {
    let cfg = small_cfg(Variant::Transposed);
    let a = matviz::render_frame(&cfg, FrameIndex(7)).unwrap();
    let b = matviz::render_frame(&cfg, FrameIndex(7)).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn transposition_improves_b_hit_rate_at_reference_size() {
    // The point of the animation: at the reference 12x12x12 size, walking
    // B down a column thrashes the 8-line cache, while the transposed
    // layout makes the same walk contiguous.
    let dims = Dims::square(12).unwrap();

    let b_hits = |variant: Variant| {
        let tr = Traversal::new(dims, variant).unwrap();
        let mut model = MemoryModel::new(dims, variant.transposed_b(), CacheParams::default());
        for ev in tr.events() {
            model.apply(&ev);
        }
        model.matrix(MatrixId::B).l2_hits()
    };

    let naive = b_hits(Variant::Naive);
    let transposed = b_hits(Variant::Transposed);
    assert!(
        transposed > naive,
        "expected transposed ({transposed}) to beat naive ({naive})"
    );
}

#[test]
fn blocking_does_not_hurt_the_total_hit_rate() {
    let dims = Dims::square(12).unwrap();

    let hits = |variant: Variant| {
        let tr = Traversal::new(dims, variant).unwrap();
        let mut model = MemoryModel::new(dims, variant.transposed_b(), CacheParams::default());
        for ev in tr.events() {
            model.apply(&ev);
        }
        model.totals().cache_hits()
    };

    let naive = hits(Variant::Naive);
    let blocked = hits(Variant::Blocked {
        block1: 4,
        l1: None,
    });
    assert!(
        blocked >= naive,
        "expected blocked ({blocked}) >= naive ({naive})"
    );
}

#[test]
fn trace_lines_are_valid_json_events() {
    let cfg = small_cfg(Variant::Naive);
    let mut buf = Vec::new();
    let count = matviz::write_trace_json(&cfg, &mut buf).unwrap();
    assert_eq!(count, 4 * 4 * (3 * 4 + 1));

    let text = String::from_utf8(buf).unwrap();
    for line in text.lines() {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v.get("matrix").is_some());
        assert!(v.get("kind").is_some());
        assert!(v.get("level").is_some());
    }
}

#[test]
fn totals_line_reports_the_run() {
    let dims = Dims::square(4).unwrap();
    let tr = Traversal::new(dims, Variant::Naive).unwrap();
    let mut model = MemoryModel::new(dims, false, CacheParams::default());
    for ev in tr.events() {
        model.apply(&ev);
    }
    let totals = model.totals();
    assert_eq!(totals.mem, tr.event_count());
    let line = totals.to_string();
    assert!(line.contains("mem:"));
    assert!(line.contains("cache hits:"));
}
