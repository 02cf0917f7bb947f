use image::{Rgb, RgbImage};
use target_practice_detect::{
    color_mask, extract_edges, find_outer_contours, FrameAnalyzer, Rejection, TargetParams,
    TargetStatus,
};

const RED: Rgb<u8> = Rgb([220, 30, 30]);

fn fill_rect(frame: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            frame.put_pixel(x, y, color);
        }
    }
}

fn analyzer() -> FrameAnalyzer {
    FrameAnalyzer::new(TargetParams::default()).expect("default params are valid")
}

#[test]
fn red_square_is_acquired_near_its_center() {
    let mut frame = RgbImage::new(640, 480);
    fill_rect(&mut frame, 150, 150, 100, 100, RED);

    let analysis = analyzer().analyze(&frame).expect("analysis");
    let result = &analysis.result;
    assert_eq!(result.status, TargetStatus::Acquired);

    let accepted: Vec<_> = result.accepted().collect();
    assert_eq!(accepted.len(), 1, "candidates: {:#?}", result.candidates);
    let target = accepted[0];
    let centroid = target.centroid.expect("accepted target has a centroid");
    assert!((centroid.x - 200.0).abs() <= 2.0, "centroid {centroid:?}");
    assert!((centroid.y - 200.0).abs() <= 2.0, "centroid {centroid:?}");

    let rect = target.descriptor.bounding_rect;
    assert!((95..=106).contains(&rect.width), "rect {rect:?}");
    assert!((95..=106).contains(&rect.height), "rect {rect:?}");

    let crosshair = target.crosshair.expect("crosshair");
    assert_eq!(crosshair.center.x, centroid.x as i32);
    assert_eq!(crosshair.center.y, centroid.y as i32);
    assert!(crosshair.start_x < crosshair.center.x && crosshair.center.x < crosshair.end_x);
    assert!(crosshair.start_y < crosshair.center.y && crosshair.center.y < crosshair.end_y);
}

#[test]
fn black_frame_has_no_targets() {
    let frame = RgbImage::new(640, 480);
    let result = analyzer().detect(&frame).expect("detect");
    assert!(result.candidates.is_empty());
    assert_eq!(result.status, TargetStatus::NoTargets);
    assert_eq!(result.status.to_string(), "No targets.");
}

#[test]
fn elongated_and_small_shapes_are_rejected() {
    let mut frame = RgbImage::new(640, 480);
    // Bar: aspect ratio far above 1.2.
    fill_rect(&mut frame, 50, 50, 200, 40, RED);
    // Tiny square: below the minimum size.
    fill_rect(&mut frame, 400, 400, 12, 12, RED);

    let result = analyzer().detect(&frame).expect("detect");
    assert_eq!(result.status, TargetStatus::NoTargets);
    assert!(!result.candidates.is_empty());
    for c in &result.candidates {
        assert!(!c.is_accepted());
        assert!(c.centroid.is_none());
        assert!(c.crosshair.is_none());
        assert!(c.verdict.rejection.is_some());
    }
    assert!(result
        .candidates
        .iter()
        .any(|c| c.verdict.eligible && !c.verdict.aspect_ok));
}

#[test]
fn other_colors_are_ignored() {
    let mut frame = RgbImage::new(320, 240);
    fill_rect(&mut frame, 100, 60, 100, 100, Rgb([30, 200, 30]));
    let result = analyzer().detect(&frame).expect("detect");
    assert!(result.candidates.is_empty());
}

#[test]
fn status_matches_accepted_candidates() {
    let mut frames = Vec::new();
    let mut f = RgbImage::new(320, 240);
    fill_rect(&mut f, 20, 20, 60, 60, RED);
    fill_rect(&mut f, 200, 100, 100, 30, RED);
    frames.push(f);
    let mut f = RgbImage::new(320, 240);
    fill_rect(&mut f, 200, 100, 100, 30, RED);
    frames.push(f);
    frames.push(RgbImage::new(320, 240));

    let analyzer = analyzer();
    for frame in &frames {
        let result = analyzer.detect(frame).expect("detect");
        let any_accepted = result.candidates.iter().any(|c| c.verdict.accepted);
        assert_eq!(result.status == TargetStatus::Acquired, any_accepted);
    }
}

#[test]
fn every_contour_yields_one_candidate() {
    let mut frame = RgbImage::new(400, 300);
    fill_rect(&mut frame, 20, 20, 60, 60, RED);
    fill_rect(&mut frame, 150, 40, 150, 30, RED);
    fill_rect(&mut frame, 100, 200, 8, 8, RED);

    let params = TargetParams::default();
    let mask = color_mask(&frame, &params.color);
    let edges = extract_edges(&mask, &params.edges);
    let contours = find_outer_contours(&edges);

    let result = analyzer().detect(&frame).expect("detect");
    assert_eq!(result.candidates.len(), contours.len());
    for c in &result.candidates {
        assert!(!c.polygon.vertices.is_empty());
        if !c.verdict.eligible {
            assert!(matches!(c.verdict.rejection, Some(Rejection::VertexCount { .. })));
        }
    }
}

#[test]
fn analysis_leaves_the_frame_untouched() {
    let mut frame = RgbImage::new(320, 240);
    fill_rect(&mut frame, 110, 70, 100, 100, RED);
    let before = frame.clone();

    let analysis = analyzer().analyze(&frame).expect("analysis");
    assert_eq!(frame, before);
    assert_eq!(analysis.annotated.dimensions(), frame.dimensions());
    assert_ne!(analysis.annotated, frame);
}

#[test]
fn analysis_is_deterministic() {
    let mut frame = RgbImage::new(320, 240);
    fill_rect(&mut frame, 110, 70, 100, 100, RED);
    fill_rect(&mut frame, 10, 10, 40, 90, RED);
    let analyzer = analyzer();
    let a = analyzer.detect(&frame).expect("detect");
    let b = analyzer.detect(&frame).expect("detect");
    assert_eq!(a, b);
}

#[test]
fn detection_result_serializes_to_json() {
    let mut frame = RgbImage::new(320, 240);
    fill_rect(&mut frame, 110, 70, 100, 100, RED);
    let result = analyzer().detect(&frame).expect("detect");
    let json = serde_json::to_value(&result).expect("json");
    assert_eq!(json["status"], "acquired");
    assert!(json["candidates"].as_array().is_some_and(|c| !c.is_empty()));
}
