mod common;

use common::{TestDataset, T1_QUAD};
use image::Rgb;
use pvmapper_core::{Error, Palette, PatchKey};
use pvmapper_viewer::viewer::OVERLAY_COLOR;
use pvmapper_viewer::{render_frame, DatasetModel, FrameSettings, FrameView, Inspector};

#[test]
fn test_stale_patch_index_is_out_of_range() {
    let dataset = TestDataset::standard();
    let mut model = DatasetModel::new();
    model.open(dataset.path()).unwrap();
    model.select_source("A").unwrap();

    let geometry = model.geometry().unwrap();
    let err = render_frame(&dataset.layout(), &geometry, "T1", 5, &FrameSettings::default())
        .unwrap_err();
    assert!(matches!(err, Error::OutOfRange { index: 5, len: 2 }));
}

#[test]
fn test_overlay_matches_stored_quadrilateral() {
    let dataset = TestDataset::standard();
    let mut model = DatasetModel::new();
    model.open(dataset.path()).unwrap();
    model.select_source("A").unwrap();

    let geometry = model.geometry().unwrap();
    let frame =
        render_frame(&dataset.layout(), &geometry, "T1", 0, &FrameSettings::default()).unwrap();
    assert_eq!(frame.overlay.points().len(), 4);
    assert_eq!(frame.overlay.points(), &T1_QUAD);
    assert_eq!(frame.patch, PatchKey::new("T1", "frame_000001", "mask_000000"));
    assert_eq!(frame.frame_index, 1);
    assert_eq!(frame.patch_count, 2);
    assert_eq!(frame.image.dimensions(), (16, 12));

    for &(x, y) in &T1_QUAD {
        assert_eq!(*frame.image.get_pixel(x as u32, y as u32), OVERLAY_COLOR);
    }
}

#[test]
fn test_temperatures_clamp_to_display_range() {
    let dataset = TestDataset::standard();
    let mut model = DatasetModel::new();
    model.open(dataset.path()).unwrap();
    let geometry = model.geometry().unwrap();

    let gray = render_frame(&dataset.layout(), &geometry, "T1", 0, &FrameSettings::default())
        .unwrap();
    // cold half is far below 30 °C, hot half far above 50 °C
    assert_eq!(*gray.image.get_pixel(0, 11), Rgb([0, 0, 0]));
    assert_eq!(*gray.image.get_pixel(15, 11), Rgb([255, 255, 255]));

    let settings = FrameSettings {
        palette: Palette::Jet,
        ..FrameSettings::default()
    };
    let jet = render_frame(&dataset.layout(), &geometry, "T1", 0, &settings).unwrap();
    assert_eq!(*jet.image.get_pixel(0, 11), Rgb(Palette::Jet.apply(0.0)));
    assert_eq!(*jet.image.get_pixel(15, 11), Rgb(Palette::Jet.apply(1.0)));
}

#[test]
fn test_missing_metadata_key_is_not_found() {
    let dataset = TestDataset::standard();
    dataset.write_patch("T3", "frame_000001_mask_000009.tiff", &common::uniform(4, 4, 7829));
    let mut model = DatasetModel::new();
    model.open(dataset.path()).unwrap();
    let geometry = model.geometry().unwrap();

    let err = render_frame(&dataset.layout(), &geometry, "T3", 0, &FrameSettings::default())
        .unwrap_err();
    assert!(err.is_not_found());
    let err = render_frame(&dataset.layout(), &geometry, "T9", 0, &FrameSettings::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_missing_source_frame_is_not_found() {
    let dataset = TestDataset::standard();
    std::fs::remove_file(dataset.layout().source_frame_path(1)).unwrap();
    let mut model = DatasetModel::new();
    model.open(dataset.path()).unwrap();
    let geometry = model.geometry().unwrap();
    let err = render_frame(&dataset.layout(), &geometry, "T1", 0, &FrameSettings::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_failed_render_keeps_previous_image() {
    let dataset = TestDataset::standard();
    let mut model = DatasetModel::new();
    let events = model.subscribe();
    model.open(dataset.path()).unwrap();
    let mut view = FrameView::default();

    model.select_track("T1");
    for event in events.try_iter() {
        view.handle_event(&event);
    }
    assert!(view.refresh(&model));
    let first = view.current().unwrap().patch.clone();

    std::fs::remove_file(dataset.layout().source_frame_path(2)).unwrap();
    model.set_patch_index(1);
    for event in events.try_iter() {
        view.handle_event(&event);
    }
    assert!(!view.refresh(&model));
    assert_eq!(view.current().unwrap().patch, first);
    assert_eq!(view.render_count(), 2);
}

#[test]
fn test_each_change_renders_once() {
    let dataset = TestDataset::standard();
    let mut inspector = Inspector::default();
    inspector.model_mut().open(dataset.path()).unwrap();
    inspector.update();
    assert_eq!(inspector.frame().render_count(), 0);

    inspector.update_images(r#"{"track_id": "T1"}"#).unwrap();
    inspector.update();
    assert_eq!(inspector.frame().render_count(), 1);
    inspector.update();
    assert_eq!(inspector.frame().render_count(), 1);

    inspector.frame_mut().set_min_temp(35.0);
    inspector.frame_mut().set_max_temp(45.0);
    inspector.frame_mut().set_palette(Palette::Plasma);
    inspector.update();
    assert_eq!(inspector.frame().render_count(), 2);
    assert_eq!(inspector.frame().settings().palette, Palette::Plasma);

    inspector.frame_mut().set_palette(Palette::Plasma);
    inspector.update();
    assert_eq!(inspector.frame().render_count(), 2);
    assert!(inspector.frame().current().is_some());
}
