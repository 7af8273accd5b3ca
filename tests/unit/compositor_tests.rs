// Compositor unit tests
// Drives full render passes against a recording surface

use image::{Rgba, RgbaImage};
use rstest::rstest;
use watermark_studio::watermark::*;

fn base(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([240, 240, 240, 255]))
}

fn render(surface: &mut RecordingSurface, layers: &[WatermarkLayer]) -> RenderStats {
    WatermarkCompositor::new()
        .render(surface, &base(800, 600), layers)
        .expect("render should succeed")
}

// "Sample" at 48px is 6 * 48 * 0.5 = 144 wide on the recording surface
#[rstest]
#[case(Anchor::TopLeft, (10.0, 58.0))]
#[case(Anchor::TopRight, (646.0, 58.0))]
#[case(Anchor::BottomLeft, (10.0, 590.0))]
#[case(Anchor::BottomRight, (646.0, 590.0))]
#[case(Anchor::Center, (328.0, 324.0))]
fn test_anchored_layer_lands_at_resolved_position(#[case] anchor: Anchor, #[case] expected: (f32, f32)) {
    let mut surface = RecordingSurface::new(800, 600).unwrap();
    render(&mut surface, &[WatermarkLayer::new("Sample").with_position(anchor)]);

    let draw = surface.text_draws().next().unwrap();
    assert_eq!(draw.device, expected);
}

#[test]
fn test_custom_position_uses_layer_coordinates() {
    let mut surface = RecordingSurface::new(800, 600).unwrap();
    render(&mut surface, &[WatermarkLayer::new("Sample").at(123, 45)]);
    assert_eq!(surface.text_draws().next().unwrap().device, (123.0, 45.0));
}

#[test]
fn test_offscreen_custom_position_is_still_drawn() {
    let mut surface = RecordingSurface::new(800, 600).unwrap();
    let stats = render(&mut surface, &[WatermarkLayer::new("gone").at(5000, 5000)]);

    assert_eq!(stats.offscreen, 1);
    assert_eq!(surface.fill_count(), 1);
}

#[test]
fn test_every_effect_ends_with_a_fill_in_layer_color() {
    let color = Color::new(10, 20, 30);
    let layers: Vec<_> = [
        TextEffect::None,
        TextEffect::Outline,
        TextEffect::Shadow,
        TextEffect::Emboss,
        TextEffect::Neon,
    ]
    .into_iter()
    .map(|effect| WatermarkLayer::new("fx").with_color(color).with_effect(effect))
    .collect();

    let mut surface = RecordingSurface::new(800, 600).unwrap();
    let stats = render(&mut surface, &layers);
    assert_eq!(stats.layers_drawn, 5);

    // None 1, Outline 1, Shadow 1, Emboss 2, Neon 1
    assert_eq!(surface.fill_count(), 6);
    // Outline and Neon
    assert_eq!(surface.stroke_count(), 2);

    let last_fill = surface
        .calls()
        .iter()
        .rev()
        .find_map(|call| match call {
            DrawCall::FillText(draw) => Some(draw),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_fill.color, color);
}

#[test]
fn test_rerender_is_a_full_redraw() {
    let mut surface = RecordingSurface::new(800, 600).unwrap();
    let layers = vec![WatermarkLayer::new("again")];

    render(&mut surface, &layers);
    let first = surface.take_calls();
    render(&mut surface, &layers);

    assert_eq!(surface.calls(), first.as_slice());
    assert_eq!(surface.calls()[0], DrawCall::Clear);
}

#[test]
fn test_pattern_tiles_cover_surface_with_rotation() {
    let mut surface = RecordingSurface::new(800, 600).unwrap();
    let layer = WatermarkLayer::new("tiled").with_pattern(PatternSettings::tiled(200, 45));
    let stats = render(&mut surface, &[layer]);

    // x in -800..1600 step 200 (12), y in -600..1200 step 200 (9)
    assert_eq!(stats.tiles, 108);
    assert_eq!(surface.fill_count(), 108);
    assert_eq!(surface.saved_depth(), 0);
}

#[test]
fn test_blend_mode_and_alpha_scope_to_their_layer() {
    let mut surface = RecordingSurface::new(800, 600).unwrap();
    let layers = vec![
        WatermarkLayer::new("screened")
            .with_blend_mode(BlendMode::Screen)
            .with_opacity(0.3),
        WatermarkLayer::new("plain").with_opacity(1.0),
    ];
    render(&mut surface, &layers);

    let draws: Vec<_> = surface.text_draws().collect();
    assert_eq!(draws[0].composite, BlendMode::Screen);
    assert_eq!(draws[0].global_alpha, 0.3);
    assert_eq!(draws[1].composite, BlendMode::Normal);
    assert_eq!(draws[1].global_alpha, 1.0);
}

#[test]
fn test_base_only_render_reproduces_base_pixels() {
    let mut surface = PixmapSurface::new(4, 3, FontBook::empty()).unwrap();
    let base = RgbaImage::from_fn(4, 3, |x, y| Rgba([(x * 60) as u8, (y * 80) as u8, 128, 255]));

    WatermarkCompositor::new().render(&mut surface, &base, &[]).unwrap();
    let out = surface.to_rgba_image().unwrap();

    for (expected, actual) in base.pixels().zip(out.pixels()) {
        for channel in 0..4 {
            let diff = (expected[channel] as i16 - actual[channel] as i16).abs();
            assert!(diff <= 1, "expected {:?}, got {:?}", expected, actual);
        }
    }
}

#[test]
fn test_text_layer_without_fonts_fails() {
    let mut surface = PixmapSurface::new(32, 32, FontBook::empty()).unwrap();
    let result = WatermarkCompositor::new().render(&mut surface, &base(32, 32), &[WatermarkLayer::new("x")]);
    assert!(matches!(result, Err(WatermarkError::FontUnavailable(_))));
}

#[test]
fn test_rendering_is_deterministic_across_surfaces() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        // Rasterizing text needs at least one installed face
        return;
    }

    let base = RgbaImage::from_fn(160, 120, |x, y| Rgba([x as u8, y as u8, 90, 255]));
    let layers = vec![
        WatermarkLayer::new("emboss")
            .with_font("sans-serif", 24)
            .with_effect(TextEffect::Emboss)
            .with_position(Anchor::Center),
        WatermarkLayer::new("neon")
            .with_font("sans-serif", 18)
            .with_color(Color::new(0, 200, 255))
            .with_effect(TextEffect::Neon)
            .with_blend_mode(BlendMode::Screen)
            .with_pattern(PatternSettings::tiled(60, 30)),
    ];

    let paint = |fonts: FontBook, passes: usize| {
        let mut surface = PixmapSurface::new(160, 120, fonts).unwrap();
        for _ in 0..passes {
            WatermarkCompositor::new().render(&mut surface, &base, &layers).unwrap();
        }
        surface.to_rgba_image().unwrap()
    };

    let first = paint(fonts.clone(), 1);
    assert_eq!(paint(fonts.clone(), 1), first);
    // Every pass is a full redraw, so repeated renders do not accumulate
    assert_eq!(paint(fonts, 2), first);
    assert_ne!(first, base);
}
